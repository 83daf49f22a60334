use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use typed_builder::TypedBuilder;

use crate::apis::APIRule;

/// Controller owner reference pointing back at the object that caused the creation.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[builder(build_method(into = OwnerReference))]
pub struct Owner {
    #[builder(setter(into))]
    api_version: String,
    #[builder(setter(into))]
    kind: String,
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    uid: String,
    #[builder(default = true)]
    controller: bool,
}

impl From<Owner> for OwnerReference {
    fn from(owner: Owner) -> Self {
        OwnerReference {
            api_version: owner.api_version,
            kind: owner.kind,
            name: owner.name,
            uid: owner.uid,
            controller: Some(owner.controller),
            block_owner_deletion: None,
        }
    }
}

pub fn api_rule_owner(api: &APIRule) -> OwnerReference {
    Owner::builder().api_version(APIRule::api_version(&())).kind(APIRule::kind(&())).name(api.name_any()).uid(api.uid().unwrap_or_default()).build()
}
