use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use sha2::{Digest, Sha256};
use typed_builder::TypedBuilder;

use super::object_meta;
use crate::apis::{AccessRule, AccessRuleSpec, Handler, Match, Upstream};

pub const DEFAULT_AUTHORIZER: &str = "allow";

/// Matcher understood by Oathkeeper: the scheme alternation and the path are regex groups.
pub fn match_url(host: &str, path: &str) -> String {
    format!("<http|https>://{host}<{path}>")
}

/// `<api>-<hash>`, where the hash is the first 8 hex digits of the SHA-256 of `match_url`.
/// The same APIRule and match URL always give the same name.
pub fn access_rule_name(api: &str, match_url: &str) -> String {
    let digest = Sha256::digest(match_url.as_bytes());
    format!("{api}-{}", hex::encode(&digest[..4]))
}

#[derive(Clone, Debug, TypedBuilder)]
#[builder(build_method(into = AccessRule))]
pub struct AccessRuleObject {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    namespace: String,
    labels: BTreeMap<String, String>,
    owner: OwnerReference,
    #[builder(setter(into))]
    upstream_url: String,
    #[builder(setter(into))]
    match_url: String,
    #[builder(default)]
    methods: Vec<String>,
    #[builder(default)]
    authenticators: Vec<Handler>,
    #[builder(default = Handler::new(DEFAULT_AUTHORIZER))]
    authorizer: Handler,
    #[builder(default)]
    mutators: Vec<Handler>,
}

impl From<AccessRuleObject> for AccessRule {
    fn from(object: AccessRuleObject) -> Self {
        let spec = AccessRuleSpec {
            upstream: Upstream { url: object.upstream_url, ..Default::default() },
            matcher: Match { url: object.match_url, methods: object.methods },
            authenticators: object.authenticators,
            authorizer: object.authorizer,
            mutators: if object.mutators.is_empty() { None } else { Some(object.mutators) },
        };
        let mut access_rule = AccessRule::new("", spec);
        access_rule.metadata = object_meta(object.name, object.namespace, object.labels, object.owner);
        access_rule
    }
}
