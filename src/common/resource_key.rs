use std::fmt::Display;

use kube::{Resource, ResourceExt};

pub const DEFAULT_NAMESPACE_NAME: &str = "default";

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceKey {
    pub group: String,
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

impl ResourceKey {
    pub fn of<R>(namespace: &str, name: &str) -> Self
    where
        R: Resource<DynamicType = ()>,
    {
        Self { group: R::group(&()).into_owned(), namespace: namespace.to_owned(), name: name.to_owned(), kind: R::kind(&()).into_owned() }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}.{}", self.kind, self.namespace, self.name)
    }
}

/// Objects without a name are keyed by their `generateName`.
impl<R> From<&R> for ResourceKey
where
    R: Resource<DynamicType = ()>,
{
    fn from(resource: &R) -> Self {
        let namespace = resource.namespace().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned());
        Self::of::<R>(&namespace, &resource.name_any())
    }
}
