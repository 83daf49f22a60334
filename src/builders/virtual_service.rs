use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use typed_builder::TypedBuilder;

use super::object_meta;
use crate::apis::{Destination, HTTPMatchRequest, HTTPRoute, HTTPRouteDestination, PortSelector, StringMatch, VirtualService, VirtualServiceSpec};

#[derive(Clone, Debug, TypedBuilder)]
#[builder(build_method(into = Destination))]
pub struct RouteDestination {
    #[builder(setter(into))]
    host: String,
    port: u32,
}

impl From<RouteDestination> for Destination {
    fn from(destination: RouteDestination) -> Self {
        Destination { host: destination.host, port: Some(PortSelector { number: destination.port }) }
    }
}

/// One HTTP route sending every request whose URI matches `path` to `destination`.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(build_method(into = HTTPRoute))]
pub struct RegexRoute {
    #[builder(setter(into))]
    path: String,
    destination: Destination,
}

impl From<RegexRoute> for HTTPRoute {
    fn from(route: RegexRoute) -> Self {
        HTTPRoute {
            matches: vec![HTTPMatchRequest { uri: Some(StringMatch { regex: Some(route.path), ..Default::default() }) }],
            route: vec![HTTPRouteDestination { destination: route.destination, weight: None }],
        }
    }
}

#[derive(Clone, Debug, TypedBuilder)]
#[builder(build_method(into = VirtualService))]
pub struct VirtualServiceObject {
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    namespace: String,
    labels: BTreeMap<String, String>,
    owner: OwnerReference,
    #[builder(setter(into))]
    host: String,
    #[builder(default)]
    gateway: Option<String>,
    #[builder(default)]
    http: Vec<HTTPRoute>,
}

impl From<VirtualServiceObject> for VirtualService {
    fn from(object: VirtualServiceObject) -> Self {
        let mut virtual_service = VirtualService::new(
            "",
            VirtualServiceSpec { hosts: vec![object.host], gateways: object.gateway.into_iter().collect(), http: object.http },
        );
        virtual_service.metadata = object_meta(object.name, object.namespace, object.labels, object.owner);
        virtual_service
    }
}
