use std::{fmt::Display, net::SocketAddr};

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder, Deserialize)]
pub struct Address {
    #[builder(setter(into))]
    pub hostname: String,
    pub port: u16,
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("{}:{}", self.hostname, self.port).as_str())
    }
}

impl Address {
    pub fn to_ip(&self) -> Result<SocketAddr> {
        self.to_string().parse::<SocketAddr>().map_err(std::convert::Into::into)
    }
}

/// Where traffic for secured rules is sent before it reaches the backend.
#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct AuthorizationProxyConfiguration {
    pub address: Address,
}

#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct AdmissionInterfaceConfiguration {
    pub address: Address,
}

#[derive(Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    #[builder(setter(into))]
    pub controller_name: String,
    #[builder(default)]
    pub enable_open_telemetry: Option<bool>,
    pub authorization_proxy: AuthorizationProxyConfiguration,
    #[builder(default)]
    #[serde(default)]
    pub service_blocklist: Vec<String>,
    #[builder(default)]
    pub admission_interface: Option<AdmissionInterfaceConfiguration>,
}

#[derive(Error, Debug)]
enum ConfigurationError {
    #[error("controller name must be not empty")]
    ControllerName,
    #[error("authorization proxy hostname must be not empty")]
    ProxyHostname,
    #[error("authorization proxy port must be greater than zero")]
    ProxyPort,
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_name.is_empty() {
            return Err(ConfigurationError::ControllerName.into());
        }
        let proxy = &self.authorization_proxy.address;
        if proxy.hostname.trim().is_empty() {
            return Err(ConfigurationError::ProxyHostname.into());
        }
        if proxy.port == 0 {
            return Err(ConfigurationError::ProxyPort.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_validate() {
        let yaml = r"
controller_name: gateway.kyma-project.io/apirule-controller
authorization_proxy:
  address:
    hostname: ory-oathkeeper-proxy.kyma-system.svc.cluster.local
    port: 4455
service_blocklist:
  - kubernetes
  - api-gateway
admission_interface:
  address:
    hostname: 0.0.0.0
    port: 9443
";
        let configuration: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.authorization_proxy.address.port, 4455);
        assert_eq!(configuration.service_blocklist, vec!["kubernetes".to_owned(), "api-gateway".to_owned()]);
        let admission = configuration.admission_interface.unwrap();
        assert_eq!(admission.address.to_ip().unwrap(), "0.0.0.0:9443".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_blocklist_is_optional() {
        let yaml = r"
controller_name: apirule
authorization_proxy:
  address:
    hostname: oathkeeper
    port: 4455
";
        let configuration: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert!(configuration.service_blocklist.is_empty());
        assert!(configuration.admission_interface.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_values() {
        let configuration = Configuration::builder()
            .controller_name("")
            .authorization_proxy(AuthorizationProxyConfiguration::builder().address(Address::builder().hostname("oathkeeper").port(4455).build()).build())
            .build();
        assert_eq!(configuration.validate().unwrap_err().to_string(), "controller name must be not empty");

        let configuration = Configuration::builder()
            .controller_name("apirule")
            .authorization_proxy(AuthorizationProxyConfiguration::builder().address(Address::builder().hostname(" ").port(4455).build()).build())
            .build();
        assert_eq!(configuration.validate().unwrap_err().to_string(), "authorization proxy hostname must be not empty");

        let configuration = Configuration::builder()
            .controller_name("apirule")
            .authorization_proxy(AuthorizationProxyConfiguration::builder().address(Address::builder().hostname("oathkeeper").port(0).build()).build())
            .build();
        assert_eq!(configuration.validate().unwrap_err().to_string(), "authorization proxy port must be greater than zero");
    }
}
