use std::{fmt::Display, str::FromStr};

use serde_json::Value;

use super::ProcessingError;
use crate::apis::Handler;

/// Access strategies the controller knows how to turn into authenticators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessStrategy {
    Allow,
    Jwt,
    OAuth2Introspection,
    Noop,
    Anonymous,
    Unauthorized,
    CookieSession,
    OAuth2ClientCredentials,
}

impl AccessStrategy {
    pub const ALL: [AccessStrategy; 8] = [
        AccessStrategy::Allow,
        AccessStrategy::Jwt,
        AccessStrategy::OAuth2Introspection,
        AccessStrategy::Noop,
        AccessStrategy::Anonymous,
        AccessStrategy::Unauthorized,
        AccessStrategy::CookieSession,
        AccessStrategy::OAuth2ClientCredentials,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccessStrategy::Allow => "allow",
            AccessStrategy::Jwt => "jwt",
            AccessStrategy::OAuth2Introspection => "oauth2_introspection",
            AccessStrategy::Noop => "noop",
            AccessStrategy::Anonymous => "anonymous",
            AccessStrategy::Unauthorized => "unauthorized",
            AccessStrategy::CookieSession => "cookie_session",
            AccessStrategy::OAuth2ClientCredentials => "oauth2_client_credentials",
        }
    }

    /// Whether the handler configuration is forwarded to the authenticator.
    pub fn accepts_config(self) -> bool {
        matches!(self, AccessStrategy::Jwt | AccessStrategy::OAuth2Introspection | AccessStrategy::OAuth2ClientCredentials)
    }

    /// `allow` is the only strategy served without the authorization proxy.
    pub fn requires_proxy(self) -> bool {
        !matches!(self, AccessStrategy::Allow)
    }
}

impl Display for AccessStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessStrategy {
    type Err = ProcessingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        AccessStrategy::ALL.into_iter().find(|strategy| strategy.name() == name).ok_or_else(|| ProcessingError::UnsupportedStrategy(name.to_owned()))
    }
}

/// Shapes the authenticator entry of an access rule for one strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatorBuilder {
    strategy: AccessStrategy,
}

impl AuthenticatorBuilder {
    pub fn build(&self, config: Option<&Value>) -> Handler {
        if self.strategy.accepts_config() {
            Handler { name: self.strategy.name().to_owned(), config: config.cloned() }
        } else {
            Handler::new(self.strategy.name())
        }
    }
}

pub fn builder_for(name: &str) -> Result<AuthenticatorBuilder, ProcessingError> {
    name.parse().map(|strategy| AuthenticatorBuilder { strategy })
}
