use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::apis::Rule;

lazy_static! {
    static ref DOMAIN_NAME: Regex = Regex::new(r"^([a-zA-Z0-9][a-zA-Z0-9_-]*\.)+[a-zA-Z0-9_-]*[a-zA-Z0-9]+$").expect("regex is valid");
    static ref REQUEST_URI: Regex = Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*|/[^\s]*)$").expect("regex is valid");
}

/// Two rules clash when they share a path and either share a method or both leave methods open.
pub fn has_duplicates(rules: &[Rule]) -> bool {
    rules.iter().enumerate().any(|(i, rule)| {
        rules[i + 1..].iter().any(|other| {
            rule.path == other.path
                && if rule.methods.is_empty() && other.methods.is_empty() {
                    true
                } else {
                    rule.methods.iter().any(|method| other.methods.contains(method))
                }
        })
    })
}

/// Absolute URL with a scheme and a host, or an absolute path.
pub fn is_valid_url(value: &str) -> bool {
    REQUEST_URI.is_match(value)
}

pub fn is_valid_domain_name(domain: &str) -> bool {
    DOMAIN_NAME.is_match(domain)
}

/// A configuration that is absent, `null` or `{}`.
pub fn is_config_empty(config: Option<&Value>) -> bool {
    match config {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}
