use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref LABEL_VALUE: Regex = Regex::new(r"^[a-zA-Z0-9][-A-Za-z0-9_.]{0,61}[a-zA-Z0-9]$").expect("regex is valid");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LabelError {
    #[error("value '{0}' is not a proper k8s label value")]
    Value(String),
}

pub fn verify_label_value(value: &str) -> Result<(), LabelError> {
    if LABEL_VALUE.is_match(value) {
        Ok(())
    } else {
        Err(LabelError::Value(value.to_owned()))
    }
}
