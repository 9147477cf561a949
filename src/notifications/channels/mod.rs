//! Notifier providers
//!
//! Each provider exposes a `from_value` constructor matching
//! [`ProviderConstructor`](super::ProviderConstructor).

pub mod log;
pub mod pushplus;
pub mod webhook;

use serde::de::DeserializeOwned;

use crate::utils::error::ConfigError;

/// Decode provider settings, treating `null` as an empty object
pub(crate) fn parse_settings<T: DeserializeOwned>(
    provider: &str,
    value: &serde_json::Value,
) -> Result<T, ConfigError> {
    let value = if value.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        value.clone()
    };

    serde_json::from_value(value)
        .map_err(|e| ConfigError::invalid(format!("notification.config ({provider})"), e.to_string()))
}
