//! # Stored Record
//!
//! The value stored under each key. Writes always carry all five descriptor
//! fields. Reads accept records without `serviceName` (older or foreign
//! writers key by name only) and take the name from the key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ServiceDescriptor;

use super::errors::RegistryError;

/// One registry entry as it appears in the JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub keystore_path: String,
    #[serde(default)]
    pub key_password: String,
    #[serde(default)]
    pub network_id: String,
}

impl ServiceRecord {
    /// Decode a raw JSON entry stored under `key`.
    pub fn from_value(key: &str, value: Value) -> Result<Self, RegistryError> {
        serde_json::from_value(value).map_err(|e| RegistryError::InvalidRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate into a descriptor, using `key` when the record carries no name.
    pub fn into_descriptor(self, key: &str) -> Result<ServiceDescriptor, RegistryError> {
        let service_name = self.service_name.unwrap_or_else(|| key.to_string());
        ServiceDescriptor::new(
            service_name,
            self.endpoint,
            self.keystore_path,
            self.key_password,
            self.network_id,
        )
        .map_err(|e| RegistryError::InvalidRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Encode as the JSON value written under the descriptor's key.
    pub fn to_value(descriptor: &ServiceDescriptor) -> Result<Value, RegistryError> {
        let record = Self::from(descriptor);
        serde_json::to_value(record).map_err(|e| RegistryError::Encode(e.to_string()))
    }
}

impl From<&ServiceDescriptor> for ServiceRecord {
    fn from(descriptor: &ServiceDescriptor) -> Self {
        Self {
            service_name: Some(descriptor.service_name().to_string()),
            endpoint: descriptor.private_endpoint().to_string(),
            keystore_path: descriptor.keystore_path().to_string(),
            key_password: descriptor.key_password().to_string(),
            network_id: descriptor.network_id().to_string(),
        }
    }
}
