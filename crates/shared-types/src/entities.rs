//! # Core Domain Entities
//!
//! - **ServiceDescriptor**: the record of a provisioned node (endpoint and
//!   credentials), keyed by service name.
//! - **DescriptorField**: names the five required fields, used in validation
//!   messages so every call site reports missing input the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::WorkflowError;

/// The five fields every descriptor and decentralization request carries.
///
/// Declaration order is the canonical field order: validation reports the
/// first empty field in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorField {
    ServiceName,
    Endpoint,
    KeystorePath,
    KeyPassword,
    NetworkId,
}

impl DescriptorField {
    /// All fields in canonical order.
    pub const ALL: [DescriptorField; 5] = [
        Self::ServiceName,
        Self::Endpoint,
        Self::KeystorePath,
        Self::KeyPassword,
        Self::NetworkId,
    ];

    /// Human-readable field name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceName => "service name",
            Self::Endpoint => "node endpoint",
            Self::KeystorePath => "keystore path",
            Self::KeyPassword => "key password",
            Self::NetworkId => "network id",
        }
    }
}

impl fmt::Display for DescriptorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject empty or whitespace-only values.
pub fn require_field(field: DescriptorField, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::missing_field(field));
    }
    Ok(())
}

/// A provisioned node's endpoint and credentials.
///
/// Created by the node provisioner after a successful sandbox call and never
/// mutated afterwards. Re-provisioning produces a new descriptor that
/// supersedes the old record under the same service name.
///
/// Serialized as `{ serviceName, endpoint, keystorePath, keyPassword, networkId }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawServiceDescriptor", rename_all = "camelCase")]
pub struct ServiceDescriptor {
    service_name: String,
    #[serde(rename = "endpoint")]
    private_endpoint: String,
    keystore_path: String,
    key_password: String,
    network_id: String,
}

impl ServiceDescriptor {
    /// Build a descriptor, rejecting any empty field.
    pub fn new(
        service_name: impl Into<String>,
        private_endpoint: impl Into<String>,
        keystore_path: impl Into<String>,
        key_password: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let descriptor = Self {
            service_name: service_name.into(),
            private_endpoint: private_endpoint.into(),
            keystore_path: keystore_path.into(),
            key_password: key_password.into(),
            network_id: network_id.into(),
        };
        for field in DescriptorField::ALL {
            require_field(field, descriptor.field(field))?;
        }
        Ok(descriptor)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Address reachable from inside the sandbox.
    pub fn private_endpoint(&self) -> &str {
        &self.private_endpoint
    }

    pub fn keystore_path(&self) -> &str {
        &self.keystore_path
    }

    pub fn key_password(&self) -> &str {
        &self.key_password
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, field: DescriptorField) -> &str {
        match field {
            DescriptorField::ServiceName => &self.service_name,
            DescriptorField::Endpoint => &self.private_endpoint,
            DescriptorField::KeystorePath => &self.keystore_path,
            DescriptorField::KeyPassword => &self.key_password,
            DescriptorField::NetworkId => &self.network_id,
        }
    }
}

/// Unchecked wire form; converted through `ServiceDescriptor::new`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceDescriptor {
    #[serde(default)]
    service_name: String,
    #[serde(default, rename = "endpoint")]
    private_endpoint: String,
    #[serde(default)]
    keystore_path: String,
    #[serde(default)]
    key_password: String,
    #[serde(default)]
    network_id: String,
}

impl TryFrom<RawServiceDescriptor> for ServiceDescriptor {
    type Error = WorkflowError;

    fn try_from(raw: RawServiceDescriptor) -> Result<Self, Self::Error> {
        ServiceDescriptor::new(
            raw.service_name,
            raw.private_endpoint,
            raw.keystore_path,
            raw.key_password,
            raw.network_id,
        )
    }
}
