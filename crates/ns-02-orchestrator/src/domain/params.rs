//! # Decentralization Parameters
//!
//! Both entry paths (start-then-decentralize and decentralize-existing) build
//! their request here, so the field order and validation cannot drift between
//! call sites.

use serde::Serialize;
use shared_types::{require_field, DescriptorField, ServiceDescriptor, WorkflowError};

/// Normalized input to the decentralization executor.
///
/// Only constructible through [`DecentralizationRequest::build`], which
/// rejects any empty field. There is no defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecentralizationRequest {
    service_name: String,
    endpoint: String,
    keystore_path: String,
    key_password: String,
    network_id: String,
}

impl DecentralizationRequest {
    /// Build a request from its five parts.
    ///
    /// # Errors
    /// `WorkflowError::Validation` naming the first empty field, in the order
    /// service name, endpoint, keystore path, key password, network id.
    pub fn build(
        service_name: &str,
        endpoint: &str,
        keystore_path: &str,
        key_password: &str,
        network_id: &str,
    ) -> Result<Self, WorkflowError> {
        let request = Self {
            service_name: service_name.to_string(),
            endpoint: endpoint.to_string(),
            keystore_path: keystore_path.to_string(),
            key_password: key_password.to_string(),
            network_id: network_id.to_string(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Build from a freshly provisioned node.
    pub fn from_descriptor(descriptor: &ServiceDescriptor) -> Result<Self, WorkflowError> {
        Self::build(
            descriptor.service_name(),
            descriptor.private_endpoint(),
            descriptor.keystore_path(),
            descriptor.key_password(),
            descriptor.network_id(),
        )
    }

    /// Re-check every field. Executors call this before touching the network.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        for field in DescriptorField::ALL {
            require_field(field, self.field(field))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn field(&self, field: DescriptorField) -> &str {
        match field {
            DescriptorField::ServiceName => &self.service_name,
            DescriptorField::Endpoint => &self.endpoint,
            DescriptorField::KeystorePath => &self.keystore_path,
            DescriptorField::KeyPassword => &self.key_password,
            DescriptorField::NetworkId => &self.network_id,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
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
}
