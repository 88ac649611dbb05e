//! # Ports Layer
//!
//! The storage contract the orchestrator and other tools depend on.

use std::sync::Arc;

use shared_types::ServiceDescriptor;

use crate::domain::errors::RegistryError;

/// Durable store of service descriptors keyed by service name.
///
/// Production: `JsonFileRegistry` (`services.json`)
/// Testing: `InMemoryRegistry`
///
/// Implementations take `&self` so one instance can be shared by concurrent
/// workflows; each implementation serializes its own writers.
pub trait ServiceRegistry: Send + Sync {
    /// Write or overwrite the record under `service_name`.
    ///
    /// ## Atomicity
    ///
    /// The record is either fully visible to readers or not at all. Records
    /// under other keys are left untouched.
    ///
    /// # Errors
    /// * `RegistryError::KeyMismatch` - `service_name` is not the descriptor's name
    /// * `RegistryError::Io` / `Lock` / `Corrupt` - the store could not be updated
    fn persist(
        &self,
        service_name: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError>;

    /// Resolve a previously recorded service.
    fn get(&self, service_name: &str) -> Result<Option<ServiceDescriptor>, RegistryError>;

    /// All decodable records, sorted by service name.
    fn list(&self) -> Result<Vec<ServiceDescriptor>, RegistryError>;

    /// Delete a record. Returns whether one existed.
    fn remove(&self, service_name: &str) -> Result<bool, RegistryError>;
}

impl<T: ServiceRegistry + ?Sized> ServiceRegistry for Arc<T> {
    fn persist(
        &self,
        service_name: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        (**self).persist(service_name, descriptor)
    }

    fn get(&self, service_name: &str) -> Result<Option<ServiceDescriptor>, RegistryError> {
        (**self).get(service_name)
    }

    fn list(&self) -> Result<Vec<ServiceDescriptor>, RegistryError> {
        (**self).list()
    }

    fn remove(&self, service_name: &str) -> Result<bool, RegistryError> {
        (**self).remove(service_name)
    }
}

/// Reject a key that is not the descriptor's own name.
pub(crate) fn check_key(
    service_name: &str,
    descriptor: &ServiceDescriptor,
) -> Result<(), RegistryError> {
    if service_name != descriptor.service_name() {
        return Err(RegistryError::KeyMismatch {
            key: service_name.to_string(),
            service_name: descriptor.service_name().to_string(),
        });
    }
    Ok(())
}
