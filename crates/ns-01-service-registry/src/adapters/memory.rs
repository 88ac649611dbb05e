use std::collections::BTreeMap;

use parking_lot::RwLock;
use shared_types::ServiceDescriptor;

use crate::domain::errors::RegistryError;
use crate::ports::{check_key, ServiceRegistry};

/// In-process registry for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: RwLock<BTreeMap<String, ServiceDescriptor>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn persist(
        &self,
        service_name: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        check_key(service_name, descriptor)?;
        self.records
            .write()
            .insert(service_name.to_string(), descriptor.clone());
        Ok(())
    }

    fn get(&self, service_name: &str) -> Result<Option<ServiceDescriptor>, RegistryError> {
        Ok(self.records.read().get(service_name).cloned())
    }

    fn list(&self) -> Result<Vec<ServiceDescriptor>, RegistryError> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn remove(&self, service_name: &str) -> Result<bool, RegistryError> {
        Ok(self.records.write().remove(service_name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let registry = InMemoryRegistry::new();
        let descriptor =
            ServiceDescriptor::new("icon-1", "http://node:9000", "/ks/icon-1.json", "pw", "0x3")
                .unwrap();

        registry.persist("icon-1", &descriptor).unwrap();
        registry.persist("icon-1", &descriptor).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("icon-1").unwrap(), Some(descriptor));
        assert!(registry.remove("icon-1").unwrap());
        assert!(registry.is_empty());
    }
}
