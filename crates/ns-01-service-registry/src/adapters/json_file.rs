use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};
use shared_types::ServiceDescriptor;

use super::lock::{RegistryLock, DEFAULT_LOCK_TIMEOUT};
use crate::domain::errors::RegistryError;
use crate::domain::record::ServiceRecord;
use crate::ports::{check_key, ServiceRegistry};

/// Registry file name used in the working directory.
pub const DEFAULT_REGISTRY_FILE: &str = "services.json";

type Document = Map<String, Value>;

/// `services.json` backed registry shared with other tools.
///
/// Writers take an exclusive lock on `services.json.lock`, re-read the
/// document, apply their change, write a temp file, fsync it, and rename it
/// over the document. Readers never lock: `rename` guarantees they see either
/// the old or the new document, never a partial one.
///
/// A writer that cannot take the lock within `lock_timeout` fails with
/// `RegistryError::Lock` instead of waiting on the other holder.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileRegistry {
    /// Registry at an explicit document path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Registry at `<dir>/services.json`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_REGISTRY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_document(&self) -> Result<Document, RegistryError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(RegistryError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RegistryError::Corrupt {
                path: self.path.clone(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(RegistryError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Replace the document atomically. Caller must hold the writer lock.
    fn write_document(&self, document: Document) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
            }
        }

        let mut bytes = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|e| RegistryError::Encode(e.to_string()))?;
        bytes.push(b'\n');

        let temp_path = self.temp_path();
        let mut file =
            fs::File::create(&temp_path).map_err(|e| RegistryError::io(&temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| RegistryError::io(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| RegistryError::io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| RegistryError::io(&self.path, e))?;
        Ok(())
    }
}

impl ServiceRegistry for JsonFileRegistry {
    fn persist(
        &self,
        service_name: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        check_key(service_name, descriptor)?;
        let value = ServiceRecord::to_value(descriptor)?;

        let _lock = RegistryLock::acquire_with_timeout(&self.path, self.lock_timeout)?;
        let mut document = self.read_document()?;
        let replaced = document.insert(service_name.to_string(), value).is_some();
        self.write_document(document)?;

        tracing::debug!(
            service = service_name,
            replaced,
            path = %self.path.display(),
            "Service record written"
        );
        Ok(())
    }

    fn get(&self, service_name: &str) -> Result<Option<ServiceDescriptor>, RegistryError> {
        let mut document = self.read_document()?;
        match document.remove(service_name) {
            Some(value) => ServiceRecord::from_value(service_name, value)?
                .into_descriptor(service_name)
                .map(Some),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<ServiceDescriptor>, RegistryError> {
        let document = self.read_document()?;
        let mut services = Vec::with_capacity(document.len());

        for (key, value) in document {
            match ServiceRecord::from_value(&key, value).and_then(|r| r.into_descriptor(&key)) {
                Ok(descriptor) => services.push(descriptor),
                Err(e) => {
                    tracing::warn!(
                        service = %key,
                        error = %e,
                        "Skipping unreadable service record"
                    );
                }
            }
        }

        services.sort_by(|a, b| a.service_name().cmp(b.service_name()));
        Ok(services)
    }

    fn remove(&self, service_name: &str) -> Result<bool, RegistryError> {
        let _lock = RegistryLock::acquire_with_timeout(&self.path, self.lock_timeout)?;
        let mut document = self.read_document()?;
        if document.remove(service_name).is_none() {
            return Ok(false);
        }
        self.write_document(document)?;
        Ok(true)
    }
}
