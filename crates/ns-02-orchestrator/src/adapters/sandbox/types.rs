//! Wire types of the sandbox JSON-RPC API.

use serde::{Deserialize, Serialize};
use shared_types::{DescriptorField, ServiceDescriptor};

use crate::domain::node_spec::{NodeConfig, ProvisionRequest};
use crate::domain::params::DecentralizationRequest;

pub const METHOD_START_NODE: &str = "sandbox_startNode";
pub const METHOD_DECENTRALIZE: &str = "sandbox_decentralize";

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: &'static str, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " ({data})")?;
        }
        Ok(())
    }
}

/// Params of `sandbox_startNode`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartNodeParams<'a> {
    pub chain: &'a str,
    pub genesis_path: String,
    pub custom_genesis: bool,
    pub config: &'a NodeConfig,
}

impl<'a> From<&'a ProvisionRequest> for StartNodeParams<'a> {
    fn from(request: &'a ProvisionRequest) -> Self {
        Self {
            chain: request.chain,
            genesis_path: request.genesis.path().display().to_string(),
            custom_genesis: request.genesis.is_custom(),
            config: &request.node_config,
        }
    }
}

/// Result of `sandbox_startNode`. Every field is optional on the wire so an
/// incomplete reply can be reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartNodeReply {
    pub service_name: Option<String>,
    #[serde(alias = "privateEndpoint")]
    pub endpoint: Option<String>,
    pub keystore_path: Option<String>,
    pub key_password: Option<String>,
    pub network_id: Option<String>,
}

impl StartNodeReply {
    /// First descriptor field the sandbox left out or sent blank.
    pub fn missing_field(&self) -> Option<DescriptorField> {
        DescriptorField::ALL.into_iter().find(|field| {
            self.value(*field)
                .map_or(true, |value| value.trim().is_empty())
        })
    }

    fn value(&self, field: DescriptorField) -> Option<&str> {
        match field {
            DescriptorField::ServiceName => self.service_name.as_deref(),
            DescriptorField::Endpoint => self.endpoint.as_deref(),
            DescriptorField::KeystorePath => self.keystore_path.as_deref(),
            DescriptorField::KeyPassword => self.key_password.as_deref(),
            DescriptorField::NetworkId => self.network_id.as_deref(),
        }
    }

    /// Convert a complete reply. Call `missing_field` first.
    pub fn to_descriptor(&self) -> Option<ServiceDescriptor> {
        ServiceDescriptor::new(
            self.value(DescriptorField::ServiceName)?,
            self.value(DescriptorField::Endpoint)?,
            self.value(DescriptorField::KeystorePath)?,
            self.value(DescriptorField::KeyPassword)?,
            self.value(DescriptorField::NetworkId)?,
        )
        .ok()
    }
}

/// Params of `sandbox_decentralize`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecentralizeParams<'a> {
    pub service_name: &'a str,
    pub node_endpoint: &'a str,
    pub keystore_path: &'a str,
    pub key_password: &'a str,
    pub nid: &'a str,
}

impl<'a> From<&'a DecentralizationRequest> for DecentralizeParams<'a> {
    fn from(request: &'a DecentralizationRequest) -> Self {
        Self {
            service_name: request.service_name(),
            node_endpoint: request.endpoint(),
            keystore_path: request.keystore_path(),
            key_password: request.key_password(),
            nid: request.network_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_private_endpoint_alias() {
        let reply: StartNodeReply = serde_json::from_str(
            r#"{"serviceName":"icon-1","privateEndpoint":"http://node:9000","keystorePath":"/ks/icon-1.json","keyPassword":"pw","networkId":"0x3"}"#,
        )
        .unwrap();
        assert!(reply.missing_field().is_none());
        let descriptor = reply.to_descriptor().unwrap();
        assert_eq!(descriptor.private_endpoint(), "http://node:9000");
    }

    #[test]
    fn test_reply_missing_field_is_named() {
        let reply: StartNodeReply = serde_json::from_str(
            r#"{"serviceName":"icon-1","endpoint":"http://node:9000","keystorePath":"","networkId":"0x3"}"#,
        )
        .unwrap();
        assert_eq!(reply.missing_field(), Some(DescriptorField::KeystorePath));
        assert!(reply.to_descriptor().is_none());
    }

    #[test]
    fn test_decentralize_params_wire_shape() {
        let request =
            DecentralizationRequest::build(
                "icon-1",
                "http://node:9000",
                "/ks/icon-1.json",
                "pw",
                "0x3",
            )
                .unwrap();
        let value = serde_json::to_value(DecentralizeParams::from(&request)).unwrap();
        assert_eq!(value["serviceName"], "icon-1");
        assert_eq!(value["nodeEndpoint"], "http://node:9000");
        assert_eq!(value["nid"], "0x3");
    }

    #[test]
    fn test_rpc_error_envelope() {
        let response: JsonRpcResponse<serde_json::Value> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32000,"message":"node busy"}}"#,
        )
        .unwrap();
        assert_eq!(response.id, 7);
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "node busy");
    }
}
