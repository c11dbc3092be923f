// src/mcp/resources.rs

use serde_json::{json, Value};
use tracing::debug;

use crate::foundry::command::CommandLine;
use crate::AppState;

pub const ANVIL_STATUS_URI: &str = "anvil://status";
pub const CONTRACT_SOURCE_TEMPLATE: &str = "contract://{address}/source";

pub fn resource_list() -> Value {
    json!([
        {
            "uri": ANVIL_STATUS_URI,
            "name": "anvil_status",
            "description": "Live Anvil node status and configuration",
            "mimeType": "application/json"
        }
    ])
}

pub fn resource_templates() -> Value {
    json!([
        {
            "uriTemplate": CONTRACT_SOURCE_TEMPLATE,
            "name": "contract_source",
            "description": "Contract source code from Etherscan"
        }
    ])
}

/// `Some(address)` for `contract://<address>/source`.
fn contract_address(uri: &str) -> Option<&str> {
    uri.strip_prefix("contract://")
        .and_then(|rest| rest.strip_suffix("/source"))
        .filter(|address| !address.is_empty() && !address.contains('/'))
}

/// Contents of a resource, or `None` for an unknown URI.
pub async fn read_resource(state: &AppState, uri: &str) -> Option<Value> {
    let text = if uri == ANVIL_STATUS_URI {
        let info = state.anvil.status().await;
        serde_json::to_string_pretty(&info).unwrap_or_else(|_| "{}".to_string())
    } else {
        let address = contract_address(uri)?;
        let command = CommandLine::new(&state.paths.cast)
            .arg("etherscan-source")
            .arg(address);
        let result = state.runner.run(&command).await;
        if result.success {
            result.message
        } else {
            debug!("etherscan-source failed for {}: {}", address, result.message.trim());
            json!({
                "error": "Could not retrieve contract source",
                "details": result.message
            })
            .to_string()
        }
    };

    Some(json!({
        "contents": [{ "uri": uri, "text": text }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundry::models::ExecutionResult;
    use crate::foundry::services::tests::test_state;

    #[test]
    fn test_contract_address() {
        assert_eq!(contract_address("contract://0xabc/source"), Some("0xabc"));
        assert_eq!(contract_address("contract:///source"), None);
        assert_eq!(contract_address("contract://0xabc/abi"), None);
        assert_eq!(contract_address("anvil://status"), None);
    }

    #[tokio::test]
    async fn test_read_anvil_status() {
        let (_home, runner, state) = test_state();
        runner.respond("ps -eo args=", ExecutionResult::ok("anvil --port 9999\n"));

        let value = read_resource(&state, ANVIL_STATUS_URI).await.unwrap();
        let text = value["contents"][0]["text"].as_str().unwrap();
        let info: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(info["port"], "9999");
        assert_eq!(value["contents"][0]["uri"], ANVIL_STATUS_URI);
    }

    #[tokio::test]
    async fn test_read_contract_source_failure() {
        let (_home, runner, state) = test_state();
        runner.respond(
            &format!("{} etherscan-source", state.paths.cast.display()),
            ExecutionResult::failed("missing ETHERSCAN_API_KEY"),
        );

        let value = read_resource(&state, "contract://0xabc/source").await.unwrap();
        let text = value["contents"][0]["text"].as_str().unwrap();
        let body: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["error"], "Could not retrieve contract source");
        assert_eq!(body["details"], "missing ETHERSCAN_API_KEY");

        assert!(read_resource(&state, "unknown://thing").await.is_none());
    }
}
