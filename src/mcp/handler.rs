//! # MCP Handler Module
//!
//! This module implements the Model Context Protocol (MCP) for the Foundry server.
//! It handles incoming MCP requests and dispatches them to the tool handlers.
//!
//! ## Supported Tools
//!
//! ### Cast
//! - `cast_call`, `cast_send`, `cast_balance`, `cast_receipt`, `cast_chain`
//!
//! ### Anvil
//! - `anvil_start`, `anvil_stop`, `anvil_status`
//!
//! ### Forge and workspace files
//! - `forge_script`, `create_solidity_file`
//!
//! ### Utilities
//! - `convert_eth_units`
//!
//! ### Heimdall
//! - `heimdall_disassemble`, `heimdall_decode`, `heimdall_decompile`, `heimdall_cfg`, `heimdall_inspect`
//!
//! ## Resources
//! - `anvil://status`
//! - `contract://{address}/source`

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    foundry::{
        models::ToolOutput,
        services::{anvil, cast, files, forge, heimdall, units},
    },
    mcp::{
        protocol::{error_codes, Request, Response, PROTOCOL_VERSION},
        resources, tools,
    },
    utils, AppState,
};

pub const SERVER_NAME: &str = "Foundry MCP Server";
pub const SERVER_VERSION: &str = "0.1.0";

const INSTRUCTIONS: &str = "\
Foundry MCP Server - EVM-compatible blockchain (Ethereum, Optimism, etc.) development toolkit integration

Core Tools Available:
Cast: EVM RPC client for blockchain interaction (calls, transactions, balances, receipts, chain info)
Anvil: Local test node management (start/stop/status)
Forge: Smart contract development framework (script execution in a persistent workspace)
Heimdall: EVM bytecode analysis toolkit (disassemble, decode, decompile, CFG, inspect)
File Management: Solidity file creation in the workspace
Utilities: Unit conversion

Workspace: Persistent development environment at ~/.mcp-foundry-workspace
Networks: Local (Anvil) and remote EVM chains; RPC aliases resolve through [rpc_endpoints] in ~/.foundry/config.toml
Security: Optional PRIVATE_KEY for transaction signing (development use)

Quick Start
1. Ensure Foundry is installed (~/.foundry/bin/)
2. Install Heimdall for bytecode analysis: curl -L http://get.heimdall.rs | bash && bifrost
3. Set RPC_URL and PRIVATE_KEY environment variables (optional)

Resources
- anvil://status - Live Anvil node status and configuration
- contract://{address}/source - Contract source code from Etherscan";

/// Every tool name, so they can also be invoked directly as methods.
const TOOL_NAMES: &[&str] = &[
    "cast_call",
    "cast_send",
    "cast_balance",
    "cast_receipt",
    "cast_chain",
    "anvil_start",
    "anvil_stop",
    "anvil_status",
    "forge_script",
    "create_solidity_file",
    "convert_eth_units",
    "heimdall_disassemble",
    "heimdall_decode",
    "heimdall_decompile",
    "heimdall_cfg",
    "heimdall_inspect",
];

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Ignoring notification: {}", req.method);
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id.clone(), json!({})),
        "tools/list" => Response::success(
            req.id.clone(),
            json!({ "tools": tools::tool_definitions(state.rpc.default_url()) }),
        ),
        "tools/call" => handle_tool_call(req, state).await,
        "resources/list" => Response::success(
            req.id.clone(),
            json!({ "resources": resources::resource_list() }),
        ),
        "resources/templates/list" => Response::success(
            req.id.clone(),
            json!({ "resourceTemplates": resources::resource_templates() }),
        ),
        "resources/read" => handle_resource_read(req, state).await,
        // Convenience aliases: direct tool calls are rewritten into tools/call
        name if TOOL_NAMES.contains(&name) => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": name,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Parses the arguments for one tool, then runs it.
async fn run_tool<P, F, Fut>(tool: &str, args: &Value, req_id: &Value, handler: F) -> Response
where
    P: DeserializeOwned + Validate,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = ToolOutput>,
{
    match utils::parse_tool_args::<P>(tool, args, req_id) {
        Ok(params) => {
            let output = handler(params).await;
            if output.is_error {
                info!("Tool '{}' reported an error", tool);
            }
            Response::tool_result(req_id.clone(), output)
        }
        Err(err_resp) => err_resp,
    }
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = match params.get("arguments") {
        Some(Value::Null) | None => &empty_args,
        Some(a) => a,
    };
    let req_id = &req.id;
    let state = &state;

    match tool_name {
        "cast_call" => run_tool(tool_name, args, req_id, |p| cast::call(state, p)).await,
        "cast_send" => run_tool(tool_name, args, req_id, |p| cast::send(state, p)).await,
        "cast_balance" => run_tool(tool_name, args, req_id, |p| cast::balance(state, p)).await,
        "cast_receipt" => run_tool(tool_name, args, req_id, |p| cast::receipt(state, p)).await,
        "cast_chain" => run_tool(tool_name, args, req_id, |p| cast::chain(state, p)).await,
        "anvil_start" => run_tool(tool_name, args, req_id, |p| anvil::start(state, p)).await,
        "anvil_stop" => Response::tool_result(req_id.clone(), anvil::stop(state).await),
        "anvil_status" => Response::tool_result(req_id.clone(), anvil::status(state).await),
        "forge_script" => run_tool(tool_name, args, req_id, |p| forge::script(state, p)).await,
        "create_solidity_file" => {
            run_tool(tool_name, args, req_id, |p| files::create_solidity_file(state, p)).await
        }
        "convert_eth_units" => run_tool(tool_name, args, req_id, |p| units::convert(state, p)).await,
        "heimdall_disassemble" => {
            run_tool(tool_name, args, req_id, |p| heimdall::disassemble(state, p)).await
        }
        "heimdall_decode" => run_tool(tool_name, args, req_id, |p| heimdall::decode(state, p)).await,
        "heimdall_decompile" => {
            run_tool(tool_name, args, req_id, |p| heimdall::decompile(state, p)).await
        }
        "heimdall_cfg" => run_tool(tool_name, args, req_id, |p| heimdall::cfg(state, p)).await,
        "heimdall_inspect" => run_tool(tool_name, args, req_id, |p| heimdall::inspect(state, p)).await,
        _ => Response::error(
            req.id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Unknown tool: {}", tool_name),
        ),
    }
}

/// Handles 'resources/read'.
async fn handle_resource_read(req: Request, state: AppState) -> Response {
    let empty = json!({});
    let params = req.params.as_ref().unwrap_or(&empty);
    let uri = match utils::get_required_str(params, "uri", &req.id) {
        Ok(uri) => uri,
        Err(err_resp) => return err_resp,
    };

    match resources::read_resource(&state, uri).await {
        Some(contents) => Response::success(req.id.clone(), contents),
        None => Response::error(
            req.id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Unknown resource: {}", uri),
        ),
    }
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION
    });
    let capabilities = json!({
        "tools": { "listChanged": false },
        "resources": { "listChanged": false, "subscribe": false }
    });

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": INSTRUCTIONS
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundry::services::tests::test_state;

    fn request(id: Value, method: &str, params: Option<Value>) -> Request {
        Request {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }

    #[test]
    fn test_tool_names_match_definitions() {
        let defs = tools::tool_definitions("http://localhost:8545");
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let (_home, _runner, state) = test_state();
        let req = request(Value::Null, "notifications/initialized", None);
        assert!(handle_mcp_request(req, state).await.is_none());
    }

    #[tokio::test]
    async fn test_initialize() {
        let (_home, _runner, state) = test_state();
        let resp = handle_mcp_request(request(json!(1), "initialize", None), state)
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_unknown_method_and_tool() {
        let (_home, _runner, state) = test_state();

        let resp = handle_mcp_request(request(json!(1), "wallet/create", None), state.clone())
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        let resp = handle_mcp_request(
            request(json!(2), "tools/call", Some(json!({"name": "cast_rm"}))),
            state,
        )
        .await
        .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert_eq!(err.message, "Unknown tool: cast_rm");
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let (_home, runner, state) = test_state();
        let resp = handle_mcp_request(
            request(
                json!(3),
                "tools/call",
                Some(json!({"name": "cast_balance", "arguments": {}})),
            ),
            state,
        )
        .await
        .unwrap();

        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
        assert!(runner.calls().is_empty());
    }
}
