//! Utility functions for the Foundry MCP server

use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};
use validator::Validate;

use crate::mcp::protocol::{error_codes, Response};

/// Helper function to deserialize and validate a tool's argument object
pub fn parse_tool_args<T: DeserializeOwned + Validate>(
    tool: &str,
    args: &Value,
    req_id: &Value,
) -> Result<T, Response> {
    let parsed: T = from_value(args.clone()).map_err(|e| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid arguments for '{}': {}", tool, e),
        )
    })?;
    parsed.validate().map_err(|e| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid arguments for '{}': {}", tool, e),
        )
    })?;
    Ok(parsed)
}

/// Helper function to extract a required string argument from a JSON object
pub fn get_required_str<'a>(args: &'a Value, key: &str, req_id: &Value) -> Result<&'a str, Response> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Response::error(
                req_id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Missing or invalid required argument: '{}'", key),
            )
        })
}
