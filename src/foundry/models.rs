// src/foundry/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

// --- Error types ---

#[derive(Error, Debug)]
pub enum FoundryError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FileToolError {
    #[error("file path must be relative to the workspace: {0}")]
    AbsolutePath(String),
    #[error("file path escapes the workspace: {0}")]
    EscapesWorkspace(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Foundry(#[from] FoundryError),
}

// --- Execution Models ---

/// Outcome of running an external command.
///
/// `message` holds stdout on success and the diagnostic text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Point-in-time view of the local anvil node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnvilInfo {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AnvilInfo {
    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn running_on(port: impl Into<String>) -> Self {
        let port = port.into();
        Self {
            running: true,
            url: Some(format!("http://localhost:{}", port)),
            port: Some(port),
        }
    }
}

// --- Tool Output ---

/// Plain-text tool response plus the error flag every MCP client expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Picks the success or failure wording for an execution result.
    pub fn from_execution(
        result: ExecutionResult,
        on_success: impl FnOnce(&str) -> String,
        on_failure: impl FnOnce(&str) -> String,
    ) -> Self {
        if result.success {
            Self::success(on_success(&result.message))
        } else {
            Self::error(on_failure(&result.message))
        }
    }

    /// MCP `tools/call` result shape.
    pub fn into_value(self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anvil_info_serialization() {
        let stopped = serde_json::to_value(AnvilInfo::stopped()).unwrap();
        assert_eq!(stopped, json!({ "running": false }));

        let running = serde_json::to_value(AnvilInfo::running_on("9999")).unwrap();
        assert_eq!(
            running,
            json!({ "running": true, "port": "9999", "url": "http://localhost:9999" })
        );
    }

    #[test]
    fn test_tool_output_value() {
        let value = ToolOutput::error("boom").into_value();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert_eq!(value["content"][0]["text"], json!("boom"));
    }
}
