// MCP protocol surface: JSON-RPC types, dispatch, tool and resource catalogues
pub mod handler;
pub mod protocol;
pub mod resources;
pub mod tools;
