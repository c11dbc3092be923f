// src/mcp/tools.rs

use serde_json::{json, Value};

/// JSON definitions of all available tools, as returned by `tools/list`.
///
/// `default_rpc` is the endpoint used when a call omits `rpcUrl`.
pub fn tool_definitions(default_rpc: &str) -> Value {
    let rpc_url = json!({"type": "string", "description": format!("JSON-RPC URL or foundry alias (default: {})", default_rpc)});
    let heimdall_rpc = json!({"type": "string", "description": format!("EVM network RPC URL (default: {})", default_rpc)});
    let verbosity = json!({"type": "string", "enum": ["quiet", "normal", "verbose"], "description": "Output verbosity level (default: normal)"});
    let output_dir = json!({"type": "string", "description": "Output directory (default: ~/.mcp-foundry-workspace/heimdall-output)"});
    let use_defaults = json!({"type": "boolean", "description": "Always select default values when prompted (default: false)"});
    let units = json!({"type": "string", "enum": ["wei", "gwei", "ether"]});

    json!([
        {
            "name": "cast_call",
            "description": "Call a contract function (read-only)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "contractAddress": {"type": "string", "description": "Address of the contract"},
                    "functionSignature": {"type": "string", "description": "Function signature (e.g., 'balanceOf(address)')"},
                    "args": {"type": "array", "items": {"type": "string"}, "description": "Function arguments"},
                    "rpcUrl": rpc_url,
                    "blockNumber": {"type": "string", "description": "Block number (e.g., 'latest', 'earliest', or a number)"},
                    "from": {"type": "string", "description": "Address to perform the call as"}
                },
                "required": ["contractAddress", "functionSignature"]
            }
        },
        {
            "name": "cast_send",
            "description": "Send a transaction to a contract function",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "contractAddress": {"type": "string", "description": "Address of the contract"},
                    "functionSignature": {"type": "string", "description": "Function signature (e.g., 'transfer(address,uint256)')"},
                    "args": {"type": "array", "items": {"type": "string"}, "description": "Function arguments"},
                    "from": {"type": "string", "description": "Sender address or private key"},
                    "value": {"type": "string", "description": "Ether value to send with the transaction (in wei)"},
                    "rpcUrl": rpc_url,
                    "gasLimit": {"type": "string", "description": "Gas limit for the transaction"},
                    "gasPrice": {"type": "string", "description": "Gas price for the transaction (in wei)"},
                    "confirmations": {"type": "integer", "minimum": 0, "description": "Number of confirmations to wait for"}
                },
                "required": ["contractAddress", "functionSignature"]
            }
        },
        {
            "name": "cast_balance",
            "description": "Check the ETH balance of an address",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "Ethereum address to check balance for"},
                    "rpcUrl": rpc_url,
                    "blockNumber": {"type": "string", "description": "Block number (e.g., 'latest', 'earliest', or a number)"},
                    "formatEther": {"type": "boolean", "description": "Format the balance in Ether (default: wei)"}
                },
                "required": ["address"]
            }
        },
        {
            "name": "cast_receipt",
            "description": "Get the transaction receipt",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "txHash": {"type": "string", "description": "Transaction hash"},
                    "rpcUrl": rpc_url,
                    "confirmations": {"type": "integer", "minimum": 0, "description": "Number of confirmations to wait for"},
                    "field": {"type": "string", "description": "Specific field to extract (e.g., 'blockNumber', 'status')"}
                },
                "required": ["txHash"]
            }
        },
        {
            "name": "cast_chain",
            "description": "Get information about the current chain",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "rpcUrl": rpc_url,
                    "returnId": {"type": "boolean", "description": "Return the chain ID instead of the name (default: false)"}
                }
            }
        },
        {
            "name": "anvil_start",
            "description": "Start a new Anvil instance (local Ethereum node)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "port": {"type": "integer", "minimum": 1, "maximum": 65535, "description": "Port to listen on (default: 8545)"},
                    "blockTime": {"type": "integer", "minimum": 0, "description": "Block time in seconds (default: 0 - mine on demand)"},
                    "forkUrl": {"type": "string", "description": "URL (or foundry alias) of the JSON-RPC endpoint to fork from"},
                    "forkBlockNumber": {"type": "integer", "minimum": 0, "description": "Block number to fork from"},
                    "accounts": {"type": "integer", "minimum": 0, "description": "Number of accounts to generate (default: 10)"},
                    "mnemonic": {"type": "string", "description": "BIP39 mnemonic phrase to generate accounts from"},
                    "silent": {"type": "boolean", "description": "Suppress anvil output (default: false)"}
                }
            }
        },
        {
            "name": "anvil_stop",
            "description": "Stop a running Anvil instance",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "anvil_status",
            "description": "Check if Anvil is running and get its status",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "forge_script",
            "description": "Run a Forge script from the workspace",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "scriptPath": {"type": "string", "description": "Path to the script file (e.g., 'script/Deploy.s.sol')"},
                    "sig": {"type": "string", "description": "Function signature to call (default: 'run()')"},
                    "rpcUrl": rpc_url,
                    "broadcast": {"type": "boolean", "description": "Broadcast the transactions"},
                    "verify": {"type": "boolean", "description": "Verify the contract on Etherscan (needs API key)"}
                },
                "required": ["scriptPath"]
            }
        },
        {
            "name": "create_solidity_file",
            "description": "Create or update a Solidity file in the workspace",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "filePath": {"type": "string", "description": "Path to the file (e.g., 'src/MyContract.sol' or 'script/Deploy.s.sol')"},
                    "content": {"type": "string", "description": "File content"},
                    "overwrite": {"type": "boolean", "description": "Overwrite existing file (default: false)"}
                },
                "required": ["filePath", "content"]
            }
        },
        {
            "name": "convert_eth_units",
            "description": "Convert between Ethereum units (wei, gwei, ether)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "value": {"type": "string", "description": "Value to convert"},
                    "fromUnit": units,
                    "toUnit": units
                },
                "required": ["value", "fromUnit", "toUnit"]
            }
        },
        {
            "name": "heimdall_disassemble",
            "description": "Disassemble EVM bytecode into human-readable opcodes using Heimdall",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Contract address, bytecode, file, or ENS name to disassemble"},
                    "rpcUrl": heimdall_rpc,
                    "decimalCounter": {"type": "boolean", "description": "Use base-10 for the program counter (default: false)"},
                    "fileName": {"type": "string", "description": "Name of the output file"},
                    "verbosity": verbosity,
                    "outputDir": output_dir
                },
                "required": ["target"]
            }
        },
        {
            "name": "heimdall_decode",
            "description": "Decode raw calldata without requiring ABI using Heimdall",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Transaction hash or string of bytes to decode"},
                    "rpcUrl": heimdall_rpc,
                    "openaiApiKey": {"type": "string", "description": "OpenAI API key for explaining calldata"},
                    "explain": {"type": "boolean", "description": "Explain the decoded calldata using OpenAI (default: false)"},
                    "useDefaults": use_defaults,
                    "truncateCalldata": {"type": "boolean", "description": "Truncate nonstandard sized calldata (default: false)"},
                    "skipResolving": {"type": "boolean", "description": "Skip resolving selectors and guess types (default: false)"},
                    "verbosity": verbosity,
                    "outputDir": {"type": "string", "description": "Not used (console output only)"}
                },
                "required": ["target"]
            }
        },
        {
            "name": "heimdall_decompile",
            "description": "Decompile EVM bytecode to Solidity source code and ABI using Heimdall",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Contract address, bytecode, file, or ENS name to decompile"},
                    "rpcUrl": heimdall_rpc,
                    "useDefaults": use_defaults,
                    "skipResolving": {"type": "boolean", "description": "Skip resolving function selectors (default: false)"},
                    "includeSol": {"type": "boolean", "description": "Include Solidity source code in output (beta) (default: false)"},
                    "includeYul": {"type": "boolean", "description": "Include Yul source code in output (beta) (default: false)"},
                    "fileName": {"type": "string", "description": "Name for the output file"},
                    "timeout": {"type": "integer", "minimum": 0, "description": "Timeout for each function's symbolic execution in milliseconds"},
                    "verbosity": verbosity,
                    "outputDir": output_dir
                },
                "required": ["target"]
            }
        },
        {
            "name": "heimdall_cfg",
            "description": "Generate visual control flow graph for EVM bytecode using Heimdall",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Contract address, bytecode, file, or ENS name to analyze"},
                    "rpcUrl": heimdall_rpc,
                    "useDefaults": use_defaults,
                    "colorEdges": {"type": "boolean", "description": "Color edges based on JUMPI condition for visualizing if statements (default: false)"},
                    "fileName": {"type": "string", "description": "Name for the output file"},
                    "timeout": {"type": "integer", "minimum": 0, "description": "Timeout for symbolic execution in milliseconds"},
                    "verbosity": verbosity,
                    "outputDir": output_dir
                },
                "required": ["target"]
            }
        },
        {
            "name": "heimdall_inspect",
            "description": "Detailed inspection of Ethereum transactions including calldata decoding, trace analysis, and log visualization using Heimdall",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Transaction hash to inspect"},
                    "rpcUrl": heimdall_rpc,
                    "useDefaults": use_defaults,
                    "transposeApiKey": {"type": "string", "description": "Optional Transpose.io API Key for resolving contract labels"},
                    "fileName": {"type": "string", "description": "Name for the output files"},
                    "skipResolving": {"type": "boolean", "description": "Skip resolving function selectors and contract labels (default: false)"},
                    "verbosity": verbosity,
                    "outputDir": output_dir
                },
                "required": ["target"]
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_a_schema() {
        let tools = tool_definitions("http://localhost:8545");
        let tools = tools.as_array().unwrap();
        assert_eq!(tools.len(), 16);
        for tool in tools {
            assert!(tool["name"].is_string());
            assert_eq!(tool["inputSchema"]["type"], "object");
        }
    }

    #[test]
    fn test_descriptions_show_configured_default() {
        let tools = tool_definitions("https://rpc.example");
        assert_eq!(
            tools[0]["inputSchema"]["properties"]["rpcUrl"]["description"],
            "JSON-RPC URL or foundry alias (default: https://rpc.example)"
        );
    }
}
