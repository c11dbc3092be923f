// src/foundry/services/cast.rs

use serde::Deserialize;
use validator::Validate;

use super::require_foundry;
use crate::foundry::command::CommandLine;
use crate::foundry::models::ToolOutput;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastCallParams {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(length(min = 1))]
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub rpc_url: Option<String>,
    pub block_number: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastSendParams {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(length(min = 1))]
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub from: Option<String>,
    pub value: Option<String>,
    pub rpc_url: Option<String>,
    pub gas_limit: Option<String>,
    pub gas_price: Option<String>,
    pub confirmations: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastBalanceParams {
    #[validate(length(min = 1))]
    pub address: String,
    pub rpc_url: Option<String>,
    pub block_number: Option<String>,
    #[serde(default)]
    pub format_ether: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastReceiptParams {
    #[validate(length(min = 1))]
    pub tx_hash: String,
    pub rpc_url: Option<String>,
    pub confirmations: Option<u64>,
    pub field: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastChainParams {
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub return_id: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Read-only contract call.
pub async fn call(state: &AppState, params: CastCallParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let command = CommandLine::new(&state.paths.cast)
        .arg("call")
        .arg(&params.contract_address)
        .arg(&params.function_signature)
        .args(params.args.iter().cloned())
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", non_empty(params.block_number))
        .opt("--from", non_empty(params.from));

    let result = state.runner.run(&command).await;
    let function_name = params
        .function_signature
        .split('(')
        .next()
        .unwrap_or_default();

    ToolOutput::from_execution(
        result,
        |out| {
            format!(
                "Call to {}.{} result:\n{}",
                params.contract_address,
                function_name,
                tidy_call_output(out)
            )
        },
        |err| format!("Call failed: {}", err),
    )
}

/// Multi-line results (arrays, tuples) lose their blank lines and padding.
fn tidy_call_output(out: &str) -> String {
    if out.contains('\n') && !out.contains("Error") {
        out.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        out.to_string()
    }
}

/// Signed transaction to a contract function, using `PRIVATE_KEY` when configured.
pub async fn send(state: &AppState, params: CastSendParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let command = CommandLine::new(&state.paths.cast)
        .arg("send")
        .arg(&params.contract_address)
        .arg(&params.function_signature)
        .args(params.args.iter().cloned())
        .secret_opt("--private-key", state.config.private_key.as_ref())
        .opt("--from", non_empty(params.from))
        .opt("--value", non_empty(params.value))
        .opt("--rpc-url", Some(rpc_url))
        .opt("--gas-limit", non_empty(params.gas_limit))
        .opt("--gas-price", non_empty(params.gas_price))
        .opt("--confirmations", params.confirmations.filter(|c| *c > 0));

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| format!("Transaction sent successfully:\n{}", out),
        |err| format!("Transaction failed: {}", err),
    )
}

pub async fn balance(state: &AppState, params: CastBalanceParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let command = CommandLine::new(&state.paths.cast)
        .arg("balance")
        .arg(&params.address)
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", non_empty(params.block_number))
        .flag_if("--ether", params.format_ether);

    let result = state.runner.run(&command).await;
    let unit = if params.format_ether { "ETH" } else { "wei" };
    ToolOutput::from_execution(
        result,
        |out| format!("Balance of {}: {} {}", params.address, out.trim(), unit),
        |err| format!("Failed to get balance: {}", err),
    )
}

pub async fn receipt(state: &AppState, params: CastReceiptParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let field = non_empty(params.field);
    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let command = CommandLine::new(&state.paths.cast)
        .arg("receipt")
        .arg(&params.tx_hash)
        .args(field.clone())
        .opt("--rpc-url", Some(rpc_url))
        .opt("--confirmations", params.confirmations.filter(|c| *c > 0));

    let result = state.runner.run(&command).await;
    let suffix = field.map(|f| format!(" ({})", f)).unwrap_or_default();
    ToolOutput::from_execution(
        result,
        |out| format!("Transaction receipt for {}{}:\n{}", params.tx_hash, suffix, out),
        |err| format!("Failed to get receipt: {}", err),
    )
}

pub async fn chain(state: &AppState, params: CastChainParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let rpc_url = state.rpc.resolve(params.rpc_url.as_deref()).await;
    let subcommand = if params.return_id { "chain-id" } else { "chain" };
    let command = CommandLine::new(&state.paths.cast)
        .arg(subcommand)
        .opt("--rpc-url", Some(rpc_url));

    let result = state.runner.run(&command).await;
    let what = if params.return_id { "ID" } else { "name" };
    ToolOutput::from_execution(
        result,
        |out| format!("Chain {}: {}", what, out.trim()),
        |err| format!("Failed to get chain information: {}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundry::models::ExecutionResult;
    use crate::foundry::services::tests::{test_state, tool_calls};
    use secrecy::SecretString;

    fn cast(state: &AppState) -> String {
        state.paths.cast.display().to_string()
    }

    #[tokio::test]
    async fn test_call_formats_multiline_output() {
        let (_home, runner, state) = test_state();
        runner.respond(
            &format!("{} call", cast(&state)),
            ExecutionResult::ok("  1\n\n  2  \n"),
        );

        let out = call(
            &state,
            CastCallParams {
                contract_address: "0xToken".into(),
                function_signature: "balances(address)(uint256,uint256)".into(),
                args: vec!["0xabc".into()],
                rpc_url: None,
                block_number: None,
                from: None,
            },
        )
        .await;

        assert!(!out.is_error);
        assert_eq!(out.text, "Call to 0xToken.balances result:\n1\n2");
        let calls = tool_calls(&runner);
        assert_eq!(
            calls[0].redacted_args(),
            vec![
                "call",
                "0xToken",
                "balances(address)(uint256,uint256)",
                "0xabc",
                "--rpc-url",
                "http://localhost:8545"
            ]
        );
    }

    #[tokio::test]
    async fn test_send_includes_optional_flags_and_hides_key() {
        let (home, runner, _) = test_state();
        let mut config = crate::config::Config::with_home(home.path());
        config.private_key = Some(SecretString::new("0xsecret".into()));
        let state = AppState::new(config, runner.clone());
        runner.respond(&format!("{} send", cast(&state)), ExecutionResult::ok("blockHash 0x1"));

        let out = send(
            &state,
            CastSendParams {
                contract_address: "0xToken".into(),
                function_signature: "transfer(address,uint256)".into(),
                args: vec!["0xdead".into(), "100".into()],
                from: None,
                value: Some("1".into()),
                rpc_url: Some("http://127.0.0.1:8545".into()),
                gas_limit: None,
                gas_price: Some("20".into()),
                confirmations: Some(0),
            },
        )
        .await;

        assert!(!out.is_error);
        assert_eq!(out.text, "Transaction sent successfully:\nblockHash 0x1");
        let calls = tool_calls(&runner);
        assert_eq!(
            calls[0].redacted_args(),
            vec![
                "send",
                "0xToken",
                "transfer(address,uint256)",
                "0xdead",
                "100",
                "--private-key",
                "<redacted>",
                "--value",
                "1",
                "--rpc-url",
                "http://127.0.0.1:8545",
                "--gas-price",
                "20"
            ]
        );
        assert!(!calls[0].to_string().contains("0xsecret"));
    }

    #[tokio::test]
    async fn test_balance_in_ether() {
        let (_home, runner, state) = test_state();
        runner.respond(&format!("{} balance", cast(&state)), ExecutionResult::ok("1.5\n"));

        let out = balance(
            &state,
            CastBalanceParams {
                address: "0xabc".into(),
                rpc_url: None,
                block_number: Some("latest".into()),
                format_ether: true,
            },
        )
        .await;

        assert_eq!(out, ToolOutput::success("Balance of 0xabc: 1.5 ETH"));
        assert_eq!(
            tool_calls(&runner)[0].redacted_args(),
            vec!["balance", "0xabc", "--rpc-url", "http://localhost:8545", "--block", "latest", "--ether"]
        );
    }

    #[tokio::test]
    async fn test_receipt_failure_is_reported() {
        let (_home, runner, state) = test_state();
        runner.respond(
            &format!("{} receipt", cast(&state)),
            ExecutionResult::failed("transaction not found"),
        );

        let out = receipt(
            &state,
            CastReceiptParams {
                tx_hash: "0xhash".into(),
                rpc_url: None,
                confirmations: Some(2),
                field: Some("status".into()),
            },
        )
        .await;

        assert_eq!(out, ToolOutput::error("Failed to get receipt: transaction not found"));
        assert_eq!(
            tool_calls(&runner)[0].redacted_args(),
            vec!["receipt", "0xhash", "status", "--rpc-url", "http://localhost:8545", "--confirmations", "2"]
        );
    }

    #[tokio::test]
    async fn test_chain_id() {
        let (_home, runner, state) = test_state();
        runner.respond(&format!("{} chain-id", cast(&state)), ExecutionResult::ok("31337\n"));

        let out = chain(
            &state,
            CastChainParams {
                rpc_url: None,
                return_id: true,
            },
        )
        .await;

        assert_eq!(out, ToolOutput::success("Chain ID: 31337"));
    }
}
