// src/foundry/services/units.rs

use std::fmt;

use serde::Deserialize;
use validator::Validate;

use super::require_foundry;
use crate::foundry::command::CommandLine;
use crate::foundry::models::ToolOutput;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthUnit {
    Wei,
    Gwei,
    Ether,
}

impl fmt::Display for EthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EthUnit::Wei => "wei",
            EthUnit::Gwei => "gwei",
            EthUnit::Ether => "ether",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConvertEthUnitsParams {
    #[validate(length(min = 1))]
    pub value: String,
    pub from_unit: EthUnit,
    pub to_unit: EthUnit,
}

pub async fn convert(state: &AppState, params: ConvertEthUnitsParams) -> ToolOutput {
    if let Some(err) = require_foundry(state).await {
        return err;
    }

    let command = CommandLine::new(&state.paths.cast)
        .arg("to-unit")
        .arg(format!("{}{}", params.value, params.from_unit))
        .arg(params.to_unit.to_string());

    let result = state.runner.run(&command).await;
    ToolOutput::from_execution(
        result,
        |out| {
            format!(
                "{} {} = {} {}",
                params.value,
                params.from_unit,
                out.trim(),
                params.to_unit
            )
        },
        |err| format!("Conversion failed: {}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundry::models::ExecutionResult;
    use crate::foundry::services::tests::{test_state, tool_calls};

    #[tokio::test]
    async fn test_gwei_to_wei() {
        let (_home, runner, state) = test_state();
        runner.respond(
            &format!("{} to-unit", state.paths.cast.display()),
            ExecutionResult::ok("2000000000\n"),
        );

        let out = convert(
            &state,
            ConvertEthUnitsParams {
                value: "2".into(),
                from_unit: EthUnit::Gwei,
                to_unit: EthUnit::Wei,
            },
        )
        .await;

        assert_eq!(out, ToolOutput::success("2 gwei = 2000000000 wei"));
        assert_eq!(tool_calls(&runner)[0].redacted_args(), vec!["to-unit", "2gwei", "wei"]);
    }

    #[tokio::test]
    async fn test_conversion_failure() {
        let (_home, runner, state) = test_state();
        runner.respond(
            &format!("{} to-unit", state.paths.cast.display()),
            ExecutionResult::failed("error: invalid value"),
        );

        let out = convert(
            &state,
            ConvertEthUnitsParams {
                value: "abc".into(),
                from_unit: EthUnit::Ether,
                to_unit: EthUnit::Wei,
            },
        )
        .await;

        assert_eq!(out, ToolOutput::error("Conversion failed: error: invalid value"));
    }
}
