//! Command construction and execution.
//!
//! Commands are built as an ordered list of argv tokens and launched without a
//! shell, so addresses, signatures and file paths coming from tool arguments are
//! never re-parsed. Tokens marked secret are passed to the child verbatim but
//! print as `<redacted>` everywhere else.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::models::{ExecutionResult, FoundryError};

const REDACTED: &str = "<redacted>";

#[derive(Clone, Debug)]
enum Token {
    Plain(String),
    Secret(SecretString),
}

impl Token {
    fn redacted(&self) -> &str {
        match self {
            Token::Plain(s) => s,
            Token::Secret(_) => REDACTED,
        }
    }

    fn exposed(&self) -> &str {
        match self {
            Token::Plain(s) => s,
            Token::Secret(s) => s.expose_secret(),
        }
    }
}

/// A program plus its arguments, built token by token.
///
/// Optional values contribute nothing when absent, so callers can chain
/// `opt`/`flag_if` for every optional tool parameter.
#[derive(Clone, Debug)]
pub struct CommandLine {
    program: String,
    args: Vec<Token>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Token::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| Token::Plain(a.into())));
        self
    }

    pub fn flag_if(self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.arg(flag)
        } else {
            self
        }
    }

    /// Appends `flag value` when `value` is present.
    pub fn opt<V: fmt::Display>(self, flag: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.arg(flag).arg(v.to_string()),
            None => self,
        }
    }

    /// Appends `flag <secret>`; the secret never shows up in `Display` output.
    pub fn secret_opt(mut self, flag: &str, value: Option<&SecretString>) -> Self {
        if let Some(secret) = value {
            self.args.push(Token::Plain(flag.to_string()));
            self.args.push(Token::Secret(secret.clone()));
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Argument list with secret tokens replaced by a placeholder.
    pub fn redacted_args(&self) -> Vec<String> {
        self.args.iter().map(|t| t.redacted().to_string()).collect()
    }

    /// Arguments exactly as the child process receives them.
    #[cfg(test)]
    pub(crate) fn exposed_args(&self) -> Vec<String> {
        self.args.iter().map(|t| t.exposed().to_string()).collect()
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(Token::exposed));
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for token in &self.args {
            write!(f, " {}", quote(token.redacted()))?;
        }
        Ok(())
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", token.replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

/// Maps a finished process to an [`ExecutionResult`].
///
/// Non-zero exit is a failure. On a clean exit stdout wins; stderr alone is a
/// failure.
pub fn interpret_output(
    program: &str,
    exit_code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> ExecutionResult {
    let stdout = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr).into_owned();

    if exit_code != Some(0) {
        let status = exit_code
            .map(|c| format!("status {}", c))
            .unwrap_or_else(|| "a signal".to_string());
        let message = if !stderr.trim().is_empty() {
            stderr
        } else if !stdout.trim().is_empty() {
            stdout
        } else {
            format!("{} exited with {}", program, status)
        };
        return ExecutionResult::failed(message);
    }

    if stdout.is_empty() && !stderr.is_empty() {
        return ExecutionResult::failed(stderr);
    }
    ExecutionResult::ok(stdout)
}

/// Runs external commands on behalf of the tool handlers.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs to completion and buffers all output. Never times out.
    async fn run(&self, command: &CommandLine) -> ExecutionResult;

    /// Launches a long-lived process without waiting for it. Returns its pid.
    async fn spawn(&self, command: &CommandLine, silent: bool) -> Result<Option<u32>, FoundryError>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> ExecutionResult {
        debug!(command = %command, "executing command");

        match command.to_command().output().await {
            Ok(output) => {
                let result = interpret_output(
                    command.program(),
                    output.status.code(),
                    &output.stdout,
                    &output.stderr,
                );
                if !result.success {
                    debug!(command = %command, "command failed: {}", result.message.trim());
                }
                result
            }
            Err(e) => {
                let err = FoundryError::Spawn {
                    program: command.program().to_string(),
                    source: e,
                };
                debug!(command = %command, "{}", err);
                ExecutionResult::failed(err.to_string())
            }
        }
    }

    async fn spawn(&self, command: &CommandLine, silent: bool) -> Result<Option<u32>, FoundryError> {
        info!(command = %command, "spawning background process");

        let mut cmd = command.to_command();
        if silent {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|e| FoundryError::Spawn {
            program: command.program().to_string(),
            source: e,
        })?;
        let pid = child.id();
        let name = command.program().to_string();

        // stdout belongs to the MCP transport, so child output only goes to the log
        if let Some(stdout) = child.stdout.take() {
            let name = name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(process = %name, "{}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let name = name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(process = %name, "{}", line);
                }
            });
        }

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => info!(process = %name, "background process exited: {}", status),
                Err(e) => warn!(process = %name, "failed to wait for background process: {}", e),
            }
        });

        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_values_are_omitted() {
        let cmd = CommandLine::new("/bin/cast")
            .arg("balance")
            .arg("0xabc")
            .opt::<String>("--block", None)
            .opt("--confirmations", Some(3))
            .flag_if("--ether", false)
            .secret_opt("--private-key", None);

        assert_eq!(
            cmd.redacted_args(),
            vec!["balance", "0xabc", "--confirmations", "3"]
        );
        assert_eq!(cmd.to_string(), "/bin/cast balance 0xabc --confirmations 3");
    }

    #[test]
    fn test_secret_is_redacted() {
        let key = SecretString::new("0xdeadbeef".to_string());
        let cmd = CommandLine::new("cast")
            .arg("send")
            .secret_opt("--private-key", Some(&key));

        let shown = cmd.to_string();
        assert!(!shown.contains("deadbeef"));
        assert!(shown.contains("--private-key <redacted>"));
        assert_eq!(cmd.redacted_args(), vec!["send", "--private-key", "<redacted>"]);
        assert_eq!(cmd.exposed_args(), vec!["send", "--private-key", "0xdeadbeef"]);
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = CommandLine::new("anvil").opt("--mnemonic", Some("test test junk"));
        assert_eq!(cmd.to_string(), "anvil --mnemonic \"test test junk\"");
    }

    #[test]
    fn test_interpret_output() {
        // stdout wins on a clean exit
        let r = interpret_output("cast", Some(0), b"42\n", b"warning: deprecated\n");
        assert_eq!(r, ExecutionResult::ok("42\n"));

        // stderr only is a failure
        let r = interpret_output("cast", Some(0), b"", b"error: bad address\n");
        assert_eq!(r, ExecutionResult::failed("error: bad address\n"));

        // non-zero exit fails even with stdout
        let r = interpret_output("cast", Some(1), b"partial", b"boom");
        assert_eq!(r, ExecutionResult::failed("boom"));

        let r = interpret_output("pkill", Some(1), b"", b"");
        assert_eq!(r, ExecutionResult::failed("pkill exited with status 1"));

        let r = interpret_output("anvil", None, b"", b"");
        assert_eq!(r, ExecutionResult::failed("anvil exited with a signal"));

        let r = interpret_output("forge", Some(0), b"", b"");
        assert_eq!(r, ExecutionResult::ok(""));
    }

    #[tokio::test]
    async fn test_spawn_error_is_reported() {
        let runner = ProcessRunner;
        let cmd = CommandLine::new("/definitely/not/a/real/binary").arg("--version");
        let result = runner.run(&cmd).await;
        assert!(!result.success);
        assert!(result.message.contains("/definitely/not/a/real/binary"));
    }
}
