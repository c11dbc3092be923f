//! Scripted command runner for tests.
//!
//! Compiled for the crate's own unit tests and, behind the `test-utils`
//! feature, for the integration tests under `tests/`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::foundry::command::{CommandLine, CommandRunner};
use crate::foundry::models::{ExecutionResult, FoundryError};

/// Answers commands from canned responses and records every call.
///
/// A rule matches when the command's display form equals the prefix or starts
/// with it followed by a space. Queued responses are consumed in order; the
/// last one repeats.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, VecDeque<ExecutionResult>)>>,
    calls: Mutex<Vec<CommandLine>>,
    spawned: Mutex<Vec<CommandLine>>,
    spawn_error: Mutex<Option<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, prefix: &str, result: ExecutionResult) {
        let mut rules = self.rules.lock().unwrap();
        match rules.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, queue)) => queue.push_back(result),
            None => rules.push((prefix.to_string(), VecDeque::from([result]))),
        }
    }

    /// Makes every later `spawn` fail to launch with `message`.
    pub fn fail_spawn(&self, message: &str) {
        *self.spawn_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spawned(&self) -> Vec<CommandLine> {
        self.spawned.lock().unwrap().clone()
    }
}

fn matches(shown: &str, prefix: &str) -> bool {
    shown == prefix || shown.starts_with(&format!("{} ", prefix))
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> ExecutionResult {
        self.calls.lock().unwrap().push(command.clone());
        let shown = command.to_string();

        let mut rules = self.rules.lock().unwrap();
        for (prefix, queue) in rules.iter_mut() {
            if matches(&shown, prefix) {
                if queue.len() > 1 {
                    return queue.pop_front().unwrap();
                }
                return queue.front().cloned().unwrap();
            }
        }
        ExecutionResult::failed(format!("unexpected command: {}", shown))
    }

    async fn spawn(&self, command: &CommandLine, _silent: bool) -> Result<Option<u32>, FoundryError> {
        self.spawned.lock().unwrap().push(command.clone());
        match self.spawn_error.lock().unwrap().clone() {
            Some(message) => Err(FoundryError::Spawn {
                program: command.program().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            }),
            None => Ok(Some(4242)),
        }
    }
}
