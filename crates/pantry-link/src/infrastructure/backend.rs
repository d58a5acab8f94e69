//! Text backend that runs an external program.
//!
//! The program receives the prompt on stdin and writes the generated text to
//! stdout.  The API key, if any, is passed through an environment variable so
//! it never appears on a command line.  A non-zero exit is classified from
//! the program's stderr:
//!
//! | stderr mentions                                 | error          |
//! |-------------------------------------------------|----------------|
//! | quota, rate limit                               | `Quota`        |
//! | api key, unauthorized, permission, invalid key  | `Auth`         |
//! | network, connection, timed out, dns             | `Network`      |
//! | anything else                                   | `Backend`      |
//!
//! A program that cannot be started at all is `Unavailable`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::generate_dish::{GenerateError, TextGenerator};

/// Minimum length of a plausible API key.
const MIN_API_KEY_LEN: usize = 15;

/// Longest stderr excerpt kept in an error message.
const STDERR_EXCERPT: usize = 200;

/// Cheap shape check before a key is handed to the backend: at least 15
/// characters once trimmed, and no whitespace inside.
pub fn is_plausible_api_key(key: &str) -> bool {
    let key = key.trim();
    key.chars().count() >= MIN_API_KEY_LEN && !key.chars().any(char::is_whitespace)
}

/// Runs `program args...` once per prompt.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    /// `(variable name, key)` exported to the child.
    api_key: Option<(String, String)>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            api_key: None,
        }
    }

    /// Passes `key` to the child in the environment variable `var`.
    pub fn with_api_key(mut self, var: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key = Some((var.into(), key.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some((var, key)) = &self.api_key {
            command.env(var, key);
        }

        let mut child = command
            .spawn()
            .map_err(|e| GenerateError::Unavailable(format!("cannot start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| GenerateError::Backend(format!("writing prompt: {e}")))?;
            // Dropping stdin closes it so the child sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GenerateError::Backend(format!("waiting for {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}", self.program, output.status);
            return Err(classify_failure(&stderr));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("{} produced {} bytes", self.program, text.len());
        Ok(text)
    }
}

/// Maps a failed run's stderr to an error kind.
pub fn classify_failure(stderr: &str) -> GenerateError {
    let lower = stderr.to_lowercase();
    let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(&["quota", "rate limit", "配額"]) {
        GenerateError::Quota(excerpt)
    } else if mentions(&["api key", "unauthorized", "permission", "invalid key", "401", "403"]) {
        GenerateError::Auth(excerpt)
    } else if mentions(&["network", "connection", "timed out", "timeout", "dns", "連線"]) {
        GenerateError::Network(excerpt)
    } else {
        GenerateError::Backend(excerpt)
    }
}
