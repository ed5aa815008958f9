use crate::traits::{SpamClassifier, Verdict};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Exit status a classifier uses to flag spam
const SPAM_EXIT_CODE: i32 = 1;

/// A classifier that pipes the message into a local program, e.g. `rspamc`
/// or `docker compose exec -T rspamd rspamc`.
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }
}

#[cfg(test)]
#[path = "./command_classifier_tests.rs"]
mod command_classifier_tests;

#[async_trait]
impl SpamClassifier for CommandClassifier {
    async fn classify(&self, raw: &[u8]) -> anyhow::Result<Verdict> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to open stdin of {}", self.program))?;

        let write = async move {
            let result = stdin.write_all(raw).await;
            // Closing stdin signals end of message
            drop(stdin);
            match result {
                // The classifier may decide before reading everything
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        let run = async {
            let (written, output) = tokio::join!(write, child.wait_with_output());
            written.map_err(|e| anyhow::anyhow!("Failed to write message: {}", e))?;
            output.map_err(|e| anyhow::anyhow!("Failed to wait for {}: {}", self.program, e))
        };

        // Dropping `run` on timeout kills the child
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                anyhow::anyhow!("{} timed out after {:?}", self.program, self.timeout)
            })??;

        debug!(
            "{} exited with {}: {}",
            self.program,
            output.status,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        if !output.stderr.is_empty() {
            debug!(
                "{} stderr: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        if output.status.code() == Some(SPAM_EXIT_CODE) {
            Ok(Verdict::Spam)
        } else {
            Ok(Verdict::NotSpam)
        }
    }
}
