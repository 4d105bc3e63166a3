use super::{render_transcript, GenerationService};
use async_trait::async_trait;
use ragchat_core::{Message, RagError, RagResult};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

/// Local executable backend.
///
/// Spawns the configured program once per request, writes the rendered
/// transcript to its stdin, and returns its trimmed stdout. Any local model
/// runner that reads a prompt from stdin works (llama.cpp, ollama, a shell
/// script). A non-zero exit or empty output is an upstream failure.
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    /// Run `program` with `args` for every request.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl GenerationService for CommandBackend {
    async fn generate(&self, messages: &[Message]) -> RagResult<String> {
        if messages.is_empty() {
            return Err(RagError::UpstreamGenerationFailure(
                "no messages to send".into(),
            ));
        }
        let prompt = render_transcript(messages);

        tracing::info!(
            program = %self.program,
            prompt_len = prompt.len(),
            "spawning generation command"
        );

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RagError::UpstreamGenerationFailure(format!(
                    "failed to run '{}': {e}",
                    self.program
                ))
            })?;

        // Feed stdin while draining stdout/stderr so a program that answers
        // as it reads cannot fill both pipes and stall.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            // stdin drops at the end of this block, so the program sees EOF.
            match stdin.write_all(prompt.as_bytes()).await {
                // The program exited without reading; its exit status decides below.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| {
            RagError::UpstreamGenerationFailure(format!("failed to read output: {e}"))
        })?;
        fed.map_err(|e| {
            RagError::UpstreamGenerationFailure(format!("failed to write prompt: {e}"))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(RagError::UpstreamGenerationFailure(format!(
                "'{}' failed (exit {}): {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let reply = stdout.trim().to_string();
        if reply.is_empty() {
            return Err(RagError::UpstreamGenerationFailure(format!(
                "'{}' produced no output",
                self.program
            )));
        }

        tracing::info!(reply_len = reply.len(), "generation command finished");
        Ok(reply)
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_echoes_stdin() {
        let backend = CommandBackend::new("cat", vec![]);
        let reply = backend
            .generate(&[Message::system("be brief"), Message::user("hello")])
            .await
            .unwrap();
        assert_eq!(reply, "system: be brief\n\nuser: hello");
    }

    #[tokio::test]
    async fn test_large_prompt_through_streaming_program() {
        let backend = CommandBackend::new("cat", vec![]);
        let prompt = "x".repeat(400_000);
        let reply = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            backend.generate(&[Message::user(prompt.clone())]),
        )
        .await
        .expect("generation stalled on a full pipe")
        .unwrap();
        assert_eq!(reply.len(), "user: ".len() + prompt.len());
    }

    #[tokio::test]
    async fn test_command_nonzero_exit_is_upstream_failure() {
        let backend = CommandBackend::new("sh", vec!["-c".into(), "echo nope >&2; exit 3".into()]);
        let err = backend.generate(&[Message::user("hi")]).await.unwrap_err();
        match err {
            RagError::UpstreamGenerationFailure(msg) => {
                assert!(msg.contains("exit 3"), "{msg}");
                assert!(msg.contains("nope"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_upstream_failure() {
        let backend = CommandBackend::new("ragchat-definitely-not-installed", vec![]);
        assert!(matches!(
            backend.generate(&[Message::user("hi")]).await,
            Err(RagError::UpstreamGenerationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_output_is_upstream_failure() {
        let backend = CommandBackend::new("sh", vec!["-c".into(), "cat >/dev/null".into()]);
        assert!(matches!(
            backend.generate(&[Message::user("hi")]).await,
            Err(RagError::UpstreamGenerationFailure(_))
        ));
    }
}
