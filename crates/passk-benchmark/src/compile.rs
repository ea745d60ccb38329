use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const CHECK_SNIPPET: &str = "import sys; compile(sys.stdin.read(), '<chk>', 'exec')";

/// Compile-validity probe: pipes `prompt + body` through CPython's
/// `compile()` in a child process. Purely syntactic; nothing is executed.
#[derive(Debug, Clone)]
pub struct CompileChecker {
    timeout_ms: u64,
}

impl CompileChecker {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// True when the concatenated source compiles. Spawn failures and
    /// timeouts degrade to `false` with a warning so a missing interpreter
    /// never aborts a batch run.
    pub async fn check(&self, prompt: &str, body: &str) -> bool {
        let source = format!("{prompt}{body}");

        let mut cmd = Command::new("python3");
        cmd.args(["-c", CHECK_SNIPPET])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(error = %e, "could not spawn python3 for compile check");
                return false;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(source.as_bytes()).await {
                tracing::warn!(error = %e, "could not feed source to compile check");
                return false;
            }
        }

        let timeout = Duration::from_millis(self.timeout_ms);
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "compile check failed to run");
                false
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout_ms, "compile check timed out");
                false
            }
        }
    }
}

impl Default for CompileChecker {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python3_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok()
    }

    #[tokio::test]
    async fn broken_body_does_not_compile() {
        let checker = CompileChecker::default();
        let ok = checker.check("def f():\n", "    retur None\n").await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn valid_body_compiles() {
        if !python3_available() {
            return;
        }
        let checker = CompileChecker::default();
        let ok = checker.check("def f():\n", "    return None\n").await;
        assert!(ok);
    }

    #[tokio::test]
    async fn placeholder_body_always_compiles() {
        if !python3_available() {
            return;
        }
        let checker = CompileChecker::default();
        let ok = checker
            .check("def f(a, b):\n", passk_core::PLACEHOLDER_BODY)
            .await;
        assert!(ok);
    }
}
