//! Running the external collaborators (yt-dlp, curl, llm).

use std::process::{Command, Stdio};
use std::time::Duration;

use log::debug;
use tokio::io::AsyncWriteExt;

use crate::error::{QvError, Result};

pub const YT_DLP: &str = "yt-dlp";
pub const CURL: &str = "curl";
pub const LLM: &str = "llm";

/// How a tool's stdout is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutMode {
    Capture,
    Inherit,
}

/// Run `program` with `args` to completion, feeding `stdin` if given.
///
/// Returns captured stdout (empty when inherited). A missing binary, a
/// non-zero exit, or exceeding `timeout` all map to `QvError::ExternalTool`;
/// on timeout the child is killed.
pub async fn run_tool(
    program: &str,
    args: &[&str],
    stdin: Option<&str>,
    stdout: StdoutMode,
    timeout: Duration,
) -> Result<String> {
    debug!("Running {program} {}", args.join(" "));

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(match stdout {
            StdoutMode::Capture => Stdio::piped(),
            StdoutMode::Inherit => Stdio::inherit(),
        })
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            QvError::tool(program, "not installed or not in PATH")
        } else {
            QvError::tool(program, format!("could not start: {e}"))
        }
    })?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
            match pipe.write_all(input.as_bytes()).await {
                // The tool exited without reading everything; its status and stderr decide
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
                Ok(()) => {}
            }
            // Dropping the pipe closes stdin so the tool sees EOF
        }
        Ok(())
    };
    let wait = child.wait_with_output();

    let (fed, output) = match tokio::time::timeout(timeout, async move { tokio::join!(feed, wait) }).await {
        Ok((fed, result)) => (fed, result.map_err(|e| QvError::tool(program, e.to_string()))?),
        Err(_) => return Err(QvError::tool(program, format!("timed out after {timeout:?}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {stderr}", output.status)
        };
        return Err(QvError::tool(program, message));
    }

    if let Err(e) = fed {
        return Err(QvError::tool(program, format!("could not write stdin: {e}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// First line of `<name> --version`, if the tool runs.
pub fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

/// Confirm every tool in `names` is invocable before doing any work.
pub fn check_dependencies(names: &[&str]) -> Result<()> {
    for name in names {
        if tool_version(name).is_none() {
            return Err(QvError::tool(*name, "required but not installed"));
        }
        debug!("Found dependency: {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_run_tool_captures_stdout() {
        let out = run_tool("echo", &["hello"], None, StdoutMode::Capture, TIMEOUT).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_tool_feeds_stdin() {
        let out = run_tool("cat", &[], Some("piped text"), StdoutMode::Capture, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(out, "piped text");
    }

    #[tokio::test]
    async fn test_run_tool_nonzero_exit() {
        let err = run_tool("sh", &["-c", "echo boom >&2; exit 3"], None, StdoutMode::Capture, TIMEOUT)
            .await
            .unwrap_err();
        match err {
            QvError::ExternalTool { tool, message } => {
                assert_eq!(tool, "sh");
                assert!(message.contains("boom"), "message was: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let err = run_tool("qv-no-such-tool", &[], None, StdoutMode::Capture, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, QvError::ExternalTool { .. }));
        assert!(err.to_string().contains("not installed"));
    }

    #[tokio::test]
    async fn test_run_tool_timeout() {
        let err = run_tool("sleep", &["5"], None, StdoutMode::Capture, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_tool_early_exit_with_large_stdin_keeps_stderr() {
        let input = "x".repeat(1_000_000);
        let err = run_tool(
            "sh",
            &["-c", "echo Error: no such template >&2; exit 1"],
            Some(&input),
            StdoutMode::Capture,
            TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no such template"), "error was: {err}");
    }

    #[tokio::test]
    async fn test_run_tool_large_stdin_round_trip() {
        let input = "y".repeat(1_000_000);
        let out = run_tool("cat", &[], Some(&input), StdoutMode::Capture, TIMEOUT).await.unwrap();
        assert_eq!(out.len(), input.len());
    }

    #[tokio::test]
    async fn test_run_tool_timeout_covers_blocked_stdin() {
        let input = "x".repeat(1_000_000);
        let started = std::time::Instant::now();
        let err = run_tool("sleep", &["3"], Some(&input), StdoutMode::Capture, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "error was: {err}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_check_dependencies_missing() {
        let err = check_dependencies(&["qv-no-such-tool"]).unwrap_err();
        assert!(err.to_string().contains("qv-no-such-tool"));
    }

    #[test]
    fn test_check_dependencies_empty() {
        assert!(check_dependencies(&[]).is_ok());
    }
}
