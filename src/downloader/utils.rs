// Helper functions for the yt-dlp provider

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use crate::downloader::config::DownloaderConfig;
use crate::downloader::errors::ProviderError;

/// Run command with timeout, collecting stdout and stderr.
///
/// The child is killed when the returned future is dropped, so callers can
/// race this against a cancellation signal.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<std::process::Output, ProviderError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::ToolNotFound(program.to_string())
            } else {
                ProviderError::Execution(format!("Failed to start {}: {}", program, e))
            }
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        ProviderError::Execution(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        ProviderError::Execution(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                ProviderError::Execution(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ProviderError::NetworkTimeout)
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ProviderError> {
    task.await
        .map_err(|e| ProviderError::Execution(format!("{} task failed: {}", name, e)))?
        .map_err(|e| ProviderError::Execution(format!("Failed to read {}: {}", name, e)))
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &DownloaderConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(config: &DownloaderConfig) -> Vec<String> {
    vec![
        "--socket-timeout".to_string(),
        config.timeout_seconds.to_string(),
    ]
}

/// Build cookie and player-client arguments for yt-dlp
pub fn get_session_args(config: &DownloaderConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(path) = &config.cookies_path {
        args.push("--cookies".to_string());
        args.push(path.clone());
    }

    if let Some(client) = &config.player_client {
        args.push("--extractor-args".to_string());
        args.push(format!("youtube:player_client={}", client));
    }

    args
}
