//! Headless browser sessions for the search fallback.
//!
//! A browser is expensive and easy to leak, so it is only ever used through
//! [`with_browser`]: launch, run one unit of work, close. The session is
//! closed on every exit path, including when the work fails.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use contentlift_shared::{BrowserConfig, ContentLiftError, Result};

/// Work run against a live session. Boxed so it can borrow the session.
pub type SessionFuture<'s, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 's>>;

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// A live browser that can render pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url`, let scripts run, and return the resulting DOM as HTML.
    async fn render(&self, url: &str) -> Result<String>;

    /// Release every resource held by the session.
    async fn close(&self) -> Result<()>;
}

/// Launch a session, run `work` on it, and close it whatever the outcome.
///
/// A close failure is logged; the result of `work` is what the caller sees.
pub async fn with_browser<T, F>(launcher: &dyn BrowserLauncher, work: F) -> Result<T>
where
    F: for<'s> FnOnce(&'s dyn BrowserSession) -> SessionFuture<'s, T>,
{
    let session = launcher.launch().await?;
    debug!("browser session started");

    let outcome = work(session.as_ref()).await;

    match session.close().await {
        Ok(()) => debug!("browser session closed"),
        Err(e) => warn!(error = %e, "failed to close browser session"),
    }

    outcome
}

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

/// Launches headless Chrome/Chromium via its command line.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: String,
    user_agent: String,
    timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &BrowserConfig, user_agent: impl Into<String>) -> Self {
        Self {
            executable: config.executable.clone(),
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let status = Command::new(&self.executable)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                ContentLiftError::browser(format!("failed to start {}: {e}", self.executable))
            })?;

        if !status.success() {
            return Err(ContentLiftError::browser(format!(
                "{} exited with {status}",
                self.executable
            )));
        }

        let profile_dir =
            std::env::temp_dir().join(format!("contentlift-chrome-{}", Uuid::now_v7()));
        tokio::fs::create_dir_all(&profile_dir)
            .await
            .map_err(|e| ContentLiftError::io(&profile_dir, e))?;

        info!(executable = %self.executable, profile = %profile_dir.display(), "launched headless browser");

        Ok(Box::new(ChromeSession {
            executable: self.executable.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            profile_dir,
        }))
    }
}

/// One isolated browser profile. Each render is a headless `--dump-dom` run
/// against that profile.
#[derive(Debug)]
struct ChromeSession {
    executable: String,
    user_agent: String,
    timeout: Duration,
    profile_dir: PathBuf,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn render(&self, url: &str) -> Result<String> {
        debug!(%url, "rendering page");

        let mut command = Command::new(&self.executable);
        command
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--disable-setuid-sandbox",
            ])
            .arg(format!("--user-data-dir={}", self.profile_dir.display()))
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--dump-dom")
            .arg(url)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                ContentLiftError::browser(format!(
                    "render of {url} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ContentLiftError::browser(format!("render of {url} failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContentLiftError::browser(format!(
                "render of {url} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn close(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.profile_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContentLiftError::io(&self.profile_dir, e)),
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.profile_dir);
    }
}
