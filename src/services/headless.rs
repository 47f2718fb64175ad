// src/services/headless.rs

//! Adapter for cinema pages that only render client-side.
//!
//! Rendering happens either on a blocking worker in this process or in a
//! child copy of the binary (`--render-target <key>`), which prints the
//! records as JSON on stdout.
//!
//! The render itself stops at its own deadline. The caller waits that budget
//! plus [`RENDER_GRACE`]; a child still running then is killed together with
//! its process group, so a browser it launched goes with it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::browser::render_page;
use crate::error::{AppError, Result};
use crate::models::{BrowserConfig, Config, HeadlessTarget, HttpConfig, Showing};
use crate::services::cards::{CardOrigin, cards_to_showings, extract_cards};
use crate::services::{FetchContext, SourceAdapter};
use crate::utils::http::create_client;

const SOURCE_TAG: &str = "headless-browser";

/// Extra time the caller allows past the render deadline before killing.
pub const RENDER_GRACE: Duration = Duration::from_secs(3);

/// Program and leading arguments used to spawn a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ChildCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-invoke the running executable.
    pub fn current_exe(args: Vec<String>) -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, args))
    }
}

/// Where headless pages get rendered.
#[derive(Debug, Clone, Default)]
pub enum RenderMode {
    #[default]
    InProcess,
    Child(ChildCommand),
}

/// Renders one target page and applies the card heuristics.
pub struct HeadlessAdapter {
    target: HeadlessTarget,
    browser: BrowserConfig,
    http: HttpConfig,
    mode: RenderMode,
}

impl HeadlessAdapter {
    pub fn new(target: HeadlessTarget, config: &Config, mode: RenderMode) -> Self {
        Self {
            target,
            browser: config.browser.clone(),
            http: config.http.clone(),
            mode,
        }
    }

    /// Deadline of one render, settle waits included.
    fn budget(&self) -> Duration {
        Duration::from_secs(
            self.browser.timeout_secs + self.browser.settle_secs + self.browser.follow_up_secs,
        )
    }

    /// Extract VOSE showings from a rendered document.
    pub fn parse_rendered(&self, html: &str, ctx: &FetchContext) -> Result<Vec<Showing>> {
        let selectors = self.target.selectors.compile()?;
        let date = ctx.today_iso();

        Ok(cards_to_showings(
            extract_cards(html, &selectors),
            CardOrigin {
                cinema: &self.target.name,
                url: &self.target.url,
                date: &date,
                source: SOURCE_TAG,
            },
        ))
    }

    async fn render_in_process(&self) -> Result<String> {
        let browser = self.browser.clone();
        let http = self.http.clone();
        let url = self.target.url.clone();
        let budget = self.budget();

        let task = tokio::task::spawn_blocking(move || render_page(&browser, &http, &url));
        match timeout(budget + RENDER_GRACE, task).await {
            Ok(joined) => {
                joined.map_err(|e| AppError::browser(format!("render task failed: {e}")))?
            }
            Err(_) => Err(AppError::browser(format!(
                "rendering {} timed out after {}s",
                self.target.url,
                budget.as_secs()
            ))),
        }
    }

    async fn fetch_via_child(
        &self,
        command: &ChildCommand,
        ctx: &FetchContext,
    ) -> Result<Vec<Showing>> {
        let limit = self.budget() + RENDER_GRACE;
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .arg("--render-target")
            .arg(&self.target.key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        let pid = child.id();

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                if let Some(pid) = pid {
                    kill_group(pid);
                }
                return Err(AppError::browser(format!(
                    "renderer for '{}' killed after {}s",
                    self.target.key,
                    limit.as_secs()
                )));
            }
        };

        if !output.status.success() {
            return Err(AppError::source(
                &self.target.name,
                format!("renderer exited with {}", output.status),
            ));
        }

        let records: Vec<Showing> = serde_json::from_slice(&output.stdout)?;
        Ok(keep_wanted(records, ctx))
    }
}

/// SIGKILL every process in the renderer's group.
#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to kill renderer group {pid}: {e}"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// Drop child records without times or outside the run's dates.
fn keep_wanted(records: Vec<Showing>, ctx: &FetchContext) -> Vec<Showing> {
    records
        .into_iter()
        .filter(|s| !s.times.is_empty() && ctx.wants(s.date.as_deref()))
        .collect()
}

#[async_trait]
impl SourceAdapter for HeadlessAdapter {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Showing>> {
        log::info!("Rendering {} ({})...", self.target.name, self.target.url);

        let showings = match &self.mode {
            RenderMode::InProcess => {
                let html = self.render_in_process().await?;
                self.parse_rendered(&html, ctx)?
            }
            RenderMode::Child(command) => self.fetch_via_child(command, ctx).await?,
        };

        log::info!(
            "Found {} VOSE showings from {}",
            showings.len(),
            self.target.name
        );
        Ok(showings)
    }
}

/// Render one configured target in this process.
///
/// Entry point of the child side of [`RenderMode::Child`].
pub async fn render_target(config: &Config, key: &str) -> Result<Vec<Showing>> {
    let target = config
        .headless_target(key)
        .ok_or_else(|| AppError::config(format!("unknown headless target '{key}'")))?;

    let ctx = FetchContext::new(create_client(&config.http)?, false);
    HeadlessAdapter::new(target.clone(), config, RenderMode::InProcess)
        .fetch(&ctx)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_showing;
    use crate::services::test_context;

    fn adapter(mode: RenderMode) -> HeadlessAdapter {
        let mut config = Config::default();
        config.browser.timeout_secs = 2;
        config.browser.settle_secs = 0;
        config.browser.follow_up_secs = 0;
        let target = config.headless_target("ocine").unwrap().clone();
        HeadlessAdapter::new(target, &config, mode)
    }

    #[test]
    fn test_parse_rendered_page() {
        let html = r#"
            <div class="swiper-slide">
              <h3 class="movie-title">The Brutalist</h3>
              <span class="badge">VOSE</span>
              <a href="/buy">18:10</a><a href="/buy">21:35</a>
            </div>
            <div class="swiper-slide">
              <h3 class="movie-title">Vaiana 2</h3>
              <span>Castellano</span><a>17:00</a>
            </div>
        "#;
        let adapter = adapter(RenderMode::InProcess);
        let showings = adapter.parse_rendered(html, &test_context(false)).unwrap();

        assert_eq!(showings.len(), 1);
        let film = &showings[0];
        assert_eq!(film.cinema, "Ocine Premium 7 Palmas");
        assert_eq!(film.title, "The Brutalist");
        assert_eq!(film.times, vec!["18:10", "21:35"]);
        assert_eq!(film.source, "headless-browser");
        assert_eq!(film.date.as_deref(), Some("2026-02-13"));
    }

    #[test]
    fn test_keep_wanted_filters_child_output() {
        let records = vec![
            sample_showing("C", "Today", "2026-02-13", &["20:00"]),
            sample_showing("C", "Tomorrow", "2026-02-14", &["20:00"]),
            sample_showing("C", "Untimed", "2026-02-13", &[]),
        ];

        let kept = keep_wanted(records, &test_context(false));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Today");
    }

    #[tokio::test]
    async fn test_unknown_render_target() {
        let err = render_target(&Config::default(), "nope").await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> RenderMode {
        RenderMode::Child(ChildCommand::new(
            "sh",
            vec!["-c".into(), script.into(), "renderer".into()],
        ))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_records_are_read_from_stdout() {
        let script = r#"printf '%s' '[{"cinema":"Ocine Premium 7 Palmas","title":"Anora","language":"VOSE","format":"VOSE","date":"2026-02-13","times":["20:30"],"rating":null,"runtime":null,"poster":null,"url":null,"source":"headless-browser"}]'"#;
        let showings = adapter(shell(script))
            .fetch(&test_context(false))
            .await
            .unwrap();
        assert_eq!(showings.len(), 1);
        assert_eq!(showings[0].title, "Anora");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_failure_is_an_error() {
        let result = adapter(shell("exit 3")).fetch(&test_context(false)).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_child_is_killed() {
        let result = adapter(shell("sleep 30")).fetch(&test_context(false)).await;
        assert!(result.unwrap_err().to_string().contains("killed"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_hung_child_takes_its_descendants_down() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("browser.pid");
        let script = format!("sleep 60 & echo $! > '{}'; wait", pidfile.display());

        let mut adapter = adapter(shell(&script));
        adapter.browser.timeout_secs = 1;
        let result = adapter.fetch(&test_context(false)).await;
        assert!(result.unwrap_err().to_string().contains("killed"));

        let pid = std::fs::read_to_string(&pidfile).unwrap();
        let stat = std::path::PathBuf::from(format!("/proc/{}/stat", pid.trim()));
        let mut gone = false;
        for _ in 0..20 {
            gone = match std::fs::read_to_string(&stat) {
                Err(_) => true,
                // Reparented and not yet reaped.
                Ok(line) => line.rsplit(')').next().is_some_and(|rest| rest.trim_start().starts_with('Z')),
            };
            if gone {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(gone, "descendant {} outlived the renderer", pid.trim());
    }
}
