//! Website screenshots through a headless Chromium-family browser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Error, Result};
use crate::paths;
use crate::runner::{CommandRunner, Invocation};
use crate::utils::io;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Contents of `screenshot.config.conf` (JSON).
///
/// `cookies`, `waitForSelector`, `fullPage` and `quality` are parsed so that
/// configs written for a browser automation driver are not silently misread;
/// see [`check_supported`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotConfig {
    #[serde(default)]
    pub viewport: Viewport,
    /// Navigation timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default = "default_browser")]
    pub browser: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            timeout: default_timeout(),
            user_agent: None,
            browser: default_browser(),
            cookies: Vec::new(),
            wait_for_selector: None,
            full_page: None,
            quality: None,
        }
    }
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

fn default_timeout() -> u64 {
    30000
}

fn default_browser() -> String {
    "chromium".to_string()
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timeout: Option<u64>,
    pub browser: Option<String>,
}

impl ScreenshotConfig {
    pub fn with_overrides(mut self, overrides: &ScreenshotOverrides) -> Self {
        if let Some(width) = overrides.width {
            self.viewport.width = width;
        }
        if let Some(height) = overrides.height {
            self.viewport.height = height;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(browser) = &overrides.browser {
            self.browser = browser.clone();
        }
        self
    }
}

/// Load the config file merged over defaults. A missing or unreadable file
/// falls back to defaults with a log line.
pub fn load_config(root: &Path) -> ScreenshotConfig {
    let path = paths::screenshot_config(root);
    match crate::config::load::<ScreenshotConfig>(&path) {
        Ok(Some(config)) => {
            crate::log_success!("screenshot", "Loaded configuration from {}", path.display());
            config
        }
        Ok(None) => {
            crate::log_info!(
                "screenshot",
                "No config file found at {}, using defaults",
                path.display()
            );
            ScreenshotConfig::default()
        }
        Err(err) => {
            crate::log_error!("screenshot", "Error loading config file: {}", err);
            crate::log_warning!("screenshot", "Using default configuration");
            ScreenshotConfig::default()
        }
    }
}

/// URLs from `--urls` (comma or whitespace separated) and/or a file with one
/// URL per line.
pub fn collect_urls(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut collected: Vec<String> = urls
        .iter()
        .flat_map(|u| u.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
        .collect();

    if let Some(file) = file {
        let content = io::read_file(file, &format!("read {}", file.display()))?;
        collected.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
    }

    Ok(collected)
}

/// `<hostname with dots replaced by underscores>_<unix millis>.png`
pub fn screenshot_filename(url: &str, millis: i64) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| {
        Error::validation_invalid_argument("url", format!("Invalid URL '{}': {}", url, e), None, None)
    })?;
    let host = parsed.host_str().ok_or_else(|| {
        Error::validation_invalid_argument(
            "url",
            format!("URL '{}' has no hostname", url),
            None,
            None,
        )
    })?;
    Ok(format!("{}_{}.png", host.replace('.', "_"), millis))
}

/// Reject settings the headless browser command line cannot honour.
///
/// Cookies and selector waits change what gets captured, so they fail before
/// any browser starts. Full-page and quality only change the image and are
/// reported as warnings.
pub fn check_supported(config: &ScreenshotConfig) -> Result<()> {
    if !config.cookies.is_empty() {
        return Err(Error::config_invalid_value(
            "cookies",
            None,
            "cookies cannot be set through the headless browser command line",
        )
        .with_hint(
            "Remove \"cookies\" from screenshot.config.conf or capture a page that needs no login",
        ));
    }
    if let Some(selector) = &config.wait_for_selector {
        return Err(Error::config_invalid_value(
            "waitForSelector",
            Some(selector.clone()),
            "the headless browser command line cannot wait for a selector",
        )
        .with_hint(
            "Remove \"waitForSelector\" from screenshot.config.conf; --timeout bounds page loading",
        ));
    }
    if config.full_page == Some(true) {
        crate::log_warning!(
            "screenshot",
            "fullPage is not available from the browser command line; capturing the {}x{} viewport",
            config.viewport.width,
            config.viewport.height
        );
    }
    if config.quality.is_some() {
        crate::log_warning!("screenshot", "quality applies to JPEG only; PNG output ignores it");
    }
    Ok(())
}

pub fn browser_invocation(config: &ScreenshotConfig, url: &str, output: &Path) -> Invocation {
    let mut inv = Invocation::new(config.browser.as_str()).args([
        "--headless".to_string(),
        "--disable-gpu".to_string(),
        "--hide-scrollbars".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
        format!("--timeout={}", config.timeout),
        format!("--screenshot={}", output.display()),
    ]);
    if let Some(agent) = &config.user_agent {
        inv = inv.arg(format!("--user-agent={}", agent));
    }
    inv.arg(url)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Captured {
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub output_dir: PathBuf,
    pub config: ScreenshotConfig,
    pub captured: Vec<Captured>,
    pub failed: Vec<CaptureFailure>,
}

/// Capture each URL in turn. A failing URL is logged and the run continues.
pub fn capture<C>(
    urls: &[String],
    output_dir: &Path,
    config: &ScreenshotConfig,
    runner: &dyn CommandRunner,
    now_millis: C,
) -> Result<CaptureReport>
where
    C: Fn() -> i64,
{
    if urls.is_empty() {
        return Err(Error::validation_missing_argument(vec!["urls".to_string()])
            .with_hint("Use --urls or --file to provide URLs"));
    }

    check_supported(config)?;
    io::ensure_dir(output_dir, "create screenshot directory")?;
    crate::log_info!(
        "screenshot",
        "Starting screenshot capture for {} URLs",
        urls.len()
    );

    let mut captured = Vec::new();
    let mut failed = Vec::new();

    for (index, url) in urls.iter().enumerate() {
        crate::log_info!(
            "screenshot",
            "[{}/{}] Navigating to: {}",
            index + 1,
            urls.len(),
            url
        );

        let attempt = screenshot_filename(url, now_millis()).and_then(|filename| {
            let path = output_dir.join(filename);
            runner.run(&browser_invocation(config, url, &path))?;
            Ok(path)
        });

        match attempt {
            Ok(path) => {
                crate::log_success!("screenshot", "Screenshot saved to: {}", path.display());
                captured.push(Captured {
                    url: url.clone(),
                    path,
                });
            }
            Err(err) => {
                crate::log_error!(
                    "screenshot",
                    "Failed to capture screenshot for {}: {}",
                    url,
                    err
                );
                failed.push(CaptureFailure {
                    url: url.clone(),
                    error: err.message,
                });
            }
        }
    }

    crate::log_success!("screenshot", "All screenshots captured");

    Ok(CaptureReport {
        output_dir: output_dir.to_path_buf(),
        config: config.clone(),
        captured,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn filename_uses_hostname_and_timestamp() {
        assert_eq!(
            screenshot_filename("https://www.example.com/pricing?x=1", 1700000000123).unwrap(),
            "www_example_com_1700000000123.png"
        );
    }

    #[test]
    fn filename_rejects_invalid_url() {
        assert!(screenshot_filename("not a url", 1).is_err());
    }

    #[test]
    fn file_values_override_defaults_field_by_field() {
        let config: ScreenshotConfig =
            serde_json::from_str(r#"{"viewport": {"width": 1920}, "fullPage": false}"#).unwrap();

        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.viewport.height, 800);
        assert_eq!(config.timeout, 30000);
        assert_eq!(config.browser, "chromium");
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let config = ScreenshotConfig {
            timeout: 5000,
            ..Default::default()
        }
        .with_overrides(&ScreenshotOverrides {
            height: Some(600),
            browser: Some("google-chrome".to_string()),
            ..Default::default()
        });

        assert_eq!(config.viewport, Viewport { width: 1280, height: 600 });
        assert_eq!(config.timeout, 5000);
        assert_eq!(config.browser, "google-chrome");
    }

    #[test]
    fn load_config_reads_file_from_temp_dir() {
        let dir = TempDir::new().unwrap();
        let path = paths::screenshot_config(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"userAgent": "bot/1.0", "timeout": 1000}"#).unwrap();

        let config = load_config(dir.path());

        assert_eq!(config.user_agent.as_deref(), Some("bot/1.0"));
        assert_eq!(config.timeout, 1000);
        assert_eq!(config.viewport, Viewport::default());
    }

    #[test]
    fn load_config_falls_back_on_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = paths::screenshot_config(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert_eq!(load_config(dir.path()), ScreenshotConfig::default());
    }

    #[test]
    fn collect_urls_splits_and_reads_file() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("urls.txt");
        fs::write(&list, "https://c.example\n\n  https://d.example  \n").unwrap();

        let urls = collect_urls(
            &["https://a.example,https://b.example".to_string()],
            Some(&list),
        )
        .unwrap();

        assert_eq!(
            urls,
            vec![
                "https://a.example",
                "https://b.example",
                "https://c.example",
                "https://d.example"
            ]
        );
    }

    #[test]
    fn browser_invocation_carries_viewport_timeout_and_agent() {
        let config = ScreenshotConfig {
            user_agent: Some("bot/1.0".to_string()),
            ..Default::default()
        };
        let inv = browser_invocation(&config, "https://example.com", Path::new("/tmp/a.png"));

        assert_eq!(inv.program, "chromium");
        assert!(inv.args.contains(&"--window-size=1280,800".to_string()));
        assert!(inv.args.contains(&"--timeout=30000".to_string()));
        assert!(inv.args.contains(&"--screenshot=/tmp/a.png".to_string()));
        assert!(inv.args.contains(&"--user-agent=bot/1.0".to_string()));
        assert_eq!(inv.args.last().map(String::as_str), Some("https://example.com"));
    }

    #[test]
    fn capture_continues_after_a_failed_url() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_on("https://down.example", "net::ERR_NAME_NOT_RESOLVED");
        let urls = vec![
            "https://down.example".to_string(),
            "https://up.example".to_string(),
            "no-scheme".to_string(),
        ];

        let report = capture(&urls, dir.path(), &ScreenshotConfig::default(), &runner, || 42).unwrap();

        assert_eq!(report.captured.len(), 1);
        assert_eq!(report.captured[0].path, dir.path().join("up_example_42.png"));
        assert_eq!(report.failed.len(), 2);
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn automation_only_keys_are_parsed_from_file() {
        let config: ScreenshotConfig = serde_json::from_str(
            r#"{"cookies": [{"name": "session", "value": "abc", "domain": "example.com"}],
                "waitForSelector": "main", "fullPage": true, "quality": 80}"#,
        )
        .unwrap();

        assert_eq!(config.cookies[0]["name"], "session");
        assert_eq!(config.wait_for_selector.as_deref(), Some("main"));
        assert_eq!(config.full_page, Some(true));
        assert_eq!(config.quality, Some(80));
    }

    #[test]
    fn cookies_fail_before_any_browser_runs() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let config = ScreenshotConfig {
            cookies: vec![serde_json::json!({"name": "session", "value": "abc"})],
            ..Default::default()
        };

        let urls = vec!["https://example.com".to_string()];

        let err = capture(&urls, dir.path(), &config, &runner, || 1).unwrap_err();

        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "cookies");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn wait_for_selector_is_rejected() {
        let config = ScreenshotConfig {
            wait_for_selector: Some("#app".to_string()),
            ..Default::default()
        };

        let err = check_supported(&config).unwrap_err();

        assert_eq!(err.details["key"], "waitForSelector");
        assert_eq!(err.details["value"], "#app");
    }

    #[test]
    fn full_page_and_quality_only_warn() {
        let config = ScreenshotConfig {
            full_page: Some(true),
            quality: Some(80),
            ..Default::default()
        };

        assert!(check_supported(&config).is_ok());
    }

    #[test]
    fn capture_without_urls_is_an_error() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();

        let err = capture(&[], dir.path(), &ScreenshotConfig::default(), &runner, || 0).unwrap_err();

        assert_eq!(err.code.as_str(), "validation.missing_argument");
    }
}
