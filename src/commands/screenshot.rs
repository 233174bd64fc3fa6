use clap::Args;
use std::path::PathBuf;

use toolchain::paths;
use toolchain::runner::SystemRunner;
use toolchain::screenshot::{self, CaptureReport, ScreenshotOverrides};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ScreenshotArgs {
    /// URLs to capture
    #[arg(short, long, num_args = 1..)]
    urls: Vec<String>,

    /// File with one URL per line
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output directory (default: .next-toolchain-temp/screenshots)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Viewport width
    #[arg(short, long)]
    width: Option<u32>,

    /// Viewport height
    #[arg(long)]
    height: Option<u32>,

    /// Per-page timeout in milliseconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Browser executable
    #[arg(short, long)]
    browser: Option<String>,
}

pub fn run(args: ScreenshotArgs, global: &GlobalArgs) -> CmdResult<CaptureReport> {
    let root = global.root()?;

    let urls = screenshot::collect_urls(&args.urls, args.file.as_deref())?;
    let config = screenshot::load_config(&root).with_overrides(&ScreenshotOverrides {
        width: args.width,
        height: args.height,
        timeout: args.timeout,
        browser: args.browser,
    });
    let output_dir = args
        .output
        .map(|dir| if dir.is_absolute() { dir } else { root.join(dir) })
        .unwrap_or_else(|| paths::screenshots_dir(&root));

    let report = screenshot::capture(&urls, &output_dir, &config, &SystemRunner, || {
        chrono::Utc::now().timestamp_millis()
    })?;

    Ok((report, 0))
}
