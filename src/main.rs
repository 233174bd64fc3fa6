use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{db, env, index, publish, screenshot, version};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "next-toolchain")]
#[command(version = VERSION)]
#[command(about = "Database lifecycle, .env management and package tooling for web projects")]
struct Cli {
    /// Database environment file (default: .next-toolchain-temp/db.conf)
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Postgres database pair operations
    Db(db::DbArgs),
    /// Project .env management
    Env(env::EnvArgs),
    /// Version management for package.json
    Version(version::VersionArgs),
    /// Publish the package to npm
    Publish(publish::PublishArgs),
    /// Capture page screenshots with a headless browser
    Screenshot(screenshot::ScreenshotArgs),
    /// Generate index.ts barrel files
    Index(index::IndexArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        env_file: cli.env_file,
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_required_argument_is_a_usage_error() {
        let err = Cli::try_parse_from(["next-toolchain", "version", "bump"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_unknown_bump_type() {
        assert!(Cli::try_parse_from(["next-toolchain", "version", "bump", "huge"]).is_err());
    }

    #[test]
    fn env_file_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "next-toolchain",
            "db",
            "test",
            "--env-file",
            "prod.env",
        ])
        .unwrap();
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
    }

    #[test]
    fn index_build_requires_a_directory() {
        assert!(Cli::try_parse_from(["next-toolchain", "index", "build"]).is_err());
    }

    #[test]
    fn exit_codes_are_clamped() {
        assert_eq!(exit_code_to_u8(-3), 0);
        assert_eq!(exit_code_to_u8(1), 1);
        assert_eq!(exit_code_to_u8(900), 255);
    }
}
