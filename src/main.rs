//! Teleconnection map dashboard - main entry point
//!
//! Loads the precomputed correlation and non-stationarity tables, composes
//! the configured map figures once, and serves them as an interactive web
//! dashboard.
//!
//! Module organization:
//! - `telec`: tables, grid, points, projection, palettes, boundaries
//! - `figure`: layer composition and SVG rendering
//! - `config`: declarative run configuration
//! - `pipeline`: the staged load-compose-render run
//! - `dashboard`: the HTTP presentation layer

pub mod config;
pub mod dashboard;
pub mod figure;
pub mod pipeline;
pub mod telec;

use std::path::PathBuf;

#[tokio::main]
async fn main() {
    println!("Teleconnection map dashboard v{}", env!("CARGO_PKG_VERSION"));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args(&std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(args).await {
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = config::DashboardConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let model = pipeline::build(&config).await?;
    dashboard::serve(&config, model).await?;
    Ok(())
}

#[derive(Debug, Default)]
struct CliArgs {
    config: Option<PathBuf>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
}

/// Scan command-line arguments; unknown flags are ignored
fn parse_args(args: &[String]) -> CliArgs {
    let mut out = CliArgs::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--port" if i + 1 < args.len() => {
                out.port = args[i + 1].parse().ok();
                i += 2;
            }
            "--data-dir" if i + 1 < args.len() => {
                out.data_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            _ => i += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_scan_picks_up_known_flags() {
        let args: Vec<String> = ["telemap", "--port", "9001", "--data-dir", "/tmp/tables"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = parse_args(&args);
        assert_eq!(parsed.port, Some(9001));
        assert_eq!(parsed.data_dir.as_deref(), Some(std::path::Path::new("/tmp/tables")));
        assert!(parsed.config.is_none());
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let args: Vec<String> = ["telemap", "--verbose", "--config"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let parsed = parse_args(&args);
        assert!(parsed.config.is_none());
        assert!(parsed.port.is_none());
    }
}
