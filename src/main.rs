//! shconf - Turn indented device configuration dumps into queryable trees
//!
//! shconf provides:
//! - Hierarchy rebuilding from indentation
//! - Token-keyed normalization with conflict reporting
//! - A small path-expression language with context modes
//! - Show-command capture splitting
//! - Unified output format (jsonl/json/yaml/raw)

use anyhow::Result;
use clap::Parser;
use shconf::cli;

fn init_logging(default_filter: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries results only
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.log_filter());
    cli::run(cli)
}
