use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use beltline_runner::Cli;

fn main() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();

    let cli = Cli::parse();

    if let Err(e) = beltline_runner::run(cli) {
        tracing::error!(error = %e, "beltline stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
