use clap::Parser;
use clap_handler::Handler;

mod commands;
mod config;

#[derive(Parser, Clone)]
#[clap(name = "kirinuki", version)]
struct KirinukiArgs {
    /// Log debug messages
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: commands::KirinukiCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = KirinukiArgs::parse();

    let default_level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    args.command.run().await
}
