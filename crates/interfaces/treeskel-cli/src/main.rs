use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use treeskel_cli::{commands, CliFormat};
use treeskel_config::{log_filter, ENV_ASSUME_YES, ENV_LOG_FILTER};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recreate SOURCE's directory tree under TARGET with empty placeholder files
    Copy {
        source: String,
        target: String,
        #[arg(
            short,
            long,
            env = ENV_ASSUME_YES,
            value_parser = BoolishValueParser::new(),
            help = "Continue without asking when TARGET is not empty"
        )]
        yes: bool,
        #[arg(long, value_enum, default_value_t = CliFormat::Text)]
        format: CliFormat,
    },
    /// Run every pre-copy check without writing anything
    Check { source: String, target: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = log_filter(cli.verbose, std::env::var(ENV_LOG_FILTER).ok().as_deref());
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("default subscriber")?;

    match cli.command {
        Commands::Copy {
            source,
            target,
            yes,
            format,
        } => {
            let report = commands::cmd_copy(source, target, yes, format)?;
            if !report.is_completed() {
                anyhow::bail!("Copy aborted: {}", report);
            }
        }
        Commands::Check { source, target } => {
            commands::cmd_check(source, target)?;
        }
    }

    Ok(())
}
