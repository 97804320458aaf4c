use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookstats::logging::init("info").context("init logging")?;

    let cli = bookstats::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookstats::cli::Command::Charts(args) => {
            bookstats::commands::charts(args).await.context("charts")?;
        }
        bookstats::cli::Command::Series(args) => {
            bookstats::commands::series(args).await.context("series")?;
        }
        bookstats::cli::Command::Select(args) => {
            bookstats::commands::select(args).await.context("select")?;
        }
        bookstats::cli::Command::Shelf(args) => {
            bookstats::commands::shelf(args).await.context("shelf")?;
        }
    }

    Ok(())
}
