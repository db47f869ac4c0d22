use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk::app::AppContext;
use newsdesk::cli::{commands, Cli, Commands};
use newsdesk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so listings on stdout stay clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = if cli.ephemeral {
        AppContext::in_memory(Config::load()?)?
    } else {
        AppContext::new(cli.db)?
    };

    match cli.command {
        Commands::Headlines { refresh } => {
            commands::headlines(&ctx, refresh).await?;
        }
        Commands::Category {
            name,
            sort,
            refresh,
        } => {
            commands::category(&ctx, &name, sort, refresh).await?;
        }
        Commands::Search { query, filters } => {
            commands::search(&ctx, &query, filters.into()).await?;
        }
        Commands::Videos { refresh } => {
            commands::videos(&ctx, refresh).await?;
        }
        Commands::Blogs {
            number,
            sort,
            refresh,
        } => {
            commands::blogs(&ctx, number, sort, refresh).await?;
        }
        Commands::Show { id } => {
            commands::show(&ctx, &id)?;
        }
        Commands::Save { id } => {
            commands::save(&ctx, &id)?;
        }
        Commands::Unsave { id } => {
            commands::unsave(&ctx, &id)?;
        }
        Commands::Saved { sort } => {
            commands::saved(&ctx, sort)?;
        }
    }

    Ok(())
}
