use std::{sync::Arc, time::Duration};

use anyhow::Result;
use cinefind_core::{
    AppwriteCounter, Config, DisabledCounter, DiscoverySession, FileCounter, PopularityCounter,
    ResolutionPolicy, SearchExecutor, TmdbClient, TracingSink, TrendingLoader, ViewState,
};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};

use crate::{
    logging::{Verbosity, init_subscriber},
    render::{create_spinner, follow, print_state, print_trending, section_title},
};

mod logging;
mod render;

/// Where search counts are kept
#[derive(Clone, Copy, Default, ValueEnum)]
enum CounterBackend {
    /// Appwrite when configured, otherwise the local file
    #[default]
    Auto,
    Appwrite,
    File,
    #[value(name = "none")]
    Disabled,
}

#[derive(Parser)]
#[command(name = "cinefind")]
#[command(about = "Search movies, browse popular titles and see what others are searching for")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Backend for search counts and trending searches
    #[arg(long, value_enum, default_value = "auto", global = true)]
    counter: CounterBackend,

    /// When searches overlap, show only the most recently started one
    #[arg(long, global = true)]
    latest_wins: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog once
    Search {
        /// Search text; empty lists popular titles
        query: String,
    },
    /// List popular titles
    Popular,
    /// Show the most searched terms
    Trending,
    /// Type a query per line; results refresh once typing pauses
    Interactive,
}

fn build_counter(backend: CounterBackend, config: &Config) -> Result<Arc<dyn PopularityCounter>> {
    let counter: Arc<dyn PopularityCounter> = match (backend, &config.appwrite) {
        (CounterBackend::Auto | CounterBackend::Appwrite, Some(appwrite)) => {
            Arc::new(AppwriteCounter::new(appwrite, config.trending_limit)?)
        }
        (CounterBackend::Appwrite, None) => anyhow::bail!(
            "--counter appwrite needs APPWRITE_PROJECT_ID, APPWRITE_DATABASE_ID and APPWRITE_COLLECTION_ID"
        ),
        (CounterBackend::Auto | CounterBackend::File, _) => {
            let counter = FileCounter::in_data_dir(config.trending_limit);
            tracing::debug!(path = %counter.path().display(), "Using local search counts");
            Arc::new(counter)
        }
        (CounterBackend::Disabled, _) => Arc::new(DisabledCounter),
    };
    Ok(counter)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color);

    let config = Config::from_env()?;
    if !config.has_api_key() {
        tracing::warn!("TMDB_API_KEY is not set; catalog requests will be rejected");
    }

    let catalog = Arc::new(TmdbClient::new(&config.tmdb)?);
    let counter = build_counter(cli.counter, &config)?;
    let sink = Arc::new(TracingSink);
    let policy = if cli.latest_wins {
        ResolutionPolicy::LatestRequestWins
    } else {
        ResolutionPolicy::LastResolvedWins
    };

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Search { query } => {
            let executor = SearchExecutor::new(catalog, counter, sink, policy);
            run_once(&executor, query.trim()).await
        }
        Command::Popular => {
            let executor = SearchExecutor::new(catalog, counter, sink, policy);
            run_once(&executor, "").await
        }
        Command::Trending => {
            let loader = TrendingLoader::new(counter, sink);
            let spinner = create_spinner("Loading trending searches...");
            loader.load_once().await;
            spinner.finish_and_clear();

            let entries = loader.current();
            if entries.is_empty() {
                println!("{}", style("No trending searches yet.").dim());
            } else {
                print_trending(&entries);
            }
            Ok(())
        }
        Command::Interactive => {
            let session = Arc::new(DiscoverySession::new(&config, catalog, counter, sink, policy));
            interactive(session, &config).await
        }
    }
}

async fn run_once(executor: &SearchExecutor, query: &str) -> Result<()> {
    let spinner = create_spinner(&format!("Loading {}...", section_title(query).to_lowercase()));
    let run = executor.execute(query).await;
    spinner.finish_and_clear();

    print_state(&section_title(query), &run.state);

    // The view is already printed; only keep the process alive for the count.
    if let Some(handle) = run.search_count
        && let Err(e) = handle.await
    {
        tracing::warn!(error = %e, "Search count task ended abnormally");
    }

    if let ViewState::Error(_) = run.state {
        std::process::exit(1);
    }
    Ok(())
}

async fn interactive(session: Arc<DiscoverySession>, config: &Config) -> Result<()> {
    println!(
        "\n{}  {}\n",
        style("cinefind").cyan().bold(),
        style("type a movie title, empty line for popular, Ctrl-D to quit").dim()
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let renderer = {
        let titles = Arc::clone(&session);
        tokio::spawn(follow(
            session.view(),
            session.trending(),
            move || titles.stabilized_query(),
            shutdown_tx.subscribe(),
        ))
    };

    let running = Arc::clone(&session);
    let session_task = tokio::spawn(async move { running.run(shutdown_rx).await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => session.set_query(line.trim()),
                None => {
                    // Let the last query settle and its search finish before leaving.
                    tokio::time::sleep(config.debounce + Duration::from_millis(50)).await;
                    let mut view = session.view();
                    let _ = view.wait_for(|state| !state.is_loading()).await;
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = shutdown_tx.send(());
    session_task.await?;
    renderer.await?;
    Ok(())
}
