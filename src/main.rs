use std::error::Error;
use std::io::IsTerminal;
use std::path::Path;

use clap::Parser;
use dialoguer::Confirm;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use github_user_finder_lib::render::{error_banner, render_list};
use github_user_finder_lib::server::start_server;
use github_user_finder_lib::thumbnail::{encode_png, thumbnail_all, AvatarLoader};
use github_user_finder_lib::{
    Args, Command, Config, FindClient, FinderAction, FinderState, InfiniteFinder, SearchArgs,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize the tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command {
        Command::Serve {
            port,
            token,
            github_api_url,
        } => {
            let config = config
                .with_port(port)
                .with_token(token)
                .with_github_api_url(github_api_url);
            start_server(&config).await?;
        }
        Command::Search(search) => run_search(config, search).await?,
        Command::Thumb { url, output } => {
            let loader = AvatarLoader::new(Client::builder().user_agent("github-user-finder").build()?);
            if let Some(rgba) = loader.load(&url).await? {
                tokio::fs::write(&output, encode_png(rgba)?).await?;
                info!("Wrote thumbnail to {}", output.display());
            }
        }
    }

    Ok(())
}

async fn run_search(config: Config, search: SearchArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = config.with_finder_api_url(search.api_url.clone());

    let mut state = FinderState::default();
    state.dispatch(FinderAction::SetSearchString(Some(search.search_string())));
    state.dispatch(FinderAction::SetSortOption(Some(search.sort)));
    state.dispatch(FinderAction::SetFilterOption(Some(search.filters()?.to_filter_string())));

    let query = state.query();
    if query.is_skipped() {
        warn!("Nothing to search for");
        return Ok(());
    }
    info!("Searching for '{}' sorted by {}", query.q(), query.sort);

    let mut finder = InfiniteFinder::new(FindClient::new(&config)?, query);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));

    loop {
        pb.set_message(format!("Loading '{}'", finder.state().query().q()));
        finder.fetch_all(Some(search.max_pages)).await;

        if !confirm_retry(&pb, &finder)? {
            break;
        }
        // A successful retry resumes loading up to the page limit.
        finder.retry().await;
    }
    pb.finish_and_clear();

    print!("{}", render_list(finder.state(), finder.state().query().sort.as_str()));

    if let Some(path) = &search.output {
        write_users(path, &finder).await?;
    }

    if let Some(dir) = &search.thumbnails {
        write_thumbnails(dir, &finder, search.concurrency).await?;
    }

    if let Some(err) = finder.state().error() {
        error!("Search ended with error {}: {}", err.status, err.message);
    }

    Ok(())
}

/// Shows the error banner and asks whether to request the failed page again.
/// The full list is printed once, after the last attempt.
fn confirm_retry(pb: &ProgressBar, finder: &InfiniteFinder) -> dialoguer::Result<bool> {
    let Some(err) = finder.state().error() else {
        return Ok(false);
    };
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }

    pb.suspend(|| {
        println!("{}", error_banner(err));
        Confirm::new().with_prompt("Retry?").default(true).interact()
    })
}

async fn write_users(path: &Path, finder: &InfiniteFinder) -> Result<(), Box<dyn Error + Send + Sync>> {
    let users: Vec<_> = finder.state().users().collect();
    let json = serde_json::to_string_pretty(&users)?;
    tokio::fs::write(path, json).await?;
    info!("Saved {} users to '{}'", users.len(), path.display());
    Ok(())
}

async fn write_thumbnails(
    dir: &Path,
    finder: &InfiniteFinder,
    concurrency: usize,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    tokio::fs::create_dir_all(dir).await?;

    let users: Vec<_> = finder.state().users().filter(|u| u.avatar_url.is_some()).collect();
    let urls: Vec<String> = users.iter().filter_map(|u| u.avatar_url.clone()).collect();
    let client = Client::builder().user_agent("github-user-finder").build()?;

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("Rendering avatars");

    let thumbnails = thumbnail_all(&client, &urls, concurrency).await;
    for (user, rgba) in users.iter().zip(thumbnails) {
        pb.inc(1);
        let Some(rgba) = rgba else {
            continue;
        };
        let path = dir.join(format!("{}.png", user.login));
        tokio::fs::write(&path, encode_png(rgba)?).await?;
    }
    pb.finish_with_message("Avatars written");

    info!("Wrote thumbnails to '{}'", dir.display());
    Ok(())
}
