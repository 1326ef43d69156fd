use anyhow::{bail, Result};
use clap::Parser;
use scary_story::client::ads::{AdCoordinator, NoAds};
use scary_story::client::api::StoryApiClient;
use scary_story::client::flow::{GenerationStart, Screen, SubmissionFlow};
use scary_story::client::keywords::KeywordBoard;
use scary_story::client::ClientConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "scary-story")]
#[command(about = "Request a scary story from the backend")]
struct CliArgs {
    /// Up to 10 keywords.
    #[arg(value_name = "KEYWORD", required = true)]
    keywords: Vec<String>,

    /// Backend base URL (overrides STORY_API_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// Start generation without waiting for the ad to finish.
    #[arg(long)]
    concurrent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scary_story=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = args.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }

    let mut board = KeywordBoard::new();
    for keyword in &args.keywords {
        if let Err(e) = board.add(keyword) {
            bail!("{}: {}", keyword, e.user_message());
        }
    }

    let start = if args.concurrent {
        GenerationStart::Concurrent
    } else {
        GenerationStart::AfterAd
    };

    info!("Requesting story from {}", config.api_url);
    let mut flow = SubmissionFlow::new(
        AdCoordinator::new(Arc::new(NoAds)),
        Arc::new(StoryApiClient::new(config)),
        start,
    );

    match flow.submit(&board).await {
        Screen::Result(story) => {
            println!("{}\n", story.title);
            println!("{}\n", story.content);
            println!("{}", story.image_url);
            Ok(())
        }
        Screen::Error(message) => bail!(message),
        Screen::Intro {
            message: Some(message),
        } => bail!(message),
        Screen::Intro { message: None } | Screen::Loading => bail!("story was not generated"),
    }
}
