use clap::Parser;
use eyre::WrapErr;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use melodymatchr_http_client::SongServiceClient;
use models::config::{ServiceConfig, SessionConfig};

use crate::cli::{Command, RootArgs};

mod cli;
mod interactive;
mod render;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = RootArgs::parse();
    let mut config = ServiceConfig::from_env().wrap_err("load service config")?;
    if let Some(url) = args.api_url.as_deref() {
        config.base_url = url.trim().trim_end_matches('/').to_string();
    }
    tracing::debug!(base_url = %config.base_url, "using song service");

    let client = SongServiceClient::new(&config).wrap_err("initialize http client")?;

    match args.command {
        Command::Health => {
            let status = client.check_health().await.wrap_err("health check")?;
            println!("status={status}");
        }
        Command::Search { query, max_results } => {
            let results = client
                .search_by_name(&query, max_results)
                .await
                .wrap_err("search songs")?;
            print_json(&results)?;
        }
        Command::Suggest {
            prefix,
            max_results,
        } => {
            let token = CancellationToken::new();
            let suggestions = client
                .search_by_prefix(&prefix, max_results, &token)
                .await
                .wrap_err("prefix search")?;
            print_json(&suggestions)?;
        }
        Command::Similarity { a, b } => {
            let similarity = client
                .compute_similarity(&a, &b)
                .await
                .wrap_err("compute similarity")?;
            println!("similarity={similarity:.4}");
        }
        Command::Match {
            target,
            candidates,
            top_k,
            algorithm,
        } => {
            let matches = client
                .match_against_candidates(&target, &candidates.0, top_k, algorithm)
                .await
                .wrap_err("match candidates")?;
            print_json(&matches)?;
        }
        Command::Recommend {
            song,
            top_k,
            algorithm,
        } => {
            let response = client
                .recommend(&song, top_k, algorithm)
                .await
                .wrap_err("recommend songs")?;
            print_json(&response)?;
        }
        Command::Predict {
            song,
            tolerance,
            top_k,
        } => {
            let predictions = client
                .predict_similar(&song, tolerance, top_k)
                .await
                .wrap_err("predict similar songs")?;
            print_json(&predictions)?;
        }
        Command::Interactive { algorithm } => {
            let mut session_config = SessionConfig::from_env().wrap_err("load session config")?;
            if let Some(algorithm) = algorithm {
                session_config.algorithm = algorithm;
            }
            interactive::run(client, session_config).await?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("serialize output")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
