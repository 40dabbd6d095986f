//! Query TMDB through the library client and print the normalized records.
//! Usage:
//!   cargo run --bin tmdb_probe -- trending <all|movie|tv> <day|week>
//!   cargo run --bin tmdb_probe -- popular <movie|tv>
//!   cargo run --bin tmdb_probe -- search <query...>
//!   cargo run --bin tmdb_probe -- type <keystroke> <keystroke>...
//!   cargo run --bin tmdb_probe -- details <movie|tv> <tmdb_id>
//!   cargo run --bin tmdb_probe -- discover <movie|tv> <genre_ids|-> <year_from> <year_to> <min_rating>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use cinemax::config::Settings;
use cinemax::filters::{compose_discover_params, FilterSet};
use cinemax::models::{ContentItem, MediaType, TimeWindow, TrendingScope};
use cinemax::search::SearchDebouncer;
use cinemax::tmdb::{TmdbApi, TmdbClient};
use dotenvy::dotenv;
use std::collections::BTreeSet;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const KEYSTROKE_GAP: Duration = Duration::from_millis(150);

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin tmdb_probe -- trending <all|movie|tv> <day|week>");
    eprintln!("       cargo run --bin tmdb_probe -- popular <movie|tv>");
    eprintln!("       cargo run --bin tmdb_probe -- search <query...>");
    eprintln!("       cargo run --bin tmdb_probe -- type <keystroke> <keystroke>...");
    eprintln!("       cargo run --bin tmdb_probe -- details <movie|tv> <tmdb_id>");
    eprintln!(
        "       cargo run --bin tmdb_probe -- discover <movie|tv> <genre_ids|-> <year_from> <year_to> <min_rating>"
    );
    std::process::exit(1);
}

fn arg(args: &[String], idx: usize) -> Result<&str> {
    args.get(idx)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("missing argument #{}", idx))
}

fn print_items(items: &[ContentItem]) {
    println!("{} items", items.len());
    for item in items {
        println!(
            "  [{}] {:>8}  {:<40} {}  {}",
            item.media_type(),
            item.id(),
            item.title(),
            item.rating_label(),
            item.release_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "----".to_string())
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let settings = Settings::from_env()?;
    let client = Arc::new(TmdbClient::from_settings(&settings)?);

    match args[1].as_str() {
        "trending" => {
            let scope: TrendingScope = arg(&args, 2)?.parse()?;
            let window: TimeWindow = arg(&args, 3)?.parse()?;
            print_items(&client.trending(scope, window).await);
        }
        "popular" => {
            let media_type: MediaType = arg(&args, 2)?.parse()?;
            print_items(&client.popular(media_type).await);
        }
        "search" => {
            let query = args[2..].join(" ");
            print_items(&client.search_multi(&query).await);
        }
        "type" => {
            // Each argument is the input box contents after one keystroke.
            let keystrokes = &args[2..];
            if keystrokes.is_empty() {
                usage();
            }
            let debouncer = SearchDebouncer::from_settings(client.clone(), &settings);
            let mut rx = debouncer.subscribe();
            let mut last = 0;
            for text in keystrokes {
                last = debouncer.input(text);
                println!("token {} <- {:?}", last, text);
                tokio::time::sleep(KEYSTROKE_GAP).await;
            }
            println!("waiting {:?} quiet period", debouncer.delay());
            let outcome = rx
                .wait_for(|o| o.token == last)
                .await
                .context("search channel closed")?
                .clone();
            println!("token {} -> {:?}", outcome.token, outcome.query);
            print_items(&outcome.items);
        }
        "details" => {
            let media_type: MediaType = arg(&args, 2)?.parse()?;
            let id: u64 = arg(&args, 3)?
                .parse()
                .context("tmdb_id must be an integer")?;
            let item = client.details(id, media_type).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        "discover" => {
            let media_type: MediaType = arg(&args, 2)?.parse()?;
            let genre_ids = match arg(&args, 3)? {
                "-" => BTreeSet::new(),
                list => list
                    .split(',')
                    .map(|g| g.trim().parse::<u32>())
                    .collect::<Result<BTreeSet<_>, _>>()
                    .context("genre ids must be comma-separated integers")?,
            };
            let year_from: i32 = arg(&args, 4)?.parse().context("year_from must be an integer")?;
            let year_to: i32 = arg(&args, 5)?.parse().context("year_to must be an integer")?;
            let min_rating: f64 = arg(&args, 6)?.parse().context("min_rating must be a number")?;
            let filters = FilterSet::new(genre_ids, Some(year_from), Some(year_to), min_rating)?;
            for (key, value) in compose_discover_params(media_type, &filters) {
                println!("{} = {}", key, value);
            }
            print_items(&client.discover(media_type, &filters).await);
        }
        _ => usage(),
    }

    Ok(())
}
