mod card;
mod config;
mod error;
mod extract;
mod fetch;
mod link_table;
mod markup;
mod model;
mod sink;

use crate::{
	config::{ScrapeConfig, Selectors},
	extract::{extract_all, ExtractOptions},
	fetch::{HttpFetcher, PageFetcher},
	link_table::parse_link_table_or_empty,
	model::LinkIndex,
	sink::{LinkSink, RecordSink},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::{collections::HashSet, path::PathBuf, sync::Arc};
use tokio::fs;

const LINKS_FILE: &str = "card_links.csv";
const METADATA_FILE: &str = "card_metadata.csv";

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
	/// Set page listing the cards; defaults to Genetic Apex.
	#[arg(long)]
	index_url: Option<String>,

	/// JSON file overriding site origin, selectors and limits.
	#[arg(long)]
	config: Option<PathBuf>,

	#[arg(short, long, default_value = "output")]
	output_dir: PathBuf,

	/// Parallel detail-page fetches; defaults to the number of CPUs.
	#[arg(short, long)]
	limit: Option<usize>,

	/// Per-page fetch timeout in seconds.
	#[arg(short, long)]
	timeout: Option<u64>,

	/// Only collect the card links, skip the detail pages.
	#[clap(long)]
	links_only: bool,
}

async fn load_config(args: &Args) -> Result<ScrapeConfig> {
	let mut config = match &args.config {
		Some(path) => ScrapeConfig::load(path)
			.await
			.with_context(|| format!("Failed to load config {}", path.display()))?,
		None => ScrapeConfig::default(),
	};

	if let Some(index_url) = &args.index_url {
		config.index_url = index_url.clone();
	}
	if args.limit.is_some() {
		config.workers = args.limit;
	}
	if let Some(timeout) = args.timeout {
		config.fetch_timeout_secs = timeout;
	}

	config.validate()?;
	Ok(config)
}

async fn extract_card_links(
	fetcher: &HttpFetcher,
	selectors: &Selectors,
	config: &ScrapeConfig,
) -> Result<LinkIndex> {
	let html = fetcher
		.fetch(&config.index_url)
		.await
		.with_context(|| format!("Failed to fetch the index page {}", config.index_url))?;

	Ok(parse_link_table_or_empty(&html, selectors, &config.site_origin)?)
}

fn write_links(path: &std::path::Path, index: &LinkIndex, fetched: &HashSet<String>) -> Result<()> {
	let mut sink = LinkSink::open(path)?;
	sink.write_all(index, fetched, chrono::Utc::now())?;
	Ok(())
}

// Main Function
#[tokio::main]
async fn main() -> Result<()> {
	if pretty_env_logger::try_init().is_err() {
		log::warn!("Logger is already initialized.");
	}

	let args = Args::parse();
	let config = load_config(&args).await?;
	let selectors = Arc::new(Selectors::compile(&config.selectors)?);
	let fetcher = Arc::new(HttpFetcher::new(&config)?);

	fs::create_dir_all(&args.output_dir)
		.await
		.with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
	let links_path = args.output_dir.join(LINKS_FILE);
	let metadata_path = args.output_dir.join(METADATA_FILE);

	let index = extract_card_links(&fetcher, &selectors, &config).await?;
	log::info!("Found {} card links on {}", index.len(), config.index_url);

	if args.links_only {
		for entry in index.iter() {
			println!("{}: {}", entry.number, entry.url);
		}
		write_links(&links_path, &index, &HashSet::new())?;
		return Ok(());
	}

	let options = ExtractOptions::from_config(&config);
	let records = extract_all(
		index.clone(),
		Arc::clone(&fetcher),
		Arc::clone(&selectors),
		&options,
	)
	.await;

	let fetched: HashSet<String> = records.iter().map(|r| r.number.clone()).collect();
	write_links(&links_path, &index, &fetched)?;

	let mut sink = RecordSink::open(&metadata_path, &config.site_origin)?;
	sink.write_all(&records)?;

	log::info!(
		"Wrote {} cards to {}",
		records.len(),
		metadata_path.display()
	);
	Ok(())
}
