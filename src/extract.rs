use crate::{
	card::parse_card_metadata,
	config::{ScrapeConfig, Selectors},
	error::{FetchError, ScrapeError},
	fetch::PageFetcher,
	model::{CardMetadata, CardRecord, LinkIndex},
};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::timeout};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
	pub workers: usize,
	pub fetch_timeout: Duration,
	pub progress: bool,
}

impl ExtractOptions {
	pub fn from_config(config: &ScrapeConfig) -> Self {
		ExtractOptions {
			workers: config.worker_count(),
			fetch_timeout: config.fetch_timeout(),
			progress: true,
		}
	}
}

fn progress_bar(total: u64, visible: bool) -> ProgressBar {
	if !visible {
		return ProgressBar::hidden();
	}
	let pb = ProgressBar::new(total);
	match ProgressStyle::default_bar()
		.template("{msg} {spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta_precise})")
	{
		Ok(style) => pb.set_style(style.progress_chars("##-")),
		Err(e) => log::warn!("Failed to set progress bar style: {}", e),
	}
	pb.set_message("Fetching card metadata");
	pb
}

async fn fetch_and_parse<F>(
	fetcher: &F,
	selectors: &Selectors,
	url: &str,
	fetch_timeout: Duration,
) -> Result<CardMetadata, ScrapeError>
where
	F: PageFetcher + ?Sized,
{
	let markup = timeout(fetch_timeout, fetcher.fetch(url))
		.await
		.map_err(|_| FetchError::Timeout(fetch_timeout))??;
	parse_card_metadata(&markup, selectors)
}

/// Fetches and parses every detail page in `index` on a bounded pool.
///
/// Records come back in index order. Entries whose fetch or parse failed are
/// logged and left out.
pub async fn extract_all<F>(
	index: LinkIndex,
	fetcher: Arc<F>,
	selectors: Arc<Selectors>,
	options: &ExtractOptions,
) -> Vec<CardRecord>
where
	F: PageFetcher + ?Sized + 'static,
{
	if index.is_empty() {
		return Vec::new();
	}

	let total = index.len();
	let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
	let pb = progress_bar(total as u64, options.progress);

	let mut numbers = Vec::with_capacity(total);
	let mut handles = Vec::with_capacity(total);

	for entry in index {
		let semaphore = Arc::clone(&semaphore);
		let fetcher = Arc::clone(&fetcher);
		let selectors = Arc::clone(&selectors);
		let pb = pb.clone();
		let fetch_timeout = options.fetch_timeout;
		let url = entry.url;
		numbers.push(entry.number);

		handles.push(tokio::spawn(async move {
			let _permit = semaphore
				.acquire()
				.await
				.map_err(|e| log::error!("Failed to acquire semaphore permit for {}: {}", url, e))
				.ok()?;

			let result = fetch_and_parse(fetcher.as_ref(), &selectors, &url, fetch_timeout).await;
			pb.inc(1);

			match result {
				Ok(metadata) => Some(metadata),
				Err(e) => {
					log::warn!("Dropping {}: {}", url, e);
					None
				}
			}
		}));
	}

	let records: Vec<CardRecord> = numbers
		.into_iter()
		.zip(join_all(handles).await)
		.filter_map(|(number, joined)| match joined {
			Ok(Some(metadata)) => Some(CardRecord { number, metadata }),
			Ok(None) => None,
			Err(e) => {
				log::error!("Worker for card {} aborted: {:?}", number, e);
				None
			}
		})
		.collect();

	pb.finish_with_message(format!("Done! - Extracted: {}", records.len()));
	log::info!("Extracted {} of {} cards", records.len(), total);

	records
}
