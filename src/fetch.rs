use crate::{config::ScrapeConfig, error::FetchError};
use async_trait::async_trait;
use reqwest::{header, Client};

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
	async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher. One client, shared connection pool across workers.
pub struct HttpFetcher {
	client: Client,
	user_agent: String,
	referer: String,
}

impl HttpFetcher {
	pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
		let client = Client::builder()
			.timeout(config.fetch_timeout())
			.build()?;

		Ok(HttpFetcher {
			client,
			user_agent: config.user_agent.clone(),
			referer: format!("{}/", config.site_origin),
		})
	}
}

#[async_trait]
impl PageFetcher for HttpFetcher {
	async fn fetch(&self, url: &str) -> Result<String, FetchError> {
		let response = self
			.client
			.get(url)
			.header(header::USER_AGENT, &self.user_agent)
			.header(header::REFERER, &self.referer)
			.send()
			.await?;

		log::debug!("Received status {} from {}", response.status(), url);

		if !response.status().is_success() {
			return Err(FetchError::Status(response.status().as_u16()));
		}

		Ok(response.text().await?)
	}
}
