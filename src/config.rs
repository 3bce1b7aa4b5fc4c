use crate::error::ScrapeError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

pub const SITE_ORIGIN: &str = "https://bulbapedia.bulbagarden.net";
pub const INDEX_URL: &str = "https://bulbapedia.bulbagarden.net/wiki/Genetic_Apex_(TCG_Pocket)";
pub const USER_AGENT: &str = "reqwest/0.12 (rust)";

const CARD_TABLE_SELECTOR: &str = "table[style=\"display: table; border-collapse: separate; margin-left: -2px; width: calc(100% + 4px)\"]";
const TITLE_SELECTOR: &str = ".title";
const IMAGE_SELECTOR: &str = "a.image";
const ATTACK_PANEL_SELECTOR: &str = "table.attack-panel";
const ATTACK_NAME_SELECTOR: &str = "th b";
const ATTACK_DAMAGE_SELECTOR: &str = "th big";
const ATTACK_DESCRIPTION_SELECTOR: &str = "span[lang]";

/// Everything site-specific the scraper needs. Loaded from JSON; any
/// missing key falls back to the Bulbapedia defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
	pub site_origin: String,
	pub index_url: String,
	pub user_agent: String,
	/// Parallel detail-page workers; `None` sizes the pool to the machine.
	pub workers: Option<usize>,
	pub fetch_timeout_secs: u64,
	pub selectors: SelectorConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
	pub card_table: String,
	pub title: String,
	pub image: String,
	pub attack_panel: String,
	pub attack_name: String,
	pub attack_damage: String,
	pub attack_description: String,
	pub hp_label: String,
	pub type_label: String,
	pub weakness_label: String,
}

impl Default for ScrapeConfig {
	fn default() -> Self {
		ScrapeConfig {
			site_origin: SITE_ORIGIN.to_string(),
			index_url: INDEX_URL.to_string(),
			user_agent: USER_AGENT.to_string(),
			workers: None,
			fetch_timeout_secs: 30,
			selectors: SelectorConfig::default(),
		}
	}
}

impl Default for SelectorConfig {
	fn default() -> Self {
		SelectorConfig {
			card_table: CARD_TABLE_SELECTOR.to_string(),
			title: TITLE_SELECTOR.to_string(),
			image: IMAGE_SELECTOR.to_string(),
			attack_panel: ATTACK_PANEL_SELECTOR.to_string(),
			attack_name: ATTACK_NAME_SELECTOR.to_string(),
			attack_damage: ATTACK_DAMAGE_SELECTOR.to_string(),
			attack_description: ATTACK_DESCRIPTION_SELECTOR.to_string(),
			hp_label: "HP".to_string(),
			type_label: "Type".to_string(),
			weakness_label: "weakness".to_string(),
		}
	}
}

impl ScrapeConfig {
	pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
		let config: ScrapeConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub async fn load(path: &Path) -> Result<Self, ScrapeError> {
		let json = tokio::fs::read_to_string(path).await?;
		log::debug!("Loaded config from {}", path.display());
		Self::from_json(&json)
	}

	pub fn validate(&self) -> Result<(), ScrapeError> {
		if self.site_origin.ends_with('/') {
			return Err(ScrapeError::Config(format!(
				"site_origin must not end with '/': {}",
				self.site_origin
			)));
		}
		if self.workers == Some(0) {
			return Err(ScrapeError::Config("workers must be at least 1".to_string()));
		}
		if self.fetch_timeout_secs == 0 {
			return Err(ScrapeError::Config(
				"fetch_timeout_secs must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	pub fn worker_count(&self) -> usize {
		self.workers.unwrap_or_else(|| {
			std::thread::available_parallelism()
				.map(|n| n.get())
				.unwrap_or(4)
		})
	}

	pub fn fetch_timeout(&self) -> Duration {
		Duration::from_secs(self.fetch_timeout_secs)
	}
}

/// `SelectorConfig` compiled once per run and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct Selectors {
	pub card_table: Selector,
	pub title: Selector,
	pub image: Selector,
	pub attack_panel: Selector,
	pub attack_name: Selector,
	pub attack_damage: Selector,
	pub attack_description: Selector,
	pub hp_label: String,
	pub type_label: String,
	pub weakness_label: String,
}

fn compile(role: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
	Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
		role,
		selector: selector.to_string(),
		reason: format!("{:?}", e),
	})
}

impl Selectors {
	pub fn compile(config: &SelectorConfig) -> Result<Self, ScrapeError> {
		Ok(Selectors {
			card_table: compile("card table", &config.card_table)?,
			title: compile("title", &config.title)?,
			image: compile("image", &config.image)?,
			attack_panel: compile("attack panel", &config.attack_panel)?,
			attack_name: compile("attack name", &config.attack_name)?,
			attack_damage: compile("attack damage", &config.attack_damage)?,
			attack_description: compile("attack description", &config.attack_description)?,
			hp_label: config.hp_label.clone(),
			type_label: config.type_label.clone(),
			weakness_label: config.weakness_label.clone(),
		})
	}
}

#[cfg(test)]
impl Default for Selectors {
	fn default() -> Self {
		Selectors::compile(&SelectorConfig::default()).expect("Default selectors must compile.")
	}
}

#[test]
fn test_partial_json_keeps_defaults() {
	let config = ScrapeConfig::from_json(
		r#"{ "workers": 3, "selectors": { "title": "h1.firstHeading" } }"#,
	)
	.unwrap();

	assert_eq!(config.workers, Some(3));
	assert_eq!(config.worker_count(), 3);
	assert_eq!(config.site_origin, SITE_ORIGIN);
	assert_eq!(config.selectors.title, "h1.firstHeading");
	assert_eq!(config.selectors.image, IMAGE_SELECTOR);
	assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
}

#[test]
fn test_invalid_config_is_rejected() {
	assert!(matches!(
		ScrapeConfig::from_json(r#"{ "workers": 0 }"#),
		Err(ScrapeError::Config(_))
	));
	assert!(matches!(
		ScrapeConfig::from_json(r#"{ "site_origin": "https://example.org/" }"#),
		Err(ScrapeError::Config(_))
	));
	assert!(matches!(
		ScrapeConfig::from_json("not json"),
		Err(ScrapeError::Json(_))
	));
}

#[test]
fn test_invalid_selector_names_its_role() {
	let config = SelectorConfig {
		attack_panel: "table[".to_string(),
		..SelectorConfig::default()
	};

	match Selectors::compile(&config) {
		Err(ScrapeError::InvalidSelector { role, selector, .. }) => {
			assert_eq!(role, "attack panel");
			assert_eq!(selector, "table[");
		}
		other => panic!("expected InvalidSelector, got {:?}", other),
	}
}

#[test]
fn test_default_selectors_compile() {
	assert!(Selectors::compile(&SelectorConfig::default()).is_ok());
}
