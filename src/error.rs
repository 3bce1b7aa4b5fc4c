use std::time::Duration;

/// Why a single page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
	#[error("non-success status {0}")]
	Status(u16),

	#[error("transport error: {0}")]
	Transport(String),

	#[error("timed out after {0:?}")]
	Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
	fn from(err: reqwest::Error) -> Self {
		match err.status() {
			Some(status) => FetchError::Status(status.as_u16()),
			None => FetchError::Transport(err.to_string()),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
	/// The index page has no card list table.
	#[error("card table not found in the index page")]
	TableNotFound,

	/// Diagnostic only: a metadata anchor is missing and the field was defaulted.
	#[error("field not found: {0}")]
	FieldNotFound(&'static str),

	#[error("fetch failed: {0}")]
	Fetch(#[from] FetchError),

	#[error("malformed markup: {0}")]
	MalformedMarkup(String),

	#[error("invalid selector for {role}: {selector:?} ({reason})")]
	InvalidSelector {
		role: &'static str,
		selector: String,
		reason: String,
	},

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}
