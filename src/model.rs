use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stand-in for any field the parser could not locate.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn not_available() -> String {
	NOT_AVAILABLE.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
	pub number: String,
	pub url: String,
}

/// Card number to detail page, in the order the index table lists them.
///
/// Inserting a number twice keeps the first position and takes the later URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
	entries: Vec<LinkEntry>,
	positions: HashMap<String, usize>,
}

impl LinkIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn insert(&mut self, number: String, url: String) {
		match self.positions.get(&number) {
			Some(&position) => self.entries[position].url = url,
			None => {
				self.positions.insert(number.clone(), self.entries.len());
				self.entries.push(LinkEntry { number, url });
			}
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &LinkEntry> {
		self.entries.iter()
	}
}

impl IntoIterator for LinkIndex {
	type Item = LinkEntry;
	type IntoIter = std::vec::IntoIter<LinkEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl FromIterator<(String, String)> for LinkIndex {
	fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
		let mut index = LinkIndex::new();
		for (number, url) in iter {
			index.insert(number, url);
		}
		index
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Attack {
	pub name: String,
	pub damage: String,
	pub description: String,
	pub energy_required: Vec<String>,
}

impl Default for Attack {
	fn default() -> Self {
		Attack {
			name: not_available(),
			damage: not_available(),
			description: not_available(),
			energy_required: Vec::new(),
		}
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardMetadata {
	pub name: String,
	pub hp: String,
	#[serde(rename = "type")]
	pub card_type: String,
	pub image_link: String,
	/// `None` when the page has no weakness block at all.
	pub weakness: Option<String>,
	pub attacks: Vec<Attack>,
}

impl Default for CardMetadata {
	fn default() -> Self {
		CardMetadata {
			name: not_available(),
			hp: not_available(),
			card_type: not_available(),
			image_link: not_available(),
			weakness: None,
			attacks: Vec::new(),
		}
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
	pub number: String,
	pub metadata: CardMetadata,
}

#[test]
fn test_link_index_last_write_wins_keeps_position() {
	let index: LinkIndex = [
		("001", "https://a/1"),
		("002", "https://a/2"),
		("001", "https://a/1-reprint"),
	]
	.into_iter()
	.map(|(n, u)| (n.to_string(), u.to_string()))
	.collect();

	assert_eq!(index.len(), 2);
	let numbers: Vec<&str> = index.iter().map(|e| e.number.as_str()).collect();
	assert_eq!(numbers, ["001", "002"]);
	assert_eq!(index.iter().next().unwrap().url, "https://a/1-reprint");
}

#[test]
fn test_card_metadata_default_is_sentinel() {
	let metadata = CardMetadata::default();
	assert_eq!(metadata.name, NOT_AVAILABLE);
	assert_eq!(metadata.hp, NOT_AVAILABLE);
	assert_eq!(metadata.card_type, NOT_AVAILABLE);
	assert_eq!(metadata.image_link, NOT_AVAILABLE);
	assert_eq!(metadata.weakness, None);
	assert!(metadata.attacks.is_empty());
}
