use crate::{
	error::ScrapeError,
	model::{Attack, CardRecord, LinkIndex, NOT_AVAILABLE},
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::{
	collections::HashSet,
	fs::{File, OpenOptions},
	io::Write,
	path::Path,
};

pub const CARD_HEADER: [&str; 7] = [
	"Number",
	"Name",
	"HP",
	"Type",
	"Image Link",
	"Weakness",
	"Attacks",
];
pub const LINK_HEADER: [&str; 4] = ["Number", "Link", "Added At", "Did Fetch"];

pub const ATTACK_SEPARATOR: &str = "; ";

/// `Vine Whip (Damage: 40, Description: つるのムチ, Energy: Grass, Colorless)`
pub fn format_attack(attack: &Attack) -> String {
	format!(
		"{} (Damage: {}, Description: {}, Energy: {})",
		attack.name,
		attack.damage,
		attack.description,
		attack.energy_required.join(", ")
	)
}

pub fn format_attacks(attacks: &[Attack]) -> String {
	attacks
		.iter()
		.map(format_attack)
		.collect::<Vec<_>>()
		.join(ATTACK_SEPARATOR)
}

pub fn absolute_image_link(origin: &str, image_link: &str) -> String {
	if image_link == NOT_AVAILABLE {
		image_link.to_string()
	} else {
		format!("{}{}", origin, image_link)
	}
}

pub fn card_row(record: &CardRecord, origin: &str) -> [String; 7] {
	let metadata = &record.metadata;
	[
		record.number.clone(),
		metadata.name.clone(),
		metadata.hp.clone(),
		metadata.card_type.clone(),
		absolute_image_link(origin, &metadata.image_link),
		metadata.weakness.clone().unwrap_or_default(),
		format_attacks(&metadata.attacks),
	]
}

/// Opens `path` for appending. The header goes in only when the file is new or empty.
fn open_csv(path: &Path, header: &[&str]) -> Result<csv::Writer<File>, ScrapeError> {
	let needs_header = std::fs::metadata(path)
		.map(|m| m.len() == 0)
		.unwrap_or(true);
	let file = OpenOptions::new().create(true).append(true).open(path)?;
	new_writer(file, header, needs_header)
}

fn new_writer<W: Write>(
	inner: W,
	header: &[&str],
	write_header: bool,
) -> Result<csv::Writer<W>, ScrapeError> {
	let mut writer = csv::WriterBuilder::new()
		.has_headers(false)
		.from_writer(inner);
	if write_header {
		writer.write_record(header)?;
	}
	Ok(writer)
}

#[cfg(test)]
fn finish<W: Write>(writer: csv::Writer<W>) -> Result<W, ScrapeError> {
	writer
		.into_inner()
		.map_err(|e| ScrapeError::Io(e.into_error()))
}

/// The card metadata table.
pub struct RecordSink<W: Write> {
	writer: csv::Writer<W>,
	origin: String,
}

impl RecordSink<File> {
	pub fn open(path: &Path, origin: &str) -> Result<Self, ScrapeError> {
		Ok(RecordSink {
			writer: open_csv(path, &CARD_HEADER)?,
			origin: origin.to_string(),
		})
	}
}

impl<W: Write> RecordSink<W> {
	#[cfg(test)]
	pub fn new(inner: W, origin: &str) -> Result<Self, ScrapeError> {
		Ok(RecordSink {
			writer: new_writer(inner, &CARD_HEADER, true)?,
			origin: origin.to_string(),
		})
	}

	pub fn write_all(&mut self, records: &[CardRecord]) -> Result<(), ScrapeError> {
		for record in records {
			self.writer.write_record(card_row(record, &self.origin))?;
		}
		self.writer.flush()?;
		log::debug!("Wrote {} card rows", records.len());
		Ok(())
	}

	#[cfg(test)]
	pub fn into_inner(self) -> Result<W, ScrapeError> {
		finish(self.writer)
	}
}

/// Bookkeeping table of the index stage.
pub struct LinkSink<W: Write> {
	writer: csv::Writer<W>,
}

impl LinkSink<File> {
	pub fn open(path: &Path) -> Result<Self, ScrapeError> {
		Ok(LinkSink {
			writer: open_csv(path, &LINK_HEADER)?,
		})
	}
}

impl<W: Write> LinkSink<W> {
	#[cfg(test)]
	pub fn new(inner: W) -> Result<Self, ScrapeError> {
		Ok(LinkSink {
			writer: new_writer(inner, &LINK_HEADER, true)?,
		})
	}

	/// `fetched` holds the numbers that made it into the card table.
	pub fn write_all(
		&mut self,
		index: &LinkIndex,
		fetched: &HashSet<String>,
		added_at: DateTime<Utc>,
	) -> Result<(), ScrapeError> {
		let added_at = added_at.to_rfc3339_opts(SecondsFormat::Secs, true);
		for entry in index.iter() {
			let did_fetch = fetched.contains(&entry.number).to_string();
			self.writer
				.write_record([
					entry.number.as_str(),
					entry.url.as_str(),
					added_at.as_str(),
					did_fetch.as_str(),
				])?;
		}
		self.writer.flush()?;
		log::debug!("Wrote {} link rows", index.len());
		Ok(())
	}

	#[cfg(test)]
	pub fn into_inner(self) -> Result<W, ScrapeError> {
		finish(self.writer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::CardMetadata;
	use chrono::TimeZone;

	fn attack(name: &str, damage: &str, energy: &[&str]) -> Attack {
		Attack {
			name: name.to_string(),
			damage: damage.to_string(),
			description: format!("{}の説明", name),
			energy_required: energy.iter().map(|e| e.to_string()).collect(),
		}
	}

	fn venusaur() -> CardRecord {
		CardRecord {
			number: "003".to_string(),
			metadata: CardMetadata {
				name: "Venusaur".to_string(),
				hp: "160".to_string(),
				card_type: "Grass".to_string(),
				image_link: "/wiki/File:Venusaur.png".to_string(),
				weakness: Some("Fire".to_string()),
				attacks: vec![
					attack("Razor Leaf", "60", &["Grass", "Colorless"]),
					attack("Giant Bloom", "100", &[]),
				],
			},
		}
	}

	fn read_rows(bytes: &[u8]) -> Vec<Vec<String>> {
		csv::ReaderBuilder::new()
			.has_headers(false)
			.from_reader(bytes)
			.records()
			.map(|r| r.unwrap().iter().map(str::to_string).collect())
			.collect()
	}

	#[test]
	fn test_format_attack() {
		assert_eq!(
			format_attack(&attack("Razor Leaf", "60", &["Grass", "Colorless"])),
			"Razor Leaf (Damage: 60, Description: Razor Leafの説明, Energy: Grass, Colorless)"
		);
		assert_eq!(
			format_attack(&Attack::default()),
			"N/A (Damage: N/A, Description: N/A, Energy: )"
		);
	}

	#[test]
	fn test_attacks_column_splits_back_into_attacks() {
		let mut sink = RecordSink::new(Vec::new(), "https://bulbapedia.test").unwrap();
		sink.write_all(&[venusaur()]).unwrap();
		let rows = read_rows(&sink.into_inner().unwrap());

		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0], CARD_HEADER);
		let attacks: Vec<&str> = rows[1][6].split(ATTACK_SEPARATOR).collect();
		assert_eq!(attacks.len(), 2);
		assert!(attacks[0].starts_with("Razor Leaf (Damage: 60"));
		assert!(attacks[1].starts_with("Giant Bloom (Damage: 100"));
	}

	#[test]
	fn test_card_row_columns() {
		let mut record = venusaur();
		let row = card_row(&record, "https://bulbapedia.test");
		assert_eq!(row[0], "003");
		assert_eq!(row[4], "https://bulbapedia.test/wiki/File:Venusaur.png");
		assert_eq!(row[5], "Fire");

		record.metadata.image_link = NOT_AVAILABLE.to_string();
		record.metadata.weakness = None;
		record.metadata.attacks.clear();
		let row = card_row(&record, "https://bulbapedia.test");
		assert_eq!(row[4], NOT_AVAILABLE);
		assert_eq!(row[5], "");
		assert_eq!(row[6], "");
	}

	#[test]
	fn test_header_written_once_per_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("card_metadata.csv");

		for _ in 0..2 {
			let mut sink = RecordSink::open(&path, "https://bulbapedia.test").unwrap();
			sink.write_all(&[venusaur()]).unwrap();
		}

		let rows = read_rows(&std::fs::read(&path).unwrap());
		let headers = rows.iter().filter(|r| r[0] == "Number").count();
		assert_eq!(headers, 1);
		assert_eq!(rows.len(), 3);
	}

	#[test]
	fn test_link_rows() {
		let index: LinkIndex = [("001", "https://a/1"), ("002", "https://a/2")]
			.into_iter()
			.map(|(n, u)| (n.to_string(), u.to_string()))
			.collect();
		let fetched: HashSet<String> = ["002".to_string()].into_iter().collect();
		let added_at = Utc.with_ymd_and_hms(2024, 11, 1, 12, 30, 0).unwrap();

		let mut sink = LinkSink::new(Vec::new()).unwrap();
		sink.write_all(&index, &fetched, added_at).unwrap();
		let rows = read_rows(&sink.into_inner().unwrap());

		assert_eq!(rows[0], LINK_HEADER);
		assert_eq!(rows[1], ["001", "https://a/1", "2024-11-01T12:30:00Z", "false"]);
		assert_eq!(rows[2], ["002", "https://a/2", "2024-11-01T12:30:00Z", "true"]);
	}
}
