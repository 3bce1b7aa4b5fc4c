use crate::{
	config::Selectors,
	error::ScrapeError,
	markup::{element_text, Page, Role, CELL_SELECTOR, LINK_SELECTOR, ROW_SELECTOR},
	model::LinkIndex,
};

/// Reads the card list table of an index page into `number -> detail url`.
///
/// The header row is skipped. Rows without a number cell or a link (section
/// dividers, promo notes) are left out without complaint.
pub fn parse_link_table(
	markup: &str,
	selectors: &Selectors,
	origin: &str,
) -> Result<LinkIndex, ScrapeError> {
	let page = Page::parse(markup, selectors);
	let table = page
		.find_by_role(Role::CardTable)
		.ok_or(ScrapeError::TableNotFound)?;

	let rows: Vec<_> = table.select(&ROW_SELECTOR).skip(1).collect();
	log::info!("Amount of rows: {}", rows.len());

	let mut index = LinkIndex::new();
	for row in rows {
		let number_cell = row.select(&CELL_SELECTOR).next();
		let link = row
			.select(&LINK_SELECTOR)
			.next()
			.and_then(|a| a.value().attr("href"));

		let (Some(number_cell), Some(href)) = (number_cell, link) else {
			log::debug!("Skipping row without number or link: {:?}", element_text(row));
			continue;
		};

		let number = card_number(&element_text(number_cell));
		if number.is_empty() {
			log::debug!("Skipping row with empty number cell");
			continue;
		}

		index.insert(number, format!("{}{}", origin, href));
	}

	log::debug!("Parsed {} card links", index.len());
	Ok(index)
}

/// Like [`parse_link_table`], but a page without the table is an empty index.
pub fn parse_link_table_or_empty(
	markup: &str,
	selectors: &Selectors,
	origin: &str,
) -> Result<LinkIndex, ScrapeError> {
	match parse_link_table(markup, selectors, origin) {
		Err(ScrapeError::TableNotFound) => {
			log::warn!("Card table not found in the HTML content.");
			Ok(LinkIndex::new())
		}
		other => other,
	}
}

/// `"001/226"` -> `"001"`.
fn card_number(cell_text: &str) -> String {
	cell_text
		.split('/')
		.next()
		.unwrap_or_default()
		.trim()
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SITE_ORIGIN;

	const TABLE_OPEN: &str = r#"<table style="display: table; border-collapse: separate; margin-left: -2px; width: calc(100% + 4px)">"#;

	fn index_page(rows: &str) -> String {
		format!(
			"<html><body><h2>Card list</h2>{}<tr><th>No.</th><th>Card</th></tr>{}</table></body></html>",
			TABLE_OPEN, rows
		)
	}

	fn urls(index: &LinkIndex) -> Vec<(String, String)> {
		index
			.iter()
			.map(|e| (e.number.clone(), e.url.clone()))
			.collect()
	}

	#[test]
	fn test_divider_row_is_dropped() {
		let html = index_page(
			r#"<tr><td>001/226</td><td><a href="/wiki/A">Bulbasaur</a></td></tr>
			<tr><td>—</td><td>Section divider</td></tr>
			<tr><td>002/226</td><td><a href="/wiki/B">Ivysaur</a></td></tr>"#,
		);

		let index = parse_link_table(&html, &Selectors::default(), SITE_ORIGIN).unwrap();

		assert_eq!(
			urls(&index),
			vec![
				("001".to_string(), format!("{}/wiki/A", SITE_ORIGIN)),
				("002".to_string(), format!("{}/wiki/B", SITE_ORIGIN)),
			]
		);
	}

	#[test]
	fn test_only_rows_with_number_and_href_contribute() {
		let html = index_page(
			r#"<tr><td>001/226</td><td><a href="/wiki/A">A</a></td></tr>
			<tr><td>002/226</td><td><a>no href</a></td></tr>
			<tr><td> /226</td><td><a href="/wiki/C">C</a></td></tr>
			<tr><th>004</th><th><a href="/wiki/D">no td</a></th></tr>
			<tr><td>005</td><td><a href="/wiki/E">E</a></td></tr>"#,
		);

		let index = parse_link_table(&html, &Selectors::default(), "https://x.test").unwrap();

		assert!(index.len() <= 5);
		assert_eq!(
			urls(&index),
			vec![
				("001".to_string(), "https://x.test/wiki/A".to_string()),
				("005".to_string(), "https://x.test/wiki/E".to_string()),
			]
		);
	}

	#[test]
	fn test_parsing_is_idempotent() {
		let html = index_page(
			r#"<tr><td>010/226</td><td><a href="/wiki/J">J</a></td></tr>
			<tr><td>011/226</td><td><a href="/wiki/K">K</a></td></tr>"#,
		);
		let selectors = Selectors::default();

		let first = parse_link_table(&html, &selectors, SITE_ORIGIN).unwrap();
		let second = parse_link_table(&html, &selectors, SITE_ORIGIN).unwrap();

		assert_eq!(first, second);
	}

	#[test]
	fn test_duplicate_number_last_write_wins() {
		let html = index_page(
			r#"<tr><td>001/226</td><td><a href="/wiki/First">A</a></td></tr>
			<tr><td>002/226</td><td><a href="/wiki/B">B</a></td></tr>
			<tr><td>001/226</td><td><a href="/wiki/Second">A</a></td></tr>"#,
		);

		let index = parse_link_table(&html, &Selectors::default(), "").unwrap();

		assert_eq!(
			urls(&index),
			vec![
				("001".to_string(), "/wiki/Second".to_string()),
				("002".to_string(), "/wiki/B".to_string()),
			]
		);
	}

	#[test]
	fn test_missing_table() {
		let html = r#"<html><body><table><tr><td>001/226</td><td><a href="/wiki/A">A</a></td></tr></table></body></html>"#;
		let selectors = Selectors::default();

		assert!(matches!(
			parse_link_table(html, &selectors, SITE_ORIGIN),
			Err(ScrapeError::TableNotFound)
		));
		assert!(parse_link_table_or_empty(html, &selectors, SITE_ORIGIN)
			.unwrap()
			.is_empty());
	}

	#[test]
	fn test_card_number() {
		const TEST_STRINGS: [(&str, &str); 4] = [
			("001/226", "001"),
			(" 226 / 226 ", "226"),
			("P-A 007", "P-A 007"),
			("", ""),
		];

		for (input, expected) in TEST_STRINGS {
			let result = card_number(input);
			assert_eq!(
				result.as_str(),
				expected,
				"Expected '{}' for input '{}', but got '{}'",
				expected,
				input,
				result
			);
		}
	}
}
