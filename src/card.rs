use crate::{
	config::Selectors,
	error::ScrapeError,
	markup::{element_text, extract_text, Page, Role, ICON_SELECTOR},
	model::{not_available, Attack, CardMetadata},
};
use scraper::{ElementRef, Selector};

/// Parses one card detail page.
///
/// A missing anchor only costs its own field, which falls back to `"N/A"`.
/// The only error is markup that is not a document at all.
pub fn parse_card_metadata(markup: &str, selectors: &Selectors) -> Result<CardMetadata, ScrapeError> {
	if markup.trim().is_empty() {
		return Err(ScrapeError::MalformedMarkup("empty document".to_string()));
	}

	let page = Page::parse(markup, selectors);

	let name = text_or_default(&page, Role::Title, "name");
	let hp = text_or_default(&page, Role::HeaderValue(&selectors.hp_label), "hp");
	let card_type = text_or_default(&page, Role::HeaderValue(&selectors.type_label), "type");

	let image_link = page
		.find_by_role(Role::Image)
		.and_then(|a| a.value().attr("href"))
		.map(str::to_string)
		.unwrap_or_else(|| {
			field_not_found("image link");
			not_available()
		});

	let weakness = weakness(&page);

	let attacks = page
		.find_all_by_role(Role::AttackPanel)
		.into_iter()
		.map(|panel| parse_attack(panel, selectors))
		.collect();

	Ok(CardMetadata {
		name,
		hp,
		card_type,
		image_link,
		weakness,
		attacks,
	})
}

fn field_not_found(field: &'static str) {
	log::debug!("{}", ScrapeError::FieldNotFound(field));
}

fn text_or_default(page: &Page, role: Role, field: &'static str) -> String {
	match page.find_by_role(role) {
		Some(element) => element_text(element),
		None => {
			field_not_found(field);
			not_available()
		}
	}
}

/// `None` without a weakness block; `"N/A"` when the block has no icon after it.
fn weakness(page: &Page) -> Option<String> {
	let marker = page.find_text_marker(&page.selectors().weakness_label)?;
	let alt = page
		.following_element(marker, |el| el.value().name() == "img")
		.and_then(|img| img.value().attr("alt"))
		.map(str::to_string);

	Some(alt.unwrap_or_else(|| {
		field_not_found("weakness");
		not_available()
	}))
}

fn parse_attack(panel: ElementRef, selectors: &Selectors) -> Attack {
	let sub_text = |selector: &Selector, field: &'static str| {
		extract_text(panel, selector).unwrap_or_else(|| {
			field_not_found(field);
			not_available()
		})
	};

	Attack {
		name: sub_text(&selectors.attack_name, "attack name"),
		damage: sub_text(&selectors.attack_damage, "attack damage"),
		description: sub_text(&selectors.attack_description, "attack description"),
		energy_required: panel
			.select(&ICON_SELECTOR)
			.filter_map(|img| img.value().attr("alt"))
			.map(str::to_string)
			.collect(),
	}
}
