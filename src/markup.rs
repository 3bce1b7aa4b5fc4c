//! Role-based lookups over a parsed page.
//!
//! Parsers ask for "the card table" or "the cell after the HP header" and
//! this module turns that into selector queries and document-order walks.

use crate::config::Selectors;
use ego_tree::NodeId;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

pub static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
pub static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
pub static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
pub static ICON_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img[alt]").unwrap());
static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role<'a> {
	CardTable,
	Title,
	Image,
	AttackPanel,
	/// The `td` after the `th` whose text is exactly the label.
	HeaderValue(&'a str),
}

pub struct Page<'s> {
	document: Html,
	selectors: &'s Selectors,
}

impl<'s> Page<'s> {
	pub fn parse(markup: &str, selectors: &'s Selectors) -> Self {
		let document = Html::parse_document(markup);
		if !document.errors.is_empty() {
			log::trace!("Recovered from {} markup errors", document.errors.len());
		}
		Page {
			document,
			selectors,
		}
	}

	pub fn selectors(&self) -> &'s Selectors {
		self.selectors
	}

	pub fn find_by_role(&self, role: Role) -> Option<ElementRef<'_>> {
		let root = self.document.root_element();
		match role {
			Role::CardTable => root.select(&self.selectors.card_table).next(),
			Role::Title => root.select(&self.selectors.title).next(),
			Role::Image => root.select(&self.selectors.image).next(),
			Role::AttackPanel => root.select(&self.selectors.attack_panel).next(),
			Role::HeaderValue(label) => {
				let header = root
					.select(&HEADER_CELL_SELECTOR)
					.find(|th| element_text(*th) == label)?;
				self.following_element(header.id(), |el| el.value().name() == "td")
			}
		}
	}

	pub fn find_all_by_role(&self, role: Role) -> Vec<ElementRef<'_>> {
		let root = self.document.root_element();
		match role {
			Role::CardTable => root.select(&self.selectors.card_table).collect(),
			Role::Title => root.select(&self.selectors.title).collect(),
			Role::Image => root.select(&self.selectors.image).collect(),
			Role::AttackPanel => root.select(&self.selectors.attack_panel).collect(),
			Role::HeaderValue(_) => self.find_by_role(role).into_iter().collect(),
		}
	}

	/// First text node whose trimmed content is exactly `label`.
	pub fn find_text_marker(&self, label: &str) -> Option<NodeId> {
		self.document
			.tree
			.root()
			.descendants()
			.find(|node| {
				node.value()
					.as_text()
					.map_or(false, |text| text.trim() == label)
			})
			.map(|node| node.id())
	}

	/// First element after `from` in document order that satisfies `predicate`.
	pub fn following_element<F>(&self, from: NodeId, predicate: F) -> Option<ElementRef<'_>>
	where
		F: Fn(&ElementRef) -> bool,
	{
		self.document
			.tree
			.root()
			.descendants()
			.skip_while(|node| node.id() != from)
			.skip(1)
			.filter_map(ElementRef::wrap)
			.find(|el| predicate(el))
	}
}

/// All text under `element`, joined and trimmed.
pub fn element_text(element: ElementRef) -> String {
	element
		.text()
		.collect::<Vec<_>>()
		.join("")
		.trim()
		.to_string()
}

pub fn extract_text(element: ElementRef, selector: &Selector) -> Option<String> {
	element.select(selector).next().map(element_text)
}
