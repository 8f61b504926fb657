// src/services/extractor.rs

//! Content extraction and section structuring.
//!
//! A page goes through these steps:
//! 1. The title is read from the full document
//! 2. Boilerplate regions are removed, then same-origin links are read from
//!    what remains
//! 3. The first matching main-content region (else `<body>`) is walked in
//!    document order and each block is classified
//! 4. Blocks are grouped into heading-delimited sections, and repeated
//!    sections are collapsed
//!
//! A region without any classifiable block contributes its cleaned text as a
//! single untitled section.

use std::collections::{BTreeSet, HashSet};

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, PageResult, Section};
use crate::services::cleaner::TextCleaner;
use crate::services::dom::prune;
use crate::utils::url::{normalize, same_origin};

const MIN_HEADING_CHARS: usize = 3;
const MIN_PARAGRAPH_CHARS: usize = 21;
const MIN_LIST_ITEM_CHARS: usize = 6;
const MIN_CODE_CHARS: usize = 11;
const MIN_QUOTE_CHARS: usize = 11;
const MIN_FALLBACK_CHARS: usize = 21;
const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Classified block-level element.
enum Block<'a> {
    Heading(u8, ElementRef<'a>),
    Paragraph(ElementRef<'a>),
    List(ElementRef<'a>),
    Code(ElementRef<'a>),
    Quote(ElementRef<'a>),
}

impl<'a> Block<'a> {
    fn classify(el: ElementRef<'a>) -> Option<Self> {
        let block = match el.value().name() {
            "h1" => Block::Heading(1, el),
            "h2" => Block::Heading(2, el),
            "h3" => Block::Heading(3, el),
            "h4" => Block::Heading(4, el),
            "h5" => Block::Heading(5, el),
            "h6" => Block::Heading(6, el),
            "p" => Block::Paragraph(el),
            "ul" | "ol" => Block::List(el),
            "pre" | "code" => Block::Code(el),
            "blockquote" => Block::Quote(el),
            _ => return None,
        };
        Some(block)
    }
}

/// Turns fetched markup into a [`PageResult`].
#[derive(Debug)]
pub struct ContentExtractor {
    boilerplate_selectors: Vec<String>,
    main_content_selectors: Vec<Selector>,
    cleaner: TextCleaner,
    retain_query: bool,
    anchors: Selector,
    h1: Selector,
    title: Selector,
    body: Selector,
}

impl ContentExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        let main_content_selectors = config
            .extractor
            .main_content_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            boilerplate_selectors: config.extractor.boilerplate_selectors.clone(),
            main_content_selectors,
            cleaner: TextCleaner::new(&config.cleaning)?,
            retain_query: config.crawler.retain_query_string,
            anchors: parse_selector("a[href]")?,
            h1: parse_selector("h1")?,
            title: parse_selector("title")?,
            body: parse_selector("body")?,
        })
    }

    /// Extract title, links, sections and plain text from one page.
    pub fn extract(&self, html: &str, url: &Url) -> PageResult {
        let mut doc = Html::parse_document(html);

        let title = self.page_title(&doc);

        let removed = prune(&mut doc, &self.boilerplate_selectors);
        log::debug!("Removed {removed} boilerplate nodes from {url}");
        let discovered_links = self.discover_links(&doc, url);

        let text = self.cleaner.clean_page_text(&node_text(doc.root_element(), "\n"));
        let region = self.main_region(&doc);

        let mut builder = SectionBuilder::default();
        self.walk(region, &mut builder);
        let saw_blocks = builder.saw_blocks;
        let mut sections = collapse_sections(builder.finish());

        if !saw_blocks {
            let fallback = self.cleaner.clean_page_text(&node_text(region, "\n"));
            if fallback.chars().count() >= MIN_FALLBACK_CHARS {
                log::debug!("No structured blocks on {url}; using region text");
                let mut section = Section::new("", 1);
                section.push_block(&fallback);
                sections.push(section);
            }
        }

        PageResult {
            url: url.to_string(),
            title,
            sections,
            text,
            discovered_links,
        }
    }

    /// First non-empty `<h1>`, else `<title>`, else empty.
    fn page_title(&self, doc: &Html) -> String {
        let from = |selector: &Selector| {
            doc.select(selector)
                .map(|el| self.cleaner.clean(&node_text(el, "")))
                .find(|t| !t.is_empty())
        };
        from(&self.h1)
            .or_else(|| from(&self.title))
            .unwrap_or_default()
    }

    fn discover_links(&self, doc: &Html, url: &Url) -> BTreeSet<String> {
        doc.select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| normalize(url, href, self.retain_query))
            .filter(|link| same_origin(link, url))
            .map(String::from)
            .collect()
    }

    fn main_region<'a>(&self, doc: &'a Html) -> ElementRef<'a> {
        self.main_content_selectors
            .iter()
            .find_map(|selector| doc.select(selector).next())
            .or_else(|| doc.select(&self.body).next())
            .unwrap_or_else(|| doc.root_element())
    }

    /// Visit elements in document order; a classified element consumes its
    /// whole subtree.
    fn walk(&self, el: ElementRef<'_>, builder: &mut SectionBuilder) {
        for child in el.children().filter_map(ElementRef::wrap) {
            match Block::classify(child) {
                Some(block) => self.apply(block, builder),
                None => self.walk(child, builder),
            }
        }
    }

    fn apply(&self, block: Block<'_>, builder: &mut SectionBuilder) {
        builder.saw_blocks = true;
        match block {
            Block::Heading(level, el) => {
                let text = self.cleaner.clean(&node_text(el, ""));
                if text.chars().count() >= MIN_HEADING_CHARS
                    && !text.starts_with(ZERO_WIDTH_SPACE)
                {
                    builder.open(text, level);
                }
            }
            Block::Paragraph(el) => {
                let text = self.cleaner.clean(&node_text(el, ""));
                if text.chars().count() >= MIN_PARAGRAPH_CHARS {
                    builder.push(&text);
                }
            }
            Block::List(el) => {
                let items: Vec<String> = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|li| li.value().name() == "li")
                    .map(|li| self.cleaner.clean(&node_text(li, "")))
                    .filter(|item| item.chars().count() >= MIN_LIST_ITEM_CHARS)
                    .map(|item| format!("• {item}"))
                    .collect();
                if !items.is_empty() {
                    builder.push(&items.join("\n"));
                }
            }
            Block::Code(el) => {
                let code = el.text().collect::<String>();
                let code = code.trim_matches('\n').trim_end();
                if code.trim().chars().count() >= MIN_CODE_CHARS {
                    builder.push(&format!("```\n{code}\n```"));
                }
            }
            Block::Quote(el) => {
                let text = self.cleaner.clean(&node_text(el, ""));
                if text.chars().count() >= MIN_QUOTE_CHARS {
                    builder.push(&format!("> {text}"));
                }
            }
        }
    }
}

/// Accumulates blocks into the current section.
struct SectionBuilder {
    sections: Vec<Section>,
    current: Section,
    saw_blocks: bool,
}

impl Default for SectionBuilder {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            current: Section::new("", 1),
            saw_blocks: false,
        }
    }
}

impl SectionBuilder {
    /// Close the current section and start a new one under `title`.
    fn open(&mut self, title: String, level: u8) {
        let next = Section::new(title, level);
        let closed = std::mem::replace(&mut self.current, next);
        if closed.has_content() {
            self.sections.push(closed);
        }
    }

    fn push(&mut self, block: &str) {
        self.current.push_block(block);
    }

    fn finish(mut self) -> Vec<Section> {
        if self.current.has_content() {
            self.sections.push(self.current);
        }
        self.sections
    }
}

/// Drop sections whose (title, first 100 chars) key was already seen.
///
/// Applying it to its own output is a no-op.
pub fn collapse_sections(sections: Vec<Section>) -> Vec<Section> {
    let mut seen = HashSet::new();
    let before = sections.len();
    let kept: Vec<Section> = sections
        .into_iter()
        .filter(|section| seen.insert(section.collapse_key()))
        .collect();
    if kept.len() < before {
        log::debug!("Collapsed {} repeated sections", before - kept.len());
    }
    kept
}

fn node_text(el: ElementRef<'_>, separator: &str) -> String {
    el.text().collect::<Vec<_>>().join(separator)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
}
