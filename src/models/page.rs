//! Extracted page structure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A heading-delimited block of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text, empty for content before the first heading
    pub title: String,

    /// Heading level 1..=6
    pub level: u8,

    /// Text blocks, each followed by a blank line
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, level: u8) -> Self {
        Self {
            title: title.into(),
            level: level.clamp(1, 6),
            content: String::new(),
        }
    }

    /// Append a block with block-level separation.
    pub fn push_block(&mut self, block: &str) {
        self.content.push_str(block);
        self.content.push_str("\n\n");
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Same-page duplicate key: title plus the first 100 characters of content.
    pub fn collapse_key(&self) -> (String, String) {
        (self.title.clone(), self.content.chars().take(100).collect())
    }
}

/// Result of extracting one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub title: String,
    pub sections: Vec<Section>,

    /// Boilerplate-stripped page text, used by the plain artifact format
    pub text: String,

    /// Normalized same-origin link targets
    pub discovered_links: BTreeSet<String>,
}

impl PageResult {
    /// A page without sections is neither persisted nor followed.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Heading text: the title, or the URL for untitled pages.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { &self.url } else { &self.title }
    }

    /// Render title, URL and sections as Markdown-flavored text.
    pub fn render_structured(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.display_title()));
        out.push_str(&format!("URL: {}\n\n", self.url));
        out.push_str("---\n\n");

        for section in &self.sections {
            if !section.title.is_empty() {
                // h1 is taken by the page title
                let depth = usize::from(section.level + 1).min(6);
                out.push_str(&format!("{} {}\n\n", "#".repeat(depth), section.title));
            }
            let content = section.content.trim();
            if !content.is_empty() {
                out.push_str(content);
                out.push_str("\n\n");
            }
        }
        out
    }

    /// Render the URL header followed by the plain page text.
    pub fn render_plain(&self) -> String {
        format!("URL: {}\n\n{}\n", self.url, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> PageResult {
        let mut intro = Section::new("", 1);
        intro.push_block("Opening paragraph that is long enough.");
        let mut setup = Section::new("Setup", 2);
        setup.push_block("• Install the toolchain");
        PageResult {
            url: "https://docs.example.test/start".to_string(),
            title: "Getting Started".to_string(),
            sections: vec![intro, setup],
            text: "Getting Started\nOpening paragraph".to_string(),
            discovered_links: BTreeSet::new(),
        }
    }

    #[test]
    fn test_section_level_is_clamped() {
        assert_eq!(Section::new("x", 0).level, 1);
        assert_eq!(Section::new("x", 9).level, 6);
    }

    #[test]
    fn test_collapse_key_uses_first_hundred_chars() {
        let mut a = Section::new("T", 2);
        a.push_block(&"x".repeat(150));
        let mut b = Section::new("T", 2);
        b.push_block(&format!("{}{}", "x".repeat(100), "y".repeat(50)));
        assert_eq!(a.collapse_key(), b.collapse_key());
    }

    #[test]
    fn test_untitled_page_uses_url_heading() {
        let mut page = sample_page();
        page.title.clear();
        assert_eq!(page.display_title(), "https://docs.example.test/start");
        assert!(page
            .render_structured()
            .starts_with("# https://docs.example.test/start\n\nURL: https://docs.example.test/start\n\n"));
    }

    #[test]
    fn test_render_structured() {
        let rendered = sample_page().render_structured();
        assert!(rendered.starts_with("# Getting Started\n\nURL: https://docs.example.test/start\n\n---\n\n"));
        assert!(rendered.contains("Opening paragraph that is long enough.\n\n### Setup\n\n• Install the toolchain\n\n"));
    }

    #[test]
    fn test_render_plain() {
        let rendered = sample_page().render_plain();
        assert_eq!(
            rendered,
            "URL: https://docs.example.test/start\n\nGetting Started\nOpening paragraph\n"
        );
    }
}
