// src/services/dom.rs

//! Selector-driven node removal over a parsed document.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};

/// A parsed document whose nodes can be selected and removed.
pub trait PrunableDocument {
    type NodeId: Copy;

    /// Ids of every node matching `selector`, in document order.
    fn select_nodes(&self, selector: &str) -> Result<Vec<Self::NodeId>>;

    /// Detach a node and its subtree from the document.
    fn remove(&mut self, id: Self::NodeId);
}

impl PrunableDocument for Html {
    type NodeId = NodeId;

    fn select_nodes(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed =
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        Ok(self
            .select(&parsed)
            .filter(|el| !is_root_container(el))
            .map(|el| (*el).id())
            .collect())
    }

    fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn is_root_container(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "html" | "body")
}

/// Remove every node matched by any of `selectors`, in order.
///
/// Unparseable selectors are skipped. Returns the number of removed nodes.
pub fn prune<D: PrunableDocument>(doc: &mut D, selectors: &[String]) -> usize {
    let mut removed = 0;
    for selector in selectors {
        match doc.select_nodes(selector) {
            Ok(ids) => {
                removed += ids.len();
                for id in ids {
                    doc.remove(id);
                }
            }
            Err(e) => log::warn!("Skipping boilerplate selector: {e}"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(html: &Html) -> String {
        html.root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_prune_removes_matching_subtrees() {
        let mut doc = Html::parse_document(
            "<html><body><nav><a href='/x'>Home</a></nav>\
             <main><p>Body text</p><div class='sidebar'>Side</div></main></body></html>",
        );
        let removed = prune(&mut doc, &["nav".to_string(), ".sidebar".to_string()]);
        assert_eq!(removed, 2);
        assert_eq!(text_of(&doc), "Body text");
    }

    #[test]
    fn test_prune_never_removes_body() {
        let mut doc = Html::parse_document(
            "<html><body class='navbar-open'><p>Still here</p></body></html>",
        );
        prune(&mut doc, &["[class*=\"nav\"]".to_string()]);
        assert_eq!(text_of(&doc), "Still here");
    }

    #[test]
    fn test_select_nodes_reports_bad_selector() {
        let doc = Html::parse_document("<p>x</p>");
        assert!(matches!(
            doc.select_nodes("[[nope"),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn test_prune_handles_nested_matches() {
        let mut doc = Html::parse_document(
            "<body><div class='menu'><ul class='menu-list'><li>A</li></ul></div><p>Kept</p></body>",
        );
        prune(&mut doc, &["[class*=\"menu\"]".to_string()]);
        assert_eq!(text_of(&doc), "Kept");
    }
}
