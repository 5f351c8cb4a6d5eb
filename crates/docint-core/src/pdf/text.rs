//! Plain-text documents, pages separated by form feeds.

use std::path::Path;

use super::DocumentLoader;
use crate::error::DocintError;
use crate::models::document::Page;

/// Page separator in text exports.
const FORM_FEED: char = '\u{000c}';

/// Loader for `.txt` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocumentLoader;

impl TextDocumentLoader {
    /// Split text into pages on form feeds. An empty text is one empty page.
    pub fn split_pages(text: &str) -> Vec<Page> {
        text.split(FORM_FEED)
            .enumerate()
            .map(|(i, page)| Page::new(i as u32 + 1, page))
            .collect()
    }
}

impl DocumentLoader for TextDocumentLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<Page>, DocintError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::split_pages(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_pages() {
        let pages = TextDocumentLoader::split_pages("first\u{000c}second\u{000c}third");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], Page::new(1, "first"));
        assert_eq!(pages[2], Page::new(3, "third"));
    }

    #[test]
    fn test_empty_text_is_one_page() {
        let pages = TextDocumentLoader::split_pages("");
        assert_eq!(pages, vec![Page::new(1, "")]);
    }
}
