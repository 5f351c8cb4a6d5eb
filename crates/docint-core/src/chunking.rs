//! Chunking of pages into retrieval units.

use crate::models::document::{Chunk, Page};

/// Turns document pages into chunks eligible for matching.
///
/// Every chunk must carry the number of the page it came from.
pub trait Chunker {
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk>;
}

/// One chunk per page, content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageChunker;

impl Chunker for PageChunker {
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk> {
        pages
            .iter()
            .map(|page| Chunk::new(page.number, page.text.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_chunker_preserves_pages() {
        let pages = vec![Page::new(1, "Score: 742"), Page::new(2, "Accounts")];
        let chunks = PageChunker.chunk(&pages);
        assert_eq!(
            chunks,
            vec![Chunk::new(1, "Score: 742"), Chunk::new(2, "Accounts")]
        );
    }
}
