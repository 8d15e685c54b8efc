//! The `Dataset` collaborator (spec §6.2): the only thing the engine asks of
//! the PDF decoder, which otherwise stays entirely out of scope.

use std::collections::HashMap;

use crate::entities::PageNo;

/// Page dimensions in PDF point space, as the decoder would report them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub w: f64,
    pub h: f64,
}

/// Supplies page dimensions for scale-ratio computation (spec §4.B) and for
/// `Model::page_size`. The engine never touches PDF bytes directly.
pub trait Dataset {
    fn get_page(&self, page_no: PageNo) -> Option<PageInfo>;
}

/// A `Dataset` backed by an in-memory map, used by tests and the CLI where
/// page sizes are supplied as a side JSON file instead of a live decoder.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    pages: HashMap<PageNo, PageInfo>,
}

impl InMemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page_no: PageNo, w: f64, h: f64) {
        self.pages.insert(page_no, PageInfo { w, h });
    }
}

impl FromIterator<(PageNo, PageInfo)> for InMemoryDataset {
    fn from_iter<T: IntoIterator<Item = (PageNo, PageInfo)>>(iter: T) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

impl Dataset for InMemoryDataset {
    fn get_page(&self, page_no: PageNo) -> Option<PageInfo> {
        self.pages.get(&page_no).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_dataset_round_trips() {
        let mut ds = InMemoryDataset::new();
        ds.insert(0, 612.0, 792.0);
        assert_eq!(ds.get_page(0), Some(PageInfo { w: 612.0, h: 792.0 }));
        assert_eq!(ds.get_page(1), None);
    }
}
