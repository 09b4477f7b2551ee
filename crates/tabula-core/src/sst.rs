//! Runtime shared string table.
//!
//! Bridges the XML-level [`Sst`] and the cell API: index-based lookup for
//! the reader, dedup-on-insert for the builder. Deduplication compares the
//! full item, runs included, so two rich-text items with the same flattened
//! text but different formatting stay distinct pool entries.

use std::collections::HashMap;

use tabula_xml::shared_strings::{Si, Sst};

/// Runtime shared string table.
pub struct SharedStringTable {
    items: Vec<Si>,
    texts: Vec<String>,
    /// Flattened text -> candidate indices; full-item equality picks within
    /// the bucket.
    buckets: HashMap<String, Vec<usize>>,
    /// Total reference count (`count` attribute); unique count is the pool
    /// length.
    references: u32,
}

impl SharedStringTable {
    /// Create a new, empty shared string table.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            texts: Vec::new(),
            buckets: HashMap::new(),
            references: 0,
        }
    }

    /// Build from an XML [`Sst`]. Items are inserted positionally; the SST
    /// index is the identity worksheets reference.
    pub fn from_sst(sst: &Sst) -> Self {
        let mut table = Self::new();
        for si in &sst.items {
            let idx = table.items.len();
            let text = si.text();
            table.buckets.entry(text.clone()).or_default().push(idx);
            table.texts.push(text);
            table.items.push(si.clone());
        }
        table.references = sst.count.unwrap_or(table.items.len() as u32);
        table
    }

    /// Convert back to an XML [`Sst`] with `count`/`uniqueCount` set.
    pub fn to_sst(&self) -> Sst {
        Sst {
            xmlns: tabula_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(self.references),
            unique_count: Some(self.items.len() as u32),
            items: self.items.clone(),
        }
    }

    /// Get the flattened text of an item by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(|s| s.as_str())
    }

    /// Get the full item by index.
    pub fn item(&self, index: usize) -> Option<&Si> {
        self.items.get(index)
    }

    /// Add a plain-text string, returning its pool index. Counts one
    /// reference; duplicates return the existing index.
    pub fn add(&mut self, text: &str) -> usize {
        self.add_item(Si::plain(text))
    }

    /// Add a full item (runs included), deduplicating by structural
    /// equality. Counts one reference.
    pub fn add_item(&mut self, si: Si) -> usize {
        self.references += 1;
        let text = si.text();
        if let Some(bucket) = self.buckets.get(&text) {
            if let Some(&idx) = bucket.iter().find(|&&i| self.items[i] == si) {
                return idx;
            }
        }
        let idx = self.items.len();
        self.buckets.entry(text.clone()).or_default().push(idx);
        self.texts.push(text);
        self.items.push(si);
        idx
    }

    /// Number of unique strings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the table contains no strings.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total references recorded so far.
    pub fn reference_count(&self) -> u32 {
        self.references
    }

    /// Deep copy of the pool, used when replaying a workbook into a
    /// builder.
    pub fn clone_pool(&self) -> Self {
        Self {
            items: self.items.clone(),
            texts: self.texts.clone(),
            buckets: self.buckets.clone(),
            references: self.references,
        }
    }
}

impl Default for SharedStringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_xml::shared_strings::{R, RPr, T};

    #[test]
    fn test_new_is_empty() {
        let table = SharedStringTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.reference_count(), 0);
    }

    #[test]
    fn test_add_returns_sequential_indices() {
        let mut table = SharedStringTable::new();
        assert_eq!(table.add("hello"), 0);
        assert_eq!(table.add("world"), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_dedup_counts_references() {
        let mut table = SharedStringTable::new();
        for _ in 0..5 {
            assert_eq!(table.add("same"), 0);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.reference_count(), 5);

        let sst = table.to_sst();
        assert_eq!(sst.count, Some(5));
        assert_eq!(sst.unique_count, Some(1));
    }

    #[test]
    fn test_rich_item_distinct_from_plain_with_same_text() {
        let mut table = SharedStringTable::new();
        let plain = table.add("Bold");
        let rich = table.add_item(Si {
            t: None,
            r: vec![R {
                r_pr: Some(RPr::default()),
                t: T::preserving("Bold"),
            }],
        });
        assert_ne!(plain, rich);
        assert_eq!(table.get(plain), Some("Bold"));
        assert_eq!(table.get(rich), Some("Bold"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_identical_rich_items_dedup() {
        let rich = Si {
            t: None,
            r: vec![R {
                r_pr: Some(RPr::default()),
                t: T::preserving("x"),
            }],
        };
        let mut table = SharedStringTable::new();
        let a = table.add_item(rich.clone());
        let b = table.add_item(rich);
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_sst_positional() {
        let sst = Sst {
            xmlns: tabula_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(7),
            unique_count: Some(3),
            items: vec![Si::plain("Name"), Si::plain("Age"), Si::plain("City")],
        };
        let table = SharedStringTable::from_sst(&sst);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("Name"));
        assert_eq!(table.get(2), Some("City"));
        assert_eq!(table.get(3), None);
        assert_eq!(table.reference_count(), 7);
    }

    #[test]
    fn test_roundtrip_preserves_items() {
        let sst = Sst {
            xmlns: tabula_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(2),
            unique_count: Some(2),
            items: vec![Si::plain(" padded "), Si::plain("plain")],
        };
        let table = SharedStringTable::from_sst(&sst);
        let back = table.to_sst();
        assert_eq!(back.items, sst.items);
        // Whitespace preservation marker survives.
        assert_eq!(
            back.items[0].t.as_ref().unwrap().xml_space.as_deref(),
            Some("preserve")
        );
    }
}
