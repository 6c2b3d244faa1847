//! Label dictionary (C1): intern labels to dense integer ids.
//!
//! `parsing::LabelDict` already plays this role while trees are tokenized
//! (insertion is folded into the parallel parse pass, see `parsing::parse_dataset`).
//! `LabelDictionary` is the same idea exposed as the explicit `insert`/`size`/`clear`
//! contract used by components that only need a dictionary, not a full parser
//! (e.g. cost models and ad-hoc test fixtures).

use crate::parsing::{LabelDict, LabelId};

#[derive(Debug, Default, Clone)]
pub struct LabelDictionary {
    dict: LabelDict,
    next_id: LabelId,
}

impl LabelDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: returns the existing id if `label` was already interned.
    pub fn insert(&mut self, label: &str) -> LabelId {
        if let Some((id, count)) = self.dict.get_mut(label) {
            *count += 1;
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.dict.insert(label.to_owned(), (id, 1));
        id
    }

    pub fn size(&self) -> usize {
        self.dict.len()
    }

    pub fn clear(&mut self) {
        self.dict.clear();
        self.next_id = 0;
    }

    pub fn get(&self, label: &str) -> Option<LabelId> {
        self.dict.get(label).map(|(id, _)| *id)
    }

    pub fn as_raw(&self) -> &LabelDict {
        &self.dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut d = LabelDictionary::new();
        let a1 = d.insert("a");
        let a2 = d.insert("a");
        assert_eq!(a1, a2);
        assert_eq!(d.size(), 1);
    }

    #[test]
    fn insert_assigns_ids_in_order() {
        let mut d = LabelDictionary::new();
        assert_eq!(d.insert("a"), 0);
        assert_eq!(d.insert("b"), 1);
        assert_eq!(d.insert("a"), 0);
        assert_eq!(d.size(), 2);
    }

    #[test]
    fn clear_resets_ids() {
        let mut d = LabelDictionary::new();
        d.insert("a");
        d.clear();
        assert_eq!(d.size(), 0);
        assert_eq!(d.insert("b"), 0);
    }
}
