//! Synthetic refno allocation
//!
//! Derived identifiers take the form `<parent>_<TAG><n>`:
//! - `SP`: sub-run left after splitting a run around engulfed fittings
//! - `BR`: bridge created by sequence-based gap filling
//! - `GAP`: bridge created by the sequential snapper
//! - `SEG`: piece of a segmented over-length run
//!
//! One allocator is shared by every stage of a pipeline run, so refnos stay
//! unique across the whole collection.

use std::collections::{HashMap, HashSet};

use crate::entities::component::Component;

/// Suffix tag for a synthetic component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticTag {
    SubRun,
    Bridge,
    SequenceGap,
    Segment,
}

impl SyntheticTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticTag::SubRun => "SP",
            SyntheticTag::Bridge => "BR",
            SyntheticTag::SequenceGap => "GAP",
            SyntheticTag::Segment => "SEG",
        }
    }
}

/// Hands out unique derived refnos
#[derive(Debug, Default, Clone)]
pub struct RefnoAllocator {
    used: HashSet<String>,
    /// Next counter per (parent, tag)
    next: HashMap<(String, SyntheticTag), u32>,
}

impl RefnoAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every refno already present in `components`
    pub fn from_components(components: &[Component]) -> Self {
        let mut alloc = Self::new();
        alloc.reserve_all(components);
        alloc
    }

    pub fn reserve_all(&mut self, components: &[Component]) {
        for c in components {
            self.used.insert(c.refno.clone());
        }
    }

    /// Mark a refno as taken; returns false when it already was
    pub fn reserve(&mut self, refno: &str) -> bool {
        self.used.insert(refno.to_string())
    }

    pub fn is_used(&self, refno: &str) -> bool {
        self.used.contains(refno)
    }

    /// Next unused `<parent>_<TAG><n>`, counting from 1
    pub fn derive(&mut self, parent: &str, tag: SyntheticTag) -> String {
        let counter = self.next.entry((parent.to_string(), tag)).or_insert(1);
        loop {
            let candidate = format!("{}_{}{}", parent, tag.as_str(), counter);
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Segment refno with a fixed index; bumps a `-n` suffix on collision
    pub fn derive_indexed(&mut self, parent: &str, tag: SyntheticTag, index: usize) -> String {
        let base = format!("{}_{}{}", parent, tag.as_str(), index);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            n += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::component::ComponentKind;

    #[test]
    fn test_derive_counts_per_parent_and_tag() {
        let mut alloc = RefnoAllocator::new();
        assert_eq!(alloc.derive("P-1", SyntheticTag::SubRun), "P-1_SP1");
        assert_eq!(alloc.derive("P-1", SyntheticTag::SubRun), "P-1_SP2");
        assert_eq!(alloc.derive("P-1", SyntheticTag::Bridge), "P-1_BR1");
        assert_eq!(alloc.derive("P-2", SyntheticTag::SubRun), "P-2_SP1");
    }

    #[test]
    fn test_derive_skips_existing_refnos() {
        let existing = vec![
            Component::new("P-1", ComponentKind::Pipe),
            Component::new("P-1_SP1", ComponentKind::Pipe),
        ];
        let mut alloc = RefnoAllocator::from_components(&existing);
        assert!(alloc.is_used("P-1"));
        assert_eq!(alloc.derive("P-1", SyntheticTag::SubRun), "P-1_SP2");
    }

    #[test]
    fn test_derive_indexed_collision() {
        let mut alloc = RefnoAllocator::new();
        assert!(alloc.reserve("P-9_SEG1"));
        assert_eq!(alloc.derive_indexed("P-9", SyntheticTag::Segment, 1), "P-9_SEG1-2");
        assert_eq!(alloc.derive_indexed("P-9", SyntheticTag::Segment, 2), "P-9_SEG2");
        assert!(!alloc.reserve("P-9_SEG2"));
    }
}
