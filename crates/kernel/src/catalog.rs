use scenery_common::ContentRef;
use std::collections::BTreeSet;

/// Content available for placement, as reported by the content-pack loader.
///
/// An open catalog accepts any reference; used when no packs are loaded.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    known: Option<BTreeSet<ContentRef>>,
}

impl ContentCatalog {
    /// Catalog that accepts every reference.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn from_refs(refs: impl IntoIterator<Item = ContentRef>) -> Self {
        Self {
            known: Some(refs.into_iter().collect()),
        }
    }

    pub fn contains(&self, content: &ContentRef) -> bool {
        self.known.as_ref().is_none_or(|k| k.contains(content))
    }

    pub fn insert(&mut self, content: ContentRef) {
        if let Some(known) = self.known.as_mut() {
            known.insert(content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_catalog_accepts_anything() {
        let c = ContentCatalog::open();
        assert!(c.contains(&ContentRef::parse("any/thing").unwrap()));
    }

    #[test]
    fn closed_catalog_only_accepts_known() {
        let oak = ContentRef::parse("forest/oak").unwrap();
        let pine = ContentRef::parse("forest/pine").unwrap();
        let mut c = ContentCatalog::from_refs([oak.clone()]);
        assert!(c.contains(&oak));
        assert!(!c.contains(&pine));
        c.insert(pine.clone());
        assert!(c.contains(&pine));
    }
}
