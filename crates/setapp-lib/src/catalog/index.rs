use super::types::{CatalogDocument, CatalogEntry};
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lookup tables derived from a catalog document. Rebuilt every run.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    by_id: HashMap<u64, CatalogEntry>,
    by_lower_name: HashMap<String, u64>,
}

impl CatalogIndex {
    /// Walk vendor → application → version in one pass.
    ///
    /// Applications without versions have nothing to install and are skipped.
    /// The first listed version is taken as the current one; the store lists
    /// newest first but nothing in the document guarantees it. When two
    /// applications share a lowercase name the later one wins.
    pub fn build(document: &CatalogDocument) -> Self {
        let mut index = Self::default();

        let applications = document
            .data
            .relationships
            .vendors
            .data
            .iter()
            .flat_map(|vendor| vendor.relationships.applications.data.iter());

        for app in applications {
            let Some(latest) = app.relationships.versions.data.first() else {
                log::debug!("Skipping {} ({}): no versions", app.attributes.name, app.id);
                continue;
            };

            let entry = CatalogEntry {
                id: app.id,
                name: app.attributes.name.clone(),
                archive_url: latest.attributes.archive_url.clone(),
            };
            index.by_lower_name.insert(entry.name.to_lowercase(), entry.id);
            index.by_id.insert(entry.id, entry);
        }

        log::debug!("Indexed {} catalog entries", index.by_id.len());
        index
    }

    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.by_id.get(&id)
    }

    /// Case-insensitive name lookup
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_lower_name
            .get(&name.to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.by_id.values()
    }

    /// All entries ordered by display name, for listing
    pub fn entries_sorted_by_name(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.by_id.values().collect();
        entries.sort_by(|a, b| compare_display_names(&a.name, &b.name).then(a.id.cmp(&b.id)));
        entries
    }
}

/// Dictionary-style ordering in three levels: base letters ignoring case and
/// accents, then unaccented before accented, then lowercase before uppercase.
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    let (lower_a, lower_b) = (a.to_lowercase(), b.to_lowercase());
    base_letters(&lower_a)
        .cmp(&base_letters(&lower_b))
        .then_with(|| lower_a.nfd().cmp(lower_b.nfd()))
        .then_with(|| b.cmp(a))
}

/// Decompose and drop combining marks: "ülysses" -> "ulysses"
fn base_letters(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
