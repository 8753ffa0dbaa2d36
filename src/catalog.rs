//! Component catalog parsing.
//!
//! A product's `components.txt` lists refdes strings grouped under page
//! headers:
//!
//! ```text
//! [power]
//! U1
//! TP1
//!
//! [io]
//! U2
//! ```
//!
//! Page names are lower-cased. A refdes starting with `TP` is a test point,
//! everything else is a component. Membership is a set, but file order is kept
//! for display.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::constants::TESTPOINT_PREFIX;
use crate::error::{CatalogError, NavigatorError};

/// Whether a refdes names a test point (reserved `TP` prefix).
pub fn is_testpoint(refdes: &str) -> bool {
    refdes.starts_with(TESTPOINT_PREFIX)
}

/// The two kinds of selectable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Components,
    Testpoints,
}

impl Group {
    /// Both groups, in display order.
    pub const ALL: [Group; 2] = [Group::Components, Group::Testpoints];

    /// Classify a refdes by its prefix.
    pub fn of(refdes: &str) -> Self {
        if is_testpoint(refdes) {
            Group::Testpoints
        } else {
            Group::Components
        }
    }

    /// Folder under the product root holding this group's annotation folders.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Group::Components => "components",
            Group::Testpoints => "testpoints",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Group::Components => "Components",
            Group::Testpoints => "Testpoints",
        }
    }
}

/// Refdes members of one schematic page, split by group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub components: IndexSet<String>,
    pub testpoints: IndexSet<String>,
}

impl Page {
    /// Add a refdes to the set matching its prefix. Returns false on a duplicate.
    pub fn insert(&mut self, refdes: impl Into<String>) -> bool {
        let refdes = refdes.into();
        match Group::of(&refdes) {
            Group::Components => self.components.insert(refdes),
            Group::Testpoints => self.testpoints.insert(refdes),
        }
    }

    /// Whether the page lists this refdes in either group.
    pub fn contains(&self, refdes: &str) -> bool {
        self.components.contains(refdes) || self.testpoints.contains(refdes)
    }

    /// All members, components first.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter().chain(self.testpoints.iter())
    }

    pub fn len(&self) -> usize {
        self.components.len() + self.testpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parsed `components.txt`: page name to members, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pages: IndexMap<String, Page>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog text.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut pages: IndexMap<String, Page> = IndexMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').unwrap_or(header).trim().to_lowercase();
                if pages.insert(name.clone(), Page::default()).is_some() {
                    log::warn!("Catalog page '{}' declared twice, keeping the last block", name);
                }
                current = Some(name);
                continue;
            }

            let Some(page) = current.as_ref().and_then(|name| pages.get_mut(name)) else {
                return Err(CatalogError::MalformedCatalog {
                    line: index + 1,
                    content: line.to_string(),
                });
            };

            if !page.insert(line) {
                log::debug!("Duplicate refdes {} ignored", line);
            }
        }

        Ok(Self { pages })
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, NavigatorError> {
        let text = std::fs::read_to_string(path).map_err(|e| NavigatorError::io(path, e))?;
        let catalog = Self::parse(&text)?;
        log::debug!(
            "Parsed catalog {:?}: {} pages, {} refdes",
            path,
            catalog.pages.len(),
            catalog.refdes_count()
        );
        Ok(catalog)
    }

    /// Serialize back to catalog text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (name, page) in &self.pages {
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for refdes in page.iter() {
                out.push_str(refdes);
                out.push('\n');
            }
        }
        out
    }

    /// Page names in file order.
    pub fn page_names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    pub fn pages(&self) -> &IndexMap<String, Page> {
        &self.pages
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of refdes entries across pages.
    pub fn refdes_count(&self) -> usize {
        self.pages.values().map(Page::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_two_pages() {
        let catalog = Catalog::parse("[power]\nU1\nTP1\n[io]\nU2\n").unwrap();

        assert_eq!(catalog.page_names().collect::<Vec<_>>(), vec!["power", "io"]);

        let power = catalog.page("power").unwrap();
        assert_eq!(power.components, set(&["U1"]));
        assert_eq!(power.testpoints, set(&["TP1"]));

        let io = catalog.page("io").unwrap();
        assert_eq!(io.components, set(&["U2"]));
        assert!(io.testpoints.is_empty());
    }

    #[test]
    fn test_page_names_lowercased_and_blank_lines_ignored() {
        let catalog = Catalog::parse("\n  [Power Supply]  \n\n  C12 \n\n").unwrap();
        let page = catalog.page("power supply").expect("page should exist");
        assert_eq!(page.components, set(&["C12"]));
    }

    #[test]
    fn test_refdes_before_header_is_malformed() {
        let err = Catalog::parse("\nU1\n[power]\nU2\n").unwrap_err();
        assert_eq!(
            err,
            CatalogError::MalformedCatalog {
                line: 2,
                content: "U1".to_string()
            }
        );
    }

    #[test]
    fn test_empty_page_is_kept() {
        let catalog = Catalog::parse("[empty]\n[io]\nU2\n").unwrap();
        assert!(catalog.page("empty").unwrap().is_empty());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_duplicate_refdes_collapses() {
        let catalog = Catalog::parse("[io]\nU2\nU2\nTP3\nTP3\n").unwrap();
        assert_eq!(catalog.refdes_count(), 2);
    }

    #[test]
    fn test_redeclared_page_restarts() {
        let catalog = Catalog::parse("[io]\nU1\n[power]\nU3\n[IO]\nU2\n").unwrap();
        assert_eq!(catalog.page("io").unwrap().components, set(&["U2"]));
        assert_eq!(catalog.page_names().collect::<Vec<_>>(), vec!["io", "power"]);
    }

    #[test]
    fn test_to_text_reparses_to_same_catalog() {
        let text = "[Power]\nTP1\nU1\n\n[io]\nU2\nU2\n[empty]\n";
        let parsed = Catalog::parse(text).unwrap();
        let reparsed = Catalog::parse(&parsed.to_text()).unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn test_classifier() {
        assert!(is_testpoint("TP12"));
        assert!(!is_testpoint("U1"));
        assert!(!is_testpoint("tp1"));
        assert_eq!(Group::of("TP4"), Group::Testpoints);
        assert_eq!(Group::of("R4"), Group::Components);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("components.txt")).unwrap_err();
        assert!(matches!(err, NavigatorError::Io { .. }));
    }
}
