//! Test definitions and active-subset resolution.
//!
//! Each test folder carries an ini-style `teststep.ini`:
//!
//! ```text
//! [pages]
//! power = all
//! io = none
//! ```
//!
//! Only pages whose mode is the literal `all` contribute, and they contribute
//! their whole membership. There is no per-refdes granularity.

use std::fmt;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::catalog::{Catalog, Group};
use crate::constants::PAGES_SECTION;
use crate::error::NavigatorError;

/// Inclusion mode of one page in a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMode {
    /// Every refdes of the page is active
    All,
    /// The page is excluded
    None,
    /// Unrecognised value, treated like `None`
    Other(String),
}

impl PageMode {
    /// Parse a mode value. Matching is exact, as written by `to_ini`.
    pub fn parse(value: &str) -> Self {
        match value {
            "all" => PageMode::All,
            "none" => PageMode::None,
            other => PageMode::Other(other.to_string()),
        }
    }

    /// Mode used for every page of a newly created test.
    pub fn default_for(include_all: bool) -> Self {
        if include_all {
            PageMode::All
        } else {
            PageMode::None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PageMode::All => "all",
            PageMode::None => "none",
            PageMode::Other(value) => value,
        }
    }
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `[pages]` section of a test configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestConfig {
    pub pages: IndexMap<String, PageMode>,
}

impl TestConfig {
    /// Configuration with every given page set to `mode`.
    pub fn with_default<'a>(pages: impl IntoIterator<Item = &'a str>, mode: PageMode) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| (page.to_string(), mode.clone()))
                .collect(),
        }
    }

    /// Parse ini text. Returns `None` when there is no `[pages]` section.
    ///
    /// Section names and keys are case-insensitive (keys are lower-cased),
    /// `=` and `:` both separate key from value, and lines starting with `#`
    /// or `;` are comments.
    pub fn parse(text: &str) -> Option<Self> {
        let mut pages = IndexMap::new();
        let mut in_pages = false;
        let mut seen_pages = false;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                in_pages = section.trim().eq_ignore_ascii_case(PAGES_SECTION);
                seen_pages |= in_pages;
                continue;
            }

            if !in_pages {
                continue;
            }

            let Some(split) = line.find(['=', ':']) else {
                log::warn!("Ignoring test configuration line without a value: '{}'", line);
                continue;
            };
            let key = line[..split].trim().to_lowercase();
            let value = line[split + 1..].trim();
            pages.insert(key, PageMode::parse(value));
        }

        seen_pages.then_some(Self { pages })
    }

    /// Read a test's configuration file.
    pub fn load(path: &Path) -> Result<Self, NavigatorError> {
        if !path.is_file() {
            return Err(NavigatorError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| NavigatorError::io(path, e))?;
        Self::parse(&text)
            .ok_or_else(|| NavigatorError::invalid_config(path, "missing [pages] section"))
    }

    /// Serialize as ini text.
    pub fn to_ini(&self) -> String {
        let mut out = format!("[{}]\n", PAGES_SECTION);
        for (page, mode) in &self.pages {
            out.push_str(&format!("{} = {}\n", page, mode));
        }
        out.push('\n');
        out
    }

    /// Write the configuration file.
    pub fn save(&self, path: &Path) -> Result<(), NavigatorError> {
        std::fs::write(path, self.to_ini()).map_err(|e| NavigatorError::io(path, e))
    }

    pub fn mode(&self, page: &str) -> Option<&PageMode> {
        self.pages.get(page)
    }
}

/// Active pages and their members for a loaded test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    pub components: IndexMap<String, IndexSet<String>>,
    pub testpoints: IndexMap<String, IndexSet<String>>,
}

impl ActiveSet {
    /// Page map of one group.
    pub fn pages_for(&self, group: Group) -> &IndexMap<String, IndexSet<String>> {
        match group {
            Group::Components => &self.components,
            Group::Testpoints => &self.testpoints,
        }
    }

    /// Whether `refdes` is active in `group`.
    pub fn contains(&self, group: Group, refdes: &str) -> bool {
        self.pages_for(group)
            .values()
            .any(|members| members.contains(refdes))
    }

    /// Whether `name` is an active page.
    pub fn has_page(&self, name: &str) -> bool {
        self.components.contains_key(name) || self.testpoints.contains_key(name)
    }

    /// Members of an active page, components first.
    pub fn page_members(&self, name: &str) -> Vec<String> {
        Group::ALL
            .iter()
            .filter_map(|group| self.pages_for(*group).get(name))
            .flat_map(|members| members.iter().cloned())
            .collect()
    }

    /// Number of active refdes across both groups.
    pub fn refdes_count(&self) -> usize {
        self.components
            .values()
            .chain(self.testpoints.values())
            .map(IndexSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.testpoints.is_empty()
    }
}

/// Compute the active subset of `catalog` for a test configuration.
///
/// Pages appear in configuration order. Pages missing from the catalog are
/// skipped; pages missing from the configuration are never included.
pub fn resolve(catalog: &Catalog, config: &TestConfig) -> ActiveSet {
    let mut active = ActiveSet::default();

    for (name, mode) in &config.pages {
        let Some(page) = catalog.page(name) else {
            log::debug!("Test configuration names unknown page '{}'", name);
            continue;
        };

        match mode {
            PageMode::All => {
                active.components.insert(name.clone(), page.components.clone());
                active.testpoints.insert(name.clone(), page.testpoints.clone());
            }
            PageMode::None => {}
            PageMode::Other(value) => {
                log::warn!(
                    "Page '{}' has unrecognised mode '{}', treating it as excluded",
                    name,
                    value
                );
            }
        }
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "[power]\nU1\nTP1\n[io]\nU2\n";

    fn catalog() -> Catalog {
        Catalog::parse(CATALOG).unwrap()
    }

    #[test]
    fn test_resolve_all_and_none() {
        let config = TestConfig::parse("[pages]\npower = all\nio = none\n").unwrap();
        let active = resolve(&catalog(), &config);

        assert!(active.contains(Group::Components, "U1"));
        assert!(active.contains(Group::Testpoints, "TP1"));
        assert!(!active.contains(Group::Components, "U2"));
        assert_eq!(active.refdes_count(), 2);
        assert!(!active.has_page("io"));
    }

    #[test]
    fn test_pages_missing_from_config_are_excluded() {
        let config = TestConfig::parse("[pages]\nio = all\n").unwrap();
        let active = resolve(&catalog(), &config);
        assert_eq!(active.page_members("io"), vec!["U2".to_string()]);
        assert!(!active.has_page("power"));
    }

    #[test]
    fn test_unknown_pages_and_modes_are_ignored() {
        let config = TestConfig::parse("[pages]\nghost = all\npower = ALL\nio = al\n").unwrap();
        assert_eq!(config.mode("power"), Some(&PageMode::Other("ALL".to_string())));
        let active = resolve(&catalog(), &config);
        assert!(active.is_empty());
    }

    #[test]
    fn test_every_member_lands_in_exactly_one_group() {
        let config = TestConfig::with_default(catalog().page_names(), PageMode::All);
        let active = resolve(&catalog(), &config);
        for (_, page) in catalog().pages() {
            for refdes in page.iter() {
                let in_components = active.contains(Group::Components, refdes);
                let in_testpoints = active.contains(Group::Testpoints, refdes);
                assert!(in_components ^ in_testpoints, "{} must be in one group", refdes);
                assert_eq!(in_testpoints, refdes.starts_with("TP"));
            }
        }
    }

    #[test]
    fn test_result_is_independent_copy() {
        let catalog = catalog();
        let config = TestConfig::parse("[pages]\npower = all\n").unwrap();
        let mut active = resolve(&catalog, &config);
        active.components.get_mut("power").unwrap().insert("U99".to_string());
        assert!(!catalog.page("power").unwrap().contains("U99"));
    }

    #[test]
    fn test_parse_ini_syntax() {
        let text = "; generated\n[other]\npower = all\n\n[Pages]\n# comment\nPower: all\nio=none\n";
        let config = TestConfig::parse(text).unwrap();
        assert_eq!(config.mode("power"), Some(&PageMode::All));
        assert_eq!(config.mode("io"), Some(&PageMode::None));
        assert_eq!(config.pages.len(), 2);
    }

    #[test]
    fn test_parse_without_pages_section() {
        assert!(TestConfig::parse("[general]\nname = smoke\n").is_none());
    }

    #[test]
    fn test_to_ini_reparses() {
        let config = TestConfig::with_default(["power", "io"], PageMode::None);
        let text = config.to_ini();
        assert!(text.starts_with("[pages]\npower = none\n"));
        assert_eq!(TestConfig::parse(&text), Some(config));
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teststep.ini");

        let err = TestConfig::load(&path).unwrap_err();
        assert!(matches!(err, NavigatorError::MissingConfig { .. }));

        std::fs::write(&path, "power = all\n").unwrap();
        let err = TestConfig::load(&path).unwrap_err();
        assert!(matches!(err, NavigatorError::InvalidConfig { .. }));

        std::fs::write(&path, "[pages]\npower = all\n").unwrap();
        assert_eq!(TestConfig::load(&path).unwrap().pages.len(), 1);
    }
}
