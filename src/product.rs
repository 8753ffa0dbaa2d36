//! Product folders and their on-disk layout.
//!
//! ```text
//! <products_root>/<product>/components.txt
//! <products_root>/<product>/teststeps/<test>/{readme.txt, teststep.ini}
//! <products_root>/<product>/components/<refdes>/{readme.txt, *.png, *.jpg, *.txt}
//! <products_root>/<product>/testpoints/<refdes>/...
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::Group;
use crate::constants::{CATALOG_FILE, README_FILE, TEST_CONFIG_FILE, TESTSTEPS_DIR};
use crate::error::NavigatorError;
use crate::teststep::{PageMode, TestConfig};

/// Names of the sub-folders of `dir`, sorted. A missing directory yields an empty list.
fn sorted_subfolders(dir: &Path) -> Result<Vec<String>, NavigatorError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map_err(|e| NavigatorError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .collect();
    names.sort();
    Ok(names)
}

/// Discover products: sub-folders of `root` containing a catalog file.
pub fn discover_products(root: &Path) -> Result<Vec<String>, NavigatorError> {
    let products: Vec<String> = sorted_subfolders(root)?
        .into_iter()
        .filter(|name| root.join(name).join(CATALOG_FILE).is_file())
        .collect();

    log::info!("Found {} product folders in {:?}", products.len(), root);
    Ok(products)
}

/// Paths of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLayout {
    /// Product name (folder name)
    pub name: String,
    /// Product folder
    pub root: PathBuf,
}

impl ProductLayout {
    pub fn new(products_root: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: products_root.join(name),
        }
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    pub fn teststeps_dir(&self) -> PathBuf {
        self.root.join(TESTSTEPS_DIR)
    }

    pub fn test_folder(&self, test: &str) -> PathBuf {
        self.teststeps_dir().join(test)
    }

    pub fn test_readme(&self, test: &str) -> PathBuf {
        self.test_folder(test).join(README_FILE)
    }

    pub fn test_config(&self, test: &str) -> PathBuf {
        self.test_folder(test).join(TEST_CONFIG_FILE)
    }

    /// Annotation folder of a refdes.
    pub fn annotation_folder(&self, group: Group, refdes: &str) -> PathBuf {
        self.root.join(group.folder_name()).join(refdes)
    }

    /// Test names, sorted.
    pub fn list_tests(&self) -> Result<Vec<String>, NavigatorError> {
        sorted_subfolders(&self.teststeps_dir())
    }

    /// Create a new test folder with a readme and a configuration listing
    /// every page with `mode`.
    ///
    /// Fails with `DuplicateTest` and touches nothing if the folder exists.
    pub fn create_test<'a>(
        &self,
        name: &str,
        mode: PageMode,
        pages: impl IntoIterator<Item = &'a str>,
    ) -> Result<PathBuf, NavigatorError> {
        let folder = self.test_folder(name);
        if folder.exists() {
            return Err(NavigatorError::DuplicateTest {
                name: name.to_string(),
            });
        }

        std::fs::create_dir_all(&folder).map_err(|e| NavigatorError::io(&folder, e))?;

        let readme = folder.join(README_FILE);
        std::fs::write(&readme, format!("{} components per pages included", mode))
            .map_err(|e| NavigatorError::io(&readme, e))?;

        TestConfig::with_default(pages, mode).save(&folder.join(TEST_CONFIG_FILE))?;

        log::info!("Created test '{}' in {:?}", name, folder);
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_products_requires_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("board_b")).unwrap();
        fs::write(dir.path().join("board_b/components.txt"), "[io]\nU1\n").unwrap();
        fs::create_dir_all(dir.path().join("board_a")).unwrap();
        fs::write(dir.path().join("board_a/components.txt"), "").unwrap();
        fs::create_dir_all(dir.path().join("not_a_product")).unwrap();
        fs::write(dir.path().join("stray.txt"), "").unwrap();

        let products = discover_products(dir.path()).unwrap();
        assert_eq!(products, vec!["board_a", "board_b"]);
    }

    #[test]
    fn test_discover_products_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_products(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_layout_paths() {
        let layout = ProductLayout::new(Path::new("/p"), "board");
        assert_eq!(layout.catalog_file(), PathBuf::from("/p/board/components.txt"));
        assert_eq!(
            layout.test_config("smoke"),
            PathBuf::from("/p/board/teststeps/smoke/teststep.ini")
        );
        assert_eq!(
            layout.annotation_folder(Group::Testpoints, "TP1"),
            PathBuf::from("/p/board/testpoints/TP1")
        );
    }

    #[test]
    fn test_create_test_writes_readme_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProductLayout::new(dir.path(), "board");

        layout.create_test("smoke", PageMode::All, ["power", "io"]).unwrap();

        assert_eq!(
            fs::read_to_string(layout.test_readme("smoke")).unwrap(),
            "all components per pages included"
        );
        let config = TestConfig::load(&layout.test_config("smoke")).unwrap();
        assert_eq!(config.mode("io"), Some(&PageMode::All));
        assert_eq!(layout.list_tests().unwrap(), vec!["smoke"]);
    }

    #[test]
    fn test_create_duplicate_test_leaves_folder_alone() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProductLayout::new(dir.path(), "board");
        fs::create_dir_all(layout.test_folder("smoke")).unwrap();

        let err = layout.create_test("smoke", PageMode::None, ["io"]).unwrap_err();

        assert!(matches!(err, NavigatorError::DuplicateTest { ref name } if name == "smoke"));
        assert_eq!(fs::read_dir(layout.test_folder("smoke")).unwrap().count(), 0);
    }
}
