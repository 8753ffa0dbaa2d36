//! Global constants for the rework navigator

/// Catalog file that marks a folder as a product
pub const CATALOG_FILE: &str = "components.txt";

/// Folder holding one sub-folder per test definition
pub const TESTSTEPS_DIR: &str = "teststeps";

/// Configuration file inside a test folder
pub const TEST_CONFIG_FILE: &str = "teststep.ini";

/// Note file inside a test folder or an annotation folder
pub const README_FILE: &str = "readme.txt";

/// Sub-folder receiving replaced note files
pub const BACKUP_DIR: &str = "backup";

/// Extension of picture sidecar notes
pub const SIDECAR_EXTENSION: &str = "txt";

/// Refdes prefix reserved for test points
pub const TESTPOINT_PREFIX: &str = "TP";

/// Section of the test configuration mapping page name to inclusion mode
pub const PAGES_SECTION: &str = "pages";

/// Picture extensions recognised inside an annotation folder
pub const PICTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// `strftime` pattern for backup file timestamps, e.g. `Mar-07-2024_14.05.09`
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%b-%d-%Y_%H.%M.%S";

/// Default products root, relative to the working directory
pub const DEFAULT_PRODUCTS_DIR: &str = "products";
