//! Error types for session and annotation operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NavigatorError>;

/// Errors raised while parsing a component catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A refdes line appeared before any `[page]` header
    #[error("Malformed catalog: line {line} ('{content}') precedes any page header")]
    MalformedCatalog {
        /// 1-based line number
        line: usize,
        /// Offending line, trimmed
        content: String,
    },
}

/// Errors that can occur while loading products, tests and notes.
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// Catalog text could not be parsed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A test has no configuration file
    #[error("Test configuration not found: {path:?}")]
    MissingConfig {
        /// Expected location of `teststep.ini`
        path: PathBuf,
    },

    /// A test configuration exists but cannot be used
    #[error("Invalid test configuration {path:?}: {message}")]
    InvalidConfig {
        /// Configuration file
        path: PathBuf,
        /// What is wrong with it
        message: String,
    },

    /// File or folder operation failed
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A test with this name already has a folder
    #[error("Test already exists: {name}")]
    DuplicateTest {
        /// Requested test name
        name: String,
    },

    /// Test name that cannot be used as a folder name
    #[error("Invalid test name: '{name}'")]
    InvalidTestName {
        /// Requested test name
        name: String,
    },

    /// Refdes that is not active in the loaded test
    #[error("Not part of the loaded test: {refdes}")]
    UnknownItem {
        /// Requested refdes
        refdes: String,
    },

    /// Page that is not active in the loaded test
    #[error("No active page named '{name}'")]
    UnknownPage {
        /// Requested page, lower-cased
        name: String,
    },

    /// Item-scoped action without a selected item
    #[error("No component or test point selected")]
    NoActiveSelection,

    /// Test-scoped action without a loaded test
    #[error("No test loaded")]
    NoActiveTest,

    /// Product-scoped action without a loaded product
    #[error("No product loaded")]
    NoProduct,

    /// Picture-note action without a current picture
    #[error("No picture shown")]
    NoPicture,

    /// The operator answered "no" to a confirmation
    #[error("Cancelled by operator")]
    Declined,
}

impl NavigatorError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}
