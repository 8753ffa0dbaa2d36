//! Rework Navigator
//!
//! Session and annotation model for board rework and test procedures. A
//! product's component catalog is narrowed to the pages a test activates, and
//! every component or test point can carry a readme and annotated pictures
//! stored next to the product on disk.
//!
//! The crate holds no UI. A host application implements [`host::Host`] for its
//! board view, dialogs and external programs, and drives a [`Session`].

pub mod annotation;
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod product;
pub mod session;
pub mod teststep;

pub use annotation::{AnnotationStore, NoteBuffer, NoteSlot, SaveReport};
pub use carousel::{Direction, Picture, PictureCarousel};
pub use catalog::{Catalog, Group, Page};
pub use config::{AppConfig, LogLevel};
pub use error::{CatalogError, NavigatorError, Result};
pub use host::{BoardSide, Host, Point3};
pub use session::{Focus, Selection, Session, SessionEvent, Stage};
pub use teststep::{ActiveSet, PageMode, TestConfig};
