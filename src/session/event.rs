//! Notifications a session emits for its presentation layer.

use crate::catalog::Group;
use crate::host::BoardSide;

/// The single selected item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub group: Group,
    pub refdes: String,
}

impl Selection {
    pub fn new(group: Group, refdes: impl Into<String>) -> Self {
        Self {
            group,
            refdes: refdes.into(),
        }
    }
}

/// What the operator has focused inside a loaded test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Focus {
    /// Nothing, or a page node without highlighting
    #[default]
    None,
    /// A whole page, highlighted as a group
    Page(String),
    /// One component or test point
    Item(Selection),
}

/// State changes pushed to the presentation layer.
///
/// Drained with `Session::drain_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The products root was rescanned
    ProductsChanged(Vec<String>),
    /// The loaded product's tests changed
    TestsChanged(Vec<String>),
    /// A test was loaded and its active pages resolved
    ActiveSetChanged,
    /// Focus moved
    FocusChanged(Focus),
    /// Whether an item has an annotation folder, recomputed from disk
    NotesMarker {
        group: Group,
        refdes: String,
        has_notes: bool,
    },
    /// The carousel moved or was repopulated
    PictureChanged {
        index: Option<usize>,
        count: usize,
        can_prev: bool,
        can_next: bool,
    },
    /// The board view was turned over
    ViewFlipped(BoardSide),
}
