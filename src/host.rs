//! Interfaces to the application hosting a session.
//!
//! The session never renders, opens windows or launches processes itself.
//! It calls into these traits, which the host implements on top of its CAD
//! document, GUI toolkit and operating system.

use std::io;
use std::path::Path;

/// A position in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Board side a part is placed on, and the two view orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardSide {
    #[default]
    Top,
    Bottom,
}

impl BoardSide {
    pub fn name(&self) -> &'static str {
        match self {
            BoardSide::Top => "Top side",
            BoardSide::Bottom => "Bottom side",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            BoardSide::Top => BoardSide::Bottom,
            BoardSide::Bottom => BoardSide::Top,
        }
    }
}

/// The 2D/3D board view that highlights parts.
///
/// Objects are addressed by refdes.
pub trait DocumentView {
    /// Remove every highlight.
    fn clear_selection(&mut self);

    /// Highlight one more object.
    fn add_selection(&mut self, id: &str);

    /// Center of an object, if the document has it.
    fn object_position(&self, id: &str) -> Option<Point3>;

    /// Side of the board an object is placed on, if known.
    fn object_side(&self, id: &str) -> Option<BoardSide>;

    /// Move the camera.
    fn set_camera_position(&mut self, position: Point3);

    /// Look at the board from the given side.
    fn set_view_orientation(&mut self, side: BoardSide);

    /// Fit the whole board in the view.
    fn view_fit(&mut self);
}

/// Blocking operator dialogs.
pub trait Dialogs {
    /// Ask a yes/no question. Blocks until answered.
    fn confirm(&mut self, title: &str, message: &str) -> bool;

    /// Show a notice the operator has to acknowledge.
    fn notify(&mut self, title: &str, message: &str);
}

/// Handing files and folders to other programs.
pub trait Launcher {
    /// Open `path` in an external text editor and wait until it is closed.
    fn edit_file(&mut self, path: &Path) -> io::Result<()>;

    /// Show `path` in the system file manager.
    fn open_folder(&mut self, path: &Path) -> io::Result<()>;
}

/// Everything a session needs from its host.
pub trait Host: DocumentView + Dialogs + Launcher {}

impl<T: DocumentView + Dialogs + Launcher> Host for T {}
