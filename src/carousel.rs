//! Picture navigation for the selected item.
//!
//! Pictures live in the item's annotation folder; each image `X.png` pairs
//! with a sidecar note `X.txt`. Navigation is bounded: it stops at either end
//! instead of wrapping.

use std::path::{Path, PathBuf};

use crate::constants::{PICTURE_EXTENSIONS, SIDECAR_EXTENSION};
use crate::error::NavigatorError;

/// Check if a path has a supported picture extension
pub fn is_picture_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PICTURE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sidecar note path of an image: same stem, `.txt` extension.
pub fn sidecar_path(image: &Path) -> PathBuf {
    image.with_extension(SIDECAR_EXTENSION)
}

/// An image file and its sidecar note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// Image file
    pub image: PathBuf,
    /// Sidecar note (may not exist yet)
    pub note: PathBuf,
}

impl Picture {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        let image = image.into();
        let note = sidecar_path(&image);
        Self { image, note }
    }

    /// Image file name for display.
    pub fn name(&self) -> String {
        self.image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// List the pictures of an annotation folder in directory order.
///
/// The order is whatever the filesystem enumerates and is not sorted. A
/// missing folder yields no pictures.
pub fn discover_pictures(folder: &Path) -> Result<Vec<Picture>, NavigatorError> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let pictures: Vec<Picture> = std::fs::read_dir(folder)
        .map_err(|e| NavigatorError::io(folder, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_picture_file(path))
        .map(Picture::new)
        .collect();

    log::debug!("Found {} pictures in {:?}", pictures.len(), folder);
    Ok(pictures)
}

/// Navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    fn step(&self) -> isize {
        match self {
            Direction::Next => 1,
            Direction::Prev => -1,
        }
    }
}

/// Ordered pictures of the selected item with a bounded cursor.
#[derive(Debug, Clone, Default)]
pub struct PictureCarousel {
    items: Vec<Picture>,
    /// `None` before the first move, or when empty
    cursor: Option<usize>,
}

impl PictureCarousel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pictures and put the cursor before the first one.
    pub fn set_items(&mut self, items: Vec<Picture>) {
        self.items = items;
        self.cursor = None;
    }

    /// Drop all pictures.
    pub fn clear(&mut self) {
        self.set_items(Vec::new());
    }

    /// Move by one picture, clamped to the ends. Returns the new index, or
    /// `None` if there are no pictures.
    pub fn advance(&mut self, direction: Direction) -> Option<usize> {
        if self.items.is_empty() {
            self.cursor = None;
            return None;
        }

        let last = self.items.len() as isize - 1;
        let from = self.cursor.map_or(-1, |index| index as isize);
        let index = (from + direction.step()).clamp(0, last) as usize;

        self.cursor = Some(index);
        Some(index)
    }

    pub fn current(&self) -> Option<&Picture> {
        self.cursor.and_then(|index| self.items.get(index))
    }

    pub fn index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn items(&self) -> &[Picture] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether "previous" is available.
    pub fn can_prev(&self) -> bool {
        matches!(self.cursor, Some(index) if index > 0)
    }

    /// Whether "next" is available.
    pub fn can_next(&self) -> bool {
        match self.cursor {
            Some(index) => index + 1 < self.items.len(),
            None => !self.items.is_empty(),
        }
    }

    /// Progress string like "3/15".
    pub fn position_label(&self) -> String {
        match self.cursor {
            Some(index) => format!("{}/{}", index + 1, self.items.len()),
            None => format!("-/{}", self.items.len()),
        }
    }
}
