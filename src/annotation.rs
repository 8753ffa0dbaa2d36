//! Note buffers and annotation folders.
//!
//! Three independent note slots are edited at any time: the loaded test's
//! readme, the selected item's readme, and the sidecar note of the picture
//! being shown. Each slot is bound to one file and tracks whether its
//! in-memory text diverges from disk. Only an explicit save clears that flag.

pub mod backup;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::README_FILE;
use crate::error::NavigatorError;

/// One of the three note buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSlot {
    /// `teststeps/<test>/readme.txt`
    Test,
    /// `<group>/<refdes>/readme.txt`
    Item,
    /// `<group>/<refdes>/<picture stem>.txt`
    Picture,
}

impl NoteSlot {
    /// Every slot, in save order.
    pub const ALL: [NoteSlot; 3] = [NoteSlot::Test, NoteSlot::Item, NoteSlot::Picture];

    pub fn name(&self) -> &'static str {
        match self {
            NoteSlot::Test => "test",
            NoteSlot::Item => "item",
            NoteSlot::Picture => "picture",
        }
    }

    /// Error for a slot that has no file bound to it.
    fn unbound_error(&self) -> NavigatorError {
        match self {
            NoteSlot::Test => NavigatorError::NoActiveTest,
            NoteSlot::Item => NavigatorError::NoActiveSelection,
            NoteSlot::Picture => NavigatorError::NoPicture,
        }
    }
}

impl fmt::Display for NoteSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory text of one note slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteBuffer {
    /// File the buffer is bound to, if any
    pub path: Option<PathBuf>,
    /// Current text
    pub text: String,
    /// Whether the editing surface accepts input
    pub enabled: bool,
    /// Whether `text` differs from disk
    pub dirty: bool,
}

/// Read a note file.
///
/// Returns the contents and `enabled = true` if the file exists; otherwise
/// empty text and `default_enabled`, so the editor can still be force-enabled
/// for a first note.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD. Saving the note
/// afterwards writes the replaced text; the backup keeps the original bytes.
pub fn load_text(path: &Path, default_enabled: bool) -> Result<(String, bool), NavigatorError> {
    if !path.is_file() {
        return Ok((String::new(), default_enabled));
    }
    let bytes = std::fs::read(path).map_err(|e| NavigatorError::io(path, e))?;
    Ok((String::from_utf8_lossy(&bytes).into_owned(), true))
}

/// Whether an annotation folder exists. Always checks the filesystem, since
/// the operator may add or remove folders by hand at any time.
pub fn has_notes(folder: &Path) -> bool {
    folder.is_dir()
}

/// Create an annotation folder with an empty readme.
///
/// An existing folder is left untouched. Returns true if the folder was created.
pub fn ensure_folder(folder: &Path) -> Result<bool, NavigatorError> {
    if folder.is_dir() {
        return Ok(false);
    }

    std::fs::create_dir_all(folder).map_err(|e| NavigatorError::io(folder, e))?;
    let readme = folder.join(README_FILE);
    std::fs::File::create(&readme).map_err(|e| NavigatorError::io(&readme, e))?;

    log::info!("Created annotation folder {:?}", folder);
    Ok(true)
}

/// Outcome of saving the dirty slots.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Slots written, with the file each was written to
    pub saved: Vec<(NoteSlot, PathBuf)>,
    /// Slots that failed; they stay dirty
    pub failed: Vec<(NoteSlot, NavigatorError)>,
}

impl SaveReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether nothing needed saving.
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty()
    }
}

/// The three note buffers with their dirty flags.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    test: NoteBuffer,
    item: NoteBuffer,
    picture: NoteBuffer,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&self, slot: NoteSlot) -> &NoteBuffer {
        match slot {
            NoteSlot::Test => &self.test,
            NoteSlot::Item => &self.item,
            NoteSlot::Picture => &self.picture,
        }
    }

    fn note_mut(&mut self, slot: NoteSlot) -> &mut NoteBuffer {
        match slot {
            NoteSlot::Test => &mut self.test,
            NoteSlot::Item => &mut self.item,
            NoteSlot::Picture => &mut self.picture,
        }
    }

    /// Bind `slot` to `path` and load its contents, dropping unsaved text.
    pub fn load(
        &mut self,
        slot: NoteSlot,
        path: impl Into<PathBuf>,
        default_enabled: bool,
    ) -> Result<(), NavigatorError> {
        let path = path.into();
        let (text, enabled) = match load_text(&path, default_enabled) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.clear(slot);
                return Err(e);
            }
        };

        log::debug!("Loaded {} note from {:?} (enabled: {})", slot, path, enabled);
        *self.note_mut(slot) = NoteBuffer {
            path: Some(path),
            text,
            enabled,
            dirty: false,
        };
        Ok(())
    }

    /// Unbind `slot` and empty it.
    pub fn clear(&mut self, slot: NoteSlot) {
        *self.note_mut(slot) = NoteBuffer::default();
    }

    /// Replace the text of a bound slot and mark it dirty.
    pub fn edit(&mut self, slot: NoteSlot, text: impl Into<String>) -> Result<(), NavigatorError> {
        let note = self.note_mut(slot);
        if note.path.is_none() {
            return Err(slot.unbound_error());
        }
        note.text = text.into();
        note.dirty = true;
        Ok(())
    }

    /// Record that the buffer diverges from disk.
    pub fn mark_dirty(&mut self, slot: NoteSlot) {
        let note = self.note_mut(slot);
        if !note.dirty {
            log::trace!("Note slot {} marked dirty", slot);
        }
        note.dirty = true;
    }

    /// Drop unsaved changes by reloading the slot from its file.
    ///
    /// On a read error the slot keeps its text and stays dirty.
    pub fn discard(&mut self, slot: NoteSlot) -> Result<(), NavigatorError> {
        let note = self.note_mut(slot);
        if !note.dirty {
            return Ok(());
        }
        let Some(path) = note.path.clone() else {
            note.dirty = false;
            return Ok(());
        };

        let (text, enabled) = load_text(&path, note.enabled)?;
        note.text = text;
        note.enabled = enabled;
        note.dirty = false;
        log::debug!("Reverted {} note to {:?}", slot, path);
        Ok(())
    }

    /// Discard every slot. All slots are attempted; the first error is returned.
    pub fn discard_all(&mut self) -> Result<(), NavigatorError> {
        let mut first_error = None;
        for slot in NoteSlot::ALL {
            if let Err(e) = self.discard(slot) {
                log::error!("Failed to revert {} note: {}", slot, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn is_dirty(&self, slot: NoteSlot) -> bool {
        self.note(slot).dirty
    }

    pub fn any_dirty(&self) -> bool {
        NoteSlot::ALL.iter().any(|slot| self.is_dirty(*slot))
    }

    /// Write one slot to its file, backing up prior content.
    ///
    /// The dirty flag is cleared on success only.
    pub fn save(&mut self, slot: NoteSlot) -> Result<PathBuf, NavigatorError> {
        let note = self.note_mut(slot);
        let Some(path) = note.path.clone() else {
            return Err(slot.unbound_error());
        };

        backup::save_with_backup(&path, &note.text)?;
        note.dirty = false;
        note.enabled = true;

        log::info!("Saved {} note to {:?}", slot, path);
        Ok(path)
    }

    /// Save every dirty slot in `NoteSlot::ALL` order. A failing slot does not
    /// stop the others.
    pub fn save_dirty(&mut self) -> SaveReport {
        let mut report = SaveReport::default();

        for slot in NoteSlot::ALL {
            if !self.is_dirty(slot) {
                continue;
            }
            match self.save(slot) {
                Ok(path) => report.saved.push((slot, path)),
                Err(e) => {
                    log::error!("Failed to save {} note: {}", slot, e);
                    report.failed.push((slot, e));
                }
            }
        }

        report
    }
}
