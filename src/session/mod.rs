//! Session orchestration.
//!
//! A `Session` binds the loaded product, the loaded test, the current focus,
//! the three note slots and the picture carousel. Every operation runs to
//! completion on the caller's thread; the only blocking points are the host's
//! confirmation dialogs and the external editor.
//!
//! Stages:
//!
//! ```text
//! NoProduct -> ProductLoaded -> (NoSelection | PageSelected | ItemSelected)
//!                               \______________ test loaded ______________/
//! ```
//!
//! Before anything that replaces a note buffer (switching product, test, item
//! or picture), unsaved notes go through the save flow: the operator is asked
//! whether to save, and a "no" discards the changes. If a save fails the
//! switch is abandoned so the unsaved text is not lost.

mod event;

pub use event::{Focus, Selection, SessionEvent};

use std::path::{Path, PathBuf};

use crate::annotation::{self, AnnotationStore, NoteBuffer, NoteSlot, SaveReport};
use crate::carousel::{self, Direction, PictureCarousel};
use crate::catalog::{Catalog, Group};
use crate::config::AppConfig;
use crate::constants::README_FILE;
use crate::error::{NavigatorError, Result};
use crate::host::{BoardSide, Host};
use crate::product::{self, ProductLayout};
use crate::teststep::{self, ActiveSet, PageMode, TestConfig};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No product loaded
    NoProduct,
    /// Product loaded, no test
    ProductLoaded,
    /// Test loaded, nothing focused
    NoSelection,
    /// Test loaded, a page is highlighted
    PageSelected,
    /// Test loaded, one item selected
    ItemSelected,
}

impl Stage {
    pub fn has_test(&self) -> bool {
        matches!(
            self,
            Stage::NoSelection | Stage::PageSelected | Stage::ItemSelected
        )
    }
}

#[derive(Debug)]
struct LoadedProduct {
    layout: ProductLayout,
    catalog: Catalog,
    tests: Vec<String>,
}

/// Operator session over a products root.
pub struct Session<H: Host> {
    host: H,
    config: AppConfig,
    /// Where preferences are persisted; `None` keeps them in memory
    config_path: Option<PathBuf>,
    products: Vec<String>,
    product: Option<LoadedProduct>,
    test: Option<String>,
    active: ActiveSet,
    focus: Focus,
    notes: AnnotationStore,
    carousel: PictureCarousel,
    view_side: BoardSide,
    events: Vec<SessionEvent>,
}

impl<H: Host> Session<H> {
    /// Create a session and scan the configured products root.
    pub fn new(config: AppConfig, host: H) -> Self {
        let mut session = Self {
            host,
            config,
            config_path: None,
            products: Vec::new(),
            product: None,
            test: None,
            active: ActiveSet::default(),
            focus: Focus::None,
            notes: AnnotationStore::new(),
            carousel: PictureCarousel::new(),
            view_side: BoardSide::Top,
            events: Vec::new(),
        };
        session.host.view_fit();
        session.host.set_view_orientation(BoardSide::Top);
        session.refresh_products();
        session
    }

    /// Persist preferences to `path` whenever they change.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        match (&self.product, &self.test, &self.focus) {
            (None, _, _) => Stage::NoProduct,
            (Some(_), None, _) => Stage::ProductLoaded,
            (Some(_), Some(_), Focus::None) => Stage::NoSelection,
            (Some(_), Some(_), Focus::Page(_)) => Stage::PageSelected,
            (Some(_), Some(_), Focus::Item(_)) => Stage::ItemSelected,
        }
    }

    /// Products found under the products root.
    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.layout.name.as_str())
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.product.as_ref().map(|p| &p.catalog)
    }

    /// Tests of the loaded product.
    pub fn tests(&self) -> &[String] {
        self.product.as_ref().map_or(&[], |p| p.tests.as_slice())
    }

    pub fn test_name(&self) -> Option<&str> {
        self.test.as_deref()
    }

    /// Active pages of the loaded test.
    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.focus {
            Focus::Item(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn note(&self, slot: NoteSlot) -> &NoteBuffer {
        self.notes.note(slot)
    }

    pub fn carousel(&self) -> &PictureCarousel {
        &self.carousel
    }

    pub fn view_side(&self) -> BoardSide {
        self.view_side
    }

    /// Take the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Annotation folder of a refdes in the loaded product.
    pub fn annotation_folder(&self, group: Group, refdes: &str) -> Option<PathBuf> {
        self.product
            .as_ref()
            .map(|p| p.layout.annotation_folder(group, refdes))
    }

    /// Annotation folder of the selected item.
    pub fn current_folder(&self) -> Option<PathBuf> {
        let selection = self.selection()?;
        self.annotation_folder(selection.group, &selection.refdes)
    }

    /// Whether a refdes has an annotation folder, checked on disk.
    pub fn has_notes(&self, group: Group, refdes: &str) -> bool {
        self.annotation_folder(group, refdes)
            .is_some_and(|folder| annotation::has_notes(&folder))
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Replace the text of a note slot, marking it dirty.
    ///
    /// The item note of a refdes without an annotation folder is read-only
    /// until the operator agrees to create the folder.
    pub fn edit_note(&mut self, slot: NoteSlot, text: impl Into<String>) -> Result<()> {
        if slot == NoteSlot::Item && self.selection().is_some() && !self.notes.note(slot).enabled
        {
            let folder =
                self.ensure_current_folder("No information-folder for current selection")?;
            self.refresh_marker();
            self.notes.load(NoteSlot::Item, folder.join(README_FILE), true)?;
        }
        self.notes.edit(slot, text)
    }

    /// Save every dirty slot without asking.
    pub fn save(&mut self) -> Result<SaveReport> {
        self.save_flow(true)
    }

    /// Save or discard dirty slots before a switch.
    ///
    /// Unless `silent`, the operator chooses between saving and discarding;
    /// discarded slots are reloaded from disk. Each dirty slot is saved
    /// independently. If any fails the operator is told which file, the slot
    /// stays dirty and the first error is returned.
    fn save_flow(&mut self, silent: bool) -> Result<SaveReport> {
        if !self.notes.any_dirty() {
            return Ok(SaveReport::default());
        }

        if !silent && !self.host.confirm("Information changed", "Save changes?") {
            log::info!("Unsaved notes discarded by operator");
            self.notes.discard_all()?;
            return Ok(SaveReport::default());
        }

        let mut report = self.notes.save_dirty();

        if report.is_ok() {
            return Ok(report);
        }

        for (slot, error) in &report.failed {
            let path = self
                .notes
                .note(*slot)
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.host.notify(
                "Save failed",
                &format!("Could not save the {} note to {}: {}", slot, path, error),
            );
        }
        let (_, first) = report.failed.remove(0);
        Err(first)
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    /// Rescan the products root.
    pub fn refresh_products(&mut self) -> &[String] {
        let root = self.config.preferences.products_path.clone();
        self.products = product::discover_products(&root).unwrap_or_else(|e| {
            log::warn!("Failed to scan products root {:?}: {}", root, e);
            Vec::new()
        });

        if self.products.is_empty() {
            self.host.notify("Warning", "No valid product folders found");
        }

        self.events
            .push(SessionEvent::ProductsChanged(self.products.clone()));
        &self.products
    }

    /// Switch to another products root and remember it.
    pub fn browse_products(&mut self, root: impl Into<PathBuf>) -> Result<()> {
        self.save_flow(false)?;
        self.unload_product();

        self.config.preferences.products_path = root.into();
        log::info!(
            "Products root set to {:?}",
            self.config.preferences.products_path
        );

        if !self.refresh_products().is_empty() {
            self.persist_config();
        }
        Ok(())
    }

    /// Load a product: parse its catalog and list its tests.
    ///
    /// A malformed catalog is reported and leaves the product loaded with no
    /// pages.
    pub fn load_product(&mut self, name: &str) -> Result<()> {
        log::info!("Loading product '{}'", name);
        self.save_flow(false)?;
        self.unload_product();

        let layout = ProductLayout::new(&self.config.preferences.products_path, name);
        let catalog = match Catalog::load(&layout.catalog_file()) {
            Ok(catalog) => catalog,
            Err(NavigatorError::Catalog(e)) => {
                log::warn!("Product '{}' has a malformed catalog: {}", name, e);
                self.host.notify("Malformed catalog", &e.to_string());
                Catalog::new()
            }
            Err(e) => {
                log::error!("Not a valid product folder: {:?}", layout.root);
                self.host.notify("Not a valid product folder", &e.to_string());
                return Err(e);
            }
        };

        let tests = layout.list_tests().unwrap_or_else(|e| {
            log::warn!("Failed to list tests of '{}': {}", name, e);
            Vec::new()
        });
        log::debug!("Product '{}' has tests {:?}", name, tests);

        self.events.push(SessionEvent::TestsChanged(tests.clone()));
        self.product = Some(LoadedProduct {
            layout,
            catalog,
            tests,
        });
        Ok(())
    }

    fn unload_product(&mut self) {
        self.unload_test();
        self.product = None;
    }

    fn layout(&self) -> Result<&ProductLayout> {
        self.product
            .as_ref()
            .map(|p| &p.layout)
            .ok_or(NavigatorError::NoProduct)
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    /// Load a test of the current product and resolve its active pages.
    pub fn load_test(&mut self, name: &str) -> Result<()> {
        log::info!("Loading test '{}'", name);
        self.layout()?;
        self.save_flow(false)?;
        self.unload_test();

        let layout = self.layout()?.clone();
        let config = match TestConfig::load(&layout.test_config(name)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Cannot load test '{}': {}", name, e);
                self.host.notify("Config file not found", &e.to_string());
                return Err(e);
            }
        };

        self.active = self
            .product
            .as_ref()
            .map(|p| teststep::resolve(&p.catalog, &config))
            .unwrap_or_default();
        log::debug!(
            "Test '{}' activates {} refdes",
            name,
            self.active.refdes_count()
        );

        self.test = Some(name.to_string());
        self.notes
            .load(NoteSlot::Test, layout.test_readme(name), false)?;
        self.events.push(SessionEvent::ActiveSetChanged);
        Ok(())
    }

    fn unload_test(&mut self) {
        self.clear_focus();
        self.notes.clear(NoteSlot::Test);
        self.active = ActiveSet::default();
        self.test = None;
    }

    /// Create a test with every known page set to `all` or `none`, then
    /// refresh the test list.
    pub fn create_test(&mut self, name: &str, include_all: bool) -> Result<PathBuf> {
        self.layout()?;
        self.save_flow(false)?;

        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(NavigatorError::InvalidTestName {
                name: name.to_string(),
            });
        }

        let layout = self.layout()?.clone();
        let pages: Vec<String> = self
            .catalog()
            .map(|c| c.page_names().map(String::from).collect())
            .unwrap_or_default();

        let folder = match layout.create_test(
            name,
            PageMode::default_for(include_all),
            pages.iter().map(String::as_str),
        ) {
            Ok(folder) => folder,
            Err(e @ NavigatorError::DuplicateTest { .. }) => {
                self.host.notify("Test already exists", name);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.refresh_tests();
        Ok(folder)
    }

    fn refresh_tests(&mut self) {
        let Some(product) = self.product.as_mut() else {
            return;
        };
        product.tests = product.layout.list_tests().unwrap_or_else(|e| {
            log::warn!("Failed to list tests: {}", e);
            Vec::new()
        });
        self.events
            .push(SessionEvent::TestsChanged(product.tests.clone()));
    }

    /// Open the loaded test's configuration in the external editor, wait for
    /// it to close, then reload the test.
    pub fn edit_test(&mut self) -> Result<()> {
        let name = self.test.clone().ok_or(NavigatorError::NoActiveTest)?;
        self.save_flow(false)?;

        let config_file = self.layout()?.test_config(&name);
        if !config_file.is_file() {
            self.host
                .notify("Config file not found", &config_file.display().to_string());
            return Err(NavigatorError::MissingConfig { path: config_file });
        }

        log::info!("Editing {:?}", config_file);
        self.host
            .edit_file(&config_file)
            .map_err(|e| NavigatorError::io(&config_file, e))?;

        self.load_test(&name)
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    fn require_test(&self) -> Result<()> {
        if self.test.is_some() {
            Ok(())
        } else {
            Err(NavigatorError::NoActiveTest)
        }
    }

    /// Drop focus, highlights, the item and picture notes and the carousel.
    fn clear_focus(&mut self) {
        self.host.clear_selection();
        self.notes.clear(NoteSlot::Item);
        self.notes.clear(NoteSlot::Picture);
        self.carousel.clear();
        if self.focus != Focus::None {
            self.focus = Focus::None;
            self.events.push(SessionEvent::FocusChanged(Focus::None));
        }
    }

    /// Recompute the notes marker of the selected item from disk.
    fn refresh_marker(&mut self) {
        let Some(selection) = self.selection().cloned() else {
            return;
        };
        let has_notes = self.has_notes(selection.group, &selection.refdes);
        self.events.push(SessionEvent::NotesMarker {
            group: selection.group,
            refdes: selection.refdes,
            has_notes,
        });
    }

    /// Select one component or test point of the loaded test.
    pub fn select_item(&mut self, group: Group, refdes: &str) -> Result<()> {
        self.require_test()?;
        if !self.active.contains(group, refdes) {
            return Err(NavigatorError::UnknownItem {
                refdes: refdes.to_string(),
            });
        }

        log::debug!("Selecting {} {}", group.name(), refdes);
        self.save_flow(false)?;
        // The previous item's folder may have changed on disk meanwhile
        self.refresh_marker();
        self.clear_focus();

        let selection = Selection::new(group, refdes);
        self.focus = Focus::Item(selection.clone());
        self.events
            .push(SessionEvent::FocusChanged(self.focus.clone()));
        self.refresh_marker();

        self.highlight_item(refdes);
        self.reload_item()
    }

    /// Highlight the selected part, pan to it and turn the board to its side.
    fn highlight_item(&mut self, refdes: &str) {
        self.host.add_selection(refdes);

        if self.config.preferences.pan_to_selection {
            match self.host.object_position(refdes) {
                Some(position) => self.host.set_camera_position(position),
                None => log::debug!("No position for {} in document", refdes),
            }
        }

        if self.config.preferences.auto_flip {
            let other_side = self
                .host
                .object_side(refdes)
                .filter(|side| *side != self.view_side);
            if let Some(side) = other_side {
                log::debug!("Switching view to {}", side.name());
                self.flip(side);
            }
        }
    }

    /// Load the item note and repopulate the carousel for the selection.
    fn reload_item(&mut self) -> Result<()> {
        let folder = self.current_folder().ok_or(NavigatorError::NoActiveSelection)?;

        let enabled = annotation::has_notes(&folder);
        self.notes
            .load(NoteSlot::Item, folder.join(README_FILE), enabled)?;

        let pictures = carousel::discover_pictures(&folder)?;
        self.carousel.set_items(pictures);
        self.show_picture(Direction::Next)
    }

    /// Move the carousel and load the shown picture's note.
    fn show_picture(&mut self, direction: Direction) -> Result<()> {
        let loaded = match self.carousel.advance(direction) {
            Some(_) => {
                let note = self.carousel.current().map(|p| p.note.clone());
                match note {
                    Some(note) => self.notes.load(NoteSlot::Picture, note, true),
                    None => Ok(()),
                }
            }
            None => {
                self.notes.clear(NoteSlot::Picture);
                Ok(())
            }
        };

        self.events.push(SessionEvent::PictureChanged {
            index: self.carousel.index(),
            count: self.carousel.len(),
            can_prev: self.carousel.can_prev(),
            can_next: self.carousel.can_next(),
        });
        loaded
    }

    /// Show the next or previous picture of the selected item.
    pub fn advance_picture(&mut self, direction: Direction) -> Result<Option<usize>> {
        self.save_flow(false)?;
        if self.carousel.is_empty() {
            return Ok(None);
        }
        self.show_picture(direction)?;
        Ok(self.carousel.index())
    }

    /// Highlight every member of an active page. Clears the single selection.
    pub fn select_page(&mut self, name: &str) -> Result<()> {
        self.require_test()?;
        let name = name.to_lowercase();
        if !self.active.has_page(&name) {
            return Err(NavigatorError::UnknownPage { name });
        }

        self.save_flow(false)?;
        self.refresh_marker();
        self.clear_focus();

        for refdes in self.active.page_members(&name) {
            self.host.add_selection(&refdes);
        }

        log::debug!("Page '{}' highlighted", name);
        self.focus = Focus::Page(name);
        self.events
            .push(SessionEvent::FocusChanged(self.focus.clone()));
        Ok(())
    }

    /// Drop focus inside the loaded test.
    pub fn clear_selection(&mut self) -> Result<()> {
        self.save_flow(false)?;
        self.refresh_marker();
        self.clear_focus();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Annotation folder
    // ------------------------------------------------------------------

    /// Make sure the selected item has an annotation folder, asking the
    /// operator before creating one.
    fn ensure_current_folder(&mut self, title: &str) -> Result<PathBuf> {
        let selection = self
            .selection()
            .cloned()
            .ok_or(NavigatorError::NoActiveSelection)?;
        let folder = self
            .current_folder()
            .ok_or(NavigatorError::NoActiveSelection)?;

        if annotation::has_notes(&folder) {
            return Ok(folder);
        }

        let question = format!("Add folder for {}?", selection.refdes);
        if !self.host.confirm(title, &question) {
            log::info!("Folder creation for {} cancelled", selection.refdes);
            return Err(NavigatorError::Declined);
        }

        annotation::ensure_folder(&folder)?;
        Ok(folder)
    }

    /// Copy pictures into the selected item's folder, each with an empty
    /// sidecar note, and repopulate the carousel.
    ///
    /// Returns how many pictures were added.
    pub fn add_pictures<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<usize> {
        if self.selection().is_none() {
            return Err(NavigatorError::NoActiveSelection);
        }
        self.save_flow(false)?;
        let folder =
            self.ensure_current_folder("No information-folder for current selection")?;

        let mut added = 0;
        let mut failure = None;
        for source in files {
            match copy_picture(source.as_ref(), &folder) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        log::info!("Added {} pictures to {:?}", added, folder);

        self.reload_item()?;
        self.refresh_marker();
        match failure {
            Some(e) => Err(e),
            None => Ok(added),
        }
    }

    /// Hand the selected item's folder to the file manager, creating it
    /// first if the operator agrees.
    pub fn open_folder(&mut self) -> Result<PathBuf> {
        if self.selection().is_none() {
            return Err(NavigatorError::NoActiveSelection);
        }
        self.save_flow(false)?;
        let folder = self.ensure_current_folder("No information for current selection")?;
        self.refresh_marker();
        self.save_flow(true)?;

        self.host
            .open_folder(&folder)
            .map_err(|e| NavigatorError::io(&folder, e))?;
        Ok(folder)
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Look at the board from `side`.
    pub fn flip(&mut self, side: BoardSide) {
        self.host.set_view_orientation(side);
        self.view_side = side;
        self.events.push(SessionEvent::ViewFlipped(side));
    }

    pub fn view_fit(&mut self) {
        self.host.view_fit();
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to_path(path) {
            log::warn!("Failed to save preferences: {}", e);
        }
    }

    /// Save pending notes without asking and write preferences back.
    pub fn shutdown(&mut self) -> Result<SaveReport> {
        log::info!("Shutting down session");
        let report = self.save_flow(true);
        self.persist_config();
        report
    }
}

/// Whether `a` and `b` name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if !b.exists() {
        return false;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy one picture into `folder` and create its sidecar note if missing.
///
/// A picture that already lives in `folder` is not copied onto itself, but
/// still gets its sidecar. Returns whether the picture was copied.
fn copy_picture(source: &Path, folder: &Path) -> Result<bool> {
    let Some(file_name) = source.file_name() else {
        log::warn!("Skipping {:?}: no file name", source);
        return Ok(false);
    };
    if !carousel::is_picture_file(source) {
        log::warn!("Skipping {:?}: not a picture", source);
        return Ok(false);
    }

    let target = folder.join(file_name);
    let copied = if is_same_file(source, &target) {
        log::info!("{:?} is already in {:?}", source, folder);
        false
    } else {
        std::fs::copy(source, &target).map_err(|e| NavigatorError::io(source, e))?;
        log::debug!("Copied {:?} to {:?}", source, target);
        true
    };

    let sidecar = carousel::sidecar_path(&target);
    if !sidecar.exists() {
        std::fs::File::create(&sidecar).map_err(|e| NavigatorError::io(&sidecar, e))?;
    }

    Ok(copied)
}
