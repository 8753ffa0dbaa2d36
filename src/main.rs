//! Console host for Rework Navigator.
//!
//! Reads commands from stdin and drives a session. Confirmations and notices
//! use native message boxes, notes are edited in `$VISUAL`/`$EDITOR`, and
//! there is no board document, so view calls are only logged.

#[cfg(not(target_arch = "wasm32"))]
mod console {
    use std::io::{self, BufRead, Write};
    use std::path::{Path, PathBuf};
    use std::process::Command;

    use rework_navigator::constants::PICTURE_EXTENSIONS;
    use rework_navigator::host::{Dialogs, DocumentView, Launcher};
    use rework_navigator::{
        AppConfig, BoardSide, Direction, Group, NoteSlot, Point3, Session, SessionEvent,
    };

    const HELP: &str = "\
commands:
  products                    list products
  product NAME                load a product
  test NAME                   load a test
  select REFDES               select a component or test point
  page NAME                   highlight every member of a page
  clear                       drop the selection
  next | prev                 show the next or previous picture
  note test|item|picture TEXT replace a note
  show                        print the notes
  save                        save changed notes
  add [FILE...]               add pictures to the selection
  new-test NAME [all|none]    create a test
  edit-test                   edit the loaded test's configuration
  open                        open the selection's folder
  flip [top|bottom]           turn the board over
  fit                         fit the board in the view
  browse [FOLDER]             choose another products folder
  status                      print the session state
  quit";

    /// Host without a board document.
    #[derive(Debug, Default)]
    pub struct ConsoleHost;

    impl DocumentView for ConsoleHost {
        fn clear_selection(&mut self) {
            log::trace!("view: clear selection");
        }

        fn add_selection(&mut self, id: &str) {
            log::debug!("view: highlight {}", id);
        }

        fn object_position(&self, _id: &str) -> Option<Point3> {
            None
        }

        fn object_side(&self, _id: &str) -> Option<BoardSide> {
            None
        }

        fn set_camera_position(&mut self, position: Point3) {
            log::debug!("view: camera at {:?}", position);
        }

        fn set_view_orientation(&mut self, side: BoardSide) {
            log::debug!("view: {}", side.name());
        }

        fn view_fit(&mut self) {
            log::trace!("view: fit");
        }
    }

    impl Dialogs for ConsoleHost {
        fn confirm(&mut self, title: &str, message: &str) -> bool {
            let answer = rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Info)
                .set_title(title)
                .set_description(message)
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            matches!(answer, rfd::MessageDialogResult::Yes)
        }

        fn notify(&mut self, title: &str, message: &str) {
            log::warn!("{}: {}", title, message);
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title(title)
                .set_description(message)
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
        }
    }

    fn editor() -> String {
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| {
                if cfg!(windows) {
                    "notepad".to_string()
                } else {
                    "vi".to_string()
                }
            })
    }

    fn file_manager() -> &'static str {
        if cfg!(windows) {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }

    impl Launcher for ConsoleHost {
        fn edit_file(&mut self, path: &Path) -> io::Result<()> {
            let editor = editor();
            log::info!("Waiting for {} to close {:?}", editor, path);
            let status = Command::new(&editor).arg(path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(io::Error::other(format!("{} exited with {}", editor, status)))
            }
        }

        fn open_folder(&mut self, path: &Path) -> io::Result<()> {
            Command::new(file_manager()).arg(path).spawn()?;
            Ok(())
        }
    }

    fn print_event(event: &SessionEvent) {
        match event {
            SessionEvent::ProductsChanged(products) => {
                println!("products: {}", products.join(", "))
            }
            SessionEvent::TestsChanged(tests) => println!("tests: {}", tests.join(", ")),
            SessionEvent::ActiveSetChanged => {}
            SessionEvent::FocusChanged(focus) => log::debug!("focus: {:?}", focus),
            SessionEvent::NotesMarker {
                refdes, has_notes, ..
            } => {
                let marker = if *has_notes { "has notes" } else { "no notes" };
                println!("{}: {}", refdes, marker);
            }
            SessionEvent::PictureChanged {
                index,
                count,
                can_prev,
                can_next,
            } => {
                let shown = index.map_or("-".to_string(), |i| (i + 1).to_string());
                let prev = if *can_prev { "<" } else { " " };
                let next = if *can_next { ">" } else { " " };
                println!("picture {} {}/{} {}", prev, shown, count, next);
            }
            SessionEvent::ViewFlipped(side) => println!("view: {}", side.name()),
        }
    }

    fn print_status(session: &Session<ConsoleHost>) {
        println!("stage:   {:?}", session.stage());
        println!("product: {}", session.product_name().unwrap_or("-"));
        println!("test:    {}", session.test_name().unwrap_or("-"));

        for group in Group::ALL {
            for (page, members) in session.active().pages_for(group) {
                let members: Vec<String> = members
                    .iter()
                    .map(|refdes| {
                        if session.has_notes(group, refdes) {
                            format!("{}*", refdes)
                        } else {
                            refdes.clone()
                        }
                    })
                    .collect();
                println!("  [{}] {}: {}", group.name(), page, members.join(" "));
            }
        }

        if let Some(picture) = session.carousel().current() {
            println!(
                "picture: {} ({})",
                picture.name(),
                session.carousel().position_label()
            );
        }
    }

    fn print_notes(session: &Session<ConsoleHost>) {
        for slot in NoteSlot::ALL {
            let note = session.note(slot);
            let Some(path) = &note.path else {
                continue;
            };
            let marker = if note.dirty { " (changed)" } else { "" };
            println!("--- {} note {:?}{}", slot, path, marker);
            println!("{}", note.text);
        }
    }

    fn parse_slot(name: &str) -> Option<NoteSlot> {
        NoteSlot::ALL.into_iter().find(|slot| slot.name() == name)
    }

    fn pick_pictures() -> Vec<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Pictures", PICTURE_EXTENSIONS)
            .pick_files()
            .unwrap_or_default()
    }

    /// Run one command. Returns false when the loop should stop.
    fn execute(session: &mut Session<ConsoleHost>, line: &str) -> rework_navigator::Result<bool> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(true);
        };
        let rest: Vec<&str> = words.collect();
        let arg = rest.first().copied();

        match (command, arg) {
            ("quit" | "exit", _) => return Ok(false),
            ("help", _) => println!("{}", HELP),
            ("products", _) => {
                session.refresh_products();
            }
            ("product", Some(name)) => session.load_product(name)?,
            ("test", Some(name)) => session.load_test(name)?,
            ("select", Some(refdes)) => session.select_item(Group::of(refdes), refdes)?,
            ("page", Some(name)) => session.select_page(name)?,
            ("clear", _) => session.clear_selection()?,
            ("next", _) => {
                session.advance_picture(Direction::Next)?;
            }
            ("prev", _) => {
                session.advance_picture(Direction::Prev)?;
            }
            ("note", Some(slot)) => match parse_slot(slot) {
                Some(slot) => session.edit_note(slot, rest[1..].join(" "))?,
                None => println!("unknown note slot '{}'", slot),
            },
            ("show", _) => print_notes(session),
            ("save", _) => {
                let report = session.save()?;
                for (slot, path) in &report.saved {
                    println!("saved {} note to {:?}", slot, path);
                }
            }
            ("add", _) => {
                let files: Vec<PathBuf> = if rest.is_empty() {
                    pick_pictures()
                } else {
                    rest.iter().map(PathBuf::from).collect()
                };
                let added = session.add_pictures(&files)?;
                println!("added {} pictures", added);
            }
            ("new-test", Some(name)) => {
                let include_all = rest.get(1).is_none_or(|mode| *mode != "none");
                let folder = session.create_test(name, include_all)?;
                println!("created {:?}", folder);
            }
            ("edit-test", _) => session.edit_test()?,
            ("open", _) => {
                session.open_folder()?;
            }
            ("flip", side) => {
                let side = match side {
                    Some("top") => BoardSide::Top,
                    Some("bottom") => BoardSide::Bottom,
                    _ => session.view_side().flipped(),
                };
                session.flip(side);
            }
            ("fit", _) => session.view_fit(),
            ("browse", folder) => {
                let folder = match folder {
                    Some(folder) => Some(PathBuf::from(folder)),
                    None => rfd::FileDialog::new().pick_folder(),
                };
                if let Some(folder) = folder {
                    session.browse_products(folder)?;
                }
            }
            ("status", _) => print_status(session),
            _ => println!("unknown command '{}', try 'help'", line.trim()),
        }

        Ok(true)
    }

    pub fn run() -> io::Result<()> {
        let config_path = AppConfig::default_path();
        let mut config = config_path
            .as_deref()
            .and_then(AppConfig::load_from_path)
            .unwrap_or_default();

        env_logger::Builder::new()
            .filter_level(config.preferences.log_level.to_level_filter())
            .parse_default_env()
            .init();

        if let Some(root) = std::env::args().nth(1) {
            config.preferences.products_path = PathBuf::from(root);
        }
        log::info!(
            "{} using products in {:?}",
            config.app_name,
            config.preferences.products_path
        );

        let mut session = Session::new(config, ConsoleHost);
        if let Some(path) = config_path {
            session = session.with_config_path(path);
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        loop {
            for event in session.drain_events() {
                print_event(&event);
            }

            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            match execute(&mut session, &line) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        if let Err(e) = session.shutdown() {
            eprintln!("Error while saving: {}", e);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = console::run() {
        eprintln!("Application error: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
