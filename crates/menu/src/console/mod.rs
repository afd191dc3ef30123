//! A line-oriented options menu for consoles.
//!
//! The menu is a stack of screens: the list of mods, one screen per open level of a mod's options,
//! and a screen for editing a single option. Each input line is handled by the top screen, after
//! which it is redrawn.

use std::io::{self, BufRead, Write};

use modkit_mod_host::{ModRegistry, OptionValue};
use thiserror::Error;
use tracing::{debug, error};

use self::draw::Drawer;
use crate::{
    MenuError,
    adapter::{Presentation, SurfaceId},
    entry::{EntryKind, RenderableEntry},
    stack::{OptionsStack, Selection},
};

pub mod draw;
pub mod keys;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to write to the console")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Menu(#[from] MenuError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Home,
    /// The innermost level of the options stack.
    Options,
    /// Editing the entry at `index` of the innermost level.
    Option { index: usize },
}

/// Keeps the last list the options stack drew.
#[derive(Debug, Default)]
struct ConsoleView {
    header: String,
    entries: Vec<RenderableEntry>,
}

impl Presentation for ConsoleView {
    fn render(&mut self, header: &str, entries: &[RenderableEntry]) -> Option<SurfaceId> {
        self.header = header.to_owned();
        self.entries = entries.to_vec();
        None
    }
}

pub struct ConsoleMenu<'a, W: Write> {
    registry: &'a ModRegistry,
    stack: OptionsStack,
    view: ConsoleView,
    out: Drawer<W>,
    screens: Vec<Screen>,
    /// Shown below the next redraw.
    notices: Vec<String>,
}

impl<'a, W: Write> ConsoleMenu<'a, W> {
    pub fn new(registry: &'a ModRegistry, out: W) -> Self {
        Self {
            registry,
            stack: OptionsStack::new(),
            view: ConsoleView::default(),
            out: Drawer::new(out),
            screens: vec![],
            notices: vec![],
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    pub fn is_running(&self) -> bool {
        !self.screens.is_empty()
    }

    /// Opens the menu on the list of mods.
    pub fn start(&mut self) -> Result<(), ConsoleError> {
        self.quit();
        self.screens.push(Screen::Home);
        self.draw_screen()?;
        Ok(())
    }

    /// Runs the menu until the user quits or `input` runs out.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), ConsoleError> {
        self.start()?;

        for line in input.lines() {
            self.handle_line(&line?)?;
            if !self.is_running() {
                break;
            }
        }

        self.quit();
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        let line = line.trim();
        let parsed = self.handle_input(line)?;

        if self.is_running() {
            self.draw_screen()?;
        }

        for notice in std::mem::take(&mut self.notices) {
            self.out.draw(&notice, 0)?;
        }

        if !parsed {
            self.out.draw("", 0)?;
            self.out.draw(&format!("Unrecognised input '{line}'."), 0)?;
        }

        Ok(())
    }

    fn quit(&mut self) {
        if self.stack.is_open() {
            self.stack.close_to_root();
        }
        self.screens.clear();
    }

    fn back(&mut self) -> Result<(), MenuError> {
        if let Some(Screen::Options) = self.screens.pop() {
            self.stack.pop_one_level();
            if self.stack.is_open() {
                self.stack.refresh(&mut self.view)?;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self, line: &str) -> Result<bool, ConsoleError> {
        match line.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => {
                self.quit();
                return Ok(true);
            }
            "b" | "back" if self.screens.len() > 1 => {
                self.back()?;
                return Ok(true);
            }
            "?" | "help" => return Ok(true),
            _ => {}
        }

        match self.screens.last().copied() {
            Some(Screen::Home) => self.handle_home(line),
            Some(Screen::Options) => self.handle_options(line),
            Some(Screen::Option { index }) => self.handle_option(index, line),
            None => Ok(false),
        }
    }

    fn draw_screen(&mut self) -> io::Result<()> {
        match self.screens.last().copied() {
            Some(Screen::Home) => self.draw_home(),
            Some(Screen::Options) => self.draw_options(),
            Some(Screen::Option { index }) => self.draw_option(index),
            None => Ok(()),
        }
    }

    fn draw_standard_commands(&mut self) -> io::Result<()> {
        self.out.draw("[Q] Quit", 0)?;
        if self.screens.len() > 1 {
            self.out.draw("[B] Back", 0)?;
        }
        self.out.draw("[?] Re-draw this screen", 0)
    }

    fn draw_home(&mut self) -> io::Result<()> {
        self.out.draw("Available Mods:", 0)?;
        for (idx, m) in self.registry.ordered().iter().enumerate() {
            self.out.draw(&format!("[{idx}] {}", m.name()), 0)?;
        }
        self.draw_standard_commands()
    }

    fn handle_home(&mut self, line: &str) -> Result<bool, ConsoleError> {
        let ordered = self.registry.ordered();
        let Some(target) = line.parse::<usize>().ok().and_then(|idx| ordered.get(idx)) else {
            return Ok(false);
        };

        self.stack.open(target, &mut self.view)?;
        self.screens.push(Screen::Options);
        Ok(true)
    }

    fn draw_options(&mut self) -> io::Result<()> {
        self.out.draw(&self.view.header, 0)?;

        let mut number = 0;
        for entry in &self.view.entries {
            let line = match entry.kind {
                EntryKind::GroupHeader => format!("{}:", entry.display_name),
                EntryKind::Title => entry.display_name.clone(),
                _ => {
                    let line = match &entry.value_str {
                        Some(value) => format!("[{number}] {} ({value})", entry.display_name),
                        None => format!("[{number}] {}", entry.display_name),
                    };
                    number += 1;
                    line
                }
            };
            self.out.draw(&line, entry.depth)?;
        }

        self.draw_standard_commands()
    }

    /// Entries are numbered skipping titles and headers.
    fn index_of_number(&self, number: usize) -> Option<usize> {
        self.view
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_selectable())
            .nth(number)
            .map(|(idx, _)| idx)
    }

    fn handle_options(&mut self, line: &str) -> Result<bool, ConsoleError> {
        let Some(index) = line
            .parse::<usize>()
            .ok()
            .and_then(|number| self.index_of_number(number))
        else {
            return Ok(false);
        };

        // Plain buttons get a screen of their own, to show their description before pressing
        if self.view.entries[index].kind == (EntryKind::Button { nested: false }) {
            self.screens.push(Screen::Option { index });
            return Ok(true);
        }

        match self.stack.select(index, &mut self.view)? {
            Selection::Entered => self.screens.push(Screen::Options),
            Selection::Edit(_) => self.screens.push(Screen::Option { index }),
            Selection::Pressed | Selection::Inert => {}
        }

        Ok(true)
    }

    fn draw_option(&mut self, index: usize) -> io::Result<()> {
        let Some(entry) = self.view.entries.get(index) else {
            return Ok(());
        };

        self.out.draw(&self.view.header, 0)?;
        match &entry.value_str {
            Some(value) => self.out.draw(&format!("{} ({value})", entry.display_name), 0)?,
            None => self.out.draw(&entry.display_name, 0)?,
        }

        if entry.description_title != entry.display_name {
            self.out.draw(&entry.description_title, 0)?;
        }

        if !entry.description.is_empty() {
            self.out.draw(&"=".repeat(32), 0)?;
            // Drawn line by line so wrapping never moves a line break
            for line in entry.description.lines() {
                self.out.draw(line, 0)?;
            }
        }

        self.out.draw("", 0)?;

        match &entry.kind {
            EntryKind::Button { .. } => self.out.draw("[1] Press", 0)?,
            EntryKind::Bool {
                true_text,
                false_text,
                ..
            } => {
                self.out.draw(&format!("[1] {false_text}"), 0)?;
                self.out.draw(&format!("[2] {true_text}"), 0)?;
            }
            EntryKind::Choice { choices, .. } => {
                for (idx, choice) in choices.iter().enumerate() {
                    self.out.draw(&format!("[{idx}] {choice}"), 0)?;
                }
            }
            EntryKind::Slider { .. } => {
                let range = entry.range_str().unwrap_or_default();
                self.out
                    .draw(&format!("Enter the new value [{range}]"), 0)?;
            }
            EntryKind::Keybind {
                is_rebindable: true,
                ..
            } => self
                .out
                .draw("Enter the new key name, or 'unbind' to clear it", 0)?,
            EntryKind::Keybind {
                is_rebindable: false,
                ..
            } => self.out.draw("This keybind cannot be changed.", 0)?,
            EntryKind::Title | EntryKind::GroupHeader => {}
        }

        self.draw_standard_commands()
    }

    fn handle_option(&mut self, index: usize, line: &str) -> Result<bool, ConsoleError> {
        let Some(entry) = self.view.entries.get(index) else {
            return Ok(false);
        };
        let name = entry.display_name.clone();

        let value = match entry.kind.clone() {
            EntryKind::Button { .. } => {
                if line != "1" {
                    return Ok(false);
                }
                self.stack.select(index, &mut self.view)?;
                return Ok(true);
            }
            EntryKind::Bool { .. } => match line {
                "1" => OptionValue::Bool(false),
                "2" => OptionValue::Bool(true),
                _ => return Ok(false),
            },
            EntryKind::Choice { choices, .. } => {
                match line.parse::<usize>().ok().and_then(|idx| choices.get(idx)) {
                    Some(choice) => OptionValue::Text(choice.clone()),
                    None => return Ok(false),
                }
            }
            EntryKind::Slider { .. } => match line.parse::<f64>() {
                Ok(number) if number.is_finite() => OptionValue::Number(number),
                _ => return Ok(false),
            },
            EntryKind::Keybind {
                is_rebindable: true,
                ..
            } => {
                if line.eq_ignore_ascii_case("unbind") {
                    OptionValue::Key(None)
                } else if let Some(key) = keys::find_key(line) {
                    OptionValue::Key(Some(key.to_owned()))
                } else {
                    self.notices.push(format!("'{line}' is not a known key name."));
                    if let Some(suggestion) = keys::suggest_key(line) {
                        self.notices.push(format!("Did you mean '{suggestion}'?"));
                    }
                    return Ok(true);
                }
            }
            EntryKind::Keybind {
                is_rebindable: false,
                ..
            }
            | EntryKind::Title
            | EntryKind::GroupHeader => return Ok(false),
        };

        debug!(option = %name, ?value, "changing option from console");
        self.stack.change_value(index, value)?;

        if let Some(m) = self.stack.root_mod() {
            if let Err(e) = m.save_settings() {
                error!(name = m.name(), error = %e, "failed to save mod settings");
            }
        }

        self.stack.refresh(&mut self.view)?;
        Ok(true)
    }
}
