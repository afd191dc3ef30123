//! Turns a mod's options into flat lists a front-end can draw, and tracks which list is on screen.
//!
//! [`OptionsStack`] does the work shared by every front-end. [`console::ConsoleMenu`] and
//! [`widget::WidgetAdapter`] are the two front-ends shipped here.

use modkit_mod_host::OptionError;
use thiserror::Error;

pub mod adapter;
pub mod console;
pub mod entry;
pub mod stack;
pub mod widget;

pub use self::{
    adapter::{Presentation, SurfaceId},
    entry::{ChoiceStyle, EntryKind, RenderableEntry},
    stack::{FrameCause, OptionsStack, Selection},
};

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("no options menu is open")]
    NotOpen,

    #[error("an options menu is already open")]
    AlreadyOpen,

    /// The front-end reported an index it was never given.
    #[error("selected index {index} but only {drawn} entries were drawn")]
    IndexDesync { index: usize, drawn: usize },

    #[error("entry {0} does not hold a value")]
    NotSelectable(usize),

    #[error("entry {index} cannot take a {value}")]
    UnexpectedValue { index: usize, value: &'static str },

    #[error(transparent)]
    Option(#[from] OptionError),
}
