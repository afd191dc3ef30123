//! The runtime side of modkit: mods, their options and keybinds, and the registry holding them.
//!
//! Everything here runs on the host's event-dispatch thread and nothing is `Send`. The registry
//! and the mods in it are plain values owned by whoever drives the host, there is no global state.

pub mod headless;
pub mod hook;
pub mod host;
pub mod keybinds;
pub mod mods;
pub mod options;
pub mod registry;
pub mod settings;

pub use self::{
    headless::HeadlessHost,
    hook::{Command, Hook},
    host::{BlockSignal, HookPhase, Host, InputEvent},
    keybinds::{Keybind, KeybindDispatcher},
    mods::{ComponentInfo, Mod, ModBuilder, ModRef},
    options::{ModOption, OptionError, OptionValue},
    registry::ModRegistry,
};
