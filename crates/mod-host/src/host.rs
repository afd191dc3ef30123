//! The capabilities modkit needs from the game it is running inside.
//!
//! Everything here is implemented by the native binding layer. Implementations are only ever
//! called from the host's event-dispatch thread, so they take `&self` and are free to use
//! `RefCell`/`Cell` internally.

use std::{any::Any, ops::BitOr, rc::Rc};

use modkit_mod_protocol::Game;

/// Whether an input or engine event should continue on to the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockSignal {
    #[default]
    Pass,
    Block,
}

impl BitOr for BlockSignal {
    type Output = BlockSignal;

    fn bitor(self, rhs: Self) -> Self::Output {
        if self == BlockSignal::Block || rhs == BlockSignal::Block {
            BlockSignal::Block
        } else {
            BlockSignal::Pass
        }
    }
}

impl From<()> for BlockSignal {
    fn from(_: ()) -> Self {
        BlockSignal::Pass
    }
}

impl From<bool> for BlockSignal {
    fn from(block: bool) -> Self {
        if block {
            BlockSignal::Block
        } else {
            BlockSignal::Pass
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Pressed,
    Released,
    Repeat,
    DoubleClick,
    Axis,
}

/// When a hook runs relative to the hooked engine function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Pre,
    Post,
    /// Runs after the function, even if a pre-hook blocked it.
    PostUnconditional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeybindHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookHandle(pub u64);

pub type KeybindFn = Rc<dyn Fn(InputEvent) -> BlockSignal>;

/// Hook callbacks receive whatever the native layer passes for the hooked call.
pub type HookFn = Rc<dyn Fn(&dyn Any) -> BlockSignal>;

pub trait Host {
    /// The game this process is running.
    fn current_game(&self) -> Game;

    /// Installs a native input binding. `event_filter` of `None` receives every event kind.
    fn install_keybind(
        &self,
        key: &str,
        event_filter: Option<InputEvent>,
        callback: KeybindFn,
    ) -> KeybindHandle;

    fn remove_keybind(&self, handle: KeybindHandle);

    fn install_hook(
        &self,
        function: &str,
        phase: HookPhase,
        identifier: &str,
        callback: HookFn,
    ) -> HookHandle;

    fn remove_hook(&self, handle: HookHandle);
}
