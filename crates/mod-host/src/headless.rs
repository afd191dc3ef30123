//! A [`Host`] with no game behind it.
//!
//! Keys and hooks are fired by hand, which makes this the host used by tests and by the console
//! harness.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    rc::Rc,
};

use modkit_mod_protocol::Game;
use tracing::debug;

use crate::{
    host::{BlockSignal, Host, HookFn, HookHandle, HookPhase, InputEvent, KeybindFn, KeybindHandle},
    keybinds::KeybindDispatcher,
};

struct InstalledHook {
    handle: HookHandle,
    function: String,
    phase: HookPhase,
    identifier: String,
    callback: HookFn,
}

pub struct HeadlessHost {
    game: Game,
    keybinds: KeybindDispatcher,
    next_hook: Cell<u64>,
    hooks: RefCell<Vec<InstalledHook>>,
}

impl HeadlessHost {
    pub fn new(game: Game) -> Rc<Self> {
        Rc::new(Self {
            game,
            keybinds: KeybindDispatcher::new(),
            next_hook: Cell::new(0),
            hooks: RefCell::default(),
        })
    }

    pub fn keybinds(&self) -> &KeybindDispatcher {
        &self.keybinds
    }

    /// Sends a press of `key` to every matching keybind.
    pub fn press(&self, key: &str) -> BlockSignal {
        self.keybinds.handle_key_event(key, InputEvent::Pressed)
    }

    /// Runs every hook on `function` in `phase`, in installation order.
    pub fn fire_hook(&self, function: &str, phase: HookPhase, args: &dyn Any) -> BlockSignal {
        let callbacks: Vec<HookFn> = self
            .hooks
            .borrow()
            .iter()
            .filter(|hook| hook.function == function && hook.phase == phase)
            .map(|hook| hook.callback.clone())
            .collect();

        callbacks
            .into_iter()
            .fold(BlockSignal::Pass, |signal, callback| signal | callback(args))
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }

    /// `(function, identifier)` of every installed hook.
    pub fn hooks(&self) -> Vec<(String, String)> {
        self.hooks
            .borrow()
            .iter()
            .map(|hook| (hook.function.clone(), hook.identifier.clone()))
            .collect()
    }
}

impl Host for HeadlessHost {
    fn current_game(&self) -> Game {
        self.game
    }

    fn install_keybind(
        &self,
        key: &str,
        event_filter: Option<InputEvent>,
        callback: KeybindFn,
    ) -> KeybindHandle {
        self.keybinds.install(key, event_filter, callback)
    }

    fn remove_keybind(&self, handle: KeybindHandle) {
        self.keybinds.remove(handle);
    }

    fn install_hook(
        &self,
        function: &str,
        phase: HookPhase,
        identifier: &str,
        callback: HookFn,
    ) -> HookHandle {
        let handle = HookHandle(self.next_hook.get());
        self.next_hook.set(handle.0 + 1);

        debug!(function, identifier, ?phase, "headless hook installed");
        self.hooks.borrow_mut().push(InstalledHook {
            handle,
            function: function.to_owned(),
            phase,
            identifier: identifier.to_owned(),
            callback,
        });

        handle
    }

    fn remove_hook(&self, handle: HookHandle) {
        self.hooks.borrow_mut().retain(|hook| hook.handle != handle);
    }
}

impl Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("game", &self.game)
            .field("keybinds", &self.keybinds)
            .field("hooks", &self.hooks())
            .finish()
    }
}
