use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug},
};

use tracing::trace;

use crate::host::{BlockSignal, InputEvent, KeybindFn, KeybindHandle};

struct InstalledBind {
    handle: KeybindHandle,
    key: String,
    event_filter: Option<InputEvent>,
    callback: KeybindFn,
}

/// Routes native key events to installed keybinds.
///
/// Binds for the same key run in installation order. A handler may install or remove binds while
/// an event is being dispatched, those changes only take effect for the next event.
#[derive(Default)]
pub struct KeybindDispatcher {
    next_handle: Cell<u64>,
    binds: RefCell<Vec<InstalledBind>>,
}

impl KeybindDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(
        &self,
        key: &str,
        event_filter: Option<InputEvent>,
        callback: KeybindFn,
    ) -> KeybindHandle {
        let handle = KeybindHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);

        self.binds.borrow_mut().push(InstalledBind {
            handle,
            key: key.to_owned(),
            event_filter,
            callback,
        });

        handle
    }

    /// Removes a bind. Unknown handles are ignored.
    pub fn remove(&self, handle: KeybindHandle) {
        self.binds.borrow_mut().retain(|bind| bind.handle != handle);
    }

    /// Runs every bind matching `key` and `event`.
    ///
    /// Every matching handler runs, even after one has asked to block, and any single block wins.
    pub fn handle_key_event(&self, key: &str, event: InputEvent) -> BlockSignal {
        let callbacks: Vec<KeybindFn> = self
            .binds
            .borrow()
            .iter()
            .filter(|bind| bind.key == key)
            .filter(|bind| bind.event_filter.is_none_or(|filter| filter == event))
            .map(|bind| bind.callback.clone())
            .collect();

        trace!(key, ?event, handlers = callbacks.len(), "dispatching key event");

        callbacks
            .into_iter()
            .fold(BlockSignal::Pass, |signal, callback| signal | callback(event))
    }

    pub fn len(&self) -> usize {
        self.binds.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.borrow().is_empty()
    }

    /// Keys with at least one bind, in installation order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = vec![];
        for bind in self.binds.borrow().iter() {
            if !keys.contains(&bind.key) {
                keys.push(bind.key.clone());
            }
        }
        keys
    }
}

impl Debug for KeybindDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.binds
                    .borrow()
                    .iter()
                    .map(|bind| (bind.handle.0, (&bind.key, bind.event_filter))),
            )
            .finish()
    }
}
