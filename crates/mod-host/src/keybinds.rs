use std::{
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
};

use tracing::debug;

use crate::host::{BlockSignal, Host, InputEvent, KeybindHandle};

pub use self::dispatch::KeybindDispatcher;

mod dispatch;

#[derive(Clone)]
pub enum KeybindCallback {
    /// Runs only when the key is pressed.
    Pressed(Rc<dyn Fn() -> BlockSignal>),

    /// Runs on every event kind, including releases and repeats.
    Event(Rc<dyn Fn(InputEvent) -> BlockSignal>),
}

impl Debug for KeybindCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeybindCallback::Pressed(_) => f.write_str("Pressed(..)"),
            KeybindCallback::Event(_) => f.write_str("Event(..)"),
        }
    }
}

/// A named, rebindable key association.
///
/// The bound key is shared between the options menu (which may rebind it) and the native binding
/// installed while the keybind is enabled. [`Keybind::set_key`] keeps the two in sync.
pub struct Keybind {
    identifier: String,
    display_name: Option<String>,
    description: String,
    description_title: Option<String>,
    is_hidden: bool,
    is_rebindable: bool,
    key: RefCell<Option<String>>,
    default_key: Option<String>,
    callback: Option<KeybindCallback>,
    binding: RefCell<Binding>,
}

/// `host` is set for as long as the keybind is enabled, `handle` only while a key is bound too.
#[derive(Default)]
struct Binding {
    host: Option<Rc<dyn Host>>,
    handle: Option<KeybindHandle>,
}

impl Keybind {
    pub fn new<I: Into<String>, K: Into<String>>(identifier: I, key: K) -> Self {
        Self::with_key(identifier, Some(key.into()))
    }

    pub fn unbound<I: Into<String>>(identifier: I) -> Self {
        Self::with_key(identifier, None)
    }

    fn with_key<I: Into<String>>(identifier: I, key: Option<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: None,
            description: String::new(),
            description_title: None,
            is_hidden: false,
            is_rebindable: true,
            default_key: key.clone(),
            key: RefCell::new(key),
            callback: None,
            binding: RefCell::default(),
        }
    }

    pub fn display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn description_title<S: Into<String>>(mut self, title: S) -> Self {
        self.description_title = Some(title.into());
        self
    }

    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    pub fn rebindable(mut self, is_rebindable: bool) -> Self {
        self.is_rebindable = is_rebindable;
        self
    }

    /// Sets a callback which only runs when the key is pressed.
    pub fn on_press<F, R>(mut self, callback: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<BlockSignal>,
    {
        self.callback = Some(KeybindCallback::Pressed(Rc::new(move || callback().into())));
        self
    }

    /// Sets a callback which runs on every input event for the key.
    pub fn on_event<F, R>(mut self, callback: F) -> Self
    where
        F: Fn(InputEvent) -> R + 'static,
        R: Into<BlockSignal>,
    {
        self.callback = Some(KeybindCallback::Event(Rc::new(move |event| {
            callback(event).into()
        })));
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn get_display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_description_title(&self) -> &str {
        self.description_title
            .as_deref()
            .unwrap_or_else(|| self.get_display_name())
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn is_rebindable(&self) -> bool {
        self.is_rebindable
    }

    /// The currently bound key, or `None` if unbound.
    pub fn key(&self) -> Option<String> {
        self.key.borrow().clone()
    }

    /// The key this keybind was constructed with.
    pub fn default_key(&self) -> Option<&str> {
        self.default_key.as_deref()
    }

    pub fn callback(&self) -> Option<&KeybindCallback> {
        self.callback.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.borrow().host.is_some()
    }

    /// Installs the native binding. Does nothing if already enabled.
    ///
    /// An unbound keybind, or one without a callback, still counts as enabled, it just has nothing
    /// to install until it is rebound.
    pub fn enable(&self, host: &Rc<dyn Host>) {
        if self.is_enabled() {
            return;
        }

        let handle = self.install(host.as_ref());
        *self.binding.borrow_mut() = Binding {
            host: Some(host.clone()),
            handle,
        };
    }

    /// Removes the native binding. Does nothing if already disabled.
    pub fn disable(&self) {
        let Binding { host, handle } = self.binding.take();

        if let (Some(host), Some(handle)) = (host, handle) {
            host.remove_keybind(handle);
        }
    }

    /// Rebinds the key. While enabled, the old native binding is removed before the new one is
    /// installed, so a stale binding never outlives a key change.
    pub fn set_key(&self, key: Option<String>) {
        let (host, old_handle) = {
            let mut binding = self.binding.borrow_mut();
            (binding.host.clone(), binding.handle.take())
        };

        if let (Some(host), Some(handle)) = (&host, old_handle) {
            host.remove_keybind(handle);
        }

        debug!(identifier = %self.identifier, ?key, "rebinding keybind");
        *self.key.borrow_mut() = key;

        if let Some(host) = host {
            let handle = self.install(host.as_ref());
            self.binding.borrow_mut().handle = handle;
        }
    }

    fn install(&self, host: &dyn Host) -> Option<KeybindHandle> {
        let key = self.key.borrow().clone()?;

        let handle = match self.callback.as_ref()? {
            KeybindCallback::Pressed(callback) => {
                let callback = callback.clone();
                host.install_keybind(
                    &key,
                    Some(InputEvent::Pressed),
                    Rc::new(move |_| callback()),
                )
            }
            KeybindCallback::Event(callback) => host.install_keybind(&key, None, callback.clone()),
        };

        Some(handle)
    }
}

impl Debug for Keybind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keybind")
            .field("identifier", &self.identifier)
            .field("key", &self.key.borrow())
            .field("default_key", &self.default_key)
            .field("is_rebindable", &self.is_rebindable)
            .field("is_hidden", &self.is_hidden)
            .field("callback", &self.callback)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
