use std::{
    any::Any,
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
};

use tracing::debug;

use crate::host::{BlockSignal, Host, HookFn, HookHandle, HookPhase};

/// A callback attached to an engine function while its mod is enabled.
pub struct Hook {
    function: String,
    phase: HookPhase,
    identifier: String,
    callback: HookFn,
    installed: RefCell<Option<(Rc<dyn Host>, HookHandle)>>,
}

impl Hook {
    pub fn new<F, I, C, R>(function: F, phase: HookPhase, identifier: I, callback: C) -> Self
    where
        F: Into<String>,
        I: Into<String>,
        C: Fn(&dyn Any) -> R + 'static,
        R: Into<BlockSignal>,
    {
        Self {
            function: function.into(),
            phase,
            identifier: identifier.into(),
            callback: Rc::new(move |args| callback(args).into()),
            installed: RefCell::new(None),
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Installs the hook, replacing any earlier installation of it.
    pub fn enable(&self, host: &Rc<dyn Host>) {
        self.disable();

        debug!(function = %self.function, identifier = %self.identifier, phase = ?self.phase, "installing hook");
        let handle = host.install_hook(
            &self.function,
            self.phase,
            &self.identifier,
            self.callback.clone(),
        );
        *self.installed.borrow_mut() = Some((host.clone(), handle));
    }

    pub fn disable(&self) {
        if let Some((host, handle)) = self.installed.take() {
            host.remove_hook(handle);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.installed.borrow().is_some()
    }
}

impl Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("function", &self.function)
            .field("phase", &self.phase)
            .field("identifier", &self.identifier)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// A console command carried through a mod's enable/disable lifecycle.
pub trait Command {
    fn name(&self) -> &str;

    fn enable(&self, host: &Rc<dyn Host>);

    fn disable(&self);
}
