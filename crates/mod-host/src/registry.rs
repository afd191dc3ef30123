use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use modkit_mod_protocol::{ModType, markup};
use tracing::{debug, warn};

use crate::{
    host::Host,
    mods::{ComponentInfo, ModBuilder, ModRef},
};

/// The loaded mods.
///
/// A registry always holds a base mod describing the SDK itself, which sorts before every other
/// mod.
pub struct ModRegistry {
    host: Rc<dyn Host>,
    settings_dir: PathBuf,
    base_mod: ModRef,
    mods: Vec<ModRef>,
}

impl ModRegistry {
    pub fn new<P: Into<PathBuf>>(host: Rc<dyn Host>, settings_dir: P) -> Self {
        let settings_dir = settings_dir.into();

        let base_mod = ModBuilder::new("modkit-sdk")
            .name("Mod SDK")
            .author("modkit")
            .version("")
            .mod_type(ModType::Library)
            .settings_file(settings_dir.join("modkit-sdk.json"))
            .with_components([ComponentInfo::new("Base", env!("CARGO_PKG_VERSION"))])
            .build(host.clone());

        Self {
            host,
            settings_dir,
            mods: vec![base_mod.clone()],
            base_mod,
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    /// Where mods built through [`ModBuilder::register`] keep their settings by default.
    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    pub fn base_mod(&self) -> &ModRef {
        &self.base_mod
    }

    pub fn is_base_mod(&self, candidate: &ModRef) -> bool {
        Rc::ptr_eq(candidate, &self.base_mod)
    }

    /// Mods in registration order.
    pub fn mods(&self) -> &[ModRef] {
        &self.mods
    }

    pub fn contains(&self, candidate: &ModRef) -> bool {
        self.mods.iter().any(|m| Rc::ptr_eq(m, candidate))
    }

    /// Adds a mod and loads its settings, which may enable it.
    pub fn register(&mut self, new_mod: ModRef) {
        if self.contains(&new_mod) {
            warn!(target: "modkit::dev", name = new_mod.name(), "mod is already registered");
            return;
        }

        debug!(name = new_mod.name(), "registering mod");
        self.mods.push(new_mod.clone());
        new_mod.load_settings();
    }

    /// Removes a mod, tearing down anything it installed first.
    ///
    /// The mod's saved state is left alone, so a mod that is enabled when unloaded is enabled
    /// again when it is next registered. Returns false if the mod was not registered.
    pub fn deregister(&mut self, target: &ModRef) -> bool {
        let Some(idx) = self.mods.iter().position(|m| Rc::ptr_eq(m, target)) else {
            return false;
        };

        debug!(name = target.name(), "deregistering mod");
        target.teardown();
        self.mods.remove(idx);
        true
    }

    /// Deregisters every mod saving to `settings_file`.
    pub fn deregister_using_settings_file(&mut self, settings_file: &Path) {
        let matching: Vec<ModRef> = self
            .mods
            .iter()
            .filter(|m| m.settings_file() == Some(settings_file))
            .cloned()
            .collect();

        for target in &matching {
            self.deregister(target);
        }
    }

    /// Mods in display order: the base mod, then standard mods, then libraries, each sorted by
    /// plain-text name ignoring case.
    pub fn ordered(&self) -> Vec<ModRef> {
        let mut ordered = self.mods.clone();
        ordered.sort_by_cached_key(|m| {
            (
                !self.is_base_mod(m),
                m.mod_type() == ModType::Library,
                markup::sort_key(m.name()),
            )
        });
        ordered
    }
}
