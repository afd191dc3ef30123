use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
    rc::Rc,
};

use modkit_mod_protocol::{GameSet, ModType};
use tracing::{debug, warn};

use crate::{
    hook::{Command, Hook},
    host::Host,
    keybinds::Keybind,
    mods::{ComponentInfo, Mod, ModRef},
    options::ModOption,
    registry::ModRegistry,
};

#[derive(Default)]
enum SettingsFile {
    /// `<settings dir>/<module>.json`, when registered.
    #[default]
    Default,
    Path(PathBuf),
    None,
}

/// Creates mods, optionally registering them.
///
/// Everything a mod provides is passed explicitly, nothing is discovered by scanning the defining
/// module. [`ModBuilder::with_discovered_options`] exists for mods migrating from discovery.
pub struct ModBuilder {
    module: String,
    name: Option<String>,
    author: String,
    description: String,
    version: String,
    mod_type: ModType,
    supported_games: GameSet,
    settings_file: SettingsFile,
    keybinds: Vec<Rc<Keybind>>,
    options: Vec<ModOption>,
    hooks: Vec<Rc<Hook>>,
    commands: Vec<Rc<dyn Command>>,
    auto_enable: bool,
    on_enable: Option<Box<dyn Fn()>>,
    on_disable: Option<Box<dyn Fn()>>,
    components: Option<Vec<ComponentInfo>>,
    deregister_same_settings: bool,
}

impl Default for ModBuilder {
    fn default() -> Self {
        Self {
            module: String::new(),
            name: None,
            author: "Unknown Author".to_owned(),
            description: String::new(),
            version: "Unknown Version".to_owned(),
            mod_type: ModType::Standard,
            supported_games: GameSet::default(),
            settings_file: SettingsFile::Default,
            keybinds: vec![],
            options: vec![],
            hooks: vec![],
            commands: vec![],
            auto_enable: true,
            on_enable: None,
            on_disable: None,
            components: None,
            deregister_same_settings: true,
        }
    }
}

impl ModBuilder {
    /// `module` names the defining module. It is the default display name and settings file stem.
    pub fn new<S: Into<String>>(module: S) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn author<S: Into<String>>(&mut self, author: S) -> &mut Self {
        self.author = author.into();
        self
    }

    pub fn description<S: Into<String>>(&mut self, description: S) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn version<S: Into<String>>(&mut self, version: S) -> &mut Self {
        self.version = version.into();
        self
    }

    /// Libraries are always enabled, and never auto enable.
    pub fn mod_type(&mut self, mod_type: ModType) -> &mut Self {
        self.mod_type = mod_type;
        self
    }

    pub fn supported_games(&mut self, games: GameSet) -> &mut Self {
        self.supported_games = games;
        self
    }

    pub fn settings_file<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.settings_file = SettingsFile::Path(path.into());
        self
    }

    /// The mod will neither load nor save settings.
    pub fn no_settings_file(&mut self) -> &mut Self {
        self.settings_file = SettingsFile::None;
        self
    }

    pub fn with_keybind(&mut self, keybind: impl Into<Rc<Keybind>>) -> &mut Self {
        self.keybinds.push(keybind.into());
        self
    }

    pub fn with_keybinds<I>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item: Into<Rc<Keybind>>>,
    {
        self.keybinds.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn with_option(&mut self, option: impl Into<ModOption>) -> &mut Self {
        self.options.push(option.into());
        self
    }

    pub fn with_options<I>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item: Into<ModOption>>,
    {
        self.options.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Adds options gathered without an explicit list.
    ///
    /// Grouped and nested options are dropped, the order they would flatten in is not
    /// dependable unless they are listed explicitly.
    pub fn with_discovered_options<I>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item: Into<ModOption>>,
    {
        for option in iter.into_iter().map(Into::into) {
            match option {
                ModOption::Grouped(_) | ModOption::Nested(_) => warn!(
                    target: "modkit::dev",
                    module = %self.module,
                    identifier = option.identifier(),
                    kind = option.type_name(),
                    "container options must be explicitly specified in the options list"
                ),
                option => self.options.push(option),
            }
        }
        self
    }

    pub fn with_hook(&mut self, hook: impl Into<Rc<Hook>>) -> &mut Self {
        self.hooks.push(hook.into());
        self
    }

    pub fn with_command(&mut self, command: Rc<dyn Command>) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Lists bundled components. The mod's description is generated from them.
    pub fn with_components<I>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = ComponentInfo>,
    {
        self.components
            .get_or_insert_default()
            .extend(iter);
        self
    }

    pub fn auto_enable(&mut self, auto_enable: bool) -> &mut Self {
        self.auto_enable = auto_enable;
        self
    }

    pub fn on_enable<F: Fn() + 'static>(&mut self, callback: F) -> &mut Self {
        self.on_enable = Some(Box::new(callback));
        self
    }

    pub fn on_disable<F: Fn() + 'static>(&mut self, callback: F) -> &mut Self {
        self.on_disable = Some(Box::new(callback));
        self
    }

    /// Whether registering first removes mods saving to the same settings file, so that
    /// reloading a module replaces its mod. On by default.
    pub fn deregister_same_settings(&mut self, deregister: bool) -> &mut Self {
        self.deregister_same_settings = deregister;
        self
    }

    /// Builds the mod without registering it.
    ///
    /// Unless a settings file was given, the mod has none.
    pub fn build(&mut self, host: Rc<dyn Host>) -> ModRef {
        let settings_file = match std::mem::take(&mut self.settings_file) {
            SettingsFile::Path(path) => Some(path),
            SettingsFile::Default => {
                debug!(
                    module = %self.module,
                    "built without a registry or explicit settings file, settings will not persist"
                );
                None
            }
            SettingsFile::None => None,
        };

        self.finish(host, settings_file)
    }

    /// Builds the mod and adds it to `registry`, loading its settings.
    pub fn register(&mut self, registry: &mut ModRegistry) -> ModRef {
        let settings_file = match std::mem::take(&mut self.settings_file) {
            SettingsFile::Default => {
                Some(registry.settings_dir().join(format!("{}.json", self.module)))
            }
            SettingsFile::Path(path) => Some(path),
            SettingsFile::None => None,
        };

        if self.deregister_same_settings {
            if let Some(settings_file) = &settings_file {
                registry.deregister_using_settings_file(settings_file);
            }
        }

        let new_mod = self.finish(registry.host().clone(), settings_file);
        registry.register(new_mod.clone());
        new_mod
    }

    fn finish(&mut self, host: Rc<dyn Host>, settings_file: Option<PathBuf>) -> ModRef {
        let Self {
            module,
            name,
            author,
            description,
            version,
            mod_type,
            supported_games,
            settings_file: _,
            keybinds,
            options,
            hooks,
            commands,
            auto_enable,
            on_enable,
            on_disable,
            components,
            deregister_same_settings: _,
        } = std::mem::take(self);

        let is_library = mod_type == ModType::Library;

        let new_mod = Rc::new(Mod {
            name: name.unwrap_or(module),
            author,
            description,
            version,
            mod_type,
            supported_games,
            settings_file,
            keybinds,
            options,
            hooks,
            commands,
            enabled: Cell::new(false),
            auto_enable: auto_enable && !is_library,
            on_enable,
            on_disable,
            components: components.map(RefCell::new),
            host,
        });

        if is_library {
            new_mod.enable();
        }

        new_mod
    }
}

#[cfg(test)]
mod tests {
    use modkit_mod_protocol::Game;

    use super::*;
    use crate::{
        headless::HeadlessHost,
        options::{BoolOption, GroupedOption, NestedOption},
    };

    #[test]
    fn defaults() {
        let m = ModBuilder::new("my_mod").build(HeadlessHost::new(Game::Bl3));

        assert_eq!("my_mod", m.name());
        assert_eq!("Unknown Author", m.author());
        assert_eq!("Unknown Version", m.version());
        assert_eq!(ModType::Standard, m.mod_type());
        assert_eq!(GameSet::BL3 | GameSet::WONDERLANDS, m.supported_games());
        assert!(m.auto_enable());
        assert_eq!(None, m.settings_file());
    }

    #[test]
    fn only_explicit_settings_files_survive_build() {
        let m = ModBuilder::new("my_mod")
            .settings_file("/settings/custom.json")
            .build(HeadlessHost::new(Game::Bl3));
        assert_eq!(
            Some(std::path::Path::new("/settings/custom.json")),
            m.settings_file()
        );

        let m = ModBuilder::new("my_mod")
            .no_settings_file()
            .build(HeadlessHost::new(Game::Bl3));
        assert_eq!(None, m.settings_file());
    }

    #[test]
    fn discovered_containers_are_dropped() {
        let m = ModBuilder::new("legacy")
            .with_discovered_options([
                ModOption::from(BoolOption::new("kept", true)),
                GroupedOption::new("group", [BoolOption::new("inner", true)]).into(),
                NestedOption::new("nested", Vec::<ModOption>::new()).into(),
            ])
            .build(HeadlessHost::new(Game::Bl3));

        let identifiers: Vec<_> = m.options().iter().map(|o| o.identifier()).collect();
        assert_eq!(vec!["kept"], identifiers);
    }

    #[test]
    fn libraries_never_auto_enable() {
        let m = ModBuilder::new("lib")
            .mod_type(ModType::Library)
            .auto_enable(true)
            .build(HeadlessHost::new(Game::Bl3));

        assert!(!m.auto_enable());
        assert!(m.is_enabled());
    }
}
