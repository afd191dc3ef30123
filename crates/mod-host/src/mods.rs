use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    path::{Path, PathBuf},
    rc::{Rc, Weak},
};

use modkit_mod_protocol::{GameSet, ModType, SettingsError};
use tracing::{debug, error, info};

use crate::{
    hook::{Command, Hook},
    host::Host,
    keybinds::Keybind,
    options::{BoolOption, ButtonOption, GroupedOption, KeybindOption, ModOption, TitleOption},
    settings,
};

pub use self::builder::ModBuilder;

mod builder;

pub type ModRef = Rc<Mod>;

/// A component bundled into a mod, listed in its generated description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    pub name: String,
    pub version: String,
}

impl ComponentInfo {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

type LifecycleCallback = Box<dyn Fn()>;

/// A loaded mod.
///
/// Mods are compared by identity, two mods with the same name are still different mods. Construct
/// them with [`ModBuilder`].
pub struct Mod {
    name: String,
    author: String,
    description: String,
    version: String,
    mod_type: ModType,
    supported_games: GameSet,
    settings_file: Option<PathBuf>,
    keybinds: Vec<Rc<Keybind>>,
    options: Vec<ModOption>,
    hooks: Vec<Rc<Hook>>,
    commands: Vec<Rc<dyn Command>>,
    enabled: Cell<bool>,
    auto_enable: bool,
    on_enable: Option<LifecycleCallback>,
    on_disable: Option<LifecycleCallback>,
    components: Option<RefCell<Vec<ComponentInfo>>>,
    host: Rc<dyn Host>,
}

impl Mod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// The mod's description. Mods listing components generate it from them instead.
    pub fn description(&self) -> String {
        let Some(components) = &self.components else {
            return self.description.clone();
        };

        let mut components = components.borrow_mut();
        components.sort_by_cached_key(|component| component.name.to_lowercase());

        let mut description = String::from("Components:\n");
        for component in components.iter() {
            description.push_str(&format!("- {}: {}\n", component.name, component.version));
        }
        description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn mod_type(&self) -> ModType {
        self.mod_type
    }

    pub fn supported_games(&self) -> GameSet {
        self.supported_games
    }

    pub fn settings_file(&self) -> Option<&Path> {
        self.settings_file.as_deref()
    }

    pub fn keybinds(&self) -> &[Rc<Keybind>] {
        &self.keybinds
    }

    pub fn options(&self) -> &[ModOption] {
        &self.options
    }

    pub fn hooks(&self) -> &[Rc<Hook>] {
        &self.hooks
    }

    pub fn commands(&self) -> &[Rc<dyn Command>] {
        &self.commands
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn auto_enable(&self) -> bool {
        self.auto_enable
    }

    /// True if the host is running a game this mod supports.
    pub fn is_compatible(&self) -> bool {
        self.supported_games.supports(self.host.current_game())
    }

    /// Adds a component to the generated description.
    pub fn add_component(&self, component: ComponentInfo) {
        match &self.components {
            Some(components) => components.borrow_mut().push(component),
            None => error!(
                name = %self.name,
                component = %component.name,
                "mod does not list components"
            ),
        }
    }

    pub fn enable(&self) {
        if self.enabled.get() {
            return;
        }
        if !self.is_compatible() {
            debug!(name = %self.name, game = %self.host.current_game(), "not enabling mod for unsupported game");
            return;
        }

        info!(name = %self.name, "enabling mod");
        self.enabled.set(true);

        for hook in &self.hooks {
            hook.enable(&self.host);
        }
        for command in &self.commands {
            command.enable(&self.host);
        }
        for keybind in &self.keybinds {
            keybind.enable(&self.host);
        }

        if let Some(on_enable) = &self.on_enable {
            on_enable();
        }

        if self.auto_enable {
            self.save_settings_or_log();
        }
    }

    /// Disables the mod. Libraries cannot be disabled.
    pub fn disable(&self) {
        if self.mod_type == ModType::Library {
            return;
        }

        if self.teardown() && self.auto_enable {
            self.save_settings_or_log();
        }
    }

    /// Removes everything the mod installed, without touching its saved settings.
    ///
    /// Returns false if the mod was not enabled.
    pub(crate) fn teardown(&self) -> bool {
        if !self.enabled.get() {
            return false;
        }

        info!(name = %self.name, "disabling mod");
        self.enabled.set(false);

        for hook in &self.hooks {
            hook.disable();
        }
        for command in &self.commands {
            command.disable();
        }
        for keybind in &self.keybinds {
            keybind.disable();
        }

        if let Some(on_disable) = &self.on_disable {
            on_disable();
        }

        true
    }

    /// Loads saved settings, enabling the mod if it was enabled last session.
    pub fn load_settings(&self) {
        settings::load_mod_settings(self);
    }

    pub fn save_settings(&self) -> Result<(), SettingsError> {
        settings::save_mod_settings(self)
    }

    pub(crate) fn save_settings_or_log(&self) {
        if let Err(e) = self.save_settings() {
            error!(name = %self.name, error = %e, "failed to save mod settings");
        }
    }

    /// Title of the description entry at the top of the mod's options.
    pub fn description_title(&self) -> String {
        match (self.author.is_empty(), self.version.is_empty()) {
            (false, false) => format!("By {}  -  {}", self.author, self.version),
            (false, true) => format!("By {}", self.author),
            (true, false) => self.version.clone(),
            (true, true) => "Description".to_owned(),
        }
    }

    /// Body of the description entry, warning first if the current game is unsupported.
    pub fn description_text(&self) -> String {
        let mut blocks = vec![];

        if !self.is_compatible() {
            let supported: Vec<_> = self
                .supported_games
                .games()
                .map(|game| game.display_name())
                .collect();
            blocks.push(format!(
                "<font color='#ffff00'>Incompatible Game!</font>\nThis mod supports: {}",
                supported.join(", ")
            ));
        }

        let description = self.description();
        if !description.is_empty() {
            blocks.push(description);
        }

        blocks.join("\n\n")
    }

    /// The options to show at the top level of this mod's menu.
    ///
    /// The options are built fresh on every call. The enable toggle only holds a weak reference
    /// back to the mod.
    pub fn display_options(self: &Rc<Self>) -> Vec<ModOption> {
        let mut options: Vec<ModOption> = vec![
            ButtonOption::new("Description")
                .description(self.description_text())
                .description_title(self.description_title())
                .into(),
        ];

        if !self.is_compatible() {
            options.push(
                TitleOption::new("Incompatible Game!")
                    .description(format!(
                        "This mod is incompatible with {}!",
                        self.host.current_game().display_name()
                    ))
                    .into(),
            );
        } else if self.mod_type != ModType::Library {
            let this = Rc::downgrade(self);
            options.push(
                BoolOption::new("Enabled", self.is_enabled())
                    .on_change(move |_, now_enabled| {
                        if let Some(this) = Weak::upgrade(&this) {
                            if *now_enabled {
                                this.enable();
                            } else {
                                this.disable();
                            }
                        }
                    })
                    .into(),
            );
        }

        if !self.options.is_empty() {
            options.push(GroupedOption::new("Options", self.options.iter().cloned()).into());
        }

        if !self.keybinds.is_empty() {
            options.push(
                GroupedOption::new(
                    "Keybinds",
                    self.keybinds.iter().map(KeybindOption::from_keybind),
                )
                .into(),
            );
        }

        options
    }
}

impl Debug for Mod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mod")
            .field("name", &self.name)
            .field("mod_type", &self.mod_type)
            .field("supported_games", &self.supported_games)
            .field("settings_file", &self.settings_file)
            .field("enabled", &self.enabled.get())
            .field("auto_enable", &self.auto_enable)
            .field("options", &self.options)
            .field("keybinds", &self.keybinds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use modkit_mod_protocol::Game;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        headless::HeadlessHost,
        host::{BlockSignal, HookPhase},
    };

    struct CountingCommand {
        enabled: Cell<bool>,
    }

    impl Command for CountingCommand {
        fn name(&self) -> &str {
            "count"
        }

        fn enable(&self, _host: &Rc<dyn Host>) {
            self.enabled.set(true);
        }

        fn disable(&self) {
            self.enabled.set(false);
        }
    }

    #[test]
    fn enabling_cascades_and_disabling_tears_down() {
        let host = HeadlessHost::new(Game::Bl3);
        let command = Rc::new(CountingCommand {
            enabled: Cell::new(false),
        });
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();

        let m = ModBuilder::new("cascade")
            .no_settings_file()
            .with_keybind(Keybind::new("Jump", "Space").on_press(|| true))
            .with_hook(Hook::new("Engine:Tick", HookPhase::Post, "cascade", |_| ()))
            .with_command(command.clone())
            .on_enable(move || counter.set(counter.get() + 1))
            .build(host.clone());

        m.enable();
        m.enable();
        assert!(m.is_enabled());
        assert!(command.enabled.get());
        assert_eq!(1, host.hook_count());
        assert_eq!(BlockSignal::Block, host.press("Space"));
        assert_eq!(1, runs.get());

        m.disable();
        assert!(!command.enabled.get());
        assert_eq!(0, host.hook_count());
        assert_eq!(BlockSignal::Pass, host.press("Space"));
    }

    #[test]
    fn incompatible_mods_do_not_enable() {
        let host = HeadlessHost::new(Game::Bl2);
        let m = ModBuilder::new("modern").no_settings_file().build(host);

        m.enable();
        assert!(!m.is_enabled());
        assert_eq!(
            "<font color='#ffff00'>Incompatible Game!</font>\nThis mod supports: BL3, WL",
            m.description_text()
        );
    }

    #[test]
    fn libraries_stay_enabled() {
        let host = HeadlessHost::new(Game::Wonderlands);
        let m = ModBuilder::new("lib")
            .mod_type(ModType::Library)
            .no_settings_file()
            .build(host);

        assert!(m.is_enabled());
        assert!(!m.auto_enable());

        m.disable();
        assert!(m.is_enabled());
    }

    #[test]
    fn description_titles() {
        let host = HeadlessHost::new(Game::Bl3);
        let titled = |author: &str, version: &str| {
            ModBuilder::new("m")
                .author(author)
                .version(version)
                .no_settings_file()
                .build(host.clone())
                .description_title()
        };

        assert_eq!("By apple  -  1.2", titled("apple", "1.2"));
        assert_eq!("By apple", titled("apple", ""));
        assert_eq!("1.2", titled("", "1.2"));
        assert_eq!("Description", titled("", ""));
    }

    #[test]
    fn components_generate_description() {
        let host = HeadlessHost::new(Game::Bl3);
        let m = ModBuilder::new("base")
            .with_components([ComponentInfo::new("zeta", "2"), ComponentInfo::new("Alpha", "1")])
            .no_settings_file()
            .build(host);
        m.add_component(ComponentInfo::new("beta", "3"));

        assert_eq!("Components:\n- Alpha: 1\n- beta: 3\n- zeta: 2\n", m.description());
    }

    #[test]
    fn display_options_depend_on_type_and_game() {
        let names = |m: &ModRef| -> Vec<String> {
            m.display_options()
                .iter()
                .map(|o| o.identifier().to_owned())
                .collect()
        };

        let bl3 = HeadlessHost::new(Game::Bl3);
        let standard = ModBuilder::new("m")
            .with_option(BoolOption::new("b", true))
            .with_keybind(Keybind::unbound("k"))
            .no_settings_file()
            .build(bl3.clone());
        assert_eq!(
            vec!["Description", "Enabled", "Options", "Keybinds"],
            names(&standard)
        );

        let library = ModBuilder::new("lib")
            .mod_type(ModType::Library)
            .no_settings_file()
            .build(bl3);
        assert_eq!(vec!["Description"], names(&library));

        let bl2 = HeadlessHost::new(Game::Bl2);
        let incompatible = ModBuilder::new("m").no_settings_file().build(bl2);
        assert_eq!(
            vec!["Description", "Incompatible Game!"],
            names(&incompatible)
        );
    }

    #[test]
    fn enabled_toggle_drives_the_mod() {
        let host = HeadlessHost::new(Game::Bl3);
        let m = ModBuilder::new("m").no_settings_file().build(host);
        let options = m.display_options();

        let ModOption::Bool(toggle) = &options[1] else {
            panic!("expected the enabled toggle, got {:?}", options[1]);
        };
        toggle.update(true);
        assert!(m.is_enabled());
        toggle.update(false);
        assert!(!m.is_enabled());
    }
}
