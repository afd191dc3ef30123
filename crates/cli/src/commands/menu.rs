use std::{
    any::Any,
    fs::{self, File},
    io::{self, BufReader},
    path::PathBuf,
    rc::Rc,
};

use clap::Args;
use color_eyre::eyre::Context;
use modkit_menu::console::ConsoleMenu;
use modkit_mod_host::{
    HeadlessHost, Hook, HookPhase, Host, Keybind, ModBuilder, ModOption, ModRegistry,
    options::{
        BoolOption, ButtonOption, DropdownOption, GroupedOption, NestedOption, SliderOption,
        SpinnerOption, TitleOption,
    },
};
use modkit_mod_protocol::GameSet;
use tracing::info;

use crate::config::{Config, no_settings_dir};

#[derive(Args, Debug)]
pub struct MenuArgs {
    /// Read menu input from this file instead of stdin.
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    input: Option<PathBuf>,
}

pub fn menu(config: Config, args: MenuArgs) -> color_eyre::Result<()> {
    let settings_dir = config.settings_dir().ok_or_else(no_settings_dir)?;
    fs::create_dir_all(&settings_dir)
        .wrap_err_with(|| format!("couldn't create {}", settings_dir.display()))?;

    let host = HeadlessHost::new(config.game());
    let mut registry = ModRegistry::new(host.clone() as Rc<dyn Host>, settings_dir);
    register_demo_mods(&mut registry);

    let mut console = ConsoleMenu::new(&registry, io::stdout().lock());

    match args.input {
        Some(input) => {
            let file = File::open(&input)
                .wrap_err_with(|| format!("couldn't open {}", input.display()))?;
            console.run(BufReader::new(file))?;
        }
        None => console.run(io::stdin().lock())?,
    }

    info!(hooks = host.hook_count(), "menu closed");

    Ok(())
}

/// Mods covering every kind of option, so the menu has something to show.
fn register_demo_mods(registry: &mut ModRegistry) {
    let greet = Rc::new(
        Keybind::new("Greet", "G")
            .description("Logs a greeting.")
            .on_press(|| info!("hello from the example mod")),
    );

    ModBuilder::new("example_mod")
        .name("Example Mod")
        .author("modkit")
        .version("1.0")
        .description("Shows off each kind of option the menu can draw.")
        .with_keybind(greet)
        .with_hook(Hook::new(
            "/Script/OakGame.OakPlayerController:ServerRespawn",
            HookPhase::Pre,
            "log_respawn",
            |_: &dyn Any| info!("player respawning"),
        ))
        .with_option(TitleOption::new("General"))
        .with_option(
            SliderOption::new("Volume", 5.0, 0.0, 10.0).description("How loud the example is."),
        )
        .with_option(BoolOption::new("Verbose", false).text("Loud", "Quiet"))
        .with_option(GroupedOption::new(
            "Appearance",
            [
                ModOption::from(DropdownOption::new("Colour", "Red", ["Red", "Green", "Blue"])),
                ModOption::from(
                    SpinnerOption::new("Size", "Medium", ["Small", "Medium", "Large"]).wrap(true),
                ),
            ],
        ))
        .with_option(NestedOption::new(
            "Advanced",
            [SliderOption::new("Scale", 1.0, 0.5, 2.0)
                .step(0.1)
                .integer(false)
                .description("<b>Multiplies</b> everything.")],
        ))
        .with_option(
            ButtonOption::new("Reset Volume")
                .description("Logs that the volume would be reset.")
                .on_press(|button| info!(button = button.meta().display_name(), "pressed")),
        )
        .on_enable(|| info!("example mod enabled"))
        .on_disable(|| info!("example mod disabled"))
        .register(registry);

    ModBuilder::new("legacy_mod")
        .name("Legacy Mod")
        .description("Written for an older game, never compatible here.")
        .supported_games(GameSet::BL2 | GameSet::TPS)
        .register(registry);
}
