use clap::*;
use menu::MenuArgs;
use settings::SettingsArgs;

pub mod info;
pub mod menu;
pub mod schema;
pub mod settings;

#[derive(Subcommand, Debug)]
#[command(flatten_help = true)]
pub enum Commands {
    /// Browse the bundled demo mods in the console options menu.
    #[clap(disable_version_flag = true)]
    Menu(MenuArgs),

    /// Show the contents of a mod settings file.
    #[clap(disable_version_flag = true)]
    Settings(SettingsArgs),

    /// Print the JSON schema of mod settings files.
    #[clap(disable_version_flag = true)]
    Schema,

    /// Show information on the modkit configuration and search paths.
    #[clap(disable_version_flag = true)]
    Info,
}
