use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{OptionExt, eyre};
use modkit_mod_protocol::SettingsDocument;
use serde_json::Value;

use crate::{config::Config, output::OutputBuilder};

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// A settings file, or the module name of a mod whose settings to show.
    name: String,

    /// Print the document as JSON instead.
    #[clap(long)]
    json: bool,
}

pub fn show(config: Config, args: SettingsArgs) -> color_eyre::Result<()> {
    let path = config.resolve_settings_file(&args.name)?;
    let document = SettingsDocument::from_file(&path)?
        .ok_or_else(|| eyre!("no settings file at {}", path.display()))?;

    if args.json {
        println!("{}", document.to_string_pretty()?);
    } else {
        print!("{}", render(&path, &document)?);
    }

    Ok(())
}

fn render(path: &Path, document: &SettingsDocument) -> color_eyre::Result<String> {
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .ok_or_eyre("settings path has no file name")?;

    let mut output = OutputBuilder::new(file_name.display());

    match document.enabled {
        Some(enabled) => output.property("Enabled", enabled),
        None => output.property("Enabled", "<not saved>"),
    }

    if !document.options.is_empty() {
        output.section("Options", |builder| {
            for (identifier, value) in &document.options {
                value_property(builder, identifier, value);
            }
        });
    }

    if !document.keybinds.is_empty() {
        output.section("Keybinds", |builder| {
            for (identifier, key) in &document.keybinds {
                builder.property(identifier, key.as_deref().unwrap_or("<unbound>"));
            }
        });
    }

    Ok(output.build())
}

fn value_property(builder: &mut OutputBuilder, identifier: &str, value: &Value) {
    match value {
        Value::Object(children) => builder.section(identifier, |builder| {
            for (identifier, value) in children {
                value_property(builder, identifier, value);
            }
        }),
        Value::String(value) => builder.property(identifier, value),
        value => builder.property(identifier, value),
    }
}
