use color_eyre::owo_colors::OwoColorize;

use crate::{config::Config, output::OutputBuilder};

fn format_path<P: AsRef<std::path::Path>>(path: Option<P>) -> String {
    match path {
        None => "<none>".red().to_string(),
        Some(path) => path.as_ref().to_string_lossy().to_string(),
    }
}

pub fn info(config: Config) -> color_eyre::Result<()> {
    let mut output = OutputBuilder::new("Configuration");

    output.property("Game", config.game());
    output.property("Settings directory", format_path(config.settings_dir()));
    output.property("Log file", format_path(config.options.log_file.as_ref()));
    output.property("Full tracebacks", config.options.full_tracebacks);

    output.section("Configuration search paths", |builder| {
        for (index, item) in config.known_dirs.config_dirs().enumerate() {
            builder.property(format!("{index}"), item.join("modkit.toml").to_string_lossy());
        }
    });

    print!("{}", output.build());

    Ok(())
}
