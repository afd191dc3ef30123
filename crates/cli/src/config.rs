use std::{
    fs, io,
    path::{Path, PathBuf},
};

use color_eyre::{Report, Result};
use modkit_mod_protocol::Game;
use serde::{Deserialize, Serialize};

pub mod known_paths;

pub use known_paths::KnownDirs;

#[derive(Debug, clap::Args, Serialize, Deserialize, Default, PartialEq)]
#[group(multiple = true)]
#[serde(default)]
pub struct Options {
    /// Override the directory mod settings files are kept in.
    #[clap(long, help_heading = "Configuration", value_hint = clap::ValueHint::DirPath)]
    pub(crate) settings_dir: Option<PathBuf>,

    /// The game the headless host reports as running [default: bl3]
    #[clap(long, help_heading = "Configuration")]
    pub(crate) game: Option<Game>,

    /// Show full error reports, including span traces.
    #[clap(long, help_heading = "Configuration")]
    pub(crate) full_tracebacks: bool,

    /// Also write logs to this file.
    #[clap(long, help_heading = "Configuration", value_hint = clap::ValueHint::FilePath)]
    pub(crate) log_file: Option<PathBuf>,
}

pub struct Config {
    pub options: Options,
    pub known_dirs: KnownDirs,
}

impl Config {
    pub fn settings_dir(&self) -> Option<PathBuf> {
        self.options
            .settings_dir
            .clone()
            .or_else(|| self.known_dirs.settings_dir().map(PathBuf::from))
    }

    pub fn game(&self) -> Game {
        self.options.game.unwrap_or(Game::Bl3)
    }

    /// A settings file given either as a path, or as the name of a mod module.
    pub fn resolve_settings_file(&self, name: &str) -> Result<PathBuf> {
        if let Ok(true) = fs::exists(name) {
            Ok(PathBuf::from(name))
        } else {
            Ok(self
                .settings_dir()
                .ok_or_else(no_settings_dir)?
                .join(format!("{name}.json")))
        }
    }
}

pub fn no_settings_dir() -> Report {
    color_eyre::eyre::eyre!(
        "no settings directory could be found, pass one with --settings-dir"
    )
}

impl Options {
    /// Combines two layers of options, `other` winning.
    pub fn merge(self, other: Self) -> Self {
        Self {
            settings_dir: other.settings_dir.or(self.settings_dir),
            game: other.game.or(self.game),
            full_tracebacks: other.full_tracebacks || self.full_tracebacks,
            log_file: other.log_file.or(self.log_file),
        }
    }

    /// Reads a configuration file, `None` if it does not exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let encoded_toml = match fs::read_to_string(path) {
            Ok(encoded_toml) => encoded_toml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(toml::from_str(&encoded_toml)?))
    }

    /// Merges every readable file in order. Files which fail to load are skipped and returned
    /// alongside the result, to be reported once logging is up.
    pub fn from_files<P: AsRef<Path>>(
        files: impl IntoIterator<Item = P>,
    ) -> (Options, Vec<(PathBuf, Report)>) {
        let mut options = Options::default();
        let mut failures = vec![];

        for file in files {
            let path = file.as_ref();

            match Options::from_file(path) {
                Ok(Some(item)) => options = options.merge(item),
                Ok(None) => {}
                Err(error) => failures.push((path.to_path_buf(), error)),
            }
        }

        (options, failures)
    }
}
