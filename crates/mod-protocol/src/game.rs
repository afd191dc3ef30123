use std::{error::Error, fmt::Display, path::Path, str::FromStr};

use bitflags::bitflags;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::VariantArray;
use tracing::error;

/// Games a mod may declare support for.
///
/// Only [`Game::Bl3`] and [`Game::Wonderlands`] are expected to actually host mods, the older
/// titles exist so that a mod written for them still loads far enough to show an incompatibility
/// banner.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Serialize,
    JsonSchema,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    VariantArray,
)]
pub enum Game {
    #[serde(rename = "bl3")]
    Bl3,

    #[serde(rename = "wonderlands")]
    #[serde(alias = "wl")]
    Wonderlands,

    #[serde(rename = "bl2")]
    Bl2,

    #[serde(rename = "tps")]
    Tps,

    #[serde(rename = "aodk")]
    Aodk,
}

impl Game {
    /// The primary name of a game as a lowercase string.
    pub const fn name(self) -> &'static str {
        use Game::*;
        match self {
            Bl3 => "bl3",
            Wonderlands => "wonderlands",
            Bl2 => "bl2",
            Tps => "tps",
            Aodk => "aodk",
        }
    }

    /// Short name shown to users, e.g. in incompatibility banners.
    pub const fn display_name(self) -> &'static str {
        use Game::*;
        match self {
            Bl3 => "BL3",
            Wonderlands => "WL",
            Bl2 => "BL2",
            Tps => "TPS",
            Aodk => "AoDK",
        }
    }

    /// All names and aliases of a game as lowercase strings, including the primary name.
    pub fn possible_names(self) -> &'static [&'static str] {
        use Game::*;
        match self {
            Bl3 => &[const { Bl3.name() }, "borderlands3"],
            Wonderlands => &[const { Wonderlands.name() }, "wl", "tinytina"],
            Bl2 => &[const { Bl2.name() }, "borderlands2"],
            Tps => &[const { Tps.name() }, "borderlandspresequel"],
            Aodk => &[const { Aodk.name() }, "assaultondragonkeep"],
        }
    }

    /// The set containing only this game.
    pub const fn as_set(self) -> GameSet {
        use Game::*;
        match self {
            Bl3 => GameSet::BL3,
            Wonderlands => GameSet::WONDERLANDS,
            Bl2 => GameSet::BL2,
            Tps => GameSet::TPS,
            Aodk => GameSet::AODK,
        }
    }

    /// Works out which game is running from the host executable's file name.
    ///
    /// Unknown executables are reported and treated as BL3, executable names have been seen to
    /// corrupt and a sane guess keeps mods working.
    pub fn from_executable<P: AsRef<Path>>(executable: P) -> Self {
        let executable = executable.as_ref();
        let name = executable
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_ascii_lowercase();

        match name.as_str() {
            "borderlands3.exe" => Game::Bl3,
            "wonderlands.exe" => Game::Wonderlands,
            _ => {
                error!(?executable, "unknown executable name, assuming BL3");
                Game::Bl3
            }
        }
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Game {
    type Err = InvalidGame;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.to_ascii_lowercase();

        Game::VARIANTS
            .iter()
            .copied()
            .find(|game| game.possible_names().contains(&&*name))
            .ok_or(InvalidGame(name))
    }
}

#[derive(Debug)]
pub struct InvalidGame(String);

impl Display for InvalidGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not a supported game", self.0)
    }
}

impl Error for InvalidGame {}

bitflags! {
    /// A set of [`Game`]s.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GameSet: u8 {
        const BL3 = 1 << 0;
        const WONDERLANDS = 1 << 1;
        const BL2 = 1 << 2;
        const TPS = 1 << 3;
        const AODK = 1 << 4;
    }
}

impl GameSet {
    pub fn supports(self, game: Game) -> bool {
        self.contains(game.as_set())
    }

    /// Iterates the games in this set, in declaration order.
    pub fn games(self) -> impl Iterator<Item = Game> {
        Game::VARIANTS
            .iter()
            .copied()
            .filter(move |game| self.supports(*game))
    }
}

impl Default for GameSet {
    fn default() -> Self {
        GameSet::BL3 | GameSet::WONDERLANDS
    }
}

impl From<Game> for GameSet {
    fn from(game: Game) -> Self {
        game.as_set()
    }
}

impl FromIterator<Game> for GameSet {
    fn from_iter<T: IntoIterator<Item = Game>>(iter: T) -> Self {
        iter.into_iter()
            .fold(GameSet::empty(), |set, game| set | game.as_set())
    }
}
