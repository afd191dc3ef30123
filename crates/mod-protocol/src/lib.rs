use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod game;
pub mod markup;
pub mod settings;

pub use self::{
    game::{Game, GameSet},
    settings::{SettingsDocument, SettingsError},
};

/// What kind of mod this is. Influences ordering in the mod list.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash,
)]
pub enum ModType {
    #[default]
    Standard,

    /// Shared infrastructure which is always enabled, and cannot be toggled off.
    Library,
}
