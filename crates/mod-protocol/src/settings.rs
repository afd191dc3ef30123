use std::{
    fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, ser::PrettyFormatter};
use thiserror::Error;
use tracing::{debug, error};

/// The persisted state of a single mod.
///
/// Every section is optional. Nesting in `options` mirrors the grouped and nested options of the
/// mod, keyed by option identifier, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct SettingsDocument {
    /// Whether the mod was enabled last session. Only written for mods which auto enable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Option values, keyed by option identifier.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, Value>,

    /// The key bound to each rebindable keybind, or null if unbound.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub keybinds: IndexMap<String, Option<String>>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings file is not valid JSON")]
    Parse(#[from] serde_json::Error),

    #[error("settings document must be an object, found {0}")]
    NotAnObject(&'static str),
}

impl SettingsDocument {
    /// True if writing this document would persist nothing.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.options.is_empty() && self.keybinds.is_empty()
    }

    /// Parses a settings document, tolerating sections of the wrong shape.
    ///
    /// Sections which are present but mistyped are reported and treated as missing, the rest of
    /// the document still loads. Only text which is not a JSON object at all is an error.
    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        let root = match serde_json::from_str::<Value>(contents)? {
            Value::Object(root) => root,
            other => return Err(SettingsError::NotAnObject(json_type_name(&other))),
        };

        Ok(Self::from_object(root))
    }

    fn from_object(mut root: Map<String, Value>) -> Self {
        let mut document = SettingsDocument::default();

        match root.remove("enabled") {
            None => {}
            Some(Value::Bool(enabled)) => document.enabled = Some(enabled),
            Some(other) => {
                error!(value = %other, "ignoring saved enabled state which is not a boolean")
            }
        }

        match root.remove("options") {
            None => {}
            Some(Value::Object(options)) => document.options = options.into_iter().collect(),
            Some(other) => error!(value = %other, "ignoring saved options which are not a map"),
        }

        match root.remove("keybinds") {
            None => {}
            Some(Value::Object(keybinds)) => {
                document.keybinds = keybinds
                    .into_iter()
                    .map(|(identifier, key)| {
                        let key = match key {
                            Value::Null => None,
                            Value::String(key) => Some(key),
                            other => Some(other.to_string()),
                        };
                        (identifier, key)
                    })
                    .collect();
            }
            Some(other) => error!(value = %other, "ignoring saved keybinds which are not a map"),
        }

        document
    }

    /// Reads the document at `path`. A missing file is `Ok(None)`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Option<Self>, SettingsError> {
        let path = path.as_ref();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "no settings file");
                return Ok(None);
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };

        Self::parse(&contents).map(Some)
    }

    /// Encodes the document with four space indentation.
    pub fn to_string_pretty(&self) -> Result<String, SettingsError> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;

        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the document to `path`, overwriting it in place.
    ///
    /// An empty document deletes any existing file instead.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let io_error = |source| SettingsError::Io {
            path: path.to_owned(),
            source,
        };

        if self.is_empty() {
            return match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(e)),
            };
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        fs::write(path, self.to_string_pretty()?).map_err(io_error)
    }
}

/// The JSON type of a value, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
