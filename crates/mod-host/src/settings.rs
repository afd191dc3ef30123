//! Loading and saving a mod's settings document.
//!
//! Loading never fails. A missing or unreadable file is the same as no saved settings, and a
//! saved value which does not fit its option is reported and the option keeps its value.

use modkit_mod_protocol::{SettingsDocument, SettingsError, settings::json_type_name};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::{mods::Mod, options::ModOption};

pub(crate) fn load_mod_settings(target: &Mod) {
    let Some(path) = target.settings_file() else {
        return;
    };

    let document = match SettingsDocument::from_file(path) {
        Ok(Some(document)) => document,
        Ok(None) => return,
        Err(e) => {
            warn!(?path, error = %e, "ignoring unreadable settings file");
            return;
        }
    };

    apply_document(target, &document);
}

/// Applies a saved document to a mod, enabling it if it was saved enabled and auto enables.
pub fn apply_document(target: &Mod, document: &SettingsDocument) {
    if !document.options.is_empty() {
        let saved: Map<String, Value> = document
            .options
            .iter()
            .map(|(identifier, value)| (identifier.clone(), value.clone()))
            .collect();
        load_options(target.options(), &saved);
    }

    for keybind in target.keybinds() {
        if let Some(key) = document.keybinds.get(keybind.identifier()) {
            keybind.set_key(key.clone());
        }
    }

    if target.auto_enable() && document.enabled == Some(true) {
        target.enable();
    }
}

fn load_options(options: &[ModOption], saved: &Map<String, Value>) {
    for option in options {
        let Some(value) = saved.get(option.identifier()) else {
            continue;
        };

        match option {
            ModOption::Hidden(option) => option.restore(value.clone()),
            ModOption::Bool(option) => option.restore(is_truthy(value)),
            ModOption::Slider(option) => match as_number(value) {
                Some(number) if option.kind().is_integer => option.restore(number.round()),
                Some(number) => option.restore(number),
                None => invalid_value(option.meta().identifier(), value),
            },
            ModOption::Dropdown(option) => {
                if let Some(choice) = as_choice(&option.kind().choices, value) {
                    option.restore(choice);
                } else {
                    invalid_value(option.meta().identifier(), value);
                }
            }
            ModOption::Spinner(option) => {
                if let Some(choice) = as_choice(&option.kind().choices, value) {
                    option.restore(choice);
                } else {
                    invalid_value(option.meta().identifier(), value);
                }
            }
            ModOption::Keybind(option) => {
                warn!(
                    target: "modkit::dev",
                    identifier = option.meta().identifier(),
                    "keybind option found in an options list, define a keybind instead"
                );

                option.restore(match value {
                    Value::Null => None,
                    value => Some(as_text(value)),
                });
            }
            ModOption::Grouped(group) => match value {
                Value::Object(nested) => load_options(&group.children(), nested),
                value => invalid_value(group.meta().identifier(), value),
            },
            ModOption::Nested(nested_option) => match value {
                Value::Object(nested) => load_options(&nested_option.children(), nested),
                value => invalid_value(nested_option.meta().identifier(), value),
            },
            ModOption::Title(_) | ModOption::Button(_) => {
                error!(
                    identifier = option.identifier(),
                    kind = option.type_name(),
                    "cannot load a saved value into an option without one"
                );
            }
        }
    }
}

fn invalid_value(identifier: &str, value: &Value) {
    error!(
        identifier,
        %value,
        kind = json_type_name(value),
        "saved value is not valid for option, sticking with the default"
    );
}

/// Loose truthiness, with the string "false" being false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty() && !text.trim().eq_ignore_ascii_case("false"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Choices may change between versions of a mod, a saved choice which no longer exists is invalid.
fn as_choice(choices: &[String], value: &Value) -> Option<String> {
    let value = as_text(value);
    choices.contains(&value).then_some(value)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        value => value.to_string(),
    }
}

/// The document [`save_mod_settings`] would write for `target`.
pub fn create_document(target: &Mod) -> SettingsDocument {
    let mut document = SettingsDocument::default();

    if !target.options().is_empty() {
        let mut ancestors = vec![];
        document.options = create_options(target.options(), &mut ancestors)
            .into_iter()
            .collect();
    }

    document.keybinds = target
        .keybinds()
        .iter()
        .filter(|keybind| keybind.is_rebindable())
        .map(|keybind| (keybind.identifier().to_owned(), keybind.key()))
        .collect();

    if target.auto_enable() {
        document.enabled = Some(target.is_enabled());
    }

    document
}

fn create_options(options: &[ModOption], ancestors: &mut Vec<ModOption>) -> Map<String, Value> {
    let mut saved = Map::new();

    for option in options {
        let value = match option {
            ModOption::Bool(option) => Value::Bool(option.value()),
            ModOption::Slider(option) => slider_value(option.value(), option.kind().is_integer),
            ModOption::Dropdown(option) => Value::String(option.value()),
            ModOption::Spinner(option) => Value::String(option.value()),
            ModOption::Keybind(option) => {
                warn!(
                    target: "modkit::dev",
                    identifier = option.meta().identifier(),
                    "keybind option found in an options list, define a keybind instead"
                );
                option.value().map_or(Value::Null, Value::String)
            }
            ModOption::Hidden(option) => option.value(),
            ModOption::Grouped(_) | ModOption::Nested(_)
                if ancestors.iter().any(|ancestor| ancestor.ptr_eq(option)) =>
            {
                warn!(
                    target: "modkit::dev",
                    identifier = option.identifier(),
                    "found recursive options group, not saving it"
                );
                continue;
            }
            ModOption::Grouped(group) => {
                ancestors.push(option.clone());
                let children = create_options(&group.children(), ancestors);
                ancestors.pop();
                Value::Object(children)
            }
            ModOption::Nested(nested) => {
                ancestors.push(option.clone());
                let children = create_options(&nested.children(), ancestors);
                ancestors.pop();
                Value::Object(children)
            }
            ModOption::Title(_) | ModOption::Button(_) => continue,
        };

        saved.insert(option.identifier().to_owned(), value);
    }

    saved
}

/// Integer sliders save as JSON integers.
fn slider_value(value: f64, is_integer: bool) -> Value {
    if is_integer {
        Value::from(value.round() as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Writes the mod's current state to its settings file, if it has one.
///
/// A mod with nothing to save has its file removed instead.
pub(crate) fn save_mod_settings(target: &Mod) -> Result<(), SettingsError> {
    let Some(path) = target.settings_file() else {
        return Ok(());
    };

    let document = create_document(target);
    debug!(?path, empty = document.is_empty(), "saving mod settings");

    document.write(path)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use assert_fs::{TempDir, prelude::*};
    use expect_test::expect;
    use modkit_mod_protocol::Game;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        headless::HeadlessHost,
        keybinds::Keybind,
        mods::{ModBuilder, ModRef},
        options::{
            BoolOption, ButtonOption, DropdownOption, GroupedOption, HiddenOption, NestedOption,
            SliderOption, SpinnerOption, TitleOption,
        },
    };

    struct Fixture {
        volume: Rc<SliderOption>,
        choice: Rc<DropdownOption>,
        inner: Rc<BoolOption>,
        deep: Rc<SpinnerOption>,
        state: Rc<HiddenOption>,
        jump: Rc<Keybind>,
        locked: Rc<Keybind>,
    }

    fn fixture(path: &std::path::Path) -> (ModRef, Fixture) {
        let fixture = Fixture {
            volume: Rc::new(SliderOption::new("Volume", 5.0, 0.0, 10.0)),
            choice: Rc::new(DropdownOption::new("Choice", "A", ["A", "B", "C"])),
            inner: Rc::new(BoolOption::new("Inner", false)),
            deep: Rc::new(SpinnerOption::new("Deep", "x", ["x", "y"])),
            state: Rc::new(HiddenOption::new("State", json!({"runs": 0}))),
            jump: Rc::new(Keybind::new("Jump", "Space")),
            locked: Rc::new(Keybind::new("Locked", "L").rebindable(false)),
        };

        let m = ModBuilder::new("fixture")
            .settings_file(path)
            .with_option(TitleOption::new("Heading"))
            .with_option(fixture.volume.clone())
            .with_option(fixture.choice.clone())
            .with_option(GroupedOption::new(
                "Group",
                [
                    ModOption::from(fixture.inner.clone()),
                    NestedOption::new("Sub", [fixture.deep.clone()]).into(),
                ],
            ))
            .with_option(ButtonOption::new("Go"))
            .with_option(fixture.state.clone())
            .with_keybind(fixture.jump.clone())
            .with_keybind(fixture.locked.clone())
            .build(HeadlessHost::new(Game::Bl3));

        (m, fixture)
    }

    #[test]
    fn saves_nested_options_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("fixture.json");
        let (m, f) = fixture(file.path());

        f.volume.update(7.0);
        f.inner.update(true);
        f.deep.update("y".to_owned());
        f.jump.set_key(None);
        m.save_settings()?;

        expect![[r#"
            {
                "enabled": false,
                "options": {
                    "Volume": 7,
                    "Choice": "A",
                    "Group": {
                        "Inner": true,
                        "Sub": {
                            "Deep": "y"
                        }
                    },
                    "State": {
                        "runs": 0
                    }
                },
                "keybinds": {
                    "Jump": null
                }
            }"#]]
        .assert_eq(&std::fs::read_to_string(file.path())?);

        Ok(())
    }

    #[test]
    fn round_trips_into_fresh_mod() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("fixture.json");

        let (m, f) = fixture(file.path());
        f.volume.update(3.0);
        f.choice.update("C".to_owned());
        f.inner.update(true);
        f.deep.update("y".to_owned());
        f.state.update(json!({"runs": 4}));
        f.jump.set_key(Some("J".to_owned()));
        f.locked.set_key(Some("K".to_owned()));
        m.save_settings()?;
        let first = std::fs::read_to_string(file.path())?;

        let (fresh, g) = fixture(file.path());
        fresh.load_settings();

        assert_eq!(3.0, g.volume.value());
        assert_eq!("C", g.choice.value());
        assert!(g.inner.value());
        assert_eq!("y", g.deep.value());
        assert_eq!(json!({"runs": 4}), g.state.value());
        assert_eq!(Some("J".to_owned()), g.jump.key());
        // Not rebindable, so never saved
        assert_eq!(Some("L".to_owned()), g.locked.key());

        fresh.save_settings()?;
        fresh.save_settings()?;
        assert_eq!(first, std::fs::read_to_string(file.path())?);

        Ok(())
    }

    #[test]
    fn bad_values_keep_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("fixture.json");
        file.write_str(
            r#"{
                "options": {
                    "Volume": "loud",
                    "Choice": "Removed In v2",
                    "Group": 5,
                    "Heading": 1,
                    "Unknown": true
                },
                "keybinds": {"Missing": "M"}
            }"#,
        )?;

        let (m, f) = fixture(file.path());
        m.load_settings();

        assert_eq!(5.0, f.volume.value());
        assert_eq!("A", f.choice.value());
        assert!(!f.inner.value());
        assert_eq!(Some("Space".to_owned()), f.jump.key());

        Ok(())
    }

    #[test]
    fn malformed_files_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("fixture.json");
        file.write_str("{ not json")?;

        let (m, f) = fixture(file.path());
        m.load_settings();

        assert_eq!(5.0, f.volume.value());
        assert!(!m.is_enabled());

        Ok(())
    }

    #[test]
    fn flexible_coercions() {
        let host = HeadlessHost::new(Game::Bl3);
        let flags: Vec<Rc<BoolOption>> = (0..6)
            .map(|i| Rc::new(BoolOption::new(format!("b{i}"), i % 2 == 0)))
            .collect();
        let rounded = Rc::new(SliderOption::new("r", 0.0, 0.0, 10.0));
        let fractional = Rc::new(SliderOption::new("f", 0.0, 0.0, 1.0).integer(false));

        let m = ModBuilder::new("coerce")
            .with_options(flags.iter().cloned())
            .with_option(rounded.clone())
            .with_option(fractional.clone())
            .build(host);

        apply_document(
            &m,
            &SettingsDocument::parse(
                r#"{"options": {
                    "b0": " False ", "b1": "yes", "b2": 0, "b3": [1], "b4": null, "b5": true,
                    "r": "6.6", "f": 0.25
                }}"#,
            )
            .expect("valid document"),
        );

        let values: Vec<bool> = flags.iter().map(|flag| flag.value()).collect();
        assert_eq!(vec![false, true, false, true, false, true], values);
        assert_eq!(7.0, rounded.value());
        assert_eq!(0.25, fractional.value());
    }

    #[test]
    fn saved_enable_state_only_applies_with_auto_enable() {
        let host = HeadlessHost::new(Game::Bl3);
        let document = SettingsDocument {
            enabled: Some(true),
            ..Default::default()
        };

        let auto = ModBuilder::new("auto").build(host.clone());
        apply_document(&auto, &document);
        assert!(auto.is_enabled());

        let manual = ModBuilder::new("manual").auto_enable(false).build(host);
        apply_document(&manual, &document);
        assert!(!manual.is_enabled());
    }

    #[test]
    fn recursive_groups_are_not_saved() {
        let group = Rc::new(GroupedOption::new("Loop", [BoolOption::new("Leaf", true)]));
        group.push(group.clone());

        let m = ModBuilder::new("loop")
            .with_option(group.clone())
            .build(HeadlessHost::new(Game::Bl3));

        let document = create_document(&m);
        assert_eq!(
            json!({"Loop": {"Leaf": true}}),
            serde_json::to_value(&document.options).expect("serializable")
        );
    }

    #[test]
    fn empty_documents_delete_the_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("quiet.json");
        file.write_str(r#"{"options": {"Gone": 1}}"#)?;

        let m = ModBuilder::new("quiet")
            .auto_enable(false)
            .settings_file(file.path())
            .with_option(TitleOption::new("Only a title"))
            .build(HeadlessHost::new(Game::Bl3));

        m.save_settings()?;
        assert!(!file.path().exists());

        Ok(())
    }

    #[test]
    fn foo_scenario() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("foo.json");
        let volume = Rc::new(SliderOption::new("Volume", 5.0, 0.0, 10.0).step(1.0));

        let m = ModBuilder::new("foo")
            .name("Foo")
            .settings_file(file.path())
            .with_option(volume.clone())
            .with_keybind(Keybind::new("Jump", "Space"))
            .build(HeadlessHost::new(Game::Bl3));

        m.enable();
        volume.update(8.0);
        m.disable();

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(file.path())?)?;
        assert_eq!(
            json!({"enabled": false, "options": {"Volume": 8}, "keybinds": {"Jump": "Space"}}),
            saved
        );

        Ok(())
    }
}
