//! The declarative option model.
//!
//! Options are shared between the mod which declares them, the settings codec and whichever menu
//! is open, so every option lives behind an [`Rc`] and value-bearing options keep their value in a
//! [`RefCell`]. All access happens on the host's event-dispatch thread.

use std::{
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
};

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::keybinds::Keybind;

/// Metadata every option carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionMeta {
    identifier: String,
    display_name: Option<String>,
    description: String,
    description_title: Option<String>,
    is_hidden: bool,
}

impl OptionMeta {
    fn new<S: Into<String>>(identifier: S) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// The stable key used when persisting this option.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Defaults to the identifier.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Defaults to the display name.
    pub fn description_title(&self) -> &str {
        self.description_title
            .as_deref()
            .unwrap_or_else(|| self.display_name())
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }
}

macro_rules! meta_builders {
    () => {
        pub fn display_name<S: Into<String>>(mut self, display_name: S) -> Self {
            self.meta.display_name = Some(display_name.into());
            self
        }

        pub fn description<S: Into<String>>(mut self, description: S) -> Self {
            self.meta.description = description.into();
            self
        }

        pub fn description_title<S: Into<String>>(mut self, title: S) -> Self {
            self.meta.description_title = Some(title.into());
            self
        }

        pub fn hidden(mut self, is_hidden: bool) -> Self {
            self.meta.is_hidden = is_hidden;
            self
        }

        pub fn meta(&self) -> &OptionMeta {
            &self.meta
        }
    };
}

/// A line of display-only text.
#[derive(Debug)]
pub struct TitleOption {
    meta: OptionMeta,
}

impl TitleOption {
    pub fn new<S: Into<String>>(identifier: S) -> Self {
        Self {
            meta: OptionMeta::new(identifier),
        }
    }

    meta_builders!();
}

type ButtonCallback = Box<dyn Fn(&ButtonOption)>;

pub struct ButtonOption {
    meta: OptionMeta,
    on_press: Option<ButtonCallback>,
}

impl ButtonOption {
    pub fn new<S: Into<String>>(identifier: S) -> Self {
        Self {
            meta: OptionMeta::new(identifier),
            on_press: None,
        }
    }

    meta_builders!();

    pub fn on_press<F: Fn(&ButtonOption) + 'static>(mut self, callback: F) -> Self {
        if self.on_press.is_some() {
            warn!(target: "modkit::dev", identifier = %self.meta.identifier, "replacing existing on_press callback");
        }
        self.on_press = Some(Box::new(callback));
        self
    }

    /// Runs the press callback, if any.
    pub fn press(&self) {
        if let Some(callback) = &self.on_press {
            callback(self);
        }
    }
}

impl Debug for ButtonOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonOption")
            .field("meta", &self.meta)
            .field("on_press", &self.on_press.is_some())
            .finish()
    }
}

type ChangeCallback<T, K> = Box<dyn Fn(&ValueOption<T, K>, &T)>;

/// An option holding a value of type `T`, with `K` describing what values make sense.
///
/// The value it was constructed with is kept as its default.
pub struct ValueOption<T, K> {
    meta: OptionMeta,
    value: RefCell<T>,
    default_value: T,
    kind: K,
    on_change: Option<ChangeCallback<T, K>>,
}

impl<T: Clone, K> ValueOption<T, K> {
    fn with_kind<S: Into<String>>(identifier: S, value: T, kind: K) -> Self {
        Self {
            meta: OptionMeta::new(identifier),
            default_value: value.clone(),
            value: RefCell::new(value),
            kind,
            on_change: None,
        }
    }

    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T, K> ValueOption<T, K> {
    meta_builders!();

    /// Sets a callback run with the candidate value before every change.
    ///
    /// The callback cannot veto the change, and sees the old value through the option.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ValueOption<T, K>, &T) + 'static,
    {
        if self.on_change.is_some() {
            warn!(target: "modkit::dev", identifier = %self.meta.identifier, "replacing existing on_change callback");
        }
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Changes the value, notifying the change callback first.
    pub fn update(&self, value: T) {
        if let Some(callback) = &self.on_change {
            callback(self, &value);
        }
        self.restore(value);
    }

    /// Assigns without notifying, used when loading saved settings.
    pub(crate) fn restore(&self, value: T) {
        *self.value.borrow_mut() = value;
    }
}

impl<T: Debug, K: Debug> Debug for ValueOption<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOption")
            .field("meta", &self.meta)
            .field("value", &self.value.borrow())
            .field("default_value", &self.default_value)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoolText {
    pub true_text: Option<String>,
    pub false_text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub is_integer: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropdownChoices {
    pub choices: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinnerChoices {
    pub choices: Vec<String>,
    pub wrap_enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    pub is_rebindable: bool,
}

/// Marker for options which are never displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hidden;

pub type BoolOption = ValueOption<bool, BoolText>;
pub type SliderOption = ValueOption<f64, SliderRange>;
pub type DropdownOption = ValueOption<String, DropdownChoices>;
pub type SpinnerOption = ValueOption<String, SpinnerChoices>;
pub type KeybindOption = ValueOption<Option<String>, KeyBinding>;

/// Persists arbitrary JSON state. Never shown in a menu.
pub type HiddenOption = ValueOption<Value, Hidden>;

impl BoolOption {
    pub fn new<S: Into<String>>(identifier: S, value: bool) -> Self {
        Self::with_kind(identifier, value, BoolText::default())
    }

    /// Replaces the default "On"/"Off" display text.
    pub fn text<T: Into<String>, F: Into<String>>(mut self, true_text: T, false_text: F) -> Self {
        self.kind = BoolText {
            true_text: Some(true_text.into()),
            false_text: Some(false_text.into()),
        };
        self
    }
}

impl SliderOption {
    /// An integer slider with a step of one.
    pub fn new<S: Into<String>>(identifier: S, value: f64, min: f64, max: f64) -> Self {
        Self::with_kind(
            identifier,
            value,
            SliderRange {
                min,
                max,
                step: 1.0,
                is_integer: true,
            },
        )
    }

    pub fn step(mut self, step: f64) -> Self {
        self.kind.step = step;
        self
    }

    pub fn integer(mut self, is_integer: bool) -> Self {
        self.kind.is_integer = is_integer;
        self
    }
}

impl DropdownOption {
    pub fn new<S, V, I, C>(identifier: S, value: V, choices: I) -> Self
    where
        S: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::with_kind(
            identifier,
            value.into(),
            DropdownChoices {
                choices: choices.into_iter().map(Into::into).collect(),
            },
        )
    }
}

impl SpinnerOption {
    pub fn new<S, V, I, C>(identifier: S, value: V, choices: I) -> Self
    where
        S: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::with_kind(
            identifier,
            value.into(),
            SpinnerChoices {
                choices: choices.into_iter().map(Into::into).collect(),
                wrap_enabled: false,
            },
        )
    }

    pub fn wrap(mut self, wrap_enabled: bool) -> Self {
        self.kind.wrap_enabled = wrap_enabled;
        self
    }
}

impl KeybindOption {
    pub fn new<S: Into<String>>(identifier: S, value: Option<String>) -> Self {
        Self::with_kind(
            identifier,
            value,
            KeyBinding {
                is_rebindable: true,
            },
        )
    }

    pub fn rebindable(mut self, is_rebindable: bool) -> Self {
        self.kind.is_rebindable = is_rebindable;
        self
    }

    /// An option mirroring a keybind, for display in a menu. Changing it rebinds the keybind.
    pub fn from_keybind(keybind: &Rc<Keybind>) -> Self {
        let mut option = Self::new(keybind.identifier(), keybind.key())
            .rebindable(keybind.is_rebindable())
            .display_name(keybind.get_display_name())
            .description(keybind.get_description())
            .description_title(keybind.get_description_title())
            .hidden(keybind.is_hidden());

        let keybind = keybind.clone();
        option.on_change = Some(Box::new(move |_: &KeybindOption, key: &Option<String>| {
            keybind.set_key(key.clone())
        }));
        option
    }
}

impl HiddenOption {
    pub fn new<S: Into<String>>(identifier: S, value: Value) -> Self {
        Self::with_kind(identifier, value, Hidden).hidden(true)
    }
}

/// Children drawn inline, under a header naming the group.
#[derive(Debug)]
pub struct GroupedOption {
    meta: OptionMeta,
    children: RefCell<Vec<ModOption>>,
}

/// Children shown on their own screen, entered by selecting this option.
#[derive(Debug)]
pub struct NestedOption {
    meta: OptionMeta,
    children: RefCell<Vec<ModOption>>,
}

macro_rules! container_impl {
    ($ty:ident) => {
        impl $ty {
            pub fn new<S, I, O>(identifier: S, children: I) -> Self
            where
                S: Into<String>,
                I: IntoIterator<Item = O>,
                O: Into<ModOption>,
            {
                Self {
                    meta: OptionMeta::new(identifier),
                    children: RefCell::new(children.into_iter().map(Into::into).collect()),
                }
            }

            meta_builders!();

            /// Appends a child. Containers may be extended after construction, which is how a
            /// container can end up inside itself.
            pub fn push<O: Into<ModOption>>(&self, child: O) {
                self.children.borrow_mut().push(child.into());
            }

            pub fn children(&self) -> Vec<ModOption> {
                self.children.borrow().clone()
            }
        }
    };
}

container_impl!(GroupedOption);
container_impl!(NestedOption);

/// A value to assign to an option of unknown type.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Key(Option<String>),
    Json(Value),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "text",
            OptionValue::Key(_) => "key",
            OptionValue::Json(_) => "json",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionError {
    #[error("option {identifier} is a {expected} option, cannot assign a {found} value")]
    TypeMismatch {
        identifier: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("option {0} does not hold a value")]
    NotAValue(String),
}

/// Any option.
#[derive(Clone)]
pub enum ModOption {
    Title(Rc<TitleOption>),
    Button(Rc<ButtonOption>),
    Bool(Rc<BoolOption>),
    Slider(Rc<SliderOption>),
    Dropdown(Rc<DropdownOption>),
    Spinner(Rc<SpinnerOption>),
    Keybind(Rc<KeybindOption>),
    Hidden(Rc<HiddenOption>),
    Grouped(Rc<GroupedOption>),
    Nested(Rc<NestedOption>),
}

macro_rules! mod_option_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ModOption {
                fn from(option: $ty) -> Self {
                    ModOption::$variant(Rc::new(option))
                }
            }

            impl From<Rc<$ty>> for ModOption {
                fn from(option: Rc<$ty>) -> Self {
                    ModOption::$variant(option)
                }
            }
        )*
    };
}

mod_option_from!(
    Title(TitleOption),
    Button(ButtonOption),
    Bool(BoolOption),
    Slider(SliderOption),
    Dropdown(DropdownOption),
    Spinner(SpinnerOption),
    Keybind(KeybindOption),
    Hidden(HiddenOption),
    Grouped(GroupedOption),
    Nested(NestedOption),
);

impl ModOption {
    pub fn meta(&self) -> &OptionMeta {
        match self {
            ModOption::Title(o) => &o.meta,
            ModOption::Button(o) => &o.meta,
            ModOption::Bool(o) => &o.meta,
            ModOption::Slider(o) => &o.meta,
            ModOption::Dropdown(o) => &o.meta,
            ModOption::Spinner(o) => &o.meta,
            ModOption::Keybind(o) => &o.meta,
            ModOption::Hidden(o) => &o.meta,
            ModOption::Grouped(o) => &o.meta,
            ModOption::Nested(o) => &o.meta,
        }
    }

    pub fn identifier(&self) -> &str {
        self.meta().identifier()
    }

    pub fn display_name(&self) -> &str {
        self.meta().display_name()
    }

    /// Hidden options are never displayed, whatever their flag says.
    pub fn is_hidden(&self) -> bool {
        matches!(self, ModOption::Hidden(_)) || self.meta().is_hidden()
    }

    /// True if both refer to the same option object.
    pub fn ptr_eq(&self, other: &ModOption) -> bool {
        std::ptr::addr_eq(self.as_ptr(), other.as_ptr())
    }

    fn as_ptr(&self) -> *const () {
        match self {
            ModOption::Title(o) => Rc::as_ptr(o).cast(),
            ModOption::Button(o) => Rc::as_ptr(o).cast(),
            ModOption::Bool(o) => Rc::as_ptr(o).cast(),
            ModOption::Slider(o) => Rc::as_ptr(o).cast(),
            ModOption::Dropdown(o) => Rc::as_ptr(o).cast(),
            ModOption::Spinner(o) => Rc::as_ptr(o).cast(),
            ModOption::Keybind(o) => Rc::as_ptr(o).cast(),
            ModOption::Hidden(o) => Rc::as_ptr(o).cast(),
            ModOption::Grouped(o) => Rc::as_ptr(o).cast(),
            ModOption::Nested(o) => Rc::as_ptr(o).cast(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ModOption::Title(_) => "title",
            ModOption::Button(_) => "button",
            ModOption::Bool(_) => "bool",
            ModOption::Slider(_) => "slider",
            ModOption::Dropdown(_) => "dropdown",
            ModOption::Spinner(_) => "spinner",
            ModOption::Keybind(_) => "keybind",
            ModOption::Hidden(_) => "hidden",
            ModOption::Grouped(_) => "grouped",
            ModOption::Nested(_) => "nested",
        }
    }

    /// The current value as shown to a user, `None` for options without a value.
    pub fn value_str(&self) -> Option<String> {
        let value = match self {
            ModOption::Bool(o) => {
                let text = if o.value() {
                    o.kind.true_text.as_deref().unwrap_or("On")
                } else {
                    o.kind.false_text.as_deref().unwrap_or("Off")
                };
                text.to_owned()
            }
            ModOption::Slider(o) => format_slider_value(o.value(), o.kind.is_integer),
            ModOption::Dropdown(o) => o.value(),
            ModOption::Spinner(o) => o.value(),
            ModOption::Keybind(o) => {
                let key = o.value().unwrap_or_else(|| "Unbound".to_owned());
                if o.kind.is_rebindable {
                    key
                } else {
                    format!("Locked: {key}")
                }
            }
            ModOption::Hidden(o) => o.value.borrow().to_string(),
            ModOption::Title(_)
            | ModOption::Button(_)
            | ModOption::Grouped(_)
            | ModOption::Nested(_) => return None,
        };

        Some(value)
    }

    /// Assigns a value through the option's normal change path.
    ///
    /// Values are not checked against ranges or choice lists, only against the option's type.
    pub fn update_value(&self, value: OptionValue) -> Result<(), OptionError> {
        match (self, value) {
            (ModOption::Bool(o), OptionValue::Bool(v)) => o.update(v),
            (ModOption::Slider(o), OptionValue::Number(v)) => o.update(v),
            (ModOption::Dropdown(o), OptionValue::Text(v)) => o.update(v),
            (ModOption::Spinner(o), OptionValue::Text(v)) => o.update(v),
            (ModOption::Keybind(o), OptionValue::Key(v)) => o.update(v),
            (ModOption::Hidden(o), OptionValue::Json(v)) => o.update(v),
            (
                ModOption::Title(_)
                | ModOption::Button(_)
                | ModOption::Grouped(_)
                | ModOption::Nested(_),
                _,
            ) => return Err(OptionError::NotAValue(self.identifier().to_owned())),
            (_, value) => {
                return Err(OptionError::TypeMismatch {
                    identifier: self.identifier().to_owned(),
                    expected: self.type_name(),
                    found: value.type_name(),
                });
            }
        }

        Ok(())
    }
}

/// Integer sliders never show a fractional part.
pub fn format_slider_value(value: f64, is_integer: bool) -> String {
    if is_integer {
        format!("{}", value.round() as i64)
    } else {
        format!("{value}")
    }
}

impl Debug for ModOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name(), self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use modkit_mod_protocol::Game;
    use serde_json::json;

    use super::*;
    use crate::{headless::HeadlessHost, host::Host};

    #[test]
    fn change_callback_runs_before_assignment() {
        let seen = Rc::new(RefCell::new(vec![]));
        let log = seen.clone();
        let option = SliderOption::new("Volume", 5.0, 0.0, 10.0)
            .on_change(move |option, new| log.borrow_mut().push((option.value(), *new)));

        option.update(8.0);
        option.update(2.0);

        assert_eq!(vec![(5.0, 8.0), (8.0, 2.0)], *seen.borrow());
        assert_eq!(2.0, option.value());
        assert_eq!(5.0, *option.default_value());
    }

    #[test]
    fn metadata_defaults_chain() {
        let option = ModOption::from(BoolOption::new("god_mode", false));
        assert_eq!("god_mode", option.meta().description_title());

        let option = ModOption::from(BoolOption::new("god_mode", false).display_name("God Mode"));
        assert_eq!("God Mode", option.meta().description_title());
        assert!(!option.is_hidden());

        let hidden = ModOption::from(HiddenOption::new("state", json!({})).hidden(false));
        assert!(hidden.is_hidden());
    }

    #[test]
    fn display_strings() {
        let cases: Vec<(ModOption, Option<&str>)> = vec![
            (BoolOption::new("a", true).into(), Some("On")),
            (BoolOption::new("a", false).text("Yes", "No").into(), Some("No")),
            (SliderOption::new("a", 4.6, 0.0, 10.0).into(), Some("5")),
            (
                SliderOption::new("a", 0.25, 0.0, 1.0).integer(false).into(),
                Some("0.25"),
            ),
            (DropdownOption::new("a", "B", ["A", "B"]).into(), Some("B")),
            (KeybindOption::new("a", None).into(), Some("Unbound")),
            (
                KeybindOption::new("a", Some("F".into())).rebindable(false).into(),
                Some("Locked: F"),
            ),
            (TitleOption::new("a").into(), None),
            (
                GroupedOption::new("a", Vec::<ModOption>::new()).into(),
                None,
            ),
        ];

        for (option, expected) in cases {
            assert_eq!(expected.map(str::to_owned), option.value_str(), "{option:?}");
        }
    }

    #[test]
    fn dynamic_updates_check_types() {
        let option = ModOption::from(SpinnerOption::new("Mode", "A", ["A", "B"]));

        assert_eq!(Ok(()), option.update_value(OptionValue::Text("Z".into())));
        assert_eq!(Some("Z".to_owned()), option.value_str());

        assert_eq!(
            Err(OptionError::TypeMismatch {
                identifier: "Mode".into(),
                expected: "spinner",
                found: "bool"
            }),
            option.update_value(OptionValue::Bool(true))
        );

        let button = ModOption::from(ButtonOption::new("Go"));
        assert_eq!(
            Err(OptionError::NotAValue("Go".into())),
            button.update_value(OptionValue::Bool(true))
        );
    }

    #[test]
    fn identity_is_by_object() {
        let a = ModOption::from(BoolOption::new("same", true));
        let b = ModOption::from(BoolOption::new("same", true));

        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn buttons_press() {
        let presses = Rc::new(Cell::new(0));
        let counter = presses.clone();
        let button = ButtonOption::new("Go").on_press(move |_| counter.set(counter.get() + 1));

        button.press();
        assert_eq!(1, presses.get());
    }

    #[test]
    fn keybind_options_rebind_their_keybind() {
        let host = HeadlessHost::new(Game::Bl3);
        let dyn_host: Rc<dyn Host> = host.clone();
        let keybind = Rc::new(Keybind::new("Jump", "Space").on_press(|| ()));
        keybind.enable(&dyn_host);

        let option = KeybindOption::from_keybind(&keybind);
        assert_eq!(Some("Space".to_owned()), option.value());

        option.update(Some("J".to_owned()));
        assert_eq!(Some("J".to_owned()), keybind.key());
        assert_eq!(vec!["J".to_owned()], host.keybinds().keys());
    }
}
