use modkit_mod_host::options::{ModOption, format_slider_value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceStyle {
    Dropdown,
    Spinner { wrap: bool },
}

/// What a front-end should draw for one entry.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Title,

    /// Names the enclosing groups, joined with `" - "`.
    GroupHeader,

    /// `nested` buttons open a deeper level when selected.
    Button { nested: bool },

    Bool {
        value: bool,
        true_text: String,
        false_text: String,
    },

    Choice {
        choices: Vec<String>,
        /// `None` if the current value is not one of the choices.
        selected: Option<usize>,
        style: ChoiceStyle,
    },

    Slider {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
        is_integer: bool,
    },

    Keybind {
        key: Option<String>,
        is_rebindable: bool,
    },
}

/// One line of a rendered options list.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderableEntry {
    pub kind: EntryKind,
    pub display_name: String,
    pub description_title: String,
    pub description: String,
    pub value_str: Option<String>,
    /// How many groups enclose this entry.
    pub depth: usize,
}

impl RenderableEntry {
    /// A header line for the groups in `names`, outermost first.
    pub(crate) fn group_header<'a, I>(names: I, depth: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = names.into_iter().collect();

        RenderableEntry {
            kind: EntryKind::GroupHeader,
            display_name: names.join(" - "),
            description_title: String::new(),
            description: String::new(),
            value_str: None,
            depth,
        }
    }

    /// The entry drawn for `option`, or `None` for options which are never drawn directly.
    pub(crate) fn for_option(option: &ModOption, depth: usize) -> Option<Self> {
        let kind = match option {
            ModOption::Title(_) => EntryKind::Title,
            ModOption::Button(_) => EntryKind::Button { nested: false },
            ModOption::Nested(_) => EntryKind::Button { nested: true },
            ModOption::Bool(option) => EntryKind::Bool {
                value: option.value(),
                true_text: option.kind().true_text.clone().unwrap_or_else(|| "On".into()),
                false_text: option.kind().false_text.clone().unwrap_or_else(|| "Off".into()),
            },
            ModOption::Dropdown(option) => {
                let value = option.value();
                EntryKind::Choice {
                    selected: option.kind().choices.iter().position(|c| *c == value),
                    choices: option.kind().choices.clone(),
                    style: ChoiceStyle::Dropdown,
                }
            }
            ModOption::Spinner(option) => {
                let value = option.value();
                EntryKind::Choice {
                    selected: option.kind().choices.iter().position(|c| *c == value),
                    choices: option.kind().choices.clone(),
                    style: ChoiceStyle::Spinner {
                        wrap: option.kind().wrap_enabled,
                    },
                }
            }
            ModOption::Slider(option) => {
                let range = option.kind();
                EntryKind::Slider {
                    value: option.value(),
                    min: range.min,
                    max: range.max,
                    step: range.step,
                    is_integer: range.is_integer,
                }
            }
            ModOption::Keybind(option) => EntryKind::Keybind {
                key: option.value(),
                is_rebindable: option.kind().is_rebindable,
            },
            ModOption::Hidden(_) | ModOption::Grouped(_) => return None,
        };

        let meta = option.meta();
        Some(RenderableEntry {
            kind,
            display_name: meta.display_name().to_owned(),
            description_title: meta.description_title().to_owned(),
            description: meta.description().to_owned(),
            value_str: option.value_str(),
            depth,
        })
    }

    /// True for entries a user can pick.
    pub fn is_selectable(&self) -> bool {
        !matches!(self.kind, EntryKind::Title | EntryKind::GroupHeader)
    }

    /// The slider range as shown to a user.
    pub fn range_str(&self) -> Option<String> {
        match self.kind {
            EntryKind::Slider {
                min,
                max,
                is_integer,
                ..
            } => Some(format!(
                "{}-{}",
                format_slider_value(min, is_integer),
                format_slider_value(max, is_integer)
            )),
            _ => None,
        }
    }
}
