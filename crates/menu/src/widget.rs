//! Drives a native widget list, one widget per entry.
//!
//! The host owns the widgets. It implements [`WidgetSink`] to build them, and reports presses and
//! raw widget values back through [`WidgetAdapter::press`] and [`WidgetAdapter::change`], which
//! take care of mapping widget cells back onto the options stack.

use modkit_mod_host::options::{OptionValue, SliderRange};
use tracing::warn;

use crate::{
    MenuError,
    adapter::{Presentation, SurfaceId},
    entry::{ChoiceStyle, EntryKind, RenderableEntry},
    stack::{OptionsStack, Selection},
};

/// The text every widget shows.
#[derive(Clone, Copy, Debug)]
pub struct WidgetText<'a> {
    pub name: &'a str,
    pub description_title: &'a str,
    pub description: &'a str,
}

pub trait WidgetSink {
    /// Clears the list and starts drawing a new one.
    fn begin(&mut self, header: &str) -> Option<SurfaceId>;

    /// Whether titles count as cells when the host reports which cell was used.
    fn titles_take_cells(&self) -> bool {
        true
    }

    fn add_title(&mut self, name: &str);

    fn add_button(&mut self, text: &WidgetText<'_>);

    /// A two-value spinner, false first.
    fn add_bool_spinner(
        &mut self,
        text: &WidgetText<'_>,
        value: bool,
        false_text: &str,
        true_text: &str,
    );

    fn add_slider(&mut self, text: &WidgetText<'_>, value: f64, range: SliderRange);

    fn add_dropdown(&mut self, text: &WidgetText<'_>, choices: &[String], selected: usize);

    fn add_spinner(&mut self, text: &WidgetText<'_>, choices: &[String], selected: usize, wrap: bool);

    fn add_keybind(&mut self, text: &WidgetText<'_>, key: Option<&str>, is_rebindable: bool);
}

/// A raw value read back from a widget.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetValue {
    SpinnerIndex(usize),
    ComboIndex(usize),
    Number(f64),
    Key(Option<String>),
}

impl WidgetValue {
    fn name(&self) -> &'static str {
        match self {
            WidgetValue::SpinnerIndex(_) => "spinner index",
            WidgetValue::ComboIndex(_) => "combo box index",
            WidgetValue::Number(_) => "number",
            WidgetValue::Key(_) => "key",
        }
    }
}

/// Cell numbers are worked out from whichever level is innermost on the stack when the host
/// reports them, so they stay aligned after the host steps back out of a nested level.
#[derive(Debug)]
pub struct WidgetAdapter<S> {
    sink: S,
}

impl<S: WidgetSink> WidgetAdapter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn takes_cell(&self, entry: &RenderableEntry) -> bool {
        self.sink.titles_take_cells()
            || !matches!(entry.kind, EntryKind::Title | EntryKind::GroupHeader)
    }

    /// The entry of the innermost level drawn in `cell`.
    fn entry_index(&self, stack: &OptionsStack, cell: usize) -> Result<usize, MenuError> {
        let cells: Vec<usize> = stack
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.takes_cell(entry))
            .map(|(idx, _)| idx)
            .collect();

        cells.get(cell).copied().ok_or(MenuError::IndexDesync {
            index: cell,
            drawn: cells.len(),
        })
    }

    /// The host's cell at `cell` was clicked.
    pub fn press(&mut self, stack: &mut OptionsStack, cell: usize) -> Result<Selection, MenuError> {
        let index = self.entry_index(stack, cell)?;
        stack.select(index, self)
    }

    /// The widget at `cell` now shows `value`.
    ///
    /// The widget already displays the new value, so the list is not redrawn.
    pub fn change(
        &mut self,
        stack: &mut OptionsStack,
        cell: usize,
        value: WidgetValue,
    ) -> Result<(), MenuError> {
        let index = self.entry_index(stack, cell)?;
        let kind = stack
            .entries()
            .get(index)
            .map(|entry| entry.kind.clone())
            .ok_or(MenuError::IndexDesync {
                index,
                drawn: stack.entries().len(),
            })?;

        let value = match (value, kind) {
            (WidgetValue::SpinnerIndex(idx), EntryKind::Bool { .. }) => OptionValue::Bool(idx == 1),
            (
                WidgetValue::SpinnerIndex(idx) | WidgetValue::ComboIndex(idx),
                EntryKind::Choice { choices, .. },
            ) => {
                let drawn = choices.len();
                let choice = choices
                    .into_iter()
                    .nth(idx)
                    .ok_or(MenuError::IndexDesync { index: idx, drawn })?;
                OptionValue::Text(choice)
            }
            (WidgetValue::Number(number), EntryKind::Slider { .. }) => OptionValue::Number(number),
            (WidgetValue::Key(key), EntryKind::Keybind { .. }) => OptionValue::Key(key),
            (value, _) => {
                return Err(MenuError::UnexpectedValue {
                    index,
                    value: value.name(),
                });
            }
        };

        stack.change_value(index, value)
    }
}

impl<S: WidgetSink> Presentation for WidgetAdapter<S> {
    fn render(&mut self, header: &str, entries: &[RenderableEntry]) -> Option<SurfaceId> {
        let surface = self.sink.begin(header);
        for entry in entries {
            let text = WidgetText {
                name: &entry.display_name,
                description_title: &entry.description_title,
                description: &entry.description,
            };

            match &entry.kind {
                EntryKind::Title | EntryKind::GroupHeader => {
                    self.sink.add_title(&entry.display_name)
                }
                EntryKind::Button { .. } => self.sink.add_button(&text),
                EntryKind::Bool {
                    value,
                    true_text,
                    false_text,
                } => self
                    .sink
                    .add_bool_spinner(&text, *value, false_text, true_text),
                EntryKind::Choice {
                    choices,
                    selected,
                    style,
                } => {
                    let selected = selected.unwrap_or_else(|| {
                        warn!(
                            target: "modkit::dev",
                            option = %entry.display_name,
                            value = ?entry.value_str,
                            "current value is not one of the choices"
                        );
                        0
                    });

                    match style {
                        ChoiceStyle::Dropdown => self.sink.add_dropdown(&text, choices, selected),
                        ChoiceStyle::Spinner { wrap } => {
                            self.sink.add_spinner(&text, choices, selected, *wrap)
                        }
                    }
                }
                EntryKind::Slider {
                    value,
                    min,
                    max,
                    step,
                    is_integer,
                } => self.sink.add_slider(
                    &text,
                    *value,
                    SliderRange {
                        min: *min,
                        max: *max,
                        step: *step,
                        is_integer: *is_integer,
                    },
                ),
                EntryKind::Keybind { key, is_rebindable } => {
                    self.sink
                        .add_keybind(&text, key.as_deref(), *is_rebindable)
                }
            }
        }

        surface
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use expect_test::expect;
    use modkit_mod_host::{
        HeadlessHost, Keybind, ModBuilder, ModRef,
        options::{
            BoolOption, DropdownOption, NestedOption, SliderOption, SpinnerOption, TitleOption,
        },
    };
    use modkit_mod_protocol::Game;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
        surfaces: u64,
        title_cells: bool,
    }

    impl WidgetSink for Recording {
        fn begin(&mut self, header: &str) -> Option<SurfaceId> {
            self.calls.push(format!("begin {header}"));
            self.surfaces += 1;
            Some(SurfaceId(self.surfaces))
        }

        fn titles_take_cells(&self) -> bool {
            self.title_cells
        }

        fn add_title(&mut self, name: &str) {
            self.calls.push(format!("title {name}"));
        }

        fn add_button(&mut self, text: &WidgetText<'_>) {
            self.calls.push(format!("button {}", text.name));
        }

        fn add_bool_spinner(
            &mut self,
            text: &WidgetText<'_>,
            value: bool,
            false_text: &str,
            true_text: &str,
        ) {
            self.calls.push(format!(
                "bool {} {value} [{false_text}/{true_text}]",
                text.name
            ));
        }

        fn add_slider(&mut self, text: &WidgetText<'_>, value: f64, range: SliderRange) {
            self.calls.push(format!(
                "slider {} {value} [{}..{} step {}]",
                text.name, range.min, range.max, range.step
            ));
        }

        fn add_dropdown(&mut self, text: &WidgetText<'_>, choices: &[String], selected: usize) {
            self.calls
                .push(format!("dropdown {} {selected} {choices:?}", text.name));
        }

        fn add_spinner(
            &mut self,
            text: &WidgetText<'_>,
            choices: &[String],
            selected: usize,
            wrap: bool,
        ) {
            self.calls.push(format!(
                "spinner {} {selected} {choices:?} wrap={wrap}",
                text.name
            ));
        }

        fn add_keybind(&mut self, text: &WidgetText<'_>, key: Option<&str>, is_rebindable: bool) {
            self.calls
                .push(format!("keybind {} {key:?} {is_rebindable}", text.name));
        }
    }

    struct Fixture {
        m: ModRef,
        flag: Rc<BoolOption>,
        colour: Rc<DropdownOption>,
        volume: Rc<SliderOption>,
        deep: Rc<BoolOption>,
    }

    fn fixture() -> Fixture {
        let flag = Rc::new(BoolOption::new("Flag", true).text("Yes", "No"));
        let colour = Rc::new(DropdownOption::new("Colour", "Red", ["Red", "Blue"]));
        let volume = Rc::new(SliderOption::new("Volume", 5.0, 0.0, 10.0));
        let deep = Rc::new(BoolOption::new("Deep", false));

        let m = ModBuilder::new("Test")
            .with_option(TitleOption::new("Intro"))
            .with_option(flag.clone())
            .with_option(colour.clone())
            .with_option(volume.clone())
            .with_option(SpinnerOption::new("Mode", "Slow", ["Fast", "Slow"]).wrap(true))
            .with_option(NestedOption::new("More", [deep.clone()]))
            .with_keybind(Keybind::new("Jump", "SpaceBar"))
            .build(HeadlessHost::new(Game::Bl3));

        Fixture {
            m,
            flag,
            colour,
            volume,
            deep,
        }
    }

    fn open(fixture: &Fixture, title_cells: bool) -> (OptionsStack, WidgetAdapter<Recording>) {
        let mut adapter = WidgetAdapter::new(Recording {
            title_cells,
            ..Default::default()
        });
        let mut stack = OptionsStack::new();
        stack
            .open(&fixture.m, &mut adapter)
            .expect("menu not yet open");
        (stack, adapter)
    }

    #[test]
    fn draws_one_widget_per_entry() {
        let fixture = fixture();
        let (mut stack, mut adapter) = open(&fixture, true);

        expect![[r#"
            begin Test
            button Description
            bool Enabled false [Off/On]
            title Options
            title Intro
            bool Flag true [No/Yes]
            dropdown Colour 0 ["Red", "Blue"]
            slider Volume 5 [0..10 step 1]
            spinner Mode 1 ["Fast", "Slow"] wrap=true
            button More
            title Keybinds
            keybind Jump Some("SpaceBar") true
        "#]]
        .assert_eq(&(adapter.sink().calls.join("\n") + "\n"));

        adapter.sink_mut().calls.clear();
        let selection = adapter.press(&mut stack, 8).expect("cell was drawn");
        assert!(matches!(selection, Selection::Entered));
        assert_eq!(
            vec!["begin Test - More", "bool Deep false [Off/On]"],
            adapter.sink().calls
        );
        assert_eq!(Some(SurfaceId(2)), stack.surface());

        adapter
            .change(&mut stack, 0, WidgetValue::SpinnerIndex(1))
            .expect("bool accepts spinner indices");
        assert!(fixture.deep.value());
    }

    #[test]
    fn cells_skip_titles_when_the_host_does() {
        let fixture = fixture();
        let (mut stack, mut adapter) = open(&fixture, false);

        adapter
            .change(&mut stack, 2, WidgetValue::SpinnerIndex(0))
            .expect("bool accepts spinner indices");
        assert!(!fixture.flag.value());

        adapter
            .change(&mut stack, 3, WidgetValue::ComboIndex(1))
            .expect("dropdown accepts combo indices");
        assert_eq!("Blue", fixture.colour.value());

        adapter
            .change(&mut stack, 4, WidgetValue::Number(7.4))
            .expect("slider accepts numbers");
        assert_eq!(7.0, fixture.volume.value());

        adapter
            .change(&mut stack, 7, WidgetValue::Key(Some("K".into())))
            .expect("keybind accepts keys");
        assert_eq!(Some("K".to_owned()), fixture.m.keybinds()[0].key());

        assert!(matches!(
            adapter.press(&mut stack, 0),
            Ok(Selection::Pressed)
        ));
    }

    #[test]
    fn outer_cells_still_map_after_leaving_a_nested_level() {
        let fixture = fixture();
        let (mut stack, mut adapter) = open(&fixture, false);

        assert!(matches!(
            adapter.press(&mut stack, 6),
            Ok(Selection::Entered)
        ));
        assert_eq!(1, stack.entries().len());

        stack.surface_changed(Some(SurfaceId(1)));
        assert_eq!(1, stack.depth());

        adapter
            .change(&mut stack, 2, WidgetValue::SpinnerIndex(0))
            .expect("outer bool is drawn in cell 2");
        assert!(!fixture.flag.value());

        adapter
            .change(&mut stack, 4, WidgetValue::Number(3.0))
            .expect("outer slider is drawn in cell 4");
        assert_eq!(3.0, fixture.volume.value());
        assert!(!fixture.deep.value());
    }

    #[test]
    fn mismatched_reports_are_errors() {
        let fixture = fixture();
        let (mut stack, mut adapter) = open(&fixture, false);

        assert!(matches!(
            adapter.press(&mut stack, 99),
            Err(MenuError::IndexDesync { index: 99, drawn: 8 })
        ));
        assert!(matches!(
            adapter.change(&mut stack, 3, WidgetValue::ComboIndex(5)),
            Err(MenuError::IndexDesync { index: 5, drawn: 2 })
        ));
        assert!(matches!(
            adapter.change(&mut stack, 3, WidgetValue::Number(1.0)),
            Err(MenuError::UnexpectedValue {
                index: 5,
                value: "number"
            })
        ));
        assert_eq!("Red", fixture.colour.value());
    }
}
