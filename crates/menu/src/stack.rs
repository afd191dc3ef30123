//! The navigation stack behind an open options menu.
//!
//! Each level of the stack remembers which options it drew, in the same order as the entries handed
//! to the front-end, so an index reported by the front-end always resolves to the option the user
//! actually saw there.

use std::rc::Rc;

use modkit_mod_host::{
    mods::ModRef,
    options::{GroupedOption, ModOption, NestedOption, OptionValue},
};
use tracing::{debug, error, warn};

use crate::{
    MenuError,
    adapter::{Presentation, SurfaceId},
    entry::RenderableEntry,
};

/// What opened a level of the stack.
#[derive(Clone, Debug)]
pub enum FrameCause {
    Mod(ModRef),
    Nested(Rc<NestedOption>),
}

impl FrameCause {
    pub fn name(&self) -> &str {
        match self {
            FrameCause::Mod(m) => m.name(),
            FrameCause::Nested(nested) => nested.meta().display_name(),
        }
    }
}

#[derive(Debug)]
struct Frame {
    cause: FrameCause,
    /// Aligned with `entries`. Group headers hold the group they belong to.
    drawn: Vec<ModOption>,
    entries: Vec<RenderableEntry>,
    surface: Option<SurfaceId>,
}

/// The result of selecting an entry.
#[derive(Debug)]
pub enum Selection {
    /// A nested option was entered, and its level drawn.
    Entered,

    /// A button was pressed.
    Pressed,

    /// A value option was picked. The front-end should collect a new value for it and report it
    /// through [`OptionsStack::change_value`].
    Edit(ModOption),

    /// Titles and group headers do nothing.
    Inert,
}

#[derive(Debug, Default)]
pub struct OptionsStack {
    frames: Vec<Frame>,
}

impl OptionsStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The mod whose menu is open.
    pub fn root_mod(&self) -> Option<&ModRef> {
        match self.frames.first() {
            Some(Frame {
                cause: FrameCause::Mod(m),
                ..
            }) => Some(m),
            _ => None,
        }
    }

    pub fn causes(&self) -> impl Iterator<Item = &FrameCause> {
        self.frames.iter().map(|frame| &frame.cause)
    }

    /// Every level's name, joined with `" - "`.
    pub fn header(&self) -> String {
        self.causes()
            .map(FrameCause::name)
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// The entries last drawn for the innermost level.
    pub fn entries(&self) -> &[RenderableEntry] {
        self.frames
            .last()
            .map_or(&[], |frame| frame.entries.as_slice())
    }

    /// Where the innermost level was drawn, if the front-end said.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.frames.last().and_then(|frame| frame.surface)
    }

    /// Opens the top level menu of a mod.
    pub fn open(
        &mut self,
        target: &ModRef,
        adapter: &mut dyn Presentation,
    ) -> Result<(), MenuError> {
        if self.is_open() {
            return Err(MenuError::AlreadyOpen);
        }

        debug!(name = target.name(), "opening options menu");
        self.push(FrameCause::Mod(target.clone()), adapter);
        Ok(())
    }

    fn push(&mut self, cause: FrameCause, adapter: &mut dyn Presentation) {
        self.frames.push(Frame {
            cause,
            drawn: vec![],
            entries: vec![],
            surface: None,
        });
        self.draw_top(adapter);
    }

    fn draw_top(&mut self, adapter: &mut dyn Presentation) {
        let header = self.header();
        let Some(frame) = self.frames.last_mut() else {
            return;
        };

        let options = match &frame.cause {
            FrameCause::Mod(m) => m.display_options(),
            FrameCause::Nested(nested) => nested.children(),
        };

        let mut flattener = Flattener::default();
        flattener.draw_options(&options);

        frame.drawn = flattener.drawn;
        frame.entries = flattener.entries;
        frame.surface = adapter.render(&header, &frame.entries);
    }

    /// Redraws the innermost level in place, to pick up changed values.
    pub fn refresh(&mut self, adapter: &mut dyn Presentation) -> Result<(), MenuError> {
        if !self.is_open() {
            return Err(MenuError::NotOpen);
        }

        self.draw_top(adapter);
        Ok(())
    }

    /// The option drawn at `index` in the innermost level.
    ///
    /// An index outside the drawn list means the front-end and the stack disagree about what is
    /// on screen.
    pub fn resolve(&self, index: usize) -> Result<&ModOption, MenuError> {
        let frame = self.frames.last().ok_or(MenuError::NotOpen)?;

        frame.drawn.get(index).ok_or(MenuError::IndexDesync {
            index,
            drawn: frame.drawn.len(),
        })
    }

    /// Handles the user picking the entry at `index`.
    pub fn select(
        &mut self,
        index: usize,
        adapter: &mut dyn Presentation,
    ) -> Result<Selection, MenuError> {
        let option = self.resolve(index)?.clone();

        let selection = match option {
            ModOption::Nested(nested) => {
                debug!(identifier = nested.meta().identifier(), "entering nested options");
                self.push(FrameCause::Nested(nested), adapter);
                Selection::Entered
            }
            ModOption::Button(button) => {
                button.press();
                Selection::Pressed
            }
            ModOption::Title(_) | ModOption::Grouped(_) | ModOption::Hidden(_) => Selection::Inert,
            option @ (ModOption::Bool(_)
            | ModOption::Slider(_)
            | ModOption::Dropdown(_)
            | ModOption::Spinner(_)
            | ModOption::Keybind(_)) => Selection::Edit(option),
        };

        Ok(selection)
    }

    /// Assigns a new value to the option at `index`, through its change callback.
    ///
    /// Integer sliders round the value. Does not redraw, call [`OptionsStack::refresh`] once the
    /// front-end is ready.
    pub fn change_value(&mut self, index: usize, value: OptionValue) -> Result<(), MenuError> {
        let option = self.resolve(index)?;

        let value = match (option, value) {
            (ModOption::Slider(slider), OptionValue::Number(number))
                if slider.kind().is_integer =>
            {
                OptionValue::Number(number.round())
            }
            (
                ModOption::Title(_)
                | ModOption::Button(_)
                | ModOption::Grouped(_)
                | ModOption::Nested(_),
                _,
            ) => return Err(MenuError::NotSelectable(index)),
            (_, value) => value,
        };

        option.update_value(value)?;
        Ok(())
    }

    /// The host returned to its outermost menu. Saves the open mod's settings, and closes every
    /// level.
    pub fn close_to_root(&mut self) {
        if let Some(m) = self.root_mod() {
            debug!(name = m.name(), "closing options menu");
            if let Err(e) = m.save_settings() {
                error!(name = m.name(), error = %e, "failed to save mod settings");
            }
        }

        self.frames.clear();
    }

    /// The host stepped back one menu level. Leaving the top level closes the menu.
    pub fn pop_one_level(&mut self) {
        if self.frames.len() <= 1 {
            self.close_to_root();
        } else {
            self.frames.pop();
        }
    }

    /// The host is now showing `active`. Pops back to the level drawn on it, or closes the menu
    /// if no level was.
    pub fn surface_changed(&mut self, active: Option<SurfaceId>) {
        let Some(level) = self
            .frames
            .iter()
            .rposition(|frame| active.is_some() && frame.surface == active)
        else {
            if self.is_open() {
                self.close_to_root();
            }
            return;
        };

        while self.frames.len() > level + 1 {
            self.pop_one_level();
        }
    }
}

/// Flattens an option list into display entries, expanding groups inline.
#[derive(Default)]
struct Flattener {
    drawn: Vec<ModOption>,
    entries: Vec<RenderableEntry>,
    groups: Vec<Rc<GroupedOption>>,
}

impl Flattener {
    fn draw_options(&mut self, options: &[ModOption]) {
        for (idx, option) in options.iter().enumerate() {
            if option.is_hidden() {
                continue;
            }

            match option {
                ModOption::Grouped(group) if self.is_open_group(group) => warn!(
                    target: "modkit::dev",
                    identifier = group.meta().identifier(),
                    "found recursive options group, not drawing"
                ),
                ModOption::Grouped(group) => self.draw_group(group, &options[idx + 1..]),
                option => match RenderableEntry::for_option(option, self.groups.len()) {
                    Some(entry) => {
                        self.drawn.push(option.clone());
                        self.entries.push(entry);
                    }
                    None => warn!(
                        target: "modkit::dev",
                        identifier = option.identifier(),
                        kind = option.type_name(),
                        "cannot draw option"
                    ),
                },
            }
        }
    }

    /// Draws a group and its children under a combined header.
    ///
    /// A group whose first drawn child is another group leaves the header to that child, so only
    /// the most specific header is shown. Once an inner group finishes, the enclosing header is
    /// drawn again if the next thing drawn belongs to it directly.
    fn draw_group(&mut self, group: &Rc<GroupedOption>, following: &[ModOption]) {
        self.groups.push(group.clone());

        let children = group.children();
        let Some(first) = children.iter().find(|child| self.draws_anything(child)) else {
            self.groups.pop();
            return;
        };

        if !matches!(first, ModOption::Grouped(_)) {
            self.push_header();
        }

        self.draw_options(&children);
        self.groups.pop();

        if self.groups.is_empty() {
            return;
        }

        let next = following.iter().find(|option| self.draws_anything(option));
        if next.is_some_and(|next| !matches!(next, ModOption::Grouped(_))) {
            self.push_header();
        }
    }

    fn push_header(&mut self) {
        let Some(group) = self.groups.last().cloned() else {
            return;
        };

        let header = RenderableEntry::group_header(
            self.groups.iter().map(|g| g.meta().display_name()),
            self.groups.len() - 1,
        );

        self.drawn.push(ModOption::Grouped(group));
        self.entries.push(header);
    }

    fn is_open_group(&self, group: &Rc<GroupedOption>) -> bool {
        self.groups.iter().any(|open| Rc::ptr_eq(open, group))
    }

    /// True if drawing `option` here would produce at least one entry.
    fn draws_anything(&self, option: &ModOption) -> bool {
        draws_anything(option, &mut self.groups.clone())
    }
}

fn draws_anything(option: &ModOption, ancestors: &mut Vec<Rc<GroupedOption>>) -> bool {
    if option.is_hidden() {
        return false;
    }

    let ModOption::Grouped(group) = option else {
        return true;
    };

    if ancestors.iter().any(|ancestor| Rc::ptr_eq(ancestor, group)) {
        return false;
    }

    ancestors.push(group.clone());
    let visible = group
        .children()
        .iter()
        .any(|child| draws_anything(child, ancestors));
    ancestors.pop();

    visible
}

#[cfg(test)]
mod tests {
    use assert_fs::{TempDir, prelude::*};
    use expect_test::{Expect, expect};
    use modkit_mod_host::{
        HeadlessHost, ModBuilder,
        options::{BoolOption, ButtonOption, SliderOption, TitleOption},
    };
    use modkit_mod_protocol::Game;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entry::EntryKind;

    #[derive(Default)]
    struct Recorder {
        headers: Vec<String>,
        next_surface: u64,
    }

    impl Presentation for Recorder {
        fn render(&mut self, header: &str, _entries: &[RenderableEntry]) -> Option<SurfaceId> {
            self.headers.push(header.to_owned());
            self.next_surface += 1;
            Some(SurfaceId(self.next_surface))
        }
    }

    fn describe(entries: &[RenderableEntry]) -> String {
        entries
            .iter()
            .map(|entry| {
                let tag = match entry.kind {
                    EntryKind::Title => "title",
                    EntryKind::GroupHeader => "header",
                    EntryKind::Button { nested: false } => "button",
                    EntryKind::Button { nested: true } => "nested",
                    EntryKind::Bool { .. } => "bool",
                    EntryKind::Choice { .. } => "choice",
                    EntryKind::Slider { .. } => "slider",
                    EntryKind::Keybind { .. } => "keybind",
                };
                match &entry.value_str {
                    Some(value) => format!("{tag} {} = {value}\n", entry.display_name),
                    None => format!("{tag} {}\n", entry.display_name),
                }
            })
            .collect()
    }

    fn check(options: Vec<ModOption>, expected: Expect) {
        let m = ModBuilder::new("Test")
            .with_options(options)
            .build(HeadlessHost::new(Game::Bl3));

        let mut stack = OptionsStack::new();
        stack
            .open(&m, &mut Recorder::default())
            .expect("menu not yet open");

        expected.assert_eq(&describe(stack.entries()));
    }

    #[test]
    fn hidden_children_hide_their_group() {
        check(
            vec![
                GroupedOption::new(
                    "All Hidden",
                    [
                        BoolOption::new("a", true).hidden(true),
                        BoolOption::new("b", true).hidden(true),
                    ],
                )
                .into(),
                GroupedOption::new(
                    "One Visible",
                    [
                        BoolOption::new("c", true).hidden(true),
                        BoolOption::new("d", true),
                    ],
                )
                .into(),
            ],
            expect![[r#"
                button Description
                bool Enabled = Off
                header Options - One Visible
                bool d = On
            "#]],
        );
    }

    #[test]
    fn enclosing_header_is_redrawn_after_inner_group() {
        check(
            vec![
                TitleOption::new("Intro").into(),
                GroupedOption::new("Inner", [BoolOption::new("a", false)]).into(),
                SliderOption::new("b", 3.0, 0.0, 5.0).into(),
                GroupedOption::new("Last", [ButtonOption::new("c")]).into(),
            ],
            expect![[r#"
                button Description
                bool Enabled = Off
                header Options
                title Intro
                header Options - Inner
                bool a = Off
                header Options
                slider b = 3
                header Options - Last
                button c
            "#]],
        );
    }

    #[test]
    fn hidden_siblings_between_groups_do_not_redraw_the_header() {
        check(
            vec![
                GroupedOption::new("Inner", [BoolOption::new("a", false)]).into(),
                BoolOption::new("secret", true).hidden(true).into(),
                GroupedOption::new("Last", [ButtonOption::new("c")]).into(),
            ],
            expect![[r#"
                button Description
                bool Enabled = Off
                header Options - Inner
                bool a = Off
                header Options - Last
                button c
            "#]],
        );
    }

    #[test]
    fn recursive_groups_are_skipped() {
        let group = Rc::new(GroupedOption::new("Loop", [BoolOption::new("x", true)]));
        group.push(group.clone());

        check(
            vec![group.into()],
            expect![[r#"
                button Description
                bool Enabled = Off
                header Options - Loop
                bool x = On
            "#]],
        );
    }

    #[test]
    fn indices_resolve_to_drawn_options() {
        let title = ModOption::from(TitleOption::new("Title"));
        let flag = ModOption::from(BoolOption::new("Flag", true));
        let a = ModOption::from(BoolOption::new("a", true));
        let b = ModOption::from(BoolOption::new("b", false));
        let group = ModOption::from(GroupedOption::new("G", [a.clone(), b.clone()]));
        let button = ModOption::from(ButtonOption::new("Button"));

        let sub = Rc::new(NestedOption::new(
            "Sub",
            [
                title.clone(),
                flag.clone(),
                group.clone(),
                button.clone(),
            ],
        ));
        let m = ModBuilder::new("Mod")
            .with_option(sub.clone())
            .build(HeadlessHost::new(Game::Bl3));

        let mut recorder = Recorder::default();
        let mut stack = OptionsStack::new();
        stack.open(&m, &mut recorder).expect("menu not yet open");

        let sub_index = stack
            .entries()
            .iter()
            .position(|entry| entry.display_name == "Sub")
            .expect("nested option drawn");
        assert!(matches!(
            stack.select(sub_index, &mut recorder),
            Ok(Selection::Entered)
        ));
        assert_eq!("Mod - Sub", stack.header());
        assert_eq!(vec!["Mod", "Mod - Sub"], recorder.headers);

        let expected = [title, flag, group.clone(), a, b, button];
        assert_eq!(expected.len(), stack.entries().len());
        for (idx, option) in expected.iter().enumerate() {
            let resolved = stack.resolve(idx).expect("index was drawn");
            assert!(resolved.ptr_eq(option), "index {idx} resolved to {resolved:?}");
        }
        assert_eq!(EntryKind::GroupHeader, stack.entries()[2].kind);

        assert!(matches!(
            stack.resolve(expected.len()),
            Err(MenuError::IndexDesync { index: 6, drawn: 6 })
        ));
    }

    #[test]
    fn navigation_and_saving() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let file = dir.child("nav.json");
        let m = ModBuilder::new("Nav")
            .settings_file(file.path())
            .with_option(NestedOption::new("Deeper", [BoolOption::new("x", true)]))
            .build(HeadlessHost::new(Game::Bl3));

        let mut recorder = Recorder::default();
        let mut stack = OptionsStack::new();
        assert!(matches!(stack.resolve(0), Err(MenuError::NotOpen)));

        stack.open(&m, &mut recorder)?;
        assert!(matches!(
            stack.open(&m, &mut recorder),
            Err(MenuError::AlreadyOpen)
        ));

        // Description, Enabled, "Options" header, Deeper
        stack.select(3, &mut recorder)?;
        assert_eq!(2, stack.depth());

        stack.surface_changed(Some(SurfaceId(1)));
        assert_eq!(1, stack.depth());
        assert!(!file.path().exists());

        stack.pop_one_level();
        assert!(!stack.is_open());
        assert!(file.path().exists());

        Ok(())
    }

    #[test]
    fn value_changes() {
        let volume = Rc::new(SliderOption::new("Volume", 5.0, 0.0, 10.0));
        let m = ModBuilder::new("Values")
            .with_option(volume.clone())
            .build(HeadlessHost::new(Game::Bl3));

        let mut recorder = Recorder::default();
        let mut stack = OptionsStack::new();
        stack.open(&m, &mut recorder).expect("menu not yet open");

        let Ok(Selection::Edit(ModOption::Bool(_))) = stack.select(1, &mut recorder) else {
            panic!("expected to edit the enabled toggle");
        };
        stack
            .change_value(1, OptionValue::Bool(true))
            .expect("toggle accepts bools");
        assert!(m.is_enabled());

        stack
            .change_value(3, OptionValue::Number(7.6))
            .expect("slider accepts numbers");
        assert_eq!(8.0, volume.value());

        stack.refresh(&mut recorder).expect("menu is open");
        assert_eq!(Some("On"), stack.entries()[1].value_str.as_deref());
        assert_eq!(Some("8"), stack.entries()[3].value_str.as_deref());

        assert!(matches!(
            stack.change_value(0, OptionValue::Bool(true)),
            Err(MenuError::NotSelectable(0))
        ));
        assert!(matches!(
            stack.change_value(3, OptionValue::Text("loud".into())),
            Err(MenuError::Option(_))
        ));
        assert!(matches!(
            stack.select(2, &mut recorder),
            Ok(Selection::Inert)
        ));
    }
}
