use crate::entry::RenderableEntry;

/// Identifies whatever a front-end drew a list onto, e.g. a native menu object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// A front-end the options stack draws into.
///
/// Implementations report user actions back through [`crate::OptionsStack::select`] and
/// [`crate::OptionsStack::change_value`], using the index of the entry in the last list they
/// were given. Mapping their own widget indices back to those is their job.
pub trait Presentation {
    /// Draws a complete list, replacing anything drawn for the same level before.
    fn render(&mut self, header: &str, entries: &[RenderableEntry]) -> Option<SurfaceId>;
}
