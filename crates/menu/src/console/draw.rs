use std::io::{self, Write};

use modkit_mod_protocol::markup;
use textwrap::{Options, WordSplitter};

const PREFIX: &str = "Mod Menu |";
const WIDTH: usize = 100;

/// Writes menu lines: prefixed, markup stripped and word wrapped.
#[derive(Debug)]
pub struct Drawer<W> {
    out: W,
}

impl<W: Write> Drawer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Draws a message, indented by `indent` levels. An empty message draws an empty line.
    pub fn draw(&mut self, msg: &str, indent: usize) -> io::Result<()> {
        if msg.is_empty() {
            return writeln!(self.out, "{PREFIX}");
        }

        let plain = markup::to_plain_text(msg).replace('\t', "  ");
        let indent = "  ".repeat(indent);
        let options = Options::new(WIDTH).word_splitter(WordSplitter::NoHyphenation);

        for line in textwrap::wrap(&plain, options) {
            if line.is_empty() {
                writeln!(self.out, "{PREFIX}")?;
            } else {
                writeln!(self.out, "{PREFIX} {indent}{line}")?;
            }
        }

        Ok(())
    }
}
