//! Text codec for RCS `,v` files.
//!
//! Writes a [`RevisionGraph`] in canonical form and reads files back into
//! one, carrying the per-revision blank-line offsets that let a parsed file
//! be written out again byte for byte.
//!
//! ## File Layout
//!
//! ```text
//! head     1.2;             admin header, fixed field order
//! access;
//! symbols;
//! locks;
//! comment  @# @;
//!                           two blank lines
//! 1.2                       revision index, one entry per node
//! date ...; author ...; state ...;
//! branches;
//! next     1.1;
//!                           one blank line per entry, one more at the end
//! desc
//! @...@
//!                           two blank lines (+ layout offset)
//! 1.2                       content section, same order as the index
//! log
//! @...@
//! text
//! @...@
//! ```

mod error;
pub mod reader;
pub mod writer;

use std::io::{Read, Write};

use rcs_core::RevisionGraph;

pub use error::{Error, ParseErrorKind};
pub use reader::parse;
pub use writer::to_text;

/// An RCS file: a validated revision graph plus text I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcsFile {
    pub graph: RevisionGraph,
}

impl RcsFile {
    pub fn new(graph: RevisionGraph) -> Self {
        Self { graph }
    }

    /// Render to a string in canonical form.
    pub fn to_text(&self) -> Result<String, Error> {
        to_text(&self.graph)
    }

    /// Write to `writer`. The whole file is rendered before the first byte
    /// is written, so a failure never leaves partial output behind.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        let text = self.to_text()?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Parse from a string.
    pub fn parse(input: &str) -> Result<Self, Error> {
        Ok(Self::new(parse(input)?))
    }

    /// Parse from a reader.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Parse from raw bytes, which must be UTF-8.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let text = String::from_utf8(data)?;
        Self::parse(&text)
    }
}
