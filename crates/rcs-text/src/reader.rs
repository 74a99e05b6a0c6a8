//! Reading RCS text back into a [`RevisionGraph`].
//!
//! The admin header and the revision index are read as a stream of
//! whitespace-separated tokens, so any spacing is accepted there. Blank
//! lines are only recorded where the writer can reproduce them: before each
//! content entry (the node's `layout_offset`), before `desc` and at the end
//! of the file (the header's [`FileLayout`]). Only the excess over the
//! canonical gap is stored, and never for the first content entry.

use rcs_core::graph::header::{AdminHeader, FileLayout, LineEnding, Lock, Symbol};
use rcs_core::quote::{self, DELIMITER};
use rcs_core::{RevisionGraph, RevisionId, RevisionNode};
use tracing::{debug, warn};

use crate::error::{Error, ParseErrorKind};
use crate::writer::{CONTENT_GAP, DESC_GAP};

/// Parse RCS text into a validated graph, keeping the file's node order.
pub fn parse(input: &str) -> Result<RevisionGraph, Error> {
    let mut r = Reader::new(input);
    let mut header = r.header()?;
    let mut nodes = r.index()?;
    let (desc_gap, description) = r.description()?;
    let eof_newlines = r.contents(&mut nodes)?;

    header.description = description;
    header.layout = FileLayout {
        line_ending: line_ending(input),
        desc_offset: desc_gap.saturating_sub(DESC_GAP),
        eof_newlines,
    };
    debug!(
        head = %header.head,
        revisions = nodes.len(),
        bytes = input.len(),
        "parsed RCS text"
    );
    Ok(RevisionGraph::new(header, nodes)?)
}

/// The terminator of the first line decides the whole file.
fn line_ending(input: &str) -> LineEnding {
    match input.find('\n') {
        Some(i) if input[..i].ends_with('\r') => LineEnding::CrLf,
        _ => LineEnding::Lf,
    }
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    /// 1-based line of `pos`, kept in step with every advance.
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance(&mut self, len: usize) {
        let consumed = &self.input[self.pos..self.pos + len];
        self.line += consumed.matches('\n').count();
        self.pos += len;
    }

    fn error(&self, kind: ParseErrorKind) -> Error {
        Error::Parse {
            line: self.line,
            kind,
        }
    }

    /// Skip whitespace, returning how many newlines were crossed.
    fn skip_ws(&mut self) -> usize {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let skipped = &rest[..rest.len() - trimmed.len()];
        let newlines = skipped.matches('\n').count();
        self.pos += skipped.len();
        self.line += newlines;
        newlines
    }

    /// Newlines in the whitespace run that ends at the current position.
    fn newlines_before(&self) -> usize {
        let before = &self.input[..self.pos];
        let token_end = before
            .trim_end_matches(|c: char| c.is_ascii_whitespace())
            .len();
        before[token_end..].matches('\n').count()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn token_end(s: &str) -> usize {
        s.find(|c: char| c.is_ascii_whitespace() || c == ';' || c == ':' || c == DELIMITER)
            .unwrap_or(s.len())
    }

    /// The next word without consuming it; empty at a delimiter or EOF.
    fn peek_word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        &rest[..Self::token_end(rest)]
    }

    fn word(&mut self, what: &str) -> Result<&'a str, Error> {
        let w = self.peek_word();
        if w.is_empty() {
            return Err(self.unexpected(what));
        }
        self.advance(w.len());
        Ok(w)
    }

    fn unexpected(&self, what: &str) -> Error {
        match self.rest().lines().next() {
            None => self.error(ParseErrorKind::UnexpectedEof(what.to_string())),
            Some(found) => self.error(ParseErrorKind::Expected {
                expected: what.to_string(),
                found: found.to_string(),
            }),
        }
    }

    fn keyword(&mut self, kw: &str) -> Result<(), Error> {
        if self.peek_word() != kw {
            return Err(self.unexpected(kw));
        }
        self.advance(kw.len());
        Ok(())
    }

    fn punct(&mut self, c: char) -> Result<(), Error> {
        if self.peek_char() != Some(c) {
            return Err(self.unexpected(&format!("'{c}'")));
        }
        self.advance(c.len_utf8());
        Ok(())
    }

    fn revision(&mut self, what: &str) -> Result<RevisionId, Error> {
        let w = self.word(what)?;
        RevisionId::parse(w).map_err(|_| self.error(ParseErrorKind::InvalidId(w.to_string())))
    }

    fn quoted(&mut self) -> Result<String, Error> {
        self.skip_ws();
        let (raw, used) = quote::decode_prefix(self.rest()).map_err(|source| Error::Encoding {
            line: self.line,
            source,
        })?;
        self.advance(used);
        Ok(raw)
    }

    /// Words up to the terminating `;`, which is consumed.
    fn words_until_semicolon(&mut self, what: &str) -> Result<Vec<&'a str>, Error> {
        let mut out = Vec::new();
        while self.peek_char() != Some(';') {
            out.push(self.word(what)?);
        }
        self.punct(';')?;
        Ok(out)
    }

    /// `a:b` pairs up to the terminating `;`, which is consumed.
    fn pairs_until_semicolon(&mut self, what: &str) -> Result<Vec<(&'a str, RevisionId)>, Error> {
        let mut out = Vec::new();
        while self.peek_char() != Some(';') {
            let key = self.word(what)?;
            self.punct(':')?;
            out.push((key, self.revision("revision number")?));
        }
        self.punct(';')?;
        Ok(out)
    }

    fn header(&mut self) -> Result<AdminHeader, Error> {
        self.keyword("head")?;
        let head = self.revision("head revision")?;
        self.punct(';')?;
        let mut header = AdminHeader::new(head);
        // The comment leader defaults only for built files; a parsed file
        // without one has an empty leader.
        header.comment.clear();

        loop {
            let kw = self.peek_word();
            if kw.is_empty() || kw == "desc" || kw.starts_with(|c: char| c.is_ascii_digit()) {
                return Ok(header);
            }
            self.advance(kw.len());
            match kw {
                "branch" => {
                    let words = self.words_until_semicolon("default branch")?;
                    header.default_branch = words.first().map(|w| w.to_string());
                }
                "access" => {
                    header.access = self
                        .words_until_semicolon("user name")?
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                }
                "symbols" => {
                    header.symbols = self
                        .pairs_until_semicolon("symbol name")?
                        .into_iter()
                        .map(|(name, revision)| Symbol {
                            name: name.to_string(),
                            revision,
                        })
                        .collect();
                }
                "locks" => {
                    header.locks = self
                        .pairs_until_semicolon("lock owner")?
                        .into_iter()
                        .map(|(user, revision)| Lock::new(user, revision))
                        .collect();
                }
                "strict" => {
                    self.punct(';')?;
                    header.strict = true;
                }
                "integrity" => {
                    header.integrity = Some(self.quoted()?);
                    self.punct(';')?;
                }
                "comment" => {
                    header.comment = self.quoted()?;
                    self.punct(';')?;
                }
                "expand" => {
                    let expand = if self.peek_char() == Some(DELIMITER) {
                        self.quoted()?
                    } else {
                        self.word("expansion mode")?.to_string()
                    };
                    header.expand = Some(expand);
                    self.punct(';')?;
                }
                other => {
                    return Err(self.error(ParseErrorKind::UnknownKeyword(other.to_string())));
                }
            }
        }
    }

    fn index(&mut self) -> Result<Vec<RevisionNode>, Error> {
        let mut nodes = Vec::new();
        while self.peek_word().starts_with(|c: char| c.is_ascii_digit()) {
            nodes.push(self.index_entry()?);
        }
        Ok(nodes)
    }

    fn index_entry(&mut self) -> Result<RevisionNode, Error> {
        let id = self.revision("revision number")?;

        self.keyword("date")?;
        let date = self.word("date")?;
        self.punct(';')?;
        self.keyword("author")?;
        let author = self.word("author")?;
        self.punct(';')?;
        self.keyword("state")?;
        let state = self.words_until_semicolon("state")?;

        let mut node = RevisionNode::new(id, date, author);
        node.state = state.first().map(|s| s.to_string()).unwrap_or_default();

        self.keyword("branches")?;
        while self.peek_char() != Some(';') {
            node.branches.push(self.revision("branch revision")?);
        }
        self.punct(';')?;

        self.keyword("next")?;
        if self.peek_char() != Some(';') {
            node.next = Some(self.revision("next revision")?);
        }
        self.punct(';')?;

        if self.peek_word() == "commitid" {
            self.advance("commitid".len());
            node.commit_id = Some(self.word("commit id")?.to_string());
            self.punct(';')?;
        }
        Ok(node)
    }

    /// The description, with the number of newlines that preceded `desc`.
    fn description(&mut self) -> Result<(usize, String), Error> {
        self.skip_ws();
        let gap = self.newlines_before();
        self.keyword("desc")?;
        Ok((gap, self.quoted()?))
    }

    /// Fill in log and text of every node, returning the newlines that
    /// trail the last quoted block.
    fn contents(&mut self, nodes: &mut [RevisionNode]) -> Result<usize, Error> {
        let mut k = 0;
        let eof_newlines = loop {
            let newlines = self.skip_ws();
            if self.at_eof() {
                break newlines;
            }
            let id = self.revision("revision number")?;
            let Some(node) = nodes.get_mut(k) else {
                return Err(self.error(ParseErrorKind::UnexpectedContent(id)));
            };
            if node.id != id {
                return Err(self.error(ParseErrorKind::ContentOutOfOrder {
                    expected: node.id.clone(),
                    found: id,
                }));
            }

            let mut offset = newlines.saturating_sub(CONTENT_GAP);
            if k == 0 && offset > 0 {
                warn!(
                    revision = %id,
                    offset,
                    "dropping layout offset of first content entry"
                );
                offset = 0;
            }
            node.layout_offset = offset;

            self.keyword("log")?;
            node.log = self.quoted()?;
            self.keyword("text")?;
            node.text = self.quoted()?;
            k += 1;
        };

        if let Some(missing) = nodes.get(k) {
            return Err(self.error(ParseErrorKind::MissingContent(missing.id.clone())));
        }
        Ok(eof_newlines)
    }
}
