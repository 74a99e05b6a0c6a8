//! `@`-quoting for RCS string fields.
//!
//! Every free-text field of an RCS file (`desc`, `log`, `text`, `comment`,
//! `integrity`, `expand`) is written between two `@` delimiters. A literal
//! `@` inside the string is doubled; nothing else is escaped, so newlines,
//! tabs and NUL characters pass through untouched.
//!
//! ```rust
//! use rcs_core::quote;
//!
//! let quoted = quote::encode("mail me @ home");
//! assert_eq!(quoted, "@mail me @@ home@");
//! assert_eq!(quote::decode(&quoted).unwrap(), "mail me @ home");
//! ```

use std::fmt;

use thiserror::Error;

/// The character that opens and closes a quoted block.
pub const DELIMITER: char = '@';

const DELIMITER_BYTE: u8 = b'@';

/// Errors raised while decoding a quoted block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("quoted block must start with '@'")]
    MissingOpenDelimiter,

    #[error("unterminated quoted block")]
    Unterminated,

    #[error("unexpected input after quoted block at byte {offset}")]
    TrailingInput { offset: usize },
}

/// Quote `raw`, doubling every `@` and wrapping the result in delimiters.
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(DELIMITER);
    for segment in raw.split_inclusive(DELIMITER) {
        out.push_str(segment);
        if segment.ends_with(DELIMITER) {
            out.push(DELIMITER);
        }
    }
    out.push(DELIMITER);
    out
}

/// Write the quoted form of `raw` to `w` without building an intermediate
/// string.
pub fn write_quoted<W: fmt::Write>(w: &mut W, raw: &str) -> fmt::Result {
    w.write_char(DELIMITER)?;
    for segment in raw.split_inclusive(DELIMITER) {
        w.write_str(segment)?;
        if segment.ends_with(DELIMITER) {
            w.write_char(DELIMITER)?;
        }
    }
    w.write_char(DELIMITER)
}

/// Decode a complete quoted block. `quoted` must consist of exactly one
/// block: leading and trailing delimiters included, nothing after.
pub fn decode(quoted: &str) -> Result<String, EncodingError> {
    let (raw, consumed) = decode_prefix(quoted)?;
    if consumed != quoted.len() {
        return Err(EncodingError::TrailingInput { offset: consumed });
    }
    Ok(raw)
}

/// Decode the quoted block at the start of `input`.
///
/// Returns the raw string and the number of bytes consumed, including both
/// delimiters. Whatever follows the closing delimiter is left to the caller.
pub fn decode_prefix(input: &str) -> Result<(String, usize), EncodingError> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&DELIMITER_BYTE) {
        return Err(EncodingError::MissingOpenDelimiter);
    }

    let mut raw = String::new();
    let mut pos = 1;
    loop {
        let Some(found) = input[pos..].find(DELIMITER) else {
            return Err(EncodingError::Unterminated);
        };
        let at = pos + found;
        raw.push_str(&input[pos..at]);
        if bytes.get(at + 1) == Some(&DELIMITER_BYTE) {
            raw.push(DELIMITER);
            pos = at + 2;
        } else {
            return Ok((raw, at + 1));
        }
    }
}
