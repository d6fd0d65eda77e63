use std::fmt::Write as _;

use regex::bytes::{NoExpand, Regex, RegexBuilder};
use thiserror::Error;

/// Size limit for the compiled matchers built around a single preformatted block. This is the
/// default limit used by the `regex` crate.
pub const DEFAULT_BLOCK_SIZE_LIMIT: usize = 10 * (1 << 20);

#[derive(Error, Debug)]
pub enum PlaceholderError {
    #[error("failed to build the matcher for preformatted block {index}: {source}")]
    Compile {
        index: usize,
        #[source]
        source: regex::Error,
    },
}

/// A preformatted block that is swapped out of the page while the rule set runs.
///
/// Both matchers are compiled up front, so a block is only hidden when it can be restored.
#[derive(Debug)]
pub struct Placeholder {
    token: String,
    block: Vec<u8>,
    hide: Regex,
    reveal: Regex,
}

/// The marker that stands in for block `index`. It is derived from the index alone, so two
/// blocks never share a token.
pub fn token(index: usize) -> String {
    format!("</-{0}-{0}-{0}-{0}-/>", index)
}

/// Builds the placeholder for `block`, the `index`th match of the preformatted block pattern.
pub fn protect(block: &[u8], index: usize) -> Result<Placeholder, PlaceholderError> {
    protect_within(block, index, DEFAULT_BLOCK_SIZE_LIMIT)
}

pub(crate) fn protect_within(
    block: &[u8],
    index: usize,
    size_limit: usize,
) -> Result<Placeholder, PlaceholderError> {
    let token = token(index);

    let build = |literal: &[u8]| {
        RegexBuilder::new(&format!(r"\s*{}\s*", quote_bytes(literal)))
            .unicode(false)
            .size_limit(size_limit)
            .build()
            .map_err(|source| PlaceholderError::Compile { index, source })
    };

    Ok(Placeholder {
        hide: build(block)?,
        reveal: build(token.as_bytes())?,
        block: block.trim_ascii().to_vec(),
        token,
    })
}

impl Placeholder {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Replaces the first occurrence of the block, and the whitespace around it, with the token.
    pub fn hide(&self, page: &[u8]) -> Vec<u8> {
        self.hide
            .replacen(page, 1, NoExpand(self.token.as_bytes()))
            .into_owned()
    }

    /// Replaces the token, and the whitespace around it, with the block trimmed at its edges.
    pub fn reveal(&self, page: &[u8]) -> Vec<u8> {
        self.reveal
            .replace_all(page, NoExpand(self.block.as_slice()))
            .into_owned()
    }
}

/// Quotes arbitrary bytes for a pattern compiled without Unicode support. Anything that is not
/// an ASCII letter or digit becomes a `\xNN` escape, so invalid UTF-8 is matched byte for byte.
fn quote_bytes(literal: &[u8]) -> String {
    let mut quoted = String::with_capacity(literal.len() * 2);
    for &byte in literal {
        if byte.is_ascii_alphanumeric() {
            quoted.push(byte as char);
        } else {
            let _ = write!(quoted, r"\x{:02X}", byte);
        }
    }
    quoted
}
