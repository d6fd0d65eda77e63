use std::sync::LazyLock;

use regex::bytes::Regex;
use scorched::{logf, LogData, LogImportance};

use super::{
    placeholder::{self, Placeholder, DEFAULT_BLOCK_SIZE_LIMIT},
    rules::{RuleSet, PRE_BLOCK},
};
use crate::rewriting::rewriter::Rewriter;

static DEFAULT_REWRITER: LazyLock<WhitespaceRewriter> = LazyLock::new(WhitespaceRewriter::default);

/// Returns `page` with HTML comments and redundant whitespace removed, using the default rules.
///
/// Content of `<pre>` blocks is left exactly as it is; only the whitespace around such a block
/// is dropped.
pub fn remove(page: &[u8]) -> Vec<u8> {
    DEFAULT_REWRITER.transform(page)
}

/// Strips comments and redundant whitespace from HTML while shielding preformatted blocks.
#[derive(Debug, Clone)]
pub struct WhitespaceRewriter {
    rules: RuleSet,
    pre: Regex,
    block_size_limit: usize,
}

impl WhitespaceRewriter {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            pre: PRE_BLOCK.clone(),
            block_size_limit: DEFAULT_BLOCK_SIZE_LIMIT,
        }
    }

    /// Caps the compiled size of the matcher built for each preformatted block. Blocks whose
    /// matcher would be larger are left unprotected.
    pub fn block_size_limit(mut self, bytes: usize) -> Self {
        self.block_size_limit = bytes;
        self
    }

    pub fn transform(&self, page: &[u8]) -> Vec<u8> {
        let blocks: Vec<&[u8]> = self.pre.find_iter(page).map(|m| m.as_bytes()).collect();

        if blocks.is_empty() {
            return self.rules.apply(page.to_vec());
        }

        let placeholders: Vec<Placeholder> = blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| {
                match placeholder::protect_within(block, index, self.block_size_limit) {
                    Ok(placeholder) => Some(placeholder),
                    Err(e) => {
                        logf!(Warning, "Leaving preformatted block unprotected: {}", e);
                        None
                    }
                }
            })
            .collect();

        let page = placeholders
            .iter()
            .fold(page.to_vec(), |page, placeholder| placeholder.hide(&page));

        let page = self.rules.apply(page);

        placeholders
            .iter()
            .fold(page, |page, placeholder| placeholder.reveal(&page))
    }
}

impl Default for WhitespaceRewriter {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl Rewriter for WhitespaceRewriter {
    fn rewrite(&self, input: Vec<u8>) -> Vec<u8> {
        self.transform(&input)
    }
}
