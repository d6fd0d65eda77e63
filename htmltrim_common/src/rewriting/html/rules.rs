use std::sync::{Arc, LazyLock};

use regex::bytes::{Regex, RegexBuilder};

/// The whitespace rules, in the order they are applied. Later rules see the output of earlier
/// ones, so reordering them changes the result.
///
/// Every pattern is compiled without Unicode support: `\s` is ASCII whitespace only, `[^>]`
/// and `.` match single bytes, and case folding is ASCII.
const WHITESPACE_RULES: &[(&str, &str)] = &[
    // comments
    (r"(?s)<!--.*?-->", ""),
    // document structure
    (
        r"(?i)\s*(</?(?:body|!doctype|head|html|link|meta|script|style|title)[^>]*>)\s*",
        "${1}",
    ),
    // block elements
    (
        r"(?i)\s+(</?(?:article|blockquote|div|footer|h[1-6]|header|nav|p|section)[^>]*>)",
        "${1}",
    ),
    (
        r"(?i)(</?(?:article|blockquote|div|footer|h[1-6]|header|nav|p|section)[^>]*>)\s+",
        "${1}",
    ),
    // lists
    (r"(?i)\s+(</?(?:[dou]l|li|d[dt])[^>]*>)", "${1}"),
    (r"(?i)(</?(?:[dou]l|li|d[dt])[^>]*>)\s+", "${1}"),
    // empty table cells keep their width, so this has to run before the table rules
    (r"(?i)(<td(?:\s+[^>]*)?>)\s+(</td\s*>)", "${1}&#160;${2}"),
    // tables
    (r"(?i)\s+(</?(?:col|t(?:able|body|foot|head|[dhr]))[^>]*>)", "${1}"),
    (r"(?i)(</?(?:col|t(?:able|body|foot|head|[dhr]))[^>]*>)\s+", "${1}"),
    // forms
    (r"(?i)\s+(</?(?:form|fieldset|legend|opt(?:group|ion))[^>]*>)", "${1}"),
    (r"(?i)(</?(?:form|fieldset|legend|opt(?:group|ion))[^>]*>)\s+", "${1}"),
    // br, hr
    (r"(?i)\s*(<[bh]r[^>]*>)\s*", "${1}"),
    // after an opening anchor
    (r"(?i)(<a\s+[^>]*>)\s+", "${1}"),
    // empty paragraphs
    (r"(?i)<p(?:\s+[^>]*)?>\s*</p\s*>", ""),
    // before a closing `>`
    (r"\s+>", ">"),
];

/// Finds preformatted blocks together with the whitespace around them.
const PRE_BLOCK_PATTERN: &str = r"(?si)\s*<pre[^>]*>.*?</pre>\s*";

pub static DEFAULT_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        WHITESPACE_RULES
            .iter()
            .map(|(pattern, replacement)| {
                Rule::new(pattern, replacement).expect("whitespace rule pattern is valid")
            })
            .collect(),
    )
});

pub static PRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(PRE_BLOCK_PATTERN).expect("preformatted block pattern is valid"));

pub(crate) fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

/// A single pattern/replacement pair. The replacement may refer to capture groups as `${n}`.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, page: &[u8]) -> Vec<u8> {
        self.pattern
            .replace_all(page, self.replacement.as_bytes())
            .into_owned()
    }
}

/// An ordered, immutable list of rules. Cloning shares the compiled rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[Rule]>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule once over the whole page, in order.
    pub fn apply(&self, page: Vec<u8>) -> Vec<u8> {
        self.rules.iter().fold(page, |page, rule| rule.apply(&page))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}
