pub mod placeholder;
pub mod rules;
pub mod whitespace;

pub use rules::{Rule, RuleSet};
pub use whitespace::{remove, WhitespaceRewriter};
