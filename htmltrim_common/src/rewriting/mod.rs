pub mod html;
pub mod rewriter;
