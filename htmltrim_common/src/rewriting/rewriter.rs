/// A whole-buffer transformation of a response body.
///
/// Implementations must not fail: when nothing can be done the input is handed back as is.
pub trait Rewriter {
    fn rewrite(&self, input: Vec<u8>) -> Vec<u8>;
}
