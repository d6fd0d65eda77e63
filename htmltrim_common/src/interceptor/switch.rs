use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::rewriting::rewriter::Rewriter;

#[derive(Clone, Debug)]
/// Turns trimming on or off at runtime. Clones share the same flag.
pub struct TrimSwitch(Arc<AtomicBool>);

impl TrimSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }

    /// Rewrites `page` when enabled; otherwise hands it back untouched.
    pub fn apply<R: Rewriter + ?Sized>(&self, rewriter: &R, page: Vec<u8>) -> Vec<u8> {
        if self.is_enabled() {
            rewriter.rewrite(page)
        } else {
            page
        }
    }
}

impl Default for TrimSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriting::html::WhitespaceRewriter;

    #[test]
    fn enabled_by_default() {
        assert!(TrimSwitch::default().is_enabled());
    }

    #[test]
    fn clones_share_state() {
        let switch = TrimSwitch::default();
        let handle = switch.clone();
        handle.set(false);
        assert!(!switch.is_enabled());
    }

    #[test]
    fn disabled_switch_returns_input() {
        let rewriter = WhitespaceRewriter::default();
        let page = b"<div>\n  <!-- c -->\n  <p> x </p>\n</div>".to_vec();

        let switch = TrimSwitch::new(false);
        assert_eq!(switch.apply(&rewriter, page.clone()), page);

        switch.set(true);
        assert_eq!(switch.apply(&rewriter, page), b"<div><p>x</p></div>".to_vec());
    }
}
