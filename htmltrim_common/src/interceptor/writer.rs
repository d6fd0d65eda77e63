use std::{io, sync::Arc};

use super::switch::TrimSwitch;
use crate::rewriting::{html::WhitespaceRewriter, rewriter::Rewriter};

/// Sends bytes to a client.
pub trait ResponseWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
}

impl<W: io::Write> ResponseWriter for W {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        io::Write::write(self, data)
    }
}

/// Wraps a [`ResponseWriter`] and rewrites every buffer before handing it on.
///
/// The byte count and errors of the wrapped writer are returned as they are. Note that the count
/// refers to the rewritten buffer, which is usually shorter than the one passed in.
pub struct TrimWriter<W, R = WhitespaceRewriter> {
    inner: W,
    rewriter: Arc<R>,
    switch: TrimSwitch,
}

impl<W> TrimWriter<W> {
    pub fn new(inner: W, switch: TrimSwitch) -> Self {
        Self::with_rewriter(inner, Arc::new(WhitespaceRewriter::default()), switch)
    }
}

impl<W, R> TrimWriter<W, R> {
    pub fn with_rewriter(inner: W, rewriter: Arc<R>, switch: TrimSwitch) -> Self {
        Self {
            inner,
            rewriter,
            switch,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W, R> ResponseWriter for TrimWriter<W, R>
where
    W: ResponseWriter,
    R: Rewriter,
{
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        if self.switch.is_enabled() {
            let trimmed = self.rewriter.rewrite(data.to_vec());
            if !trimmed.is_empty() {
                return self.inner.write(&trimmed);
            }
        }

        self.inner.write(data)
    }
}
