//! Token to syntax-node correlation.

use crate::cursor::Cursor;
use crate::engine::RawCursor;
use crate::token::Tokens;

impl<'tu> Tokens<'tu> {
    /// The node owning each token: the smallest named node whose extent
    /// covers it.
    ///
    /// The result is index-aligned with the stream. Tokens no node owns map
    /// to the null cursor. An empty stream never reaches the engine.
    pub fn annotate(&self) -> Vec<Cursor<'tu>> {
        let tokens = self.as_raw();
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut cursors = vec![RawCursor::NULL; tokens.len()];
        self.unit.annotate_tokens(tokens, &mut cursors);
        cursors
            .into_iter()
            .map(|raw| Cursor::new(self.unit, raw))
            .collect()
    }
}
