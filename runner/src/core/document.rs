//! In-memory view of the append-only plan document.

/// Separator written before every chunk except the first.
pub const CHUNK_SEPARATOR: char = '\n';

/// Full text of the plan, grown one chunk at a time.
///
/// Chunks are never edited or removed once pushed. The text mirrors the
/// persisted file byte for byte, so it doubles as the agent's scratchpad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the document holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Text that appending `chunk` adds to the document.
    ///
    /// An empty document takes the chunk verbatim; otherwise it is preceded by
    /// [`CHUNK_SEPARATOR`].
    pub fn piece_for(&self, chunk: &str) -> String {
        if self.text.is_empty() {
            return chunk.to_string();
        }
        let mut piece = String::with_capacity(chunk.len() + 1);
        piece.push(CHUNK_SEPARATOR);
        piece.push_str(chunk);
        piece
    }

    /// Record a piece produced by [`Document::piece_for`] after it was persisted.
    pub fn push_piece(&mut self, piece: &str) {
        self.text.push_str(piece);
    }

    /// Scratchpad handed to the agent: a copy of the full text.
    pub fn scratchpad(&self) -> String {
        self.text.clone()
    }
}
