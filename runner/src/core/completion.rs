//! Completion heuristic applied to the newest chunk.
//!
//! The loop cannot see the agent's internal reasoning, so "done" is inferred
//! from the shape of its output alone: an explicit sentinel word, or a reply
//! so short that generation most likely stalled.

/// Sentinel the agent is expected to emit when the plan is complete.
pub const DEFAULT_SENTINEL: &str = "FINISHED";

/// Chunks shorter than this (in characters) are treated as a stalled generation.
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;

/// Why the heuristic did or did not stop the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep looping.
    Continue,
    /// The chunk contains the sentinel (case-insensitive).
    Sentinel,
    /// The chunk is below the minimum length.
    TooShort,
}

impl Verdict {
    pub fn is_finished(self) -> bool {
        !matches!(self, Verdict::Continue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Continue => "continue",
            Verdict::Sentinel => "sentinel",
            Verdict::TooShort => "too_short",
        }
    }
}

/// Sentinel/short-output rule evaluated once per iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionHeuristic {
    sentinel_upper: String,
    min_chunk_chars: usize,
}

impl CompletionHeuristic {
    pub fn new(sentinel: &str, min_chunk_chars: usize) -> Self {
        Self {
            sentinel_upper: sentinel.to_uppercase(),
            min_chunk_chars,
        }
    }

    /// Classify `chunk`. The sentinel check wins over the length check.
    pub fn evaluate(&self, chunk: &str) -> Verdict {
        if chunk.to_uppercase().contains(&self.sentinel_upper) {
            return Verdict::Sentinel;
        }
        if chunk.chars().count() < self.min_chunk_chars {
            return Verdict::TooShort;
        }
        Verdict::Continue
    }
}

impl Default for CompletionHeuristic {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL, DEFAULT_MIN_CHUNK_CHARS)
    }
}
