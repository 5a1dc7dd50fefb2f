use thiserror::Error;

/// Failures that abort a stylesheet parse.
///
/// Everything else (malformed declarations, unknown at-rules, unresolved
/// `var()` references) is tolerated and never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// The input ended while `depth` blocks were still open.
    #[error("unclosed block: input ended at byte {offset} with {depth} open block(s)")]
    UnclosedBlock { offset: usize, depth: usize },

    /// A `}` was found with no block open.
    #[error("unexpected `}}` at byte {offset}")]
    UnexpectedClosingBrace { offset: usize },

    /// A `/*` comment never closed.
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
}
