use std::io;

/// Recoverable failures surfaced at the library boundary.
///
/// Internal consistency failures (a decoded model that fails the
/// verifier, a generator that cannot reach uniqueness after giving
/// every cell) are never represented here — those are encoding bugs,
/// not recoverable user errors, and are reported by panicking instead.
/// Structural errors (a malformed cage, a coincident-cell inequality —
/// spec §7) are likewise not a variant here: the encoder handles them
/// at encode time via the empty clause (`encode.rs::cage_clauses`,
/// `inequality_clauses`), surfacing as an ordinary UNSAT `Solution`
/// rather than a `Result` failure.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type PuzzleResult<T> = Result<T, PuzzleError>;
