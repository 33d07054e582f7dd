use std::fmt;

/// Errors raised at the data-model boundary (malformed wire payloads,
/// dimension mismatches). Mirrors the teacher's hand-rolled
/// `ProtocolError` — small, `Display` + `Error`, no `thiserror`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GolError {
    MalformedWorld(String),
    DimensionMismatch { expected: (u32, u32), actual: (u32, u32) },
}

impl fmt::Display for GolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedWorld(msg) => write!(f, "malformed world: {msg}"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "world dimensions {}x{} do not match params {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for GolError {}
