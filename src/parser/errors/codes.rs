//! Error code definitions for parser diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (invalid tokens)
//! - E02xx: Structural errors (braces, semicolons)
//! - E03xx: Declaration errors (structs, enums, unions, services)
//! - E05xx: Import errors
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for parser diagnostics
///
/// Each error code represents a specific category of parse error,
/// enabling filtering, documentation, and IDE integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors (invalid tokens)
    // =========================================================================
    /// Invalid or unexpected character in source
    E0101,
    /// Unterminated string literal
    E0102,
    /// Unterminated block comment
    E0103,
    /// Invalid numeric literal
    E0104,

    // =========================================================================
    // E02xx: Structural errors (braces, semicolons, delimiters)
    // =========================================================================
    /// Missing semicolon
    E0201,
    /// Unclosed brace `{`
    E0202,
    /// Unexpected closing delimiter
    E0205,
    /// Unclosed angle bracket `<`
    E0206,

    // =========================================================================
    // E03xx: Declaration errors
    // =========================================================================
    /// Missing identifier/name
    E0301,
    /// Unexpected token in declaration body
    E0304,
    /// Missing type where one was expected
    E0305,
    /// Missing body (neither `;` nor `{`)
    E0307,
    /// Missing array length in `T[N]`
    E0308,

    // =========================================================================
    // E05xx: Import errors
    // =========================================================================
    /// Malformed import path
    E0501,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Unexpected token
    E0901,
}

impl ErrorCode {
    /// Get the code as a string (e.g., "E0101")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0104 => "E0104",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0205 => "E0205",
            Self::E0206 => "E0206",
            Self::E0301 => "E0301",
            Self::E0304 => "E0304",
            Self::E0305 => "E0305",
            Self::E0307 => "E0307",
            Self::E0308 => "E0308",
            Self::E0501 => "E0501",
            Self::E0901 => "E0901",
        }
    }

    /// True for lexical-class codes (produced from recovery tokens).
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
