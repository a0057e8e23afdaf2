//! Diagnostics: stable codes, related info, and the per-file store.
//!
//! Diagnostics are data, never `Err`. Every analysis stage returns a partial
//! result plus diagnostics; only host contract violations surface as a
//! `WorkspaceError`. A file's diagnostics are fully replaced on every
//! re-analysis of that file, so stale entries cannot accumulate across
//! edits.

use rustc_hash::FxHashMap;
use text_size::TextRange;

use crate::base::FileId;
use crate::parser::{ErrorCode, SyntaxError};

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// The closed set of diagnostic rules, with stable string codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Lexical
    InvalidToken,
    UnterminatedString,
    UnterminatedComment,
    // Syntax
    SyntaxError,
    // Semantic
    DuplicateSymbol,
    UnresolvedImport,
    CyclicImport,
    UnresolvedType,
    FieldTypeMismatch,
    CyclicLayout,
    DuplicateEnumTag,
    InvalidDiscriminant,
}

impl DiagnosticCode {
    /// The stable code string hosts key on.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::InvalidToken => "invalid-token",
            DiagnosticCode::UnterminatedString => "unterminated-string",
            DiagnosticCode::UnterminatedComment => "unterminated-comment",
            DiagnosticCode::SyntaxError => "syntax-error",
            DiagnosticCode::DuplicateSymbol => "duplicate-symbol",
            DiagnosticCode::UnresolvedImport => "unresolved-import",
            DiagnosticCode::CyclicImport => "cyclic-import",
            DiagnosticCode::UnresolvedType => "unresolved-type",
            DiagnosticCode::FieldTypeMismatch => "field-type-mismatch",
            DiagnosticCode::CyclicLayout => "cyclic-layout",
            DiagnosticCode::DuplicateEnumTag => "duplicate-enum-tag",
            DiagnosticCode::InvalidDiscriminant => "invalid-discriminant",
        }
    }

    /// Stage rank used for intra-file ordering: syntax before semantic.
    pub fn stage(&self) -> u8 {
        match self {
            DiagnosticCode::InvalidToken
            | DiagnosticCode::UnterminatedString
            | DiagnosticCode::UnterminatedComment
            | DiagnosticCode::SyntaxError => 0,
            _ => 1,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secondary location attached to a diagnostic, e.g. the first
/// declaration a duplicate collides with.
#[derive(Clone, Debug, PartialEq)]
pub struct RelatedInfo {
    pub file: FileId,
    pub range: TextRange,
    pub message: String,
}

/// A diagnostic with location, stable code, and optional related locations.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub file: FileId,
    pub range: TextRange,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    pub fn error(
        file: FileId,
        range: TextRange,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file,
            range,
            severity: Severity::Error,
            code,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, file: FileId, range: TextRange, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            file,
            range,
            message: message.into(),
        });
        self
    }

    /// Lift a parser error into the unified diagnostic stream.
    pub fn from_syntax(file: FileId, error: &SyntaxError) -> Self {
        let code = match error.code {
            ErrorCode::E0101 | ErrorCode::E0104 => DiagnosticCode::InvalidToken,
            ErrorCode::E0102 => DiagnosticCode::UnterminatedString,
            ErrorCode::E0103 => DiagnosticCode::UnterminatedComment,
            _ => DiagnosticCode::SyntaxError,
        };
        Self::error(file, error.range, code, error.message.clone())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} at {:?}: {}",
            self.severity.as_str(),
            self.code,
            self.file,
            self.range,
            self.message
        )
    }
}

/// Published diagnostics, keyed by file.
///
/// `replace` is the only mutation for a live file: a (re)analysis hands over
/// the complete new set and the old one is dropped.
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    by_file: FxHashMap<FileId, Vec<Diagnostic>>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a file's diagnostics with a freshly computed set, sorted by
    /// span start then stage. Returns true if the visible set changed.
    pub fn replace(&mut self, file: FileId, mut diagnostics: Vec<Diagnostic>) -> bool {
        diagnostics.sort_by_key(|d| (d.range.start(), d.code.stage()));
        if self.by_file.get(&file).map(Vec::as_slice) == Some(diagnostics.as_slice()) {
            return false;
        }
        if diagnostics.is_empty() {
            self.by_file.remove(&file).is_some()
        } else {
            self.by_file.insert(file, diagnostics);
            true
        }
    }

    /// Drop a removed file's diagnostics. Returns true if any were present.
    pub fn remove(&mut self, file: FileId) -> bool {
        self.by_file.remove(&file).is_some()
    }

    pub fn get(&self, file: FileId) -> &[Diagnostic] {
        self.by_file.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files that currently have at least one diagnostic.
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.by_file.keys().copied()
    }

    pub fn total(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }
}
