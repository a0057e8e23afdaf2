//! Token kinds for the RIDL lexer.
//!
//! Tokens are the leaves the parser consumes: keywords, identifiers,
//! literals, punctuation, and trivia (whitespace and comments). Trivia is
//! kept in the token stream so doc comments can be attached to the
//! declaration that follows them.

/// All token kinds in RIDL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA (preserved in the stream but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,
    DOC_COMMENT,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,   // identifier
    INTEGER, // 42
    FLOAT,   // 3.14
    STRING,  // "hello"

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,   // {
    R_BRACE,   // }
    L_BRACKET, // [
    R_BRACKET, // ]
    L_PAREN,   // (
    R_PAREN,   // )
    SEMICOLON, // ;
    COLON,     // :
    COMMA,     // ,
    DOT,       // .
    LT,        // <
    GT,        // >
    EQ,        // =
    MINUS,     // - (negative enum tags)

    // =========================================================================
    // DECLARATION KEYWORDS
    // =========================================================================
    MODULE_KW,
    STRUCT_KW,
    ENUM_KW,
    UNION_KW,
    INTERFACE_KW,
    SERVICE_KW,
    IMPORT_KW,

    // =========================================================================
    // TYPE KEYWORDS
    // =========================================================================
    LIST_KW,
    SEQUENCE_KW,
    OPTIONAL_KW,
    BOOL_KW,
    STRING_KW,
    BYTES_KW,
    INT8_KW,
    INT16_KW,
    INT32_KW,
    INT64_KW,
    UINT8_KW,
    UINT16_KW,
    UINT32_KW,
    UINT64_KW,
    FLOAT_KW,
    DOUBLE_KW,
    VOID_KW,

    // =========================================================================
    // LITERAL KEYWORDS
    // =========================================================================
    TRUE_KW,
    FALSE_KW,

    // =========================================================================
    // RECOVERY TOKENS (malformed input, still total)
    // =========================================================================
    UNTERMINATED_STRING,
    UNTERMINATED_BLOCK_COMMENT,
    ERROR,
}

impl TokenKind {
    /// Whitespace and comments, skipped by the parser outside doc collection.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::WHITESPACE
                | TokenKind::LINE_COMMENT
                | TokenKind::BLOCK_COMMENT
                | TokenKind::DOC_COMMENT
                | TokenKind::UNTERMINATED_BLOCK_COMMENT
        )
    }

    /// Keywords that begin a declaration; used for recovery sets.
    pub fn starts_declaration(self) -> bool {
        matches!(
            self,
            TokenKind::MODULE_KW
                | TokenKind::STRUCT_KW
                | TokenKind::ENUM_KW
                | TokenKind::UNION_KW
                | TokenKind::INTERFACE_KW
                | TokenKind::SERVICE_KW
                | TokenKind::IMPORT_KW
        )
    }

    /// Keywords naming a builtin primitive type.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TokenKind::BOOL_KW
                | TokenKind::STRING_KW
                | TokenKind::BYTES_KW
                | TokenKind::INT8_KW
                | TokenKind::INT16_KW
                | TokenKind::INT32_KW
                | TokenKind::INT64_KW
                | TokenKind::UINT8_KW
                | TokenKind::UINT16_KW
                | TokenKind::UINT32_KW
                | TokenKind::UINT64_KW
                | TokenKind::FLOAT_KW
                | TokenKind::DOUBLE_KW
                | TokenKind::VOID_KW
        )
    }

    /// True if this token can begin a type expression.
    pub fn starts_type(self) -> bool {
        self.is_primitive()
            || matches!(
                self,
                TokenKind::IDENT
                    | TokenKind::LIST_KW
                    | TokenKind::SEQUENCE_KW
                    | TokenKind::OPTIONAL_KW
            )
    }
}
