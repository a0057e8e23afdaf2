//! Logos-based lexer for RIDL
//!
//! Fast tokenization using the logos crate. The lexer is total: malformed
//! input yields recovery tokens (`UNTERMINATED_STRING`,
//! `UNTERMINATED_BLOCK_COMMENT`, `ERROR`) rather than failing the call.

use logos::Logos;
use text_size::{TextRange, TextSize};

use super::token_kind::TokenKind;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl<'a> Token<'a> {
    /// The byte range this token covers in its source file.
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.text))
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to TokenKind. Nothing is skipped: trivia is
/// emitted so the parser can collect doc comments.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    // `///` must win over `//` (higher priority than LineComment)
    #[regex(r"///[^\n]*", priority = 4)]
    DocComment,

    #[regex(r"//[^\n]*", priority = 3)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", priority = 4)]
    BlockComment,

    // An opened block comment with no closing `*/`: spans to end of input.
    #[regex(r"/\*([^*]|\*[^/])*\*?", priority = 3)]
    UnterminatedBlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]*\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 4)]
    String,

    // A string with no closing quote: spans to end of line.
    #[regex(r#""([^"\\\n]|\\.)*"#, priority = 3)]
    UnterminatedString,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("-")]
    Minus,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("module")]
    ModuleKw,
    #[token("struct")]
    StructKw,
    #[token("enum")]
    EnumKw,
    #[token("union")]
    UnionKw,
    #[token("interface")]
    InterfaceKw,
    #[token("service")]
    ServiceKw,
    #[token("import")]
    ImportKw,

    #[token("list")]
    ListKw,
    #[token("sequence")]
    SequenceKw,
    #[token("optional")]
    OptionalKw,

    #[token("bool")]
    BoolKw,
    #[token("string")]
    StringKw,
    #[token("bytes")]
    BytesKw,
    #[token("int8")]
    Int8Kw,
    #[token("int16")]
    Int16Kw,
    #[token("int32")]
    Int32Kw,
    #[token("int64")]
    Int64Kw,
    #[token("uint8")]
    Uint8Kw,
    #[token("uint16")]
    Uint16Kw,
    #[token("uint32")]
    Uint32Kw,
    #[token("uint64")]
    Uint64Kw,
    #[token("float")]
    FloatKw,
    #[token("double")]
    DoubleKw,
    #[token("void")]
    VoidKw,

    #[token("true")]
    TrueKw,
    #[token("false")]
    FalseKw,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            // Trivia
            Whitespace => TokenKind::WHITESPACE,
            DocComment => TokenKind::DOC_COMMENT,
            LineComment => TokenKind::LINE_COMMENT,
            BlockComment => TokenKind::BLOCK_COMMENT,
            UnterminatedBlockComment => TokenKind::UNTERMINATED_BLOCK_COMMENT,

            // Literals
            Ident => TokenKind::IDENT,
            Integer => TokenKind::INTEGER,
            Float => TokenKind::FLOAT,
            String => TokenKind::STRING,
            UnterminatedString => TokenKind::UNTERMINATED_STRING,

            // Punctuation
            LBrace => TokenKind::L_BRACE,
            RBrace => TokenKind::R_BRACE,
            LBracket => TokenKind::L_BRACKET,
            RBracket => TokenKind::R_BRACKET,
            LParen => TokenKind::L_PAREN,
            RParen => TokenKind::R_PAREN,
            Semicolon => TokenKind::SEMICOLON,
            Colon => TokenKind::COLON,
            Comma => TokenKind::COMMA,
            Dot => TokenKind::DOT,
            Lt => TokenKind::LT,
            Gt => TokenKind::GT,
            Eq => TokenKind::EQ,
            Minus => TokenKind::MINUS,

            // Keywords
            ModuleKw => TokenKind::MODULE_KW,
            StructKw => TokenKind::STRUCT_KW,
            EnumKw => TokenKind::ENUM_KW,
            UnionKw => TokenKind::UNION_KW,
            InterfaceKw => TokenKind::INTERFACE_KW,
            ServiceKw => TokenKind::SERVICE_KW,
            ImportKw => TokenKind::IMPORT_KW,

            ListKw => TokenKind::LIST_KW,
            SequenceKw => TokenKind::SEQUENCE_KW,
            OptionalKw => TokenKind::OPTIONAL_KW,

            BoolKw => TokenKind::BOOL_KW,
            StringKw => TokenKind::STRING_KW,
            BytesKw => TokenKind::BYTES_KW,
            Int8Kw => TokenKind::INT8_KW,
            Int16Kw => TokenKind::INT16_KW,
            Int32Kw => TokenKind::INT32_KW,
            Int64Kw => TokenKind::INT64_KW,
            Uint8Kw => TokenKind::UINT8_KW,
            Uint16Kw => TokenKind::UINT16_KW,
            Uint32Kw => TokenKind::UINT32_KW,
            Uint64Kw => TokenKind::UINT64_KW,
            FloatKw => TokenKind::FLOAT_KW,
            DoubleKw => TokenKind::DOUBLE_KW,
            VoidKw => TokenKind::VOID_KW,

            TrueKw => TokenKind::TRUE_KW,
            FalseKw => TokenKind::FALSE_KW,
        }
    }
}
