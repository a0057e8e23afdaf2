//! Recursive descent parser for RIDL
//!
//! Builds an owned AST from tokens. Supports error recovery: on an
//! unexpected token the parser emits one syntax error, records an
//! `Item::Error` node spanning the skipped region, and resynchronizes at
//! the next `;` or at the closing `}` of the enclosing block. Nesting is
//! tracked with an explicit depth counter so recovery targets the correct
//! brace. Lookahead never exceeds one token.

use text_size::{TextRange, TextSize};

use super::errors::{ErrorCode, SyntaxError};
use super::lexer::{Lexer, Token};
use super::token_kind::TokenKind;
use crate::syntax::ast::{
    EnumDecl, EnumMember, ErrorItem, FieldDecl, Ident, ImportDecl, Item, MethodDecl, ModuleDecl,
    ParamDecl, PrimitiveType, SequenceKeyword, ServiceDecl, ServiceKeyword, SourceUnit, StructDecl,
    TypeExpr, UnionDecl,
};

/// Parse result containing the AST and any syntax errors
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub ast: SourceUnit,
    pub errors: Vec<SyntaxError>,
}

impl ParseResult {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse RIDL source code into an AST
pub fn parse(input: &str) -> ParseResult {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens);
    let ast = parser.parse_source_unit();
    ParseResult {
        ast,
        errors: parser.errors,
    }
}

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    /// Brace nesting depth, maintained by `bump`
    depth: u32,
    /// End of the last consumed token, for range construction
    last_end: TextSize,
    /// Doc comment text collected by `skip_trivia`, claimed by declarations
    pending_doc: Option<String>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            last_end: TextSize::new(0),
            pending_doc: None,
            errors: Vec::new(),
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::ERROR)
    }

    fn current_range(&self) -> TextRange {
        self.current()
            .map(Token::range)
            .unwrap_or_else(|| TextRange::empty(self.last_end))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Option<&Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        match token.kind {
            TokenKind::L_BRACE => self.depth += 1,
            TokenKind::R_BRACE => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.last_end = token.range().end();
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches, yielding its text and range.
    fn bump_matching(&mut self, kind: TokenKind) -> Option<(&'a str, TextRange)> {
        if self.at(kind) {
            self.bump().map(|t| (t.text, t.range()))
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, code: ErrorCode, what: &str) -> bool {
        self.skip_trivia();
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {what}"), code);
            false
        }
    }

    /// Skip whitespace and comments, collecting `///` doc text for the next
    /// declaration and diagnosing unterminated block comments once.
    fn skip_trivia(&mut self) {
        let mut docs: Vec<String> = Vec::new();
        while let Some(token) = self.current() {
            match token.kind {
                TokenKind::DOC_COMMENT => {
                    let text = token.text.trim_start_matches('/').trim().to_string();
                    docs.push(text);
                }
                TokenKind::WHITESPACE | TokenKind::LINE_COMMENT | TokenKind::BLOCK_COMMENT => {}
                TokenKind::UNTERMINATED_BLOCK_COMMENT => {
                    let range = token.range();
                    self.errors.push(
                        SyntaxError::new("unterminated block comment", range, ErrorCode::E0103)
                            .with_hint("close the comment with `*/`"),
                    );
                }
                _ => break,
            }
            self.pos += 1;
            if let Some(t) = self.tokens.get(self.pos - 1) {
                self.last_end = t.range().end();
            }
        }
        if !docs.is_empty() {
            self.pending_doc = Some(docs.join("\n"));
        }
    }

    fn take_doc(&mut self) -> Option<String> {
        self.pending_doc.take()
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>, code: ErrorCode) {
        let range = self.current_range();
        self.errors.push(SyntaxError::new(message, range, code));
    }

    /// Classify the current token for an "unexpected token" report, so
    /// lexical recovery tokens get lexical codes.
    fn classify_unexpected(&self) -> (ErrorCode, String) {
        match self.current_kind() {
            TokenKind::ERROR => {
                let text = self.current().map(|t| t.text).unwrap_or("");
                (ErrorCode::E0101, format!("invalid character `{text}`"))
            }
            TokenKind::UNTERMINATED_STRING => {
                (ErrorCode::E0102, "unterminated string literal".to_string())
            }
            _ => match self.current() {
                Some(token) => (ErrorCode::E0901, format!("unexpected `{}`", token.text)),
                None => (ErrorCode::E0901, "unexpected end of file".to_string()),
            },
        }
    }

    /// Emit one error for the current construct and skip tokens until a
    /// statement terminator (`;`) or a block boundary at the entry depth.
    /// Returns the skipped range for an `Item::Error` node.
    fn recover(&mut self, message: String, code: ErrorCode) -> TextRange {
        let start = self.current_range().start();
        self.errors
            .push(SyntaxError::new(message, self.current_range(), code));

        let base_depth = self.depth;
        let mut end = start;
        while !self.at_eof() {
            let kind = self.current_kind();
            // Closing brace of the enclosing block: leave it for the caller.
            if kind == TokenKind::R_BRACE && self.depth <= base_depth {
                break;
            }
            // A fresh declaration at this depth is a safe restart point.
            if kind.starts_declaration() && self.depth == base_depth && end > start {
                break;
            }
            let consumed_semi = kind == TokenKind::SEMICOLON && self.depth == base_depth;
            if let Some(token) = self.bump() {
                end = token.range().end();
            }
            if consumed_semi {
                break;
            }
        }
        TextRange::new(start, end.max(start))
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    /// SourceUnit = Item* EOF
    fn parse_source_unit(&mut self) -> SourceUnit {
        let items = self.parse_items(false);
        SourceUnit { items }
    }

    /// Item* until EOF or, inside a module body, the closing `}`.
    fn parse_items(&mut self, in_block: bool) -> Vec<Item> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() || (in_block && self.at(TokenKind::R_BRACE)) {
                break;
            }
            let pos_before = self.pos;
            if let Some(item) = self.parse_item() {
                items.push(item);
            }
            // Safety: if we didn't make progress, force-skip a token
            if self.pos == pos_before && !self.at_eof() {
                let (code, message) = self.classify_unexpected();
                self.error(message, code);
                self.bump();
            }
        }
        items
    }

    /// Item = Module | Import | Struct | Enum | Union | Service
    fn parse_item(&mut self) -> Option<Item> {
        self.skip_trivia();
        match self.current_kind() {
            TokenKind::MODULE_KW => Some(self.parse_module()),
            TokenKind::IMPORT_KW => Some(self.parse_import()),
            TokenKind::STRUCT_KW => Some(self.parse_struct()),
            TokenKind::ENUM_KW => Some(self.parse_enum()),
            TokenKind::UNION_KW => Some(self.parse_union()),
            TokenKind::INTERFACE_KW | TokenKind::SERVICE_KW => Some(self.parse_service()),
            _ => {
                let (code, message) = self.classify_unexpected();
                let range = self.recover(message, code);
                Some(Item::Error(ErrorItem { range }))
            }
        }
    }

    /// Module = 'module' Name '{' Item* '}'
    fn parse_module(&mut self) -> Item {
        let doc = self.take_doc();
        let start = self.current_range().start();
        self.bump(); // module

        let Some(name) = self.parse_name("module name") else {
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        };

        self.skip_trivia();
        if !self.eat(TokenKind::L_BRACE) {
            self.error("expected '{' after module name", ErrorCode::E0307);
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        }

        let items = self.parse_items(true);
        self.expect_closing_brace();

        Item::Module(ModuleDecl {
            name,
            items,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Import = 'import' Name ('.' Name)* ';'
    fn parse_import(&mut self) -> Item {
        let start = self.current_range().start();
        self.bump(); // import
        self.take_doc(); // imports don't carry docs

        self.skip_trivia();
        let mut path = Vec::new();
        if let Some((text, range)) = self.bump_matching(TokenKind::IDENT) {
            path.push(Ident::new(text, range));
            while self.at(TokenKind::DOT) {
                self.bump();
                if let Some((text, range)) = self.bump_matching(TokenKind::IDENT) {
                    path.push(Ident::new(text, range));
                } else {
                    self.error("expected name after '.' in import path", ErrorCode::E0501);
                    break;
                }
            }
        } else {
            let range = self.recover("expected import path".to_string(), ErrorCode::E0501);
            return Item::Error(ErrorItem { range });
        }

        self.expect(TokenKind::SEMICOLON, ErrorCode::E0201, "';' after import");
        Item::Import(ImportDecl {
            path,
            range: TextRange::new(start, self.last_end),
        })
    }

    /// Struct = 'struct' Name '{' Field* '}'
    fn parse_struct(&mut self) -> Item {
        let doc = self.take_doc();
        let start = self.current_range().start();
        self.bump(); // struct

        let Some(name) = self.parse_name("struct name") else {
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        };

        self.skip_trivia();
        if !self.eat(TokenKind::L_BRACE) {
            self.error("expected '{' after struct name", ErrorCode::E0307);
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        }

        let fields = self.parse_field_block();
        self.expect_closing_brace();

        Item::Struct(StructDecl {
            name,
            fields,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Enum = 'enum' Name '{' Member (',' Member)* ','? '}'
    fn parse_enum(&mut self) -> Item {
        let doc = self.take_doc();
        let start = self.current_range().start();
        self.bump(); // enum

        let Some(name) = self.parse_name("enum name") else {
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        };

        self.skip_trivia();
        if !self.eat(TokenKind::L_BRACE) {
            self.error("expected '{' after enum name", ErrorCode::E0307);
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        }

        let mut members = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() || self.at(TokenKind::R_BRACE) {
                break;
            }
            if let Some(member) = self.parse_enum_member() {
                members.push(member);
            }
            self.skip_trivia();
            if !self.eat(TokenKind::COMMA) && !self.at(TokenKind::R_BRACE) && !self.at_eof() {
                // One error per malformed member, then resync
                let (code, message) = self.classify_unexpected();
                self.recover(message, code);
            }
        }
        self.expect_closing_brace();

        Item::Enum(EnumDecl {
            name,
            members,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Member = Name ('=' '-'? Integer)?
    fn parse_enum_member(&mut self) -> Option<EnumMember> {
        let doc = self.take_doc();
        self.skip_trivia();
        let Some((text, range)) = self.bump_matching(TokenKind::IDENT) else {
            let (code, message) = self.classify_unexpected();
            self.recover(message, code);
            return None;
        };
        let name = Ident::new(text, range);
        let start = name.range.start();

        let mut tag = None;
        self.skip_trivia();
        if self.eat(TokenKind::EQ) {
            self.skip_trivia();
            let negative = self.eat(TokenKind::MINUS);
            self.skip_trivia();
            if let Some((text, _)) = self.bump_matching(TokenKind::INTEGER) {
                match text.parse::<i64>() {
                    Ok(value) => tag = Some(if negative { -value } else { value }),
                    Err(_) => {
                        self.error(
                            format!("enum tag `{text}` out of range"),
                            ErrorCode::E0104,
                        );
                    }
                }
            } else {
                self.error("expected integer tag after '='", ErrorCode::E0104);
            }
        }

        Some(EnumMember {
            name,
            tag,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Union = 'union' Name (':' Type)? '{' Field* '}'
    fn parse_union(&mut self) -> Item {
        let doc = self.take_doc();
        let start = self.current_range().start();
        self.bump(); // union

        let Some(name) = self.parse_name("union name") else {
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        };

        self.skip_trivia();
        let discriminant = if self.eat(TokenKind::COLON) {
            self.parse_type()
        } else {
            None
        };

        self.skip_trivia();
        if !self.eat(TokenKind::L_BRACE) {
            self.error("expected '{' after union declaration", ErrorCode::E0307);
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        }

        let arms = self.parse_field_block();
        self.expect_closing_brace();

        Item::Union(UnionDecl {
            name,
            discriminant,
            arms,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Service = ('interface' | 'service') Name '{' Method* '}'
    fn parse_service(&mut self) -> Item {
        let doc = self.take_doc();
        let start = self.current_range().start();
        let keyword = if self.current_kind() == TokenKind::SERVICE_KW {
            ServiceKeyword::Service
        } else {
            ServiceKeyword::Interface
        };
        self.bump();

        let Some(name) = self.parse_name("service name") else {
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        };

        self.skip_trivia();
        if !self.eat(TokenKind::L_BRACE) {
            self.error("expected '{' after service name", ErrorCode::E0307);
            let range = TextRange::new(start, self.last_end);
            return Item::Error(ErrorItem { range });
        }

        let mut methods = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() || self.at(TokenKind::R_BRACE) {
                break;
            }
            let pos_before = self.pos;
            if let Some(method) = self.parse_method() {
                methods.push(method);
            }
            if self.pos == pos_before && !self.at_eof() {
                let (code, message) = self.classify_unexpected();
                self.recover(message, code);
            }
        }
        self.expect_closing_brace();

        Item::Service(ServiceDecl {
            keyword,
            name,
            methods,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Method = Type Name '(' (Param (',' Param)*)? ')' ';'
    fn parse_method(&mut self) -> Option<MethodDecl> {
        let doc = self.take_doc();
        self.skip_trivia();
        if !self.current_kind().starts_type() {
            let (code, message) = self.classify_unexpected();
            self.recover(message, code);
            return None;
        }
        let start = self.current_range().start();
        let return_ty = self.parse_type()?;

        let name = self.parse_name("method name")?;

        self.skip_trivia();
        if !self.eat(TokenKind::L_PAREN) {
            self.recover("expected '(' after method name".to_string(), ErrorCode::E0304);
            return None;
        }

        let mut params = Vec::new();
        self.skip_trivia();
        if !self.at(TokenKind::R_PAREN) {
            loop {
                if let Some(param) = self.parse_param() {
                    params.push(param);
                }
                self.skip_trivia();
                if !self.eat(TokenKind::COMMA) {
                    break;
                }
            }
        }
        self.expect(TokenKind::R_PAREN, ErrorCode::E0205, "')'");
        self.expect(TokenKind::SEMICOLON, ErrorCode::E0201, "';' after method");

        Some(MethodDecl {
            return_ty,
            name,
            params,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Param = Type Name
    fn parse_param(&mut self) -> Option<ParamDecl> {
        self.skip_trivia();
        let start = self.current_range().start();
        let ty = self.parse_type()?;
        let name = self.parse_name("parameter name")?;
        Some(ParamDecl {
            ty,
            name,
            range: TextRange::new(start, self.last_end),
        })
    }

    /// Field* until `}` — shared by struct bodies and union bodies.
    fn parse_field_block(&mut self) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_eof() || self.at(TokenKind::R_BRACE) {
                break;
            }
            let pos_before = self.pos;
            if let Some(field) = self.parse_field() {
                fields.push(field);
            }
            if self.pos == pos_before && !self.at_eof() {
                let (code, message) = self.classify_unexpected();
                self.recover(message, code);
            }
        }
        fields
    }

    /// Field = Type Name ';'
    fn parse_field(&mut self) -> Option<FieldDecl> {
        let doc = self.take_doc();
        self.skip_trivia();
        if !self.current_kind().starts_type() {
            let (code, message) = self.classify_unexpected();
            self.recover(message, code);
            return None;
        }
        let start = self.current_range().start();
        let ty = self.parse_type()?;
        let name = self.parse_name("field name")?;
        self.expect(TokenKind::SEMICOLON, ErrorCode::E0201, "';' after field");

        Some(FieldDecl {
            ty,
            name,
            range: TextRange::new(start, self.last_end),
            doc,
        })
    }

    /// Type = Primitive | ('list' | 'sequence') '<' Type '>'
    ///      | 'optional' '<' Type '>' | Name ('.' Name)*
    /// with postfix bounded arrays: Type '[' Integer ']'
    ///
    /// `<` is always a type parameter here (never comparison): the grammar
    /// has no expression position, so one token of lookahead suffices.
    fn parse_type(&mut self) -> Option<TypeExpr> {
        self.skip_trivia();
        let start = self.current_range().start();

        let mut ty = match self.current_kind() {
            kind if kind.is_primitive() => {
                let range = self.current_range();
                self.bump();
                match PrimitiveType::from_token(kind) {
                    Some(prim) => TypeExpr::Primitive { prim, range },
                    None => {
                        self.error("expected a type", ErrorCode::E0305);
                        return None;
                    }
                }
            }
            TokenKind::LIST_KW | TokenKind::SEQUENCE_KW => {
                let keyword = if self.current_kind() == TokenKind::LIST_KW {
                    SequenceKeyword::List
                } else {
                    SequenceKeyword::Sequence
                };
                self.bump();
                let elem = self.parse_angle_bracketed()?;
                TypeExpr::Sequence {
                    keyword,
                    elem: Box::new(elem),
                    range: TextRange::new(start, self.last_end),
                }
            }
            TokenKind::OPTIONAL_KW => {
                self.bump();
                let elem = self.parse_angle_bracketed()?;
                TypeExpr::Optional {
                    elem: Box::new(elem),
                    range: TextRange::new(start, self.last_end),
                }
            }
            TokenKind::IDENT => {
                let mut path = Vec::new();
                if let Some((text, range)) = self.bump_matching(TokenKind::IDENT) {
                    path.push(Ident::new(text, range));
                }
                while self.at(TokenKind::DOT) {
                    self.bump();
                    if let Some((text, range)) = self.bump_matching(TokenKind::IDENT) {
                        path.push(Ident::new(text, range));
                    } else {
                        self.error("expected name after '.'", ErrorCode::E0301);
                        break;
                    }
                }
                TypeExpr::Named {
                    path,
                    range: TextRange::new(start, self.last_end),
                }
            }
            _ => {
                self.error("expected a type", ErrorCode::E0305);
                return None;
            }
        };

        // Postfix bounded arrays: T[N], possibly stacked
        loop {
            self.skip_trivia();
            if !self.at(TokenKind::L_BRACKET) {
                break;
            }
            self.bump();
            self.skip_trivia();
            let len = if let Some((text, _)) = self.bump_matching(TokenKind::INTEGER) {
                match text.parse::<u64>() {
                    Ok(value) => value,
                    Err(_) => {
                        self.error(
                            format!("array length `{text}` out of range"),
                            ErrorCode::E0104,
                        );
                        0
                    }
                }
            } else {
                self.error("expected array length", ErrorCode::E0308);
                0
            };
            self.expect(TokenKind::R_BRACKET, ErrorCode::E0205, "']'");
            ty = TypeExpr::Array {
                elem: Box::new(ty),
                len,
                range: TextRange::new(start, self.last_end),
            };
        }

        Some(ty)
    }

    /// '<' Type '>' after `list` / `sequence` / `optional`.
    fn parse_angle_bracketed(&mut self) -> Option<TypeExpr> {
        self.skip_trivia();
        if !self.eat(TokenKind::LT) {
            self.error("expected '<' after parametrized type", ErrorCode::E0206);
            return None;
        }
        let elem = self.parse_type()?;
        self.skip_trivia();
        if !self.eat(TokenKind::GT) {
            self.error("expected '>' to close type parameter", ErrorCode::E0206);
        }
        Some(elem)
    }

    /// A declared name; on failure, emits one error and resynchronizes.
    fn parse_name(&mut self, what: &str) -> Option<Ident> {
        self.skip_trivia();
        if let Some((text, range)) = self.bump_matching(TokenKind::IDENT) {
            Some(Ident::new(text, range))
        } else {
            self.recover(format!("expected {what}"), ErrorCode::E0301);
            None
        }
    }

    fn expect_closing_brace(&mut self) {
        self.skip_trivia();
        if !self.eat(TokenKind::R_BRACE) {
            let range = TextRange::empty(self.last_end);
            self.errors.push(
                SyntaxError::new("unclosed block", range, ErrorCode::E0202)
                    .with_hint("add a closing '}'"),
            );
        }
    }
}
