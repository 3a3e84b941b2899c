// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Lexer
//!
//! Logos-derived tokenizer for the Vala surface syntax. Tokens carry
//! their byte span plus 1-based begin/end locations; columns count UTF-8
//! code units, matching the byte-oriented convention used across the
//! server.

use std::ops::Range;

use logos::Logos;

use vala_lsp_ast::SourceLocation;

/// Token variants.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*(?:[^*]|\*[^/])*\*/")]
pub enum TokenKind {
    // Declarations
    #[token("namespace")]
    Namespace,
    #[token("using")]
    Using,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("errordomain")]
    Errordomain,
    #[token("delegate")]
    Delegate,
    #[token("signal")]
    Signal,
    #[token("const")]
    Const,
    #[token("var")]
    Var,

    // Modifiers (parsed and discarded; they do not affect queries)
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("internal")]
    Internal,
    #[token("static")]
    Static,
    #[token("abstract")]
    Abstract,
    #[token("virtual")]
    Virtual,
    #[token("override")]
    Override,

    // Statements and expressions
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("void")]
    Void,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("get")]
    Get,
    #[token("set")]
    Set,

    // Punctuation
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessOrEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterOrEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Literals and names
    #[regex(r"[0-9]+\.[0-9]+")]
    RealLiteral,
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r"'([^'\\\n]|\\.)'")]
    CharLiteral,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
}

/// One lexed token with its text and position.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Range<usize>,
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

/// A span the lexer could not tokenize.
#[derive(Debug, Clone)]
pub struct LexError {
    pub text: String,
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

/// Byte offsets of line starts, for span → location conversion.
#[derive(Debug)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index `text`.
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    /// The 1-based location of the byte at `offset`.
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = match self.starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        SourceLocation::new(line as u32 + 1, (offset - self.starts[line]) as u32 + 1)
    }
}

/// Tokenize `text`, returning the token stream and any unlexable spans.
pub fn tokenize(text: &str) -> (Vec<Token>, Vec<LexError>) {
    let index = LineIndex::new(text);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut lexer = TokenKind::lexer(text);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let begin = index.location(span.start);
        let end = index.location(span.end.saturating_sub(1).max(span.start));
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice().to_string(),
                span,
                begin,
                end,
            }),
            Err(()) => errors.push(LexError {
                text: lexer.slice().to_string(),
                begin,
                end,
            }),
        }
    }

    (tokens, errors)
}
