// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Parser
//!
//! Recursive-descent parser building [`Ast`] nodes for one source file.
//! Parsing is best-effort: errors are reported through the [`Reporter`]
//! and recovery resumes at the next declaration or statement boundary, so
//! a partial tree always materializes; the query engine depends on
//! having whatever did parse.
//!
//! Source references follow the front-end convention: declaration nodes
//! reference the declared *name* token, member accesses reference the
//! member name, and compound expressions span their full text.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use vala_lsp_ast::{
    Ast, BinaryOp, LiteralValue, Node, NodeId, NodeKind, SourceLocation, SourceReference, UnaryOp,
};

use crate::lexer::{self, Token, TokenKind};
use crate::report::Reporter;

/// Parse `text` into the arena, returning the file's root node.
///
/// The root is also registered with the arena so the locators can find
/// the file again.
pub fn parse_file(
    ast: &mut Ast,
    reporter: &mut Reporter,
    file: Arc<PathBuf>,
    text: &str,
) -> NodeId {
    let (tokens, lex_errors) = lexer::tokenize(text);
    for err in lex_errors {
        reporter.error(
            Some(SourceReference::new(
                Arc::clone(&file),
                err.begin,
                err.end,
            )),
            format!("syntax error, unexpected character `{}'", err.text),
        );
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        file,
        ast,
        reporter,
    };
    let root = parser.parse_root();
    parser.ast.add_root(root);
    root
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: Arc<PathBuf>,
    ast: &'a mut Ast,
    reporter: &'a mut Reporter,
}

impl Parser<'_> {
    // ----- token stream helpers -----

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) { self.advance() } else { None }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            let message = format!("syntax error, expected {}", what);
            self.error_here(message);
            None
        }
    }

    fn current_location(&self) -> SourceLocation {
        match self.peek() {
            Some(token) => token.begin,
            None => self
                .tokens
                .last()
                .map(|t| t.end)
                .unwrap_or(SourceLocation::new(1, 1)),
        }
    }

    fn error_here(&mut self, message: String) {
        let here = self.current_location();
        let sref = SourceReference::new(Arc::clone(&self.file), here, here);
        debug!("parse error at {}: {}", sref, message);
        self.reporter.error(Some(sref), message);
    }

    fn token_ref(&self, token: &Token) -> SourceReference {
        SourceReference::new(Arc::clone(&self.file), token.begin, token.end)
    }

    fn span_ref(&self, begin: SourceLocation, end: SourceLocation) -> SourceReference {
        SourceReference::new(Arc::clone(&self.file), begin, end)
    }

    fn node_begin(&self, node: NodeId) -> Option<SourceLocation> {
        self.ast.node(node).source_ref.as_ref().map(|s| s.begin)
    }

    // ----- recovery -----

    /// Skip a balanced `{ ... }` block. Assumes the opening brace is
    /// current.
    fn skip_balanced_block(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            self.advance();
            match kind {
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Resume after a broken declaration: at the next `;`, after a
    /// balanced block, or before a closing brace.
    fn recover_declaration(&mut self) {
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::OpenBrace => {
                    self.skip_balanced_block();
                    return;
                }
                TokenKind::CloseBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Resume after a broken statement: past the next `;`, or before a
    /// closing brace.
    fn recover_statement(&mut self) {
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::CloseBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ----- file root -----

    fn parse_root(&mut self) -> NodeId {
        let end = self
            .tokens
            .last()
            .map(|t| t.end)
            .unwrap_or(SourceLocation::new(1, 1));
        let sref = self.span_ref(SourceLocation::new(1, 1), end);

        let mut children = Vec::new();
        while self.peek().is_some() {
            if self.at(TokenKind::Using) {
                if let Some(node) = self.parse_using() {
                    children.push(node);
                }
                continue;
            }
            if self.at(TokenKind::CloseBrace) {
                self.error_here("syntax error, unexpected `}'".to_string());
                self.advance();
                continue;
            }
            match self.parse_declaration(None) {
                Some(node) => children.push(node),
                None => self.recover_declaration(),
            }
        }

        let root = self.ast.add_node(Node::new(NodeKind::SourceRoot, Some(sref)));
        self.ast.node_mut(root).children = children;
        root
    }

    fn parse_using(&mut self) -> Option<NodeId> {
        let keyword = self.expect(TokenKind::Using, "`using'")?;
        let name = self.expect(TokenKind::Identifier, "namespace name")?;
        self.expect(TokenKind::Semicolon, "`;'");

        let sref = self.span_ref(keyword.begin, name.end);
        Some(self.ast.add_node(Node::new(
            NodeKind::UsingDirective { name: name.text },
            Some(sref),
        )))
    }

    // ----- declarations -----

    fn skip_modifiers(&mut self) {
        while matches!(
            self.peek_kind(),
            Some(
                TokenKind::Public
                    | TokenKind::Private
                    | TokenKind::Protected
                    | TokenKind::Internal
                    | TokenKind::Static
                    | TokenKind::Abstract
                    | TokenKind::Virtual
                    | TokenKind::Override
            )
        ) {
            self.advance();
        }
    }

    /// Parse one declaration. `container` names the enclosing type, used
    /// to recognize creation methods.
    fn parse_declaration(&mut self, container: Option<&str>) -> Option<NodeId> {
        self.skip_modifiers();

        match self.peek_kind()? {
            TokenKind::Namespace => self.parse_namespace(),
            TokenKind::Class => self.parse_type_declaration(TokenKind::Class),
            TokenKind::Interface => self.parse_type_declaration(TokenKind::Interface),
            TokenKind::Struct => self.parse_type_declaration(TokenKind::Struct),
            TokenKind::Enum => self.parse_enum(),
            TokenKind::Errordomain => self.parse_errordomain(),
            TokenKind::Delegate => self.parse_delegate(),
            TokenKind::Signal => self.parse_signal(),
            TokenKind::Const => self.parse_constant(),
            TokenKind::Identifier | TokenKind::Void => {
                // A creation method has the enclosing type's name and no
                // return type.
                let is_creation = container.is_some_and(|container| {
                    self.peek().map(|t| t.text.as_str()) == Some(container)
                        && self.peek_kind_at(1) == Some(TokenKind::OpenParen)
                });
                if is_creation {
                    return self.parse_creation_method();
                }
                self.parse_typed_member()
            }
            _ => {
                self.error_here("syntax error, expected declaration".to_string());
                None
            }
        }
    }

    fn parse_namespace(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Namespace, "`namespace'")?;
        let name = self.expect(TokenKind::Identifier, "namespace name")?;
        self.expect(TokenKind::OpenBrace, "`{'")?;

        let mut children = Vec::new();
        while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
            if self.at(TokenKind::Using) {
                if let Some(node) = self.parse_using() {
                    children.push(node);
                }
                continue;
            }
            match self.parse_declaration(None) {
                Some(node) => children.push(node),
                None => self.recover_declaration(),
            }
        }
        self.expect(TokenKind::CloseBrace, "`}'");

        let node = self.ast.add_node(Node::new(
            NodeKind::Namespace {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    /// Class, interface, and struct share the same shape.
    fn parse_type_declaration(&mut self, keyword: TokenKind) -> Option<NodeId> {
        self.advance();
        let name = self.expect(TokenKind::Identifier, "type name")?;

        let mut children = Vec::new();
        if self.accept(TokenKind::Colon).is_some() {
            loop {
                if let Some(base) = self.parse_type() {
                    children.push(base);
                }
                if self.accept(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::OpenBrace, "`{'")?;
        while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
            match self.parse_declaration(Some(&name.text)) {
                Some(node) => children.push(node),
                None => self.recover_declaration(),
            }
        }
        self.expect(TokenKind::CloseBrace, "`}'");

        let kind = match keyword {
            TokenKind::Interface => NodeKind::Interface {
                name: name.text.clone(),
            },
            TokenKind::Struct => NodeKind::Struct {
                name: name.text.clone(),
            },
            _ => NodeKind::Class {
                name: name.text.clone(),
            },
        };
        let node = self
            .ast
            .add_node(Node::new(kind, Some(self.token_ref(&name))));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_enum(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Enum, "`enum'")?;
        let name = self.expect(TokenKind::Identifier, "enum name")?;
        self.expect(TokenKind::OpenBrace, "`{'")?;

        let mut children = Vec::new();

        // Value list, then optionally `;` followed by members.
        while self.at(TokenKind::Identifier) {
            let value = self.advance()?;
            let node = self.ast.add_node(Node::new(
                NodeKind::EnumValue {
                    name: value.text.clone(),
                },
                Some(self.token_ref(&value)),
            ));
            if self.accept(TokenKind::Assign).is_some() {
                if let Some(expr) = self.parse_expression() {
                    self.ast.node_mut(node).children.push(expr);
                }
            }
            children.push(node);
            if self.accept(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.accept(TokenKind::Semicolon).is_some() {
            while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
                match self.parse_declaration(Some(&name.text)) {
                    Some(node) => children.push(node),
                    None => self.recover_declaration(),
                }
            }
        }
        self.expect(TokenKind::CloseBrace, "`}'");

        let node = self.ast.add_node(Node::new(
            NodeKind::Enum {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_errordomain(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Errordomain, "`errordomain'")?;
        let name = self.expect(TokenKind::Identifier, "error domain name")?;
        self.expect(TokenKind::OpenBrace, "`{'")?;

        let mut children = Vec::new();
        while self.at(TokenKind::Identifier) {
            let code = self.advance()?;
            children.push(self.ast.add_node(Node::new(
                NodeKind::ErrorCode {
                    name: code.text.clone(),
                },
                Some(self.token_ref(&code)),
            )));
            if self.accept(TokenKind::Comma).is_none() {
                break;
            }
        }

        // Methods may follow the code list after a `;`.
        if self.accept(TokenKind::Semicolon).is_some() {
            while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
                match self.parse_declaration(Some(&name.text)) {
                    Some(node) => children.push(node),
                    None => self.recover_declaration(),
                }
            }
        }
        self.expect(TokenKind::CloseBrace, "`}'");

        let node = self.ast.add_node(Node::new(
            NodeKind::ErrorDomain {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_delegate(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Delegate, "`delegate'")?;
        let return_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "delegate name")?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::Delegate {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = std::iter::once(return_type)
            .chain(params)
            .collect();
        Some(node)
    }

    fn parse_signal(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Signal, "`signal'")?;
        let return_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "signal name")?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::Signal {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = std::iter::once(return_type)
            .chain(params)
            .collect();
        Some(node)
    }

    fn parse_constant(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Const, "`const'")?;
        let const_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "constant name")?;

        let mut children = vec![const_type];
        if self.accept(TokenKind::Assign).is_some() {
            if let Some(expr) = self.parse_expression() {
                children.push(expr);
            }
        }
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::Constant {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_creation_method(&mut self) -> Option<NodeId> {
        let name = self.expect(TokenKind::Identifier, "type name")?;
        let params = self.parse_parameter_list()?;
        let body = if self.at(TokenKind::OpenBrace) {
            self.parse_block()
        } else {
            self.expect(TokenKind::Semicolon, "`;'");
            None
        };

        let node = self.ast.add_node(Node::new(
            NodeKind::CreationMethod {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = params.into_iter().chain(body).collect();
        Some(node)
    }

    /// Member starting with a type: a method, a property, or a field.
    fn parse_typed_member(&mut self) -> Option<NodeId> {
        let member_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "member name")?;

        match self.peek_kind() {
            Some(TokenKind::OpenParen) => {
                let params = self.parse_parameter_list()?;
                let body = if self.at(TokenKind::OpenBrace) {
                    self.parse_block()
                } else {
                    self.expect(TokenKind::Semicolon, "`;'");
                    None
                };
                let node = self.ast.add_node(Node::new(
                    NodeKind::Method {
                        name: name.text.clone(),
                    },
                    Some(self.token_ref(&name)),
                ));
                self.ast.node_mut(node).children = std::iter::once(member_type)
                    .chain(params)
                    .chain(body)
                    .collect();
                Some(node)
            }
            Some(TokenKind::OpenBrace) => {
                self.advance();
                while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
                    match self.peek_kind() {
                        Some(TokenKind::Get | TokenKind::Set) => {
                            self.advance();
                            self.expect(TokenKind::Semicolon, "`;'");
                        }
                        _ => {
                            self.error_here(
                                "syntax error, expected `get' or `set'".to_string(),
                            );
                            self.recover_statement();
                        }
                    }
                }
                self.expect(TokenKind::CloseBrace, "`}'");

                let node = self.ast.add_node(Node::new(
                    NodeKind::Property {
                        name: name.text.clone(),
                    },
                    Some(self.token_ref(&name)),
                ));
                self.ast.node_mut(node).children = vec![member_type];
                Some(node)
            }
            _ => {
                let mut children = vec![member_type];
                if self.accept(TokenKind::Assign).is_some() {
                    if let Some(expr) = self.parse_expression() {
                        children.push(expr);
                    }
                }
                self.expect(TokenKind::Semicolon, "`;'");

                let node = self.ast.add_node(Node::new(
                    NodeKind::Field {
                        name: name.text.clone(),
                    },
                    Some(self.token_ref(&name)),
                ));
                self.ast.node_mut(node).children = children;
                Some(node)
            }
        }
    }

    fn parse_parameter_list(&mut self) -> Option<Vec<NodeId>> {
        self.expect(TokenKind::OpenParen, "`('")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::CloseParen) {
            loop {
                let param_type = self.parse_type()?;
                let name = self.expect(TokenKind::Identifier, "parameter name")?;
                let node = self.ast.add_node(Node::new(
                    NodeKind::Parameter {
                        name: name.text.clone(),
                    },
                    Some(self.token_ref(&name)),
                ));
                self.ast.node_mut(node).children = vec![param_type];
                params.push(node);
                if self.accept(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen, "`)'")?;
        Some(params)
    }

    /// A type annotation: dotted segments, pointer stars, an optional
    /// nullable marker.
    fn parse_type(&mut self) -> Option<NodeId> {
        if let Some(void) = self.accept(TokenKind::Void) {
            let node = self.ast.add_node(Node::new(
                NodeKind::TypeReference {
                    segments: vec!["void".to_string()],
                    pointer: 0,
                },
                Some(self.token_ref(&void)),
            ));
            return Some(node);
        }

        let first = self.expect(TokenKind::Identifier, "type name")?;
        let begin = first.begin;
        let mut end = first.end;
        let mut segments = vec![first.text];

        while self.at(TokenKind::Dot) && self.peek_kind_at(1) == Some(TokenKind::Identifier) {
            self.advance();
            if let Some(segment) = self.advance() {
                end = segment.end;
                segments.push(segment.text);
            }
        }

        let mut pointer = 0;
        while let Some(star) = self.accept(TokenKind::Star) {
            end = star.end;
            pointer += 1;
        }
        if let Some(question) = self.accept(TokenKind::Question) {
            // Nullability does not affect member lookup.
            end = question.end;
        }

        let node = self.ast.add_node(Node::new(
            NodeKind::TypeReference { segments, pointer },
            Some(self.span_ref(begin, end)),
        ));
        Some(node)
    }

    // ----- statements -----

    fn parse_block(&mut self) -> Option<NodeId> {
        let open = self.expect(TokenKind::OpenBrace, "`{'")?;
        let mut children = Vec::new();
        while !self.at(TokenKind::CloseBrace) && self.peek().is_some() {
            match self.parse_statement() {
                Some(node) => children.push(node),
                None => self.recover_statement(),
            }
        }
        let end = match self.expect(TokenKind::CloseBrace, "`}'") {
            Some(close) => close.end,
            None => self.current_location(),
        };

        let node = self
            .ast
            .add_node(Node::new(NodeKind::Block, Some(self.span_ref(open.begin, end))));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_statement(&mut self) -> Option<NodeId> {
        match self.peek_kind()? {
            TokenKind::OpenBrace => self.parse_block(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Var => self.parse_inferred_local(),
            _ if self.looks_like_local_declaration() => self.parse_typed_local(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "`;'");
                // Expression statements carry no reference of their own;
                // cursor queries should land on the expression.
                let node = self
                    .ast
                    .add_node(Node::new(NodeKind::ExpressionStatement, None));
                self.ast.node_mut(node).children = vec![expr];
                Some(node)
            }
        }
    }

    /// Lookahead for `Type name =` / `Type name ;` shapes, which are the
    /// only way to tell a typed local from an expression statement.
    fn looks_like_local_declaration(&self) -> bool {
        if self.peek_kind() != Some(TokenKind::Identifier) {
            return false;
        }
        let mut offset = 1;
        while self.peek_kind_at(offset) == Some(TokenKind::Dot)
            && self.peek_kind_at(offset + 1) == Some(TokenKind::Identifier)
        {
            offset += 2;
        }
        while self.peek_kind_at(offset) == Some(TokenKind::Star) {
            offset += 1;
        }
        if self.peek_kind_at(offset) == Some(TokenKind::Question) {
            offset += 1;
        }
        self.peek_kind_at(offset) == Some(TokenKind::Identifier)
            && matches!(
                self.peek_kind_at(offset + 1),
                Some(TokenKind::Assign | TokenKind::Semicolon)
            )
    }

    fn parse_return(&mut self) -> Option<NodeId> {
        let keyword = self.expect(TokenKind::Return, "`return'")?;
        let mut children = Vec::new();
        let mut end = keyword.end;
        if !self.at(TokenKind::Semicolon) {
            if let Some(expr) = self.parse_expression() {
                if let Some(sref) = self.ast.node(expr).source_ref.as_ref() {
                    end = sref.end;
                }
                children.push(expr);
            }
        }
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::ReturnStatement,
            Some(self.span_ref(keyword.begin, end)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_if(&mut self) -> Option<NodeId> {
        let keyword = self.expect(TokenKind::If, "`if'")?;
        self.expect(TokenKind::OpenParen, "`('")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::CloseParen, "`)'")?;
        let then_branch = self.parse_statement()?;

        let mut children = vec![condition, then_branch];
        let mut end = self
            .ast
            .node(then_branch)
            .source_ref
            .as_ref()
            .map(|s| s.end)
            .unwrap_or(keyword.end);
        if self.accept(TokenKind::Else).is_some() {
            if let Some(else_branch) = self.parse_statement() {
                if let Some(sref) = self.ast.node(else_branch).source_ref.as_ref() {
                    end = sref.end;
                }
                children.push(else_branch);
            }
        }

        let node = self.ast.add_node(Node::new(
            NodeKind::IfStatement,
            Some(self.span_ref(keyword.begin, end)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    fn parse_while(&mut self) -> Option<NodeId> {
        let keyword = self.expect(TokenKind::While, "`while'")?;
        self.expect(TokenKind::OpenParen, "`('")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::CloseParen, "`)'")?;
        let body = self.parse_statement()?;

        let end = self
            .ast
            .node(body)
            .source_ref
            .as_ref()
            .map(|s| s.end)
            .unwrap_or(keyword.end);
        let node = self.ast.add_node(Node::new(
            NodeKind::WhileStatement,
            Some(self.span_ref(keyword.begin, end)),
        ));
        self.ast.node_mut(node).children = vec![condition, body];
        Some(node)
    }

    fn parse_for(&mut self) -> Option<NodeId> {
        let keyword = self.expect(TokenKind::For, "`for'")?;
        self.expect(TokenKind::OpenParen, "`('")?;

        let mut children = Vec::new();
        if !self.at(TokenKind::Semicolon) {
            let init = if self.at(TokenKind::Var) {
                self.parse_inferred_local()
            } else if self.looks_like_local_declaration() {
                self.parse_typed_local()
            } else {
                let expr = self.parse_expression();
                self.expect(TokenKind::Semicolon, "`;'");
                expr
            };
            children.extend(init);
        } else {
            self.advance();
        }
        if !self.at(TokenKind::Semicolon) {
            children.extend(self.parse_expression());
        }
        self.expect(TokenKind::Semicolon, "`;'");
        if !self.at(TokenKind::CloseParen) {
            children.extend(self.parse_expression());
        }
        self.expect(TokenKind::CloseParen, "`)'")?;

        let body = self.parse_statement()?;
        let end = self
            .ast
            .node(body)
            .source_ref
            .as_ref()
            .map(|s| s.end)
            .unwrap_or(keyword.end);
        children.push(body);

        let node = self.ast.add_node(Node::new(
            NodeKind::ForStatement,
            Some(self.span_ref(keyword.begin, end)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    /// `var name = expression;`
    fn parse_inferred_local(&mut self) -> Option<NodeId> {
        self.expect(TokenKind::Var, "`var'")?;
        let name = self.expect(TokenKind::Identifier, "variable name")?;
        self.expect(TokenKind::Assign, "`='")?;
        let initializer = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::LocalVariable {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = vec![initializer];
        Some(node)
    }

    /// `Type name;` or `Type name = expression;`
    fn parse_typed_local(&mut self) -> Option<NodeId> {
        let local_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "variable name")?;

        let mut children = vec![local_type];
        if self.accept(TokenKind::Assign).is_some() {
            if let Some(initializer) = self.parse_expression() {
                children.push(initializer);
            }
        }
        self.expect(TokenKind::Semicolon, "`;'");

        let node = self.ast.add_node(Node::new(
            NodeKind::LocalVariable {
                name: name.text.clone(),
            },
            Some(self.token_ref(&name)),
        ));
        self.ast.node_mut(node).children = children;
        Some(node)
    }

    // ----- expressions -----

    fn parse_expression(&mut self) -> Option<NodeId> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<NodeId> {
        let left = self.parse_binary(0)?;
        if self.accept(TokenKind::Assign).is_none() {
            return Some(left);
        }
        let right = self.parse_assignment()?;

        let begin = self.node_begin(left);
        let end = self.ast.node(right).source_ref.as_ref().map(|s| s.end);
        let sref = match (begin, end) {
            (Some(begin), Some(end)) => Some(self.span_ref(begin, end)),
            _ => None,
        };
        let node = self.ast.add_node(Node::new(NodeKind::Assignment, sref));
        self.ast.node_mut(node).children = vec![left, right];
        Some(node)
    }

    fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
        match kind {
            TokenKind::OrOr => Some((BinaryOp::Or, 1)),
            TokenKind::AndAnd => Some((BinaryOp::And, 2)),
            TokenKind::Equal => Some((BinaryOp::Equal, 3)),
            TokenKind::NotEqual => Some((BinaryOp::NotEqual, 3)),
            TokenKind::Less => Some((BinaryOp::Less, 4)),
            TokenKind::LessOrEqual => Some((BinaryOp::LessOrEqual, 4)),
            TokenKind::Greater => Some((BinaryOp::Greater, 4)),
            TokenKind::GreaterOrEqual => Some((BinaryOp::GreaterOrEqual, 4)),
            TokenKind::Plus => Some((BinaryOp::Add, 5)),
            TokenKind::Minus => Some((BinaryOp::Subtract, 5)),
            TokenKind::Star => Some((BinaryOp::Multiply, 6)),
            TokenKind::Slash => Some((BinaryOp::Divide, 6)),
            TokenKind::Percent => Some((BinaryOp::Modulo, 6)),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Option<NodeId> {
        let mut left = self.parse_unary()?;
        while let Some(kind) = self.peek_kind() {
            let Some((op, precedence)) = Self::binary_op(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;

            let begin = self.node_begin(left);
            let end = self.ast.node(right).source_ref.as_ref().map(|s| s.end);
            let sref = match (begin, end) {
                (Some(begin), Some(end)) => Some(self.span_ref(begin, end)),
                _ => None,
            };
            let node = self.ast.add_node(Node::new(NodeKind::Binary { op }, sref));
            self.ast.node_mut(node).children = vec![left, right];
            left = node;
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => Some(UnaryOp::Minus),
            Some(TokenKind::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };

        let token = self.advance()?;
        let operand = self.parse_unary()?;
        let end = self
            .ast
            .node(operand)
            .source_ref
            .as_ref()
            .map(|s| s.end)
            .unwrap_or(token.end);
        let node = self.ast.add_node(Node::new(
            NodeKind::Unary { op },
            Some(self.span_ref(token.begin, end)),
        ));
        self.ast.node_mut(node).children = vec![operand];
        Some(node)
    }

    fn parse_postfix(&mut self) -> Option<NodeId> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot | TokenKind::Arrow) => {
                    let pointer = self.at(TokenKind::Arrow);
                    let operator = self.advance()?;
                    let Some(name) = self.accept(TokenKind::Identifier) else {
                        // A trailing access with no member yet; typical
                        // while the user is still typing. Keep a nameless
                        // access spanning through the operator so cursor
                        // queries find something there.
                        self.error_here("syntax error, expected member name".to_string());
                        let begin = self.node_begin(expr).unwrap_or(operator.begin);
                        let node = self.ast.add_node(Node::new(
                            NodeKind::MemberAccess {
                                member: String::new(),
                                pointer,
                            },
                            Some(self.span_ref(begin, operator.end)),
                        ));
                        self.ast.node_mut(node).children = vec![expr];
                        return Some(node);
                    };
                    let node = self.ast.add_node(Node::new(
                        NodeKind::MemberAccess {
                            member: name.text.clone(),
                            pointer,
                        },
                        Some(self.token_ref(&name)),
                    ));
                    self.ast.node_mut(node).children = vec![expr];
                    expr = node;
                }
                Some(TokenKind::OpenParen) => {
                    self.advance();
                    let mut children = vec![expr];
                    if !self.at(TokenKind::CloseParen) {
                        loop {
                            match self.parse_expression() {
                                Some(arg) => children.push(arg),
                                None => break,
                            }
                            if self.accept(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let close = self.expect(TokenKind::CloseParen, "`)'");

                    let begin = self.node_begin(expr);
                    let end = close.map(|t| t.end);
                    let sref = match (begin, end) {
                        (Some(begin), Some(end)) => Some(self.span_ref(begin, end)),
                        _ => None,
                    };
                    let node = self.ast.add_node(Node::new(NodeKind::MethodCall, sref));
                    self.ast.node_mut(node).children = children;
                    expr = node;
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        let token = self.peek().cloned()?;
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.text.parse::<i64>().unwrap_or_default();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Integer(value),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::RealLiteral => {
                self.advance();
                let value = token.text.parse::<f64>().unwrap_or_default();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Real(value),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::StringLiteral => {
                self.advance();
                let inner = token.text[1..token.text.len() - 1].to_string();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::String(inner),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::CharLiteral => {
                self.advance();
                let value = token.text.chars().nth(1).unwrap_or('\0');
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Character(value),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Boolean(token.kind == TokenKind::True),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::Null => {
                self.advance();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Null,
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::This => {
                self.advance();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Identifier {
                        name: "this".to_string(),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::Identifier => {
                self.advance();
                Some(self.ast.add_node(Node::new(
                    NodeKind::Identifier {
                        name: token.text.clone(),
                    },
                    Some(self.token_ref(&token)),
                )))
            }
            TokenKind::New => {
                self.advance();
                let created_type = self.parse_type()?;
                let mut children = vec![created_type];
                let mut end = self
                    .ast
                    .node(created_type)
                    .source_ref
                    .as_ref()
                    .map(|s| s.end)
                    .unwrap_or(token.end);
                if self.accept(TokenKind::OpenParen).is_some() {
                    if !self.at(TokenKind::CloseParen) {
                        loop {
                            match self.parse_expression() {
                                Some(arg) => children.push(arg),
                                None => break,
                            }
                            if self.accept(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    if let Some(close) = self.expect(TokenKind::CloseParen, "`)'") {
                        end = close.end;
                    }
                }
                let node = self.ast.add_node(Node::new(
                    NodeKind::ObjectCreation,
                    Some(self.span_ref(token.begin, end)),
                ));
                self.ast.node_mut(node).children = children;
                Some(node)
            }
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::CloseParen, "`)'");
                Some(inner)
            }
            _ => {
                self.error_here("syntax error, expected expression".to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vala_lsp_ast::visitor::{Collect, collect};

    fn parse(text: &str) -> (Ast, Reporter, NodeId) {
        let mut ast = Ast::new();
        let mut reporter = Reporter::new();
        let file = Arc::new(PathBuf::from("/test.vala"));
        let root = parse_file(&mut ast, &mut reporter, file, text);
        (ast, reporter, root)
    }

    struct ByPredicate<F>(F);

    impl<F: Fn(&NodeKind) -> bool> Collect for ByPredicate<F> {
        type Output = NodeId;

        fn matches(&self, ast: &Ast, node: NodeId) -> bool {
            (self.0)(&ast.node(node).kind)
        }

        fn project(&self, _ast: &Ast, node: NodeId) -> NodeId {
            node
        }
    }

    fn find(ast: &Ast, root: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        collect(ast, root, &ByPredicate(pred))
    }

    #[test]
    fn test_parse_class_with_members() {
        let (ast, reporter, root) = parse(
            "class Foo {\n    public int a;\n    public void bar () {\n    }\n}\n",
        );
        assert_eq!(reporter.error_count(), 0);

        let classes = find(&ast, root, |k| matches!(k, NodeKind::Class { .. }));
        assert_eq!(classes.len(), 1);

        // The class node references its name token.
        let sref = ast.node(classes[0]).source_ref.as_ref().unwrap();
        assert_eq!(sref.begin, SourceLocation::new(1, 7));
        assert_eq!(sref.end, SourceLocation::new(1, 9));

        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::Field { .. })).len(),
            1
        );
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::Method { .. })).len(),
            1
        );
    }

    #[test]
    fn test_local_declaration_references_name() {
        let (ast, reporter, root) = parse("void main () {\n    int x = 3;\n}\n");
        assert_eq!(reporter.error_count(), 0);

        let locals = find(&ast, root, |k| matches!(k, NodeKind::LocalVariable { .. }));
        assert_eq!(locals.len(), 1);

        let sref = ast.node(locals[0]).source_ref.as_ref().unwrap();
        assert_eq!(sref.begin, SourceLocation::new(2, 9));
        assert_eq!(sref.end, SourceLocation::new(2, 9));
    }

    #[test]
    fn test_member_access_references_member_name() {
        let (ast, reporter, root) = parse("void main () {\n    obj.field = 1;\n}\n");
        assert_eq!(reporter.error_count(), 0);

        let accesses = find(&ast, root, |k| matches!(k, NodeKind::MemberAccess { .. }));
        assert_eq!(accesses.len(), 1);

        // Reference covers "field", columns 9..=13 on line 2.
        let sref = ast.node(accesses[0]).source_ref.as_ref().unwrap();
        assert_eq!(sref.begin, SourceLocation::new(2, 9));
        assert_eq!(sref.end, SourceLocation::new(2, 13));
    }

    #[test]
    fn test_pointer_member_access() {
        let (ast, _, root) = parse("void main () {\n    p->x = 1;\n}\n");
        let accesses = find(&ast, root, |k| matches!(k, NodeKind::MemberAccess { .. }));
        assert_eq!(accesses.len(), 1);
        assert!(matches!(
            ast.node(accesses[0]).kind,
            NodeKind::MemberAccess { pointer: true, .. }
        ));
    }

    #[test]
    fn test_trailing_dot_recovers_nameless_access() {
        let (ast, reporter, root) = parse("void main () {\n    obj.\n}\n");
        assert!(reporter.error_count() >= 1);

        // The nameless access spans `obj.` so cursor queries find it.
        let accesses = find(&ast, root, |k| {
            matches!(k, NodeKind::MemberAccess { member, .. } if member.is_empty())
        });
        assert_eq!(accesses.len(), 1);
        let sref = ast.node(accesses[0]).source_ref.as_ref().unwrap();
        assert_eq!(sref.begin, SourceLocation::new(2, 5));
        assert_eq!(sref.end, SourceLocation::new(2, 8));

        let identifiers = find(&ast, root, |k| {
            matches!(k, NodeKind::Identifier { name } if name == "obj")
        });
        assert_eq!(identifiers.len(), 1);
    }

    #[test]
    fn test_enum_and_errordomain() {
        let (ast, reporter, root) = parse(
            "enum Color { RED, GREEN, BLUE }\nerrordomain IoError { NOT_FOUND, DENIED }\n",
        );
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::EnumValue { .. })).len(),
            3
        );
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::ErrorCode { .. })).len(),
            2
        );
    }

    #[test]
    fn test_creation_method_is_recognized() {
        let (ast, reporter, root) = parse("class Foo {\n    public Foo () {\n    }\n}\n");
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::CreationMethod { .. })).len(),
            1
        );
        assert!(find(&ast, root, |k| matches!(k, NodeKind::Method { .. })).is_empty());
    }

    #[test]
    fn test_var_declaration() {
        let (ast, reporter, root) = parse("void main () {\n    var f = new Foo ();\n}\n");
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::LocalVariable { .. })).len(),
            1
        );
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::ObjectCreation)).len(),
            1
        );
    }

    #[test]
    fn test_broken_declaration_recovers() {
        let (ast, reporter, root) = parse(
            "class 123 {\n}\nclass Ok {\n    public int a;\n}\n",
        );
        assert!(reporter.error_count() >= 1);

        // The second class still parsed.
        let classes = find(&ast, root, |k| matches!(k, NodeKind::Class { .. }));
        assert_eq!(classes.len(), 1);
    }

    #[test]
    fn test_property_and_signal() {
        let (ast, reporter, root) = parse(
            "class Foo {\n    public int size { get; set; }\n    public signal void changed ();\n}\n",
        );
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::Property { .. })).len(),
            1
        );
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::Signal { .. })).len(),
            1
        );
    }

    #[test]
    fn test_using_directive() {
        let (ast, reporter, root) = parse("using GLib;\n");
        assert_eq!(reporter.error_count(), 0);
        assert_eq!(
            find(&ast, root, |k| matches!(k, NodeKind::UsingDirective { .. })).len(),
            1
        );
    }

    #[test]
    fn test_namespace_nesting() {
        let (ast, reporter, root) = parse(
            "namespace App {\n    class Widget {\n    }\n}\n",
        );
        assert_eq!(reporter.error_count(), 0);

        let namespaces = find(&ast, root, |k| matches!(k, NodeKind::Namespace { .. }));
        assert_eq!(namespaces.len(), 1);
        // The class is a child of the namespace node.
        let children = &ast.node(namespaces[0]).children;
        assert_eq!(children.len(), 1);
    }
}
