// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser building the postorder parse tree.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - the parser always produces a tree
//! - **Multiple errors** - report them all, never stop at the first
//! - **Precise spans** - every diagnostic points at an exact token
//! - **Synchronization points** - recover at `;`, `}`, and declaration
//!   introducers
//!
//! # Postorder Emission
//!
//! Productions append their child nodes first and their own node last, so
//! the node array is postorder by construction. Each production remembers
//! where it started (`mark`) and closes with
//! `subtree_size = nodes.len() - mark + 1`.
//!
//! # Binary Operator Precedence (Pratt Parsing)
//!
//! Infix expressions use a binding-power table rather than one grammar
//! rule per precedence level:
//!
//! | Level | Operators             | Associativity |
//! |-------|-----------------------|---------------|
//! | 5     | `or`                  | Left |
//! | 10    | `and`                 | Left |
//! | 15    | `==` `!=`             | Left |
//! | 20    | `<` `<=` `>` `>=`     | Left |
//! | 30    | `+` `-`               | Left |
//! | 40    | `*` `/` `%`           | Left |
//!
//! Prefix `not`/`-` bind at 50, and the postfix forms (call, index,
//! member access) bind tightest of all. To add an operator, add an entry
//! to [`infix_binding_power`].

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::source_analysis::{TokenIndex, TokenKind, TokenizedBuffer};

use super::{NodeId, ParseNode, ParseNodeKind, ParseTree};

/// Diagnostic code for parse errors.
const SYNTAX_ERROR: &str = "syntax-error";

/// Binding power for infix operators (Pratt parsing).
///
/// Higher values bind tighter. Left- and right-hand powers differ to
/// encode associativity: left-associative operators use
/// `right == left + 1`.
#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }
}

/// Binding power of prefix `not` and `-`.
const PREFIX_BINDING_POWER: u8 = 50;

/// Gets the binding power for an infix operator token.
///
/// Returns `None` for anything else, which ends the expression - handy
/// for error recovery, since an unexpected token simply terminates the
/// production instead of derailing it.
fn infix_binding_power(kind: TokenKind) -> Option<BindingPower> {
    let power = match kind {
        TokenKind::Or => BindingPower::left_assoc(5),
        TokenKind::And => BindingPower::left_assoc(10),
        TokenKind::EqualEqual | TokenKind::NotEqual => BindingPower::left_assoc(15),
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            BindingPower::left_assoc(20)
        }
        TokenKind::Plus | TokenKind::Minus => BindingPower::left_assoc(30),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => BindingPower::left_assoc(40),
        _ => return None,
    };
    Some(power)
}

/// The parser state.
///
/// The sink borrow (`'s`) is deliberately independent of the token buffer
/// borrow (`'a`): the returned tree holds onto the tokens, not the sink.
pub(super) struct Parser<'a, 's> {
    tokens: &'a TokenizedBuffer<'a>,
    sink: &'s mut dyn DiagnosticSink,
    nodes: Vec<ParseNode>,
    /// Current token position.
    position: usize,
    /// True once any node was emitted with `has_error`.
    has_errors: bool,
}

impl<'a, 's> Parser<'a, 's> {
    /// Parses a whole token stream into a tree.
    pub(super) fn parse(
        tokens: &'a TokenizedBuffer<'a>,
        sink: &'s mut dyn DiagnosticSink,
    ) -> ParseTree<'a> {
        let mut parser = Parser {
            tokens,
            sink,
            nodes: Vec::new(),
            position: 0,
            has_errors: false,
        };
        parser.parse_file();
        ParseTree::new(tokens, parser.nodes, parser.has_errors)
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    fn current_token(&self) -> TokenIndex {
        self.tokens.token_at(self.position)
    }

    /// Returns the current token's kind.
    fn current_kind(&self) -> TokenKind {
        self.tokens.kind(self.current_token())
    }

    /// Checks if the parser has reached the end-of-file token.
    fn at_end(&self) -> bool {
        self.current_kind().is_file_end()
    }

    /// Advances to the next token and returns the previous one. Never
    /// advances past the end-of-file token.
    fn advance(&mut self) -> TokenIndex {
        let token = self.current_token();
        if !self.at_end() {
            self.position += 1;
        }
        token
    }

    /// Consumes and returns the current token if it has the given kind.
    fn consume_if(&mut self, kind: TokenKind) -> Option<TokenIndex> {
        (self.current_kind() == kind).then(|| self.advance())
    }

    /// Consumes a token of the given kind, or emits `message` and returns
    /// `None` without consuming anything.
    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<TokenIndex> {
        let token = self.consume_if(kind);
        if token.is_none() {
            self.error(message);
        }
        token
    }

    /// Emits a parse error at the current token.
    fn error(&mut self, message: &str) {
        let span = self.tokens.span(self.current_token());
        self.sink
            .emit(Diagnostic::error(SYNTAX_ERROR, message.to_string(), span));
    }

    // ========================================================================
    // Node Emission
    // ========================================================================

    /// Marks the start of a production: children emitted after this point
    /// belong to the node closed by the matching [`Self::push_node`].
    fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Closes a production: everything emitted since `mark` becomes the
    /// new node's subtree.
    fn push_node(
        &mut self,
        kind: ParseNodeKind,
        token: TokenIndex,
        mark: usize,
        has_error: bool,
    ) -> NodeId {
        let subtree_size = (self.nodes.len() - mark + 1) as u32;
        self.has_errors |= has_error;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ParseNode {
            kind,
            token,
            subtree_size,
            has_error,
        });
        id
    }

    /// Emits a childless node.
    fn push_leaf(&mut self, kind: ParseNodeKind, token: TokenIndex) -> NodeId {
        let mark = self.mark();
        self.push_node(kind, token, mark, false)
    }

    /// Emits an `Error` leaf for a token that could not be parsed.
    fn push_error_leaf(&mut self, token: TokenIndex) -> NodeId {
        let mark = self.mark();
        self.push_node(ParseNodeKind::Error, token, mark, true)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// file ::= declaration* FileEnd
    fn parse_file(&mut self) {
        let mark = self.mark();
        while !self.at_end() {
            self.parse_declaration();
        }
        let file_end = self.current_token();
        self.push_node(ParseNodeKind::File, file_end, mark, false);
    }

    fn parse_declaration(&mut self) {
        match self.current_kind() {
            TokenKind::Fn => self.parse_function_declaration(),
            TokenKind::Var | TokenKind::Let => self.parse_variable_declaration(),
            TokenKind::Semicolon => {
                let token = self.advance();
                self.push_leaf(ParseNodeKind::EmptyDeclaration, token);
            }
            // The lexer already diagnosed error tokens; skip them quietly.
            TokenKind::Error => {
                let token = self.advance();
                self.push_error_leaf(token);
            }
            _ => {
                self.error("expected a declaration");
                self.recover_to_declaration();
            }
        }
    }

    /// Skips to the next plausible declaration start, leaving an `Error`
    /// node behind for the skipped range.
    fn recover_to_declaration(&mut self) {
        let first = self.advance();
        while !matches!(
            self.current_kind(),
            TokenKind::Fn | TokenKind::Var | TokenKind::Let | TokenKind::Semicolon
        ) && !self.at_end()
        {
            self.advance();
        }
        self.push_error_leaf(first);
    }

    /// function ::= `fn` name `(` params `)` [`->` expr] (block | `;`)
    fn parse_function_declaration(&mut self) {
        let mark = self.mark();
        let fn_token = self.advance();
        let mut has_error = false;

        if let Some(name) = self.consume_if(TokenKind::Identifier) {
            self.push_leaf(ParseNodeKind::DeclaredName, name);
        } else {
            self.error("expected function name after `fn`");
            has_error = true;
        }

        if self.current_kind() == TokenKind::OpenParen {
            self.parse_parameter_list();
        } else {
            self.error("expected `(` to begin the parameter list");
            has_error = true;
        }

        if self.current_kind() == TokenKind::Arrow {
            let return_mark = self.mark();
            let arrow = self.advance();
            self.parse_expression();
            self.push_node(ParseNodeKind::ReturnType, arrow, return_mark, false);
        }

        match self.current_kind() {
            TokenKind::OpenCurly => self.parse_code_block(),
            TokenKind::Semicolon => {
                self.advance();
            }
            _ => {
                self.error("expected `{` or `;` after the function signature");
                has_error = true;
            }
        }

        self.push_node(ParseNodeKind::FunctionDeclaration, fn_token, mark, has_error);
    }

    /// params ::= `(` [binding (`,` binding)*] `)`
    fn parse_parameter_list(&mut self) {
        let mark = self.mark();
        let open = self.advance();
        let mut has_error = false;

        while self.current_kind() != TokenKind::CloseParen && !self.at_end() {
            self.parse_pattern_binding();
            if self.consume_if(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self
            .expect(TokenKind::CloseParen, "expected `)` to close the parameter list")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::ParameterList, open, mark, has_error);
    }

    /// binding ::= name `:` expr
    fn parse_pattern_binding(&mut self) {
        let mark = self.mark();
        let first = self.current_token();
        let mut has_error = false;

        if let Some(name) = self.consume_if(TokenKind::Identifier) {
            self.push_leaf(ParseNodeKind::DeclaredName, name);
        } else {
            self.error("expected parameter name");
            has_error = true;
            // Skip the offender unless it could close or continue the
            // list, or start the type annotation.
            if !matches!(
                self.current_kind(),
                TokenKind::CloseParen | TokenKind::Comma | TokenKind::Colon
            ) && !self.at_end()
            {
                self.advance();
            }
        }

        if self.consume_if(TokenKind::Colon).is_some() {
            self.parse_expression();
        } else {
            self.error("expected `:` and a type for the parameter");
            has_error = true;
        }

        self.push_node(ParseNodeKind::PatternBinding, first, mark, has_error);
    }

    /// variable ::= (`var` | `let`) name [`:` expr] [`=` expr] `;`
    fn parse_variable_declaration(&mut self) {
        let mark = self.mark();
        let intro = self.advance();
        let mut has_error = false;

        if let Some(name) = self.consume_if(TokenKind::Identifier) {
            self.push_leaf(ParseNodeKind::DeclaredName, name);
        } else {
            self.error("expected a name to declare");
            has_error = true;
        }

        if self.consume_if(TokenKind::Colon).is_some() {
            self.parse_expression();
        }

        if self.consume_if(TokenKind::Equal).is_some() {
            self.parse_expression();
        }

        if self
            .expect(TokenKind::Semicolon, "expected `;` after the declaration")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::VariableDeclaration, intro, mark, has_error);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// block ::= `{` statement* `}`
    fn parse_code_block(&mut self) {
        let mark = self.mark();
        let open = self.advance();
        let mut has_error = false;

        while self.current_kind() != TokenKind::CloseCurly && !self.at_end() {
            let before = self.position;
            self.parse_statement();
            if self.position == before {
                // The statement consumed nothing; skip the offending token
                // so the block always makes progress.
                let token = self.advance();
                self.push_error_leaf(token);
            }
        }

        if self
            .expect(TokenKind::CloseCurly, "expected `}` to close the block")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::CodeBlock, open, mark, has_error);
    }

    fn parse_statement(&mut self) {
        match self.current_kind() {
            TokenKind::Var | TokenKind::Let => self.parse_variable_declaration(),
            TokenKind::Fn => self.parse_function_declaration(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::OpenCurly => self.parse_code_block(),
            TokenKind::Semicolon => {
                let token = self.advance();
                self.push_leaf(ParseNodeKind::EmptyDeclaration, token);
            }
            TokenKind::Error => {
                let token = self.advance();
                self.push_error_leaf(token);
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// return ::= `return` [expr] `;`
    fn parse_return_statement(&mut self) {
        let mark = self.mark();
        let return_token = self.advance();
        let mut has_error = false;

        if self.current_kind() != TokenKind::Semicolon {
            self.parse_expression();
        }

        if self
            .expect(TokenKind::Semicolon, "expected `;` after the return value")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::ReturnStatement, return_token, mark, has_error);
    }

    /// if ::= `if` condition block [`else` (if | block)]
    fn parse_if_statement(&mut self) {
        let mark = self.mark();
        let if_token = self.advance();
        let mut has_error = false;

        self.parse_condition();

        if self.current_kind() == TokenKind::OpenCurly {
            self.parse_code_block();
        } else {
            self.error("expected `{` after the `if` condition");
            has_error = true;
        }

        if self.current_kind() == TokenKind::Else {
            let else_mark = self.mark();
            let else_token = self.advance();
            let mut else_error = false;
            match self.current_kind() {
                TokenKind::If => self.parse_if_statement(),
                TokenKind::OpenCurly => self.parse_code_block(),
                _ => {
                    self.error("expected `{` or `if` after `else`");
                    else_error = true;
                }
            }
            self.push_node(ParseNodeKind::ElseClause, else_token, else_mark, else_error);
        }

        self.push_node(ParseNodeKind::IfStatement, if_token, mark, has_error);
    }

    /// while ::= `while` condition block
    fn parse_while_statement(&mut self) {
        let mark = self.mark();
        let while_token = self.advance();
        let mut has_error = false;

        self.parse_condition();

        if self.current_kind() == TokenKind::OpenCurly {
            self.parse_code_block();
        } else {
            self.error("expected `{` after the `while` condition");
            has_error = true;
        }

        self.push_node(ParseNodeKind::WhileStatement, while_token, mark, has_error);
    }

    /// condition ::= `(` expr `)`
    fn parse_condition(&mut self) {
        let mark = self.mark();
        let first = self.current_token();
        let mut has_error = false;

        if self.consume_if(TokenKind::OpenParen).is_some() {
            self.parse_expression();
            if self
                .expect(TokenKind::CloseParen, "expected `)` to close the condition")
                .is_none()
            {
                has_error = true;
            }
        } else {
            self.error("expected `(` around the condition");
            has_error = true;
            self.parse_expression();
        }

        self.push_node(ParseNodeKind::Condition, first, mark, has_error);
    }

    /// expression-statement ::= expr [`=` expr] `;`
    ///
    /// Assignment is statement-level only; `=` never nests inside an
    /// expression.
    fn parse_expression_statement(&mut self) {
        let mark = self.mark();
        let first = self.current_token();
        self.parse_expression();

        if let Some(equal) = self.consume_if(TokenKind::Equal) {
            self.parse_expression();
            self.push_node(ParseNodeKind::InfixOperator, equal, mark, false);
        }

        match self.consume_if(TokenKind::Semicolon) {
            Some(semicolon) => {
                self.push_node(ParseNodeKind::ExpressionStatement, semicolon, mark, false);
            }
            None => {
                self.error("expected `;` after the expression");
                self.push_node(ParseNodeKind::ExpressionStatement, first, mark, true);
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) {
        self.parse_expression_with_power(0);
    }

    /// Pratt loop: parse a prefix operand, then fold postfix and infix
    /// operators while they bind at least as tightly as `min_power`.
    fn parse_expression_with_power(&mut self, min_power: u8) {
        let mark = self.mark();

        match self.current_kind() {
            TokenKind::Not | TokenKind::Minus => {
                let operator = self.advance();
                self.parse_expression_with_power(PREFIX_BINDING_POWER);
                self.push_node(ParseNodeKind::PrefixOperator, operator, mark, false);
            }
            _ => self.parse_primary(),
        }

        loop {
            match self.current_kind() {
                // Postfix forms bind tightest, so no power check.
                TokenKind::OpenParen => self.parse_call_suffix(mark),
                TokenKind::OpenSquare => self.parse_index_suffix(mark),
                TokenKind::Period => self.parse_member_suffix(mark),
                kind => {
                    let Some(power) = infix_binding_power(kind) else {
                        break;
                    };
                    if power.left < min_power {
                        break;
                    }
                    let operator = self.advance();
                    self.parse_expression_with_power(power.right);
                    self.push_node(ParseNodeKind::InfixOperator, operator, mark, false);
                }
            }
        }
    }

    /// call ::= callee `(` [expr (`,` expr)*] `)`
    fn parse_call_suffix(&mut self, mark: usize) {
        let open = self.advance();
        let mut has_error = false;

        while self.current_kind() != TokenKind::CloseParen && !self.at_end() {
            self.parse_expression();
            if self.consume_if(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self
            .expect(TokenKind::CloseParen, "expected `)` to close the call")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::CallExpression, open, mark, has_error);
    }

    /// index ::= base `[` expr `]`
    fn parse_index_suffix(&mut self, mark: usize) {
        let open = self.advance();
        let mut has_error = false;

        self.parse_expression();
        if self
            .expect(TokenKind::CloseSquare, "expected `]` to close the index")
            .is_none()
        {
            has_error = true;
        }

        self.push_node(ParseNodeKind::IndexExpression, open, mark, has_error);
    }

    /// member ::= base `.` name
    fn parse_member_suffix(&mut self, mark: usize) {
        let period = self.advance();
        let mut has_error = false;

        if let Some(name) = self.consume_if(TokenKind::Identifier) {
            self.push_leaf(ParseNodeKind::NameReference, name);
        } else {
            self.error("expected a member name after `.`");
            has_error = true;
        }

        self.push_node(ParseNodeKind::MemberAccess, period, mark, has_error);
    }

    fn parse_primary(&mut self) {
        match self.current_kind() {
            TokenKind::Identifier => {
                let token = self.advance();
                self.push_leaf(ParseNodeKind::NameReference, token);
            }
            TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Bool
            | TokenKind::IntTypeLiteral
            | TokenKind::UnsignedIntTypeLiteral
            | TokenKind::FloatTypeLiteral => {
                let token = self.advance();
                self.push_leaf(ParseNodeKind::Literal, token);
            }
            TokenKind::OpenParen => {
                let mark = self.mark();
                let open = self.advance();
                self.parse_expression();
                let has_error = self
                    .expect(TokenKind::CloseParen, "expected `)` to close the expression")
                    .is_none();
                self.push_node(ParseNodeKind::ParenExpression, open, mark, has_error);
            }
            TokenKind::Error => {
                // Already diagnosed by the lexer.
                let token = self.advance();
                self.push_error_leaf(token);
            }
            _ => {
                self.error("expected an expression");
                let token = self.current_token();
                // Consume the offender unless it can end an enclosing
                // production or open a block the caller wants.
                if !matches!(
                    self.current_kind(),
                    TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::CloseParen
                        | TokenKind::CloseSquare
                        | TokenKind::CloseCurly
                        | TokenKind::OpenCurly
                ) && !self.at_end()
                {
                    self.advance();
                }
                self.push_error_leaf(token);
            }
        }
    }
}
