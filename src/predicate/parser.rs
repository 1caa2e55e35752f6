//! Predicate recursive descent parser.
//!
//! Grammar (keywords case-insensitive):
//!
//! ```text
//! expression        := disjunction
//! disjunction       := conjunction (OR conjunction)*
//! conjunction       := negation (AND negation)*
//! negation          := NOT negation | atom
//! atom              := '(' disjunction ')' | simple_expression
//! simple_expression := property_seq test value
//! property_seq      := NAME ('.' NAME)*
//! test              := '=' | '==' | '!=' | '<>' | '<' | '<=' | '>' | '>='
//! value             := NUMBER | STRING | TRUE | FALSE | NAME
//! ```
//!
//! Single-operand disjunctions and conjunctions collapse into their operand,
//! and parentheses leave no node behind.

use crate::{Error, Result};
use super::lexer::{Token, TokenKind};
use super::tree::{ParseNode, ParseTree, Rule};

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Syntax error naming the token under the cursor.
    fn unexpected(&self, what: &str) -> Error {
        let tok = self.peek();
        let found = if tok.kind == TokenKind::Eof {
            "end of predicate".to_string()
        } else {
            format!("'{}'", tok.text)
        };
        Error::SyntaxError {
            position: tok.span.start,
            message: format!("Expected {what}, got {found}"),
        }
    }
}

/// Parse a token stream. Returns `None` for an empty predicate.
pub fn parse_predicate(tokens: &[Token]) -> Result<Option<ParseTree>> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut p = Parser::new(tokens);
    if p.at(TokenKind::Eof) {
        return Ok(None);
    }

    let body = parse_disjunction(&mut p)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.unexpected("a connector or end of predicate"));
    }

    Ok(Some(ParseTree::new(Rule::Expression, vec![body])))
}

// ============================================================================
// Boolean structure
// ============================================================================

fn parse_disjunction(p: &mut Parser) -> Result<ParseNode> {
    parse_connected(p, TokenKind::Or, Rule::Disjunction, parse_conjunction)
}

fn parse_conjunction(p: &mut Parser) -> Result<ParseNode> {
    parse_connected(p, TokenKind::And, Rule::Conjunction, parse_negation)
}

fn parse_connected(
    p: &mut Parser,
    connector: TokenKind,
    rule: Rule,
    operand: fn(&mut Parser) -> Result<ParseNode>,
) -> Result<ParseNode> {
    let first = operand(p)?;
    if !p.at(connector) {
        return Ok(first);
    }
    let mut children = vec![first];
    while p.at(connector) {
        let tok = p.advance();
        children.push(ParseNode::Tree(ParseTree::new(Rule::Connector, vec![ParseNode::Token(tok)])));
        children.push(operand(p)?);
    }
    Ok(ParseNode::Tree(ParseTree::new(rule, children)))
}

fn parse_negation(p: &mut Parser) -> Result<ParseNode> {
    if p.at(TokenKind::Not) {
        let not = p.advance();
        let operand = parse_negation(p)?;
        return Ok(ParseNode::Tree(ParseTree::new(Rule::Negation, vec![ParseNode::Token(not), operand])));
    }
    parse_atom(p)
}

fn parse_atom(p: &mut Parser) -> Result<ParseNode> {
    match p.peek_kind() {
        TokenKind::LParen => {
            p.advance();
            let inner = parse_disjunction(p)?;
            p.expect(TokenKind::RParen, "')'")?;
            Ok(inner)
        }
        TokenKind::Identifier => Ok(ParseNode::Tree(parse_simple_expression(p)?)),
        _ => Err(p.unexpected("a property path, NOT or '('")),
    }
}

// ============================================================================
// Comparisons
// ============================================================================

fn parse_simple_expression(p: &mut Parser) -> Result<ParseTree> {
    let path = parse_property_seq(p)?;

    if !p.peek_kind().is_comparison() {
        return Err(p.unexpected("a comparison operator"));
    }
    let test = ParseTree::new(Rule::Test, vec![ParseNode::Token(p.advance())]);

    let value = match p.peek_kind() {
        TokenKind::Integer
        | TokenKind::Float
        | TokenKind::StringLiteral
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Identifier => ParseTree::new(Rule::Value, vec![ParseNode::Token(p.advance())]),
        _ => return Err(p.unexpected("a value")),
    };

    Ok(ParseTree::new(
        Rule::SimpleExpression,
        vec![ParseNode::Tree(path), ParseNode::Tree(test), ParseNode::Tree(value)],
    ))
}

fn parse_property_seq(p: &mut Parser) -> Result<ParseTree> {
    let mut segments = vec![ParseNode::Token(p.expect(TokenKind::Identifier, "a property name")?)];
    while p.at(TokenKind::Dot) {
        p.advance();
        segments.push(ParseNode::Token(p.expect(TokenKind::Identifier, "a property name after '.'")?));
    }
    Ok(ParseTree::new(Rule::PropertySeq, segments))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::lexer::tokenize;

    fn parse(input: &str) -> Result<Option<ParseTree>> {
        let tokens = tokenize(input)?;
        parse_predicate(&tokens)
    }

    fn body(tree: &ParseTree) -> &ParseTree {
        match &tree.children[0] {
            ParseNode::Tree(t) => t,
            other => panic!("expected tree, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_comparison_shape() {
        let tree = parse("speed.value > 3").unwrap().unwrap();
        assert_eq!(tree.rule, Rule::Expression);
        let cmp = body(&tree);
        assert_eq!(cmp.rule, Rule::SimpleExpression);
        assert_eq!(cmp.children.len(), 3);
        match &cmp.children[0] {
            ParseNode::Tree(path) => {
                assert_eq!(path.rule, Rule::PropertySeq);
                assert_eq!(path.children.len(), 2);
            }
            other => panic!("expected property_seq, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_predicate() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_precedence_and_binds_tighter() {
        let tree = parse("a.x = 1 OR b.y = 2 AND c.z = 3").unwrap().unwrap();
        let top = body(&tree);
        assert_eq!(top.rule, Rule::Disjunction);
        // operand, connector, operand
        assert_eq!(top.children.len(), 3);
        match &top.children[2] {
            ParseNode::Tree(t) => assert_eq!(t.rule, Rule::Conjunction),
            other => panic!("expected conjunction, got {other:?}"),
        }
        assert_eq!(tree.comparisons().len(), 3);
    }

    #[test]
    fn test_parentheses_and_negation() {
        let tree = parse("NOT (a.x = 1 OR b.y = 2)").unwrap().unwrap();
        let top = body(&tree);
        assert_eq!(top.rule, Rule::Negation);
        match &top.children[1] {
            ParseNode::Tree(t) => assert_eq!(t.rule, Rule::Disjunction),
            other => panic!("expected disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_span_of_comparison() {
        let tree = parse("a.x = 1 AND speed.value >= 2.5").unwrap().unwrap();
        let cmps = tree.comparisons();
        let span = cmps[1].span().unwrap();
        assert_eq!(&"a.x = 1 AND speed.value >= 2.5"[span.start..span.end], "speed.value >= 2.5");
    }

    #[test]
    fn test_missing_operator_names_token() {
        match parse("speed.value fast") {
            Err(Error::SyntaxError { position, message }) => {
                assert_eq!(position, 12);
                assert!(message.contains("'fast'"), "{message}");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_value() {
        match parse("speed.value >") {
            Err(Error::SyntaxError { message, .. }) => assert!(message.contains("end of predicate")),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        assert!(parse("(a.x = 1").is_err());
        assert!(parse("a.x = 1)").is_err());
    }
}
