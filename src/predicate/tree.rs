//! Predicate parse tree.
//!
//! A rule-tagged tree with token leaves. The parser keeps connector and
//! operator tokens in the tree so that each transformer decides for itself
//! what to keep and what to omit.

use std::fmt;

use super::lexer::{Span, Token};

/// Grammar rules that appear as tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Root of every parsed predicate; exactly one child.
    Expression,
    /// `a OR b OR ...` with `Connector` nodes between operands.
    Disjunction,
    /// `a AND b AND ...` with `Connector` nodes between operands.
    Conjunction,
    /// `NOT a`: the `NOT` token followed by the operand.
    Negation,
    /// A boolean connector token (`AND`, `OR`).
    Connector,
    /// `property_seq test value`.
    SimpleExpression,
    /// Dotted path: `distance_to.target`.
    PropertySeq,
    /// Comparison operator.
    Test,
    /// Literal right-hand side.
    Value,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Expression => "expression",
            Rule::Disjunction => "disjunction",
            Rule::Conjunction => "conjunction",
            Rule::Negation => "negation",
            Rule::Connector => "connector",
            Rule::SimpleExpression => "simple_expression",
            Rule::PropertySeq => "property_seq",
            Rule::Test => "test",
            Rule::Value => "value",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Child of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    Tree(ParseTree),
    Token(Token),
}

/// An interior node of the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    pub rule: Rule,
    pub children: Vec<ParseNode>,
}

impl ParseTree {
    pub fn new(rule: Rule, children: Vec<ParseNode>) -> Self {
        Self { rule, children }
    }

    /// Source span covered by the tokens under this node.
    pub fn span(&self) -> Option<Span> {
        let mut tokens = self.tokens();
        let first = tokens.next()?;
        let last = tokens.last().unwrap_or(first);
        Some(Span { start: first.span.start, end: last.span.end })
    }

    /// Every token leaf under this node, left to right.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        let mut out = Vec::new();
        collect_tokens(self, &mut out);
        out.into_iter()
    }

    /// Every `SimpleExpression` under this node, left to right.
    pub fn comparisons(&self) -> Vec<&ParseTree> {
        let mut out = Vec::new();
        collect_rule(self, Rule::SimpleExpression, &mut out);
        out
    }
}

fn collect_tokens<'a>(tree: &'a ParseTree, out: &mut Vec<&'a Token>) {
    for child in &tree.children {
        match child {
            ParseNode::Token(tok) => out.push(tok),
            ParseNode::Tree(t) => collect_tokens(t, out),
        }
    }
}

fn collect_rule<'a>(tree: &'a ParseTree, rule: Rule, out: &mut Vec<&'a ParseTree>) {
    if tree.rule == rule {
        out.push(tree);
        return;
    }
    for child in &tree.children {
        if let ParseNode::Tree(t) = child {
            collect_rule(t, rule, out);
        }
    }
}
