//! Transition statements: predicate text evaluated in process.
//!
//! A [`TransitionStatement`] is the compiled form of the predicate text that
//! gates a behavior-graph edge. It evaluates against a node's
//! [`PredicateSet`] without any round-trip to the triple store.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{PredicateSet, PredicateValue};
use crate::predicate::lexer::{Token, TokenKind};
use crate::predicate::{self, ParseNode, ParseTree, Rule};
use crate::{Error, Result};

/// Comparison operator of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    fn from_token(tok: &Token) -> Result<Self> {
        Ok(match tok.kind {
            TokenKind::Eq => CmpOp::Eq,
            TokenKind::Neq => CmpOp::Neq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Lte => CmpOp::Lte,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Gte => CmpOp::Gte,
            _ => {
                return Err(Error::SyntaxError {
                    position: tok.span.start,
                    message: format!("Expected a comparison operator, got '{}'", tok.text),
                })
            }
        })
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Neq => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Lte => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Gte => ord != Ordering::Less,
        }
    }
}

/// Boolean criterion over named predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// No predicate text: always satisfied.
    Always,
    Compare { path: Vec<String>, op: CmpOp, value: PredicateValue },
    Not(Box<Criterion>),
    And(Vec<Criterion>),
    Or(Vec<Criterion>),
}

impl Criterion {
    pub fn evaluate(&self, predicates: &PredicateSet) -> bool {
        match self {
            Criterion::Always => true,
            Criterion::Compare { path, op, value } => match lookup(predicates, path) {
                None => false,
                Some(actual) => match actual.compare(value) {
                    Some(ord) => op.holds(ord),
                    // Incomparable types are never equal.
                    None => *op == CmpOp::Neq,
                },
            },
            Criterion::Not(inner) => !inner.evaluate(predicates),
            Criterion::And(all) => all.iter().all(|c| c.evaluate(predicates)),
            Criterion::Or(any) => any.iter().any(|c| c.evaluate(predicates)),
        }
    }

    fn from_node(node: &ParseNode) -> Result<Self> {
        match node {
            ParseNode::Tree(t) => Self::from_tree(t),
            ParseNode::Token(tok) => Err(Error::SyntaxError {
                position: tok.span.start,
                message: format!("Unexpected '{}'", tok.text),
            }),
        }
    }

    fn from_tree(tree: &ParseTree) -> Result<Self> {
        match tree.rule {
            Rule::Expression => match tree.children.as_slice() {
                [only] => Self::from_node(only),
                other => Err(Error::Arity { rule: tree.rule.name().into(), expected: 1, got: other.len() }),
            },
            Rule::Disjunction => Ok(Criterion::Or(Self::operands(tree)?)),
            Rule::Conjunction => Ok(Criterion::And(Self::operands(tree)?)),
            Rule::Negation => match tree.children.as_slice() {
                [_, operand] => Ok(Criterion::Not(Box::new(Self::from_node(operand)?))),
                other => Err(Error::Arity { rule: tree.rule.name().into(), expected: 2, got: other.len() }),
            },
            Rule::SimpleExpression => Self::comparison(tree),
            Rule::Connector | Rule::PropertySeq | Rule::Test | Rule::Value => Err(Error::SyntaxError {
                position: tree.span().map(|s| s.start).unwrap_or_default(),
                message: format!("Unexpected {} outside a comparison", tree.rule),
            }),
        }
    }

    fn operands(tree: &ParseTree) -> Result<Vec<Criterion>> {
        tree.children
            .iter()
            .filter(|c| !matches!(c, ParseNode::Tree(t) if t.rule == Rule::Connector))
            .map(Self::from_node)
            .collect()
    }

    fn comparison(tree: &ParseTree) -> Result<Self> {
        let [ParseNode::Tree(path), ParseNode::Tree(test), ParseNode::Tree(value)] = tree.children.as_slice() else {
            return Err(Error::Arity {
                rule: tree.rule.name().into(),
                expected: 3,
                got: tree.children.len(),
            });
        };
        let path = path.tokens().map(|t| t.text.clone()).collect();
        let op_tok = single_token(test)?;
        let value_tok = single_token(value)?;
        Ok(Criterion::Compare {
            path,
            op: CmpOp::from_token(op_tok)?,
            value: literal(value_tok)?,
        })
    }
}

fn single_token(tree: &ParseTree) -> Result<&Token> {
    match tree.children.as_slice() {
        [ParseNode::Token(tok)] => Ok(tok),
        other => Err(Error::Arity { rule: tree.rule.name().into(), expected: 1, got: other.len() }),
    }
}

fn literal(tok: &Token) -> Result<PredicateValue> {
    let bad_number = |e: &dyn fmt::Display| Error::SyntaxError {
        position: tok.span.start,
        message: format!("Invalid number '{}': {e}", tok.text),
    };
    Ok(match tok.kind {
        TokenKind::Integer => PredicateValue::Int(tok.text.parse().map_err(|e| bad_number(&e))?),
        TokenKind::Float => PredicateValue::Float(tok.text.parse().map_err(|e| bad_number(&e))?),
        TokenKind::True => PredicateValue::Bool(true),
        TokenKind::False => PredicateValue::Bool(false),
        _ => PredicateValue::String(tok.text.clone()),
    })
}

/// A predicate is stored under its full dotted path, or under its first
/// segment for single-valued facts.
fn lookup<'p>(predicates: &'p PredicateSet, path: &[String]) -> Option<&'p PredicateValue> {
    predicates
        .get(&path.join("."))
        .or_else(|| path.first().and_then(|head| predicates.get(head)))
}

/// Parsed predicate text plus its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransitionStatement {
    source: String,
    criterion: Criterion,
}

impl TransitionStatement {
    pub fn parse(source: &str) -> Result<Self> {
        let criterion = match predicate::parse(source)? {
            None => Criterion::Always,
            Some(tree) => Criterion::from_tree(&tree)?,
        };
        Ok(Self { source: source.trim().to_string(), criterion })
    }

    pub fn always() -> Self {
        Self { source: String::new(), criterion: Criterion::Always }
    }

    pub fn evaluate(&self, predicates: &PredicateSet) -> bool {
        self.criterion.evaluate(predicates)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn criterion(&self) -> &Criterion {
        &self.criterion
    }
}

impl Default for TransitionStatement {
    fn default() -> Self {
        Self::always()
    }
}

impl TryFrom<String> for TransitionStatement {
    type Error = Error;

    fn try_from(source: String) -> Result<Self> {
        Self::parse(&source)
    }
}

impl From<TransitionStatement> for String {
    fn from(statement: TransitionStatement) -> Self {
        statement.source
    }
}

impl fmt::Display for TransitionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            f.write_str("TRUE")
        } else {
            f.write_str(&self.source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> PredicateSet {
        PredicateSet::new()
            .with("speed.value", 4)
            .with("occupied", false)
            .with("zone", "road")
            .with("distance_to.target", 2.5)
    }

    fn eval(text: &str) -> bool {
        TransitionStatement::parse(text).unwrap().evaluate(&facts())
    }

    #[test]
    fn test_comparisons() {
        assert!(eval("speed.value > 3"));
        assert!(!eval("speed.value <= 3"));
        assert!(eval("distance_to.target < 5"));
        assert!(eval("zone.kind = 'road'"));
        assert!(eval("occupied == false"));
    }

    #[test]
    fn test_numeric_coercion() {
        assert!(eval("speed.value = 4.0"));
        assert!(eval("distance_to.target > 2"));
    }

    #[test]
    fn test_missing_predicate_is_false() {
        assert!(!eval("heading.deg = 90"));
        assert!(eval("NOT heading.deg = 90"));
    }

    #[test]
    fn test_connectors() {
        assert!(eval("speed.value > 3 AND occupied = false"));
        assert!(!eval("speed.value > 3 AND occupied = true"));
        assert!(eval("speed.value > 10 OR (zone.kind = road AND NOT occupied = true)"));
    }

    #[test]
    fn test_empty_is_always() {
        let t = TransitionStatement::parse("  ").unwrap();
        assert_eq!(t.criterion(), &Criterion::Always);
        assert!(t.evaluate(&PredicateSet::new()));
        assert_eq!(t.to_string(), "TRUE");
    }

    #[test]
    fn test_serde_as_string() {
        let t: TransitionStatement = serde_json::from_str(r#""speed.value > 3""#).unwrap();
        assert_eq!(t.source(), "speed.value > 3");
        assert_eq!(serde_json::to_string(&t).unwrap(), r#""speed.value > 3""#);
        assert!(serde_json::from_str::<TransitionStatement>(r#""speed.value >""#).is_err());
    }
}
