//! Parse-tree transformers.
//!
//! Each transformer is a structural match over [`ParseTree`] rules. A rule a
//! transformer has no use for lowers to [`Lowered::Omit`] and disappears
//! from its parent's child list.

use crate::config::Namespace;
use crate::{Error, Result};
use super::lexer::{Token, TokenKind};
use super::tree::{ParseNode, ParseTree, Rule};

/// Placeholder for the bound variable inside a lowered BIND statement.
pub const PREDICATE_VARNAME_PLACEHOLDER: &str = "?predicate_varname";

/// Result of lowering one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lowered {
    Text(String),
    Omit,
}

impl Lowered {
    pub fn into_text(self) -> String {
        match self {
            Lowered::Text(s) => s,
            Lowered::Omit => String::new(),
        }
    }
}

/// Comparison nodes always carry `property_seq test value`.
fn check_comparison_arity(tree: &ParseTree) -> Result<()> {
    if tree.children.len() != 3 {
        return Err(Error::Arity {
            rule: Rule::SimpleExpression.name().into(),
            expected: 3,
            got: tree.children.len(),
        });
    }
    Ok(())
}

fn path_segments(tree: &ParseTree) -> Vec<&str> {
    tree.children
        .iter()
        .filter_map(|c| match c {
            ParseNode::Token(t) => Some(t.text.as_str()),
            ParseNode::Tree(_) => None,
        })
        .collect()
}

/// Lower the children of a node, dropping omitted ones.
fn lower_children<F>(tree: &ParseTree, mut lower: F) -> Result<Vec<String>>
where
    F: FnMut(&ParseNode) -> Result<Lowered>,
{
    let mut out = Vec::new();
    for child in &tree.children {
        if let Lowered::Text(s) = lower(child)? {
            out.push(s);
        }
    }
    Ok(out)
}

// ============================================================================
// Query name: which template a predicate selects from
// ============================================================================

/// Resolves the template name of a single predicate: the first segment of
/// its property path. Connectors, operators and values are omitted.
pub struct QueryNameTransformer;

impl QueryNameTransformer {
    pub fn transform(&self, tree: &ParseTree) -> Result<String> {
        Ok(self.lower_tree(tree)?.into_text())
    }

    fn lower_node(&self, node: &ParseNode) -> Result<Lowered> {
        match node {
            ParseNode::Tree(t) => self.lower_tree(t),
            // NOT
            ParseNode::Token(_) => Ok(Lowered::Omit),
        }
    }

    fn lower_tree(&self, tree: &ParseTree) -> Result<Lowered> {
        match tree.rule {
            Rule::Connector | Rule::Test | Rule::Value => Ok(Lowered::Omit),
            Rule::PropertySeq => Ok(path_segments(tree)
                .first()
                .map(|s| Lowered::Text((*s).to_string()))
                .unwrap_or(Lowered::Omit)),
            Rule::SimpleExpression => {
                check_comparison_arity(tree)?;
                single(tree.rule, lower_children(tree, |c| self.lower_node(c))?)
            }
            Rule::Expression | Rule::Disjunction | Rule::Conjunction | Rule::Negation => {
                single(tree.rule, lower_children(tree, |c| self.lower_node(c))?)
            }
        }
    }
}

fn single(rule: Rule, mut parts: Vec<String>) -> Result<Lowered> {
    match parts.len() {
        0 => Ok(Lowered::Omit),
        1 => Ok(Lowered::Text(parts.remove(0))),
        got => Err(Error::Arity { rule: rule.name().into(), expected: 1, got }),
    }
}

// ============================================================================
// BIND lowering
// ============================================================================

/// Lowers a single comparison to
/// `BIND (?variable operator value AS ?predicate_varname)`.
///
/// Spatial and temporal predicates share the lowering; the namespace is kept
/// for diagnostics.
pub struct BindTransformer {
    namespace: Namespace,
}

impl BindTransformer {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn transform(&self, tree: &ParseTree) -> Result<String> {
        Ok(self.lower_tree(tree)?.into_text())
    }

    fn lower_node(&self, node: &ParseNode) -> Result<Lowered> {
        match node {
            ParseNode::Tree(t) => self.lower_tree(t),
            ParseNode::Token(tok) => Err(self.no_connectors(tok)),
        }
    }

    fn no_connectors(&self, tok: &Token) -> Error {
        Error::SyntaxError {
            position: tok.span.start,
            message: format!(
                "No connectors are expected in a single {} predicate, got '{}'",
                self.namespace, tok.text
            ),
        }
    }

    fn lower_tree(&self, tree: &ParseTree) -> Result<Lowered> {
        match tree.rule {
            Rule::Connector | Rule::Negation => {
                let tok = tree.tokens().next();
                match tok {
                    Some(tok) => Err(self.no_connectors(tok)),
                    None => Err(Error::Arity { rule: tree.rule.name().into(), expected: 1, got: 0 }),
                }
            }
            Rule::Disjunction | Rule::Conjunction => {
                // The first connector sits between the first two operands.
                match tree.children.get(1) {
                    Some(c) => self.lower_node(c),
                    None => Err(Error::Arity { rule: tree.rule.name().into(), expected: 3, got: tree.children.len() }),
                }
            }
            Rule::Expression => single(tree.rule, lower_children(tree, |c| self.lower_node(c))?),
            Rule::PropertySeq => match path_segments(tree).last() {
                Some(last) => Ok(Lowered::Text(format!("?{last}"))),
                None => Ok(Lowered::Omit),
            },
            Rule::Test => Ok(Lowered::Text(leaf(tree).map(render_operator).unwrap_or_default())),
            Rule::Value => Ok(Lowered::Text(leaf(tree).map(render_value).unwrap_or_default())),
            Rule::SimpleExpression => {
                check_comparison_arity(tree)?;
                let parts = lower_children(tree, |c| self.lower_node(c))?;
                if parts.len() != 3 {
                    return Err(Error::Arity {
                        rule: tree.rule.name().into(),
                        expected: 3,
                        got: parts.len(),
                    });
                }
                Ok(Lowered::Text(format!(
                    "BIND ({} {} {} AS {PREDICATE_VARNAME_PLACEHOLDER})",
                    parts[0], parts[1], parts[2]
                )))
            }
        }
    }
}

fn leaf(tree: &ParseTree) -> Option<&Token> {
    match tree.children.first() {
        Some(ParseNode::Token(tok)) => Some(tok),
        _ => None,
    }
}

/// SPARQL spelling of a comparison operator.
pub fn render_operator(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Eq => "=".into(),
        TokenKind::Neq => "!=".into(),
        _ => tok.text.clone(),
    }
}

/// SPARQL spelling of a literal.
pub fn render_value(tok: &Token) -> String {
    match tok.kind {
        TokenKind::StringLiteral => format!("\"{}\"", tok.text.replace('\\', "\\\\").replace('"', "\\\"")),
        TokenKind::True => "true".into(),
        TokenKind::False => "false".into(),
        _ => tok.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::lexer::Span;
    use crate::predicate::parse;

    fn tree(input: &str) -> ParseTree {
        parse(input).unwrap().unwrap()
    }

    #[test]
    fn test_query_name_is_first_segment() {
        assert_eq!(QueryNameTransformer.transform(&tree("distance_to.target < 5")).unwrap(), "distance_to");
        assert_eq!(QueryNameTransformer.transform(&tree("NOT speed.value > 3")).unwrap(), "speed");
    }

    #[test]
    fn test_bind_lowering() {
        let bind = BindTransformer::new(Namespace::Spatial).transform(&tree("speed.value > 3")).unwrap();
        assert_eq!(bind, "BIND (?value > 3 AS ?predicate_varname)");
    }

    #[test]
    fn test_bind_renders_literals() {
        let t = BindTransformer::new(Namespace::Temporal);
        assert_eq!(
            t.transform(&tree("zone.kind == 'road'")).unwrap(),
            "BIND (?kind = \"road\" AS ?predicate_varname)"
        );
        assert_eq!(
            t.transform(&tree("zone.open <> TRUE")).unwrap(),
            "BIND (?open != true AS ?predicate_varname)"
        );
    }

    #[test]
    fn test_bind_rejects_connectors() {
        let err = BindTransformer::new(Namespace::Spatial)
            .transform(&tree("a.x = 1 AND b.y = 2"))
            .unwrap_err();
        match err {
            Error::SyntaxError { message, position } => {
                assert!(message.contains("'AND'"), "{message}");
                assert_eq!(position, 8);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_comparison_arity_violation() {
        let tok = |kind, text: &str| Token { kind, span: Span { start: 0, end: text.len() }, text: text.into() };
        let broken = ParseTree::new(Rule::Expression, vec![ParseNode::Tree(ParseTree::new(
            Rule::SimpleExpression,
            vec![
                ParseNode::Tree(ParseTree::new(Rule::PropertySeq, vec![ParseNode::Token(tok(TokenKind::Identifier, "speed"))])),
                ParseNode::Tree(ParseTree::new(Rule::Test, vec![ParseNode::Token(tok(TokenKind::Gt, ">"))])),
            ],
        ))]);

        for result in [
            BindTransformer::new(Namespace::Spatial).transform(&broken),
            QueryNameTransformer.transform(&broken),
        ] {
            match result {
                Err(Error::Arity { rule, expected, got }) => {
                    assert_eq!(rule, "simple_expression");
                    assert_eq!(expected, 3);
                    assert_eq!(got, 2);
                }
                other => panic!("expected arity error, got {other:?}"),
            }
        }
    }
}
