//! # Predicate language
//!
//! Small boolean language over dotted property paths:
//!
//! ```text
//! distance_to.target < 5 AND NOT (zone.kind = 'road' OR speed.value >= 2.5)
//! ```
//!
//! Text → tokens → rule-tagged parse tree. The tree feeds two consumers: the
//! SPARQL compiler ([`PredicateCompiler`]) and the in-process evaluator
//! ([`crate::transition::TransitionStatement`]).

pub mod lexer;
pub mod tree;
pub mod parser;
pub mod transform;
pub mod template;
pub mod compiler;

pub use compiler::{CompiledPredicate, PredicateCompiler};
pub use template::{DirTemplates, InlineTemplates, QueryTemplate, TemplateSource};
pub use transform::{BindTransformer, Lowered, QueryNameTransformer};
pub use tree::{ParseNode, ParseTree, Rule};

use crate::Result;

/// Parse predicate text. `None` for an empty or blank predicate.
pub fn parse(input: &str) -> Result<Option<ParseTree>> {
    let tokens = lexer::tokenize(input)?;
    parser::parse_predicate(&tokens)
}
