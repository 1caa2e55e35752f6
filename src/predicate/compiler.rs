//! Predicate → SPARQL fragment compiler.

use tracing::debug;

use crate::config::{CompilerConfig, Namespace};
use crate::context::Context;
use crate::Result;
use super::template::{DirTemplates, QueryTemplate, TemplateSource};
use super::transform::{BindTransformer, QueryNameTransformer, PREDICATE_VARNAME_PLACEHOLDER};
use super::tree::{ParseNode, ParseTree, Rule};

/// Fragments one predicate contributes to a combined query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPredicate {
    /// Predicate text this was compiled from.
    pub source: String,
    pub where_clause: String,
    /// `?p_{index}`, or empty for a no-op predicate.
    pub bound_variable: String,
    pub bind_statement: String,
    pub order_clause: String,
}

impl CompiledPredicate {
    fn empty(source: &str) -> Self {
        Self { source: source.to_string(), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.bound_variable.is_empty()
    }

    /// `(where_clause, bound_variable, bind_statement, order_clause)`.
    pub fn into_parts(self) -> (String, String, String, String) {
        (self.where_clause, self.bound_variable, self.bind_statement, self.order_clause)
    }
}

/// Compiles predicates of one namespace against a template source.
pub struct PredicateCompiler<S: TemplateSource = DirTemplates> {
    ctx: Context,
    config: CompilerConfig,
    templates: S,
}

impl PredicateCompiler<DirTemplates> {
    /// Compiler reading templates from `config.sparql_dir`.
    pub fn from_config(ctx: &Context, config: &CompilerConfig) -> Self {
        Self::new(ctx, config, DirTemplates::new(config.sparql_dir.clone()))
    }
}

impl<S: TemplateSource> PredicateCompiler<S> {
    pub fn new(ctx: &Context, config: &CompilerConfig, templates: S) -> Self {
        Self {
            ctx: ctx.child(&format!("{}_compiler", config.namespace)),
            config: config.clone(),
            templates,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.config.namespace
    }

    /// Compile a single comparison; `index` makes its bound variable unique
    /// within the combined query.
    pub fn transform_predicate(&self, predicate: &str, index: usize) -> Result<CompiledPredicate> {
        let _guard = self.ctx.span().enter();
        match super::parse(predicate)? {
            None => Ok(CompiledPredicate::empty(predicate)),
            Some(tree) => self.compile_tree(predicate, &tree, index),
        }
    }

    /// Compile every comparison of a compound statement, numbering bound
    /// variables from `first_index`. Connectors are left to the caller.
    pub fn compile_statement(&self, statement: &str, first_index: usize) -> Result<Vec<CompiledPredicate>> {
        let _guard = self.ctx.span().enter();
        let Some(tree) = super::parse(statement)? else {
            return Ok(Vec::new());
        };
        tree.comparisons()
            .into_iter()
            .enumerate()
            .map(|(i, cmp)| {
                let source = cmp
                    .span()
                    .and_then(|s| statement.get(s.start..s.end))
                    .unwrap_or(statement);
                let single = ParseTree::new(Rule::Expression, vec![ParseNode::Tree(cmp.clone())]);
                self.compile_tree(source, &single, first_index + i)
            })
            .collect()
    }

    /// Template sections for a query name; all empty for an empty name.
    pub fn selector(&self, query_name: &str) -> Result<QueryTemplate> {
        if query_name.is_empty() {
            return Ok(QueryTemplate::default());
        }
        let text = self.templates.template(query_name)?;
        QueryTemplate::extract(query_name, &text, &self.config)
    }

    fn compile_tree(&self, source: &str, tree: &ParseTree, index: usize) -> Result<CompiledPredicate> {
        let bind = BindTransformer::new(self.config.namespace).transform(tree)?;
        if bind.is_empty() {
            return Ok(CompiledPredicate::empty(source));
        }
        let query_name = QueryNameTransformer.transform(tree)?;
        let template = self.selector(&query_name)?;

        let bound_variable = format!("?p_{index}");
        let bind_statement = bind.replace(PREDICATE_VARNAME_PLACEHOLDER, &bound_variable);
        debug!(predicate = source, query = %query_name, bind = %bind_statement, "compiled predicate");

        Ok(CompiledPredicate {
            source: source.to_string(),
            where_clause: template.selector,
            bound_variable,
            bind_statement,
            order_clause: template.order,
        })
    }
}
