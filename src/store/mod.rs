//! # Triple-store seam
//!
//! The compiler only produces SPARQL text. Executing it belongs to an
//! external service reached through [`QueryStore`]; this module assembles
//! compiled fragments into one SELECT and maps the answer back onto
//! predicate names.
//!
//! A store that cannot answer is reported as [`Error::Store`], never as a
//! predicate that evaluated to `false`.

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::model::{PredicateSet, PredicateValue};
use crate::predicate::CompiledPredicate;
use crate::{Error, Result};

/// One solution row: variable name (without `?`) → bound value.
pub type Bindings = HashMap<String, PredicateValue>;

/// Request/response access to the external triple store.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Run a SELECT query and return its solution rows.
    async fn select(&self, query: &str) -> Result<Vec<Bindings>>;
}

/// Combine compiled predicates into a single SELECT projecting every bound
/// variable. Identical WHERE bodies are emitted once. Empty when every
/// predicate is a no-op.
pub fn assemble_select(predicates: &[CompiledPredicate]) -> String {
    let live: Vec<&CompiledPredicate> = predicates.iter().filter(|p| !p.is_empty()).collect();
    if live.is_empty() {
        return String::new();
    }

    let variables: Vec<&str> = live.iter().map(|p| p.bound_variable.as_str()).collect();

    let mut seen = HashSet::new();
    let mut body = Vec::new();
    for p in &live {
        let clause = p.where_clause.trim();
        if !clause.is_empty() && seen.insert(clause) {
            body.push(clause);
        }
    }
    body.extend(live.iter().map(|p| p.bind_statement.as_str()));

    let orders: Vec<&str> = live
        .iter()
        .map(|p| p.order_clause.trim())
        .filter(|o| !o.is_empty())
        .collect();

    let mut query = format!("SELECT {} WHERE {{\n", variables.join(" "));
    for line in body {
        query.push_str("  ");
        query.push_str(line);
        query.push('\n');
    }
    query.push('}');
    if !orders.is_empty() {
        query.push_str("\nORDER BY ");
        query.push_str(&orders.join(" "));
    }
    query
}

/// Ask the store for every predicate's truth value.
///
/// The result is keyed by each predicate's source text. Only the first
/// solution row is read; a variable it leaves unbound is `false`.
pub async fn resolve_predicates<S>(store: &S, predicates: &[CompiledPredicate]) -> Result<PredicateSet>
where
    S: QueryStore + ?Sized,
{
    let query = assemble_select(predicates);
    if query.is_empty() {
        return Ok(PredicateSet::new());
    }
    debug!(%query, "Resolving predicates");

    let rows = store.select(&query).await.map_err(|e| match e {
        Error::Store(_) => e,
        other => Error::Store(other.to_string()),
    })?;
    let first = rows.into_iter().next().unwrap_or_default();

    Ok(predicates
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            let var = p.bound_variable.trim_start_matches('?');
            let value = first.get(var).cloned().unwrap_or(PredicateValue::Bool(false));
            (p.source.clone(), value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(source: &str, index: usize, where_clause: &str, order: &str) -> CompiledPredicate {
        CompiledPredicate {
            source: source.into(),
            where_clause: where_clause.into(),
            bound_variable: format!("?p_{index}"),
            bind_statement: format!("BIND (?v > {index} AS ?p_{index})"),
            order_clause: order.into(),
        }
    }

    #[test]
    fn test_assemble_dedups_where() {
        let query = assemble_select(&[
            compiled("a", 0, " ?r :speed ?v . ", ""),
            CompiledPredicate::default(),
            compiled("b", 1, "?r :speed ?v .", "?v"),
        ]);
        assert_eq!(
            query,
            "SELECT ?p_0 ?p_1 WHERE {\n  ?r :speed ?v .\n  BIND (?v > 0 AS ?p_0)\n  BIND (?v > 1 AS ?p_1)\n}\nORDER BY ?v"
        );
    }

    #[test]
    fn test_assemble_nothing() {
        assert_eq!(assemble_select(&[CompiledPredicate::default()]), "");
    }
}
