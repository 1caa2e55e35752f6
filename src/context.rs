//! Explicit logging context.
//!
//! Every builder and graph takes a `&Context` at construction and records
//! under its span. Nothing here is global: two actors in one process carry
//! two contexts.

use tracing::Span;

#[derive(Debug, Clone)]
pub struct Context {
    name: String,
    span: Span,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = tracing::info_span!("actor", name = %name);
        Self { name, span }
    }

    /// A child context, e.g. one per snapshot.
    pub fn child(&self, name: &str) -> Self {
        let full = format!("{}.{name}", self.name);
        let span = tracing::info_span!(parent: &self.span, "actor", name = %full);
        Self { name: full, span }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("rt_bi")
    }
}
