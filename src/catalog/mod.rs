//! Schema catalog and relationship graph.
//!
//! Both are rebuilt for every request; nothing is cached between calls.

mod builder;
mod graph;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::CatalogBuilder;
pub use graph::build_graph;
