//! # Blueprint Compiler Ground Truth
//!
//! ## Identity Invariants
//!
//! 1. **One join key**: a node's sanitized identifier (`i<id>_<TitleCase>`)
//!    is the blueprint file name, the logic module name and the extend
//!    reference. All three are derived by `naming::node_identifier` and
//!    nowhere else.
//!
//! 2. **Extend chain**: sibling order is expressed as a singly linked chain
//!    (child *i* extends child *i-1*), never as a literal nested list. The two
//!    children of a `_condition` frame are branches and MUST NOT chain.
//!
//! 3. **Binding namespaces**: every scalar in a blueprint resolves through
//!    exactly one rule (`states.` / `inputs.` / `logics.` prefix, else
//!    literal). See `binding::Binding`.
//!
//! 4. **Logic modules are user territory**: the synthesizer appends missing
//!    stubs and rewrites at most the single navigation/seed call it owns.
//!    It never executes user code (static parse only) and never touches a
//!    module it cannot parse.
//!
//! 5. **Idempotence**: blueprint emission, component generation and logic
//!    synthesis are all re-runnable; a second run over unchanged inputs is
//!    byte-identical. Re-running after a failure IS the retry mechanism.

pub mod api;
pub mod binding;
pub mod cache;
pub mod codegen;
pub mod compile;
pub mod config;
pub mod document;
pub mod emit;
pub mod error;
pub mod layout;
pub mod logic;
pub mod merge;
pub mod naming;
pub mod scaffold;
pub mod spec;
pub mod specs;
pub mod transform;

pub use error::{BuildError, Result};
pub use spec::{Modifier, SpecFile, SpecUnit};
pub use transform::{PageIndex, RouteTarget, TransformedNode};

#[cfg(test)]
mod generation_tests;
