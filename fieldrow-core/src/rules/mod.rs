// Rule system, actual implementations live in:
// - expander.rs: wildcard expansion of label patterns into concrete rules
// - resolver.rs: per-label value resolution (the core matching algorithm)
// - postprocess.rs: special-case value normalization

pub mod expander;
pub mod resolver;
pub mod postprocess;

pub use expander::{expand_wildcards, ExpandedRules};
pub use postprocess::postprocess;
pub use resolver::resolve;
