//! A minimal Lisp runtime for memory-constrained hosts: a fixed-capacity
//! cons cell arena, an interned symbol pool with a byte budget, a textual
//! S-expression reader and printer, and a recursive evaluator whose
//! built-ins each carry a pluggable argument-evaluation policy.
//!
//! There is no garbage collector and no tail-call optimization: the arena
//! is strictly allocate-only, and evaluation depth is bounded by the host
//! stack. Exhausting either pool is an explicit, distinguishable error.

pub mod arena;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod globals;
pub mod printer;
pub mod reader;
pub mod symbol;
pub mod value;
