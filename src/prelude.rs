// prelude.rs - Convenient re-exports for the public surface.
//
//! # Prelude
//!
//! ```
//! use ferrolint::prelude::*;
//!
//! let tree = parse(r"[A-z]", PatternFlags::empty()).unwrap();
//! let findings = run_all_checkers(&tree, None);
//! assert!(findings.iter().any(|d| d.code == "104"));
//! ```

pub use crate::charclass::{simplify_charclass, ClassEntry, WontOptimize};
pub use crate::checkers::{run_all_checkers, run_checkers, Diagnostic, GroupHint, Severity};
pub use crate::error::PatternError;
pub use crate::flags::PatternFlags;
pub use crate::parser::{parse, GroupKind, NodeId, NodeKind, ParseTree};
