//! Permission records, expressions, and the resolution pipeline pieces

pub mod aggregate;
pub mod evaluator;
pub mod expression;
pub mod matcher;
pub mod models;
pub mod set;

pub use aggregate::{aggregate, merge_grants, scope_grants};
pub use evaluator::evaluate;
pub use expression::{Combinator, Expression, Operator, PermissionQuery};
pub use matcher::{match_key, resolve_atom};
pub use models::{Grant, PermissionRecord, PermissionValue, Target};
pub use set::{normalize, normalize_records, PermissionSet};
