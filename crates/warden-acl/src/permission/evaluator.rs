//! Reducing atom matches with the expression's combinator

use crate::permission::expression::{Combinator, Expression};

/// Evaluate an expression, calling `matcher` for atoms left to right.
///
/// AND stops at the first miss, OR at the first hit. An expression without
/// atoms never grants access.
pub fn evaluate<F>(expression: &Expression, mut matcher: F) -> bool
where
    F: FnMut(&str) -> bool,
{
    let atoms = expression.atoms();
    if atoms.is_empty() {
        return false;
    }

    match expression.combinator() {
        Combinator::Single => matcher(&atoms[0]),
        Combinator::And => atoms.iter().all(|atom| matcher(atom)),
        Combinator::Or => atoms.iter().any(|atom| matcher(atom)),
    }
}
