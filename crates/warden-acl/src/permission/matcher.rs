//! Matching atomic permission names against a permission set

use crate::permission::models::Target;
use crate::permission::set::PermissionSet;

/// Check one atom against a set.
///
/// A global grant for the atom wins regardless of scope. Otherwise, when a
/// scope is given, the scoped key `atom:model:reference_id` is checked. Missing
/// keys deny.
pub fn match_key(atom: &str, set: &PermissionSet, scope: Option<&Target>) -> bool {
    if set.allows(atom) {
        return true;
    }

    match scope {
        Some(target) => set.allows(&target.scoped_key(atom)),
        None => false,
    }
}

/// Resolve an atom the way `can` and `able` do.
///
/// On top of [`match_key`] this accepts `record.action` when the whole record
/// is granted, and reads `a.b.c` as an action chain when `a` names no record:
/// it then matches if a single record grants every listed action.
///
/// The chain reads every segment as an action name, so it can grant an atom
/// whose first segment is a record the principal holds nothing of: with only
/// `comment.post` and `comment.view` granted, `post.view` matches.
pub fn resolve_atom(atom: &str, set: &PermissionSet, scope: Option<&Target>) -> bool {
    if match_key(atom, set, scope) {
        return true;
    }

    let Some((record, _)) = atom.split_once('.') else {
        return false;
    };

    if set.has_record(record) {
        return match_key(record, set, scope);
    }

    let actions: Vec<&str> = atom.split('.').collect();
    if actions.iter().any(|action| action.is_empty()) {
        return false;
    }

    set.record_names().into_iter().any(|name| {
        actions
            .iter()
            .all(|action| match_key(&format!("{}.{}", name, action), set, scope))
    })
}
