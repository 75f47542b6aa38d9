//! Point and list evaluation over a compiled [`PermissionSnapshot`].
//!
//! Point queries demand precision: a deny must be justifiable grant by
//! grant. List queries compile the same grants into an index-friendly
//! filter; every row a filter admits also passes the point query for that
//! row's target.

use crate::authz::snapshot::PermissionSnapshot;
use crate::authz::types::{ListScopeFilter, ScopeKind, Target};

/// May the user perform `action` on `target`?
pub fn may(snapshot: &PermissionSnapshot, action: &str, target: &Target) -> bool {
    if snapshot.is_admin {
        return true;
    }

    for grant in snapshot.grants_for(action) {
        match grant.scope {
            ScopeKind::Global => return true,
            ScopeKind::Arxiu if !target.arxiu_ids.is_empty() => {
                // Multi-valued archive set: any attached archive may match.
                let Some(scope_id) = grant.scope_id else {
                    continue;
                };
                if target.arxiu_ids.contains(&scope_id)
                    && (grant.include_descendants
                        || target.most_specific_scope() == Some(ScopeKind::Arxiu))
                {
                    return true;
                }
            }
            kind => {
                let Some(target_id) = target.scope_id(kind) else {
                    continue;
                };
                let Some(scope_id) = grant.scope_id else {
                    continue;
                };
                if target_id == scope_id
                    && (grant.include_descendants
                        || target.most_specific_scope() == Some(kind))
                {
                    return true;
                }
            }
        }
    }

    false
}

/// True when any of `actions` is allowed on `target`.
pub fn may_any(snapshot: &PermissionSnapshot, actions: &[&str], target: &Target) -> bool {
    actions.iter().any(|action| may(snapshot, action, target))
}

/// True when the user holds at least one grant for `action`, ignoring any
/// target. Used for navigation gating.
pub fn has_any_grant_for(snapshot: &PermissionSnapshot, action: &str) -> bool {
    snapshot.has_action(action)
}

/// Compile a structured list filter for browsing rows of kind `list_scope`.
///
/// A grant at kind K constrains the listing iff K equals `list_scope`, or K
/// is an ancestor kind of `list_scope` and the grant includes descendants.
pub fn list_scope_filter(
    snapshot: &PermissionSnapshot,
    action: &str,
    list_scope: ScopeKind,
) -> ListScopeFilter {
    if snapshot.is_admin {
        return ListScopeFilter::unrestricted();
    }

    let mut filter = ListScopeFilter::default();
    for grant in snapshot.grants_for(action) {
        match grant.scope {
            ScopeKind::Global => {
                // Short-circuit: a global grant subsumes every bucket.
                return ListScopeFilter::unrestricted();
            }
            kind => {
                let applicable = kind == list_scope
                    || (grant.include_descendants && kind.is_ancestor_of(list_scope));
                if !applicable {
                    continue;
                }
                let Some(scope_id) = grant.scope_id else {
                    continue;
                };
                let bucket = filter.scopes.entry(kind).or_default();
                if !bucket.contains(&scope_id) {
                    bucket.push(scope_id);
                }
            }
        }
    }

    for bucket in filter.scopes.values_mut() {
        bucket.sort_unstable();
    }
    filter
}
