use crate::{
    constraints::Constraint,
    context::{DynamicCandidate, Node, Router, new_candidate},
    error::RouterError,
    pattern::compile_pattern,
    types::{Route, RouteHit, RouteId, RouteSegment},
};
use std::cmp::Reverse;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Adds a route to the router.
///
/// The pattern is parsed and compiled first; any syntax, structural or
/// constraint error rejects the route before the tree is touched. The
/// compiled route is then expanded into its *truncations* (prefixes whose
/// omitted suffix consists entirely of optional or defaulted segments) and
/// each truncation is inserted as its own path under a single write lock,
/// so concurrent lookups observe either none or all of them.
///
/// The terminal node of each truncation records the route's handler unless
/// a strictly higher-priority route already terminates there; at equal
/// priority the last registration wins, letting callers intentionally
/// shadow earlier routes.
///
/// A catch-all occupies the single reserved bucket of its parent node. A
/// later catch-all at the same position reuses that bucket only when its
/// name and constraint set are identical; a differently defined catch-all
/// is rejected, before anything is inserted, so the tree stays untouched.
///
/// # Arguments
/// * `router`: The registry to add the route to.
/// * `pattern`: The route pattern, e.g. `/users/{id:int}` or `/docs/*`.
/// * `handler`: Opaque handler identity associated with the route.
/// * `priority`: Tie-break weight; higher wins. Use 0 when in doubt.
/// * `authorized_roles`: Opaque role list passed through to match results.
///
/// # Returns
/// The stable id assigned to the route, or the registration error. On an
/// error, nothing is stored.
pub fn add_route<T: Clone>(
    router: &Router<T>,
    pattern: &str,
    handler: T,
    priority: i32,
    authorized_roles: Option<Vec<String>>,
) -> Result<RouteId, RouterError> {
    let segments = match compile_pattern(pattern) {
        Ok(segments) => segments,
        Err(error) => {
            debug!(pattern, %error, "route rejected");
            return Err(error);
        }
    };

    let id = router.next_route_id.fetch_add(1, Ordering::Relaxed);
    let hit = RouteHit {
        route_id: id,
        handler: handler.clone(),
        priority,
        authorized_roles: authorized_roles.clone(),
    };

    let truncations = truncation_lengths(&segments);
    {
        let mut root = router.root.write();
        if let Some(error) = catch_all_conflict(&root, &segments, pattern) {
            debug!(pattern, %error, "route rejected");
            return Err(error);
        }
        for &length in &truncations {
            let defaults = suffix_defaults(&segments[length..]);
            insert_path(&mut root, &segments[..length], hit.clone(), defaults, priority);
        }
    }

    router.routes.write().insert(
        id,
        Route {
            id,
            pattern: pattern.to_string(),
            handler,
            priority,
            authorized_roles,
            segments,
        },
    );

    debug!(
        pattern,
        priority,
        route_id = id,
        truncations = truncations.len(),
        "route registered"
    );
    Ok(id)
}

/// Registers a controller name for the implicit `<name>/index` retry that
/// the lookup façade applies to single-segment misses.
pub fn add_controller<T: Clone>(router: &Router<T>, name: &str) {
    router.controllers.write().insert(name.to_lowercase());
}

/// Sets the handler returned for empty-path requests.
pub fn set_index_route<T: Clone>(router: &Router<T>, handler: T) {
    let id = router.next_route_id.fetch_add(1, Ordering::Relaxed);
    *router.index_route.write() = Some(RouteHit {
        route_id: id,
        handler,
        priority: 0,
        authorized_roles: None,
    });
}

/// Prefix lengths a route expands to: the full length, plus one entry for
/// every optional-or-defaulted segment peeled off the tail. Lengths are
/// distinct by construction, so no dedup pass is needed.
fn truncation_lengths(segments: &[RouteSegment]) -> Vec<usize> {
    let mut lengths = vec![segments.len()];
    let mut cut = segments.len();
    while cut > 0 && segments[cut - 1].is_truncatable() {
        cut -= 1;
        lengths.push(cut);
    }
    lengths
}

/// Default values declared by a truncated-away suffix, in segment order.
fn suffix_defaults(suffix: &[RouteSegment]) -> Vec<(String, String)> {
    suffix
        .iter()
        .filter_map(|segment| {
            segment
                .truncation_default()
                .map(|(name, value)| (name.to_string(), value.to_string()))
        })
        .collect()
}

/// Checks a route ending in a catch-all against the single-bucket rule
/// before anything is mutated: if the parent position already carries a
/// catch-all with a different name or constraint set, the registration is
/// rejected. Runs under the write lock, so the check and the insertion are
/// atomic with respect to concurrent lookups and writers.
fn catch_all_conflict<T>(
    root: &Node<T>,
    segments: &[RouteSegment],
    pattern: &str,
) -> Option<RouterError> {
    let Some(RouteSegment::CatchAll { name, constraints }) = segments.last() else {
        return None;
    };
    let parent = peek_path(root, &segments[..segments.len() - 1])?;
    let existing = parent.catch_all_child.as_ref()?;
    if existing.name == *name && existing.constraints == *constraints {
        return None;
    }
    Some(RouterError::Structural {
        pattern: pattern.to_string(),
        reason: "catch-all conflicts with a differently defined catch-all at the same position"
            .to_string(),
    })
}

/// Follows an already-inserted path without creating nodes, resolving each
/// segment the way `insert_path` would. Returns `None` as soon as a segment
/// has no existing counterpart.
fn peek_path<'t, T>(root: &'t Node<T>, path: &[RouteSegment]) -> Option<&'t Node<T>> {
    let mut node = root;
    for segment in path {
        node = match segment {
            RouteSegment::Static { literal } => &**node.static_children.get(literal)?,
            RouteSegment::Dynamic {
                name, constraints, ..
            } => {
                let candidate = node
                    .dynamic_children
                    .iter()
                    .find(|c| c.name == *name && c.constraints == *constraints)?;
                &*candidate.node
            }
            RouteSegment::Wildcard => node.wildcard_child.as_deref()?,
            // Catch-alls are final by construction, never mid-path.
            RouteSegment::CatchAll { .. } => return None,
        };
    }
    Some(node)
}

/// Inserts one truncation path and binds its terminal.
fn insert_path<T: Clone>(
    root: &mut Node<T>,
    path: &[RouteSegment],
    hit: RouteHit<T>,
    suffix_defaults: Vec<(String, String)>,
    priority: i32,
) {
    let mut node: &mut Node<T> = root;
    for segment in path {
        node = match segment {
            RouteSegment::Static { literal } => {
                &mut **node
                    .static_children
                    .entry(literal.clone())
                    .or_insert_with(|| Box::new(Node::new()))
            }
            RouteSegment::Dynamic {
                name, constraints, ..
            } => place_candidate(&mut node.dynamic_children, name, constraints, priority),
            RouteSegment::Wildcard => {
                &mut **node
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new()))
            }
            RouteSegment::CatchAll { name, constraints } => {
                // The conflict check already ran, so an existing bucket has
                // the identical name and constraint set.
                let bucket = node
                    .catch_all_child
                    .get_or_insert_with(|| new_candidate(name, constraints, priority));
                if priority > bucket.route_priority {
                    bucket.route_priority = priority;
                }
                &mut *bucket.node
            }
        };
    }
    node.bind_terminal(hit, suffix_defaults);
}

/// Sort key for the dynamic tie-break: narrower type priority first, then
/// higher route priority. Insertion order settles what the key leaves tied.
fn candidate_sort_key<T>(candidate: &DynamicCandidate<T>) -> (u32, Reverse<i32>) {
    (candidate.type_priority, Reverse(candidate.route_priority))
}

/// Finds or creates the candidate for `(name, constraints)` among a node's
/// siblings and returns its subtree, keeping the list in tie-break order
/// throughout.
///
/// A candidate with the identical name and constraint set is reused; reuse
/// by a higher-priority route bumps the candidate's route priority and
/// moves it to its new slot. New candidates are inserted after all entries
/// whose key is not larger, which preserves registration order among
/// equals.
fn place_candidate<'g, T: Clone>(
    group: &'g mut Vec<DynamicCandidate<T>>,
    name: &str,
    constraints: &[Constraint],
    priority: i32,
) -> &'g mut Node<T> {
    let same = |c: &DynamicCandidate<T>| c.name == name && c.constraints == constraints;

    let position = group.iter().position(same);
    let index = match position {
        Some(index) if priority <= group[index].route_priority => index,
        Some(index) => {
            let mut candidate = group.remove(index);
            candidate.route_priority = priority;
            let slot = group
                .partition_point(|c| candidate_sort_key(c) <= candidate_sort_key(&candidate));
            group.insert(slot, candidate);
            slot
        }
        None => {
            let candidate = new_candidate(name, constraints, priority);
            let slot = group
                .partition_point(|c| candidate_sort_key(c) <= candidate_sort_key(&candidate));
            group.insert(slot, candidate);
            slot
        }
    };
    &mut *group[index].node
}
