use crate::{
    context::{Node, Router, Terminal},
    operations::util::{acquire_buffer, lowercase_segments, release_buffer, split_path},
    types::{MatchResult, RouteHit, WILDCARD_PARAM},
};
use ahash::AHashMap;
use tracing::trace;

/// Finds the route that best matches the given request path.
///
/// The path is split on `/` (empty segments dropped); static comparison is
/// case-insensitive while captured values keep the request's casing. The
/// tree is walked depth-first with backtracking: at every level the static
/// branch is tried first, then the dynamic candidates in tie-break order,
/// then a catch-all, then a wildcard. The first fully-consumed routable
/// node wins.
///
/// Special cases handled by the façade rather than the tree walk:
/// - An empty path resolves to the index handler configured via
///   [`crate::set_index_route`], when there is one.
/// - A clean single-segment miss (no partial) on a name registered with
///   [`crate::add_controller`] is retried as `<name>/index`.
///
/// Never returns an error: a malformed or unroutable path is simply a
/// result with `is_match == false`. A miss carries no parameter bindings;
/// its `best_partial` reports the deepest routable node the walk saw, for
/// diagnostics only.
pub fn find_route<T: Clone>(router: &Router<T>, path: &str) -> MatchResult<T> {
    let segments: Vec<&str> = split_path(path).collect();

    if segments.is_empty() {
        if let Some(hit) = router.index_route.read().clone() {
            trace!(path, "matched index route");
            return MatchResult::matched(hit, AHashMap::default());
        }
    }

    let lowered = lowercase_segments(&segments);
    let first = run_match(router, &segments, &lowered);
    if first.is_match {
        trace!(
            path,
            route_id = ?first.matched_route.as_ref().map(|hit| hit.route_id),
            "matched"
        );
        return first;
    }

    // Controller retry applies only to a clean miss, not a partial one.
    if segments.len() == 1 && first.best_partial.is_none() {
        let is_controller = router.controllers.read().contains(&lowered[0]);
        if is_controller {
            let retry_segments = [segments[0], "index"];
            let retry_lowered = [lowered[0].clone(), "index".to_string()];
            let retry = run_match(router, &retry_segments, &retry_lowered);
            if retry.is_match {
                trace!(path, "matched via controller index retry");
                return retry;
            }
        }
    }

    trace!(path, "no match");
    first
}

/// Per-lookup matcher state shared down the recursion.
struct MatchState<'r, T> {
    /// Request segments in original casing (bound into captures).
    segments: &'r [&'r str],
    /// The same segments lower-cased (static child lookups).
    lowered: &'r [String],
    /// Parameter bindings along the current path.
    params: AHashMap<String, String>,
    /// Deepest routable node seen so far, with its depth.
    best_partial: Option<(usize, RouteHit<T>)>,
}

fn run_match<T: Clone>(
    router: &Router<T>,
    segments: &[&str],
    lowered: &[String],
) -> MatchResult<T> {
    let root = router.root.read();
    let mut state = MatchState {
        segments,
        lowered,
        params: AHashMap::default(),
        best_partial: None,
    };

    match descend(&root, 0, &mut state) {
        Some(terminal) => {
            // Defaults of the truncated-away suffix fill in whatever the
            // walk did not bind.
            for (name, value) in &terminal.suffix_defaults {
                state
                    .params
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            MatchResult::matched(terminal.hit.clone(), state.params)
        }
        None => MatchResult::miss(state.best_partial.map(|(_, hit)| hit)),
    }
}

/// The depth-first walk. Returns the terminal of the first exact match, or
/// `None` after exhausting this subtree. Bindings written while exploring a
/// failed branch are unwound before the next branch is tried.
fn descend<'t, T: Clone>(
    node: &'t Node<T>,
    idx: usize,
    state: &mut MatchState<'_, T>,
) -> Option<&'t Terminal<T>> {
    if let Some(terminal) = &node.terminal {
        let improves = state.best_partial.as_ref().is_none_or(|(depth, best)| {
            idx > *depth || (idx == *depth && terminal.hit.priority > best.priority)
        });
        if improves {
            state.best_partial = Some((idx, terminal.hit.clone()));
        }
    }

    // Cursor exhausted: the match is exact iff some route terminates here.
    if idx == state.segments.len() {
        if let Some(terminal) = &node.terminal {
            return Some(terminal);
        }
        // A wildcard also covers an empty remainder; the capture is `/`.
        if let Some(wildcard) = &node.wildcard_child {
            if let Some(terminal) = &wildcard.terminal {
                state
                    .params
                    .insert(WILDCARD_PARAM.to_string(), "/".to_string());
                return Some(terminal);
            }
        }
        return None;
    }

    let value = state.segments[idx];

    // a. Static branch.
    if let Some(child) = node.static_children.get(state.lowered[idx].as_str()) {
        if let Some(terminal) = descend(child, idx + 1, state) {
            return Some(terminal);
        }
    }

    // b. Dynamic candidates, in tie-break order.
    for candidate in &node.dynamic_children {
        if !candidate.constraints.iter().all(|c| c.evaluate(value)) {
            continue;
        }
        let previous = state
            .params
            .insert(candidate.name.clone(), value.to_string());
        if let Some(terminal) = descend(&candidate.node, idx + 1, state) {
            return Some(terminal);
        }
        match previous {
            Some(restored) => state.params.insert(candidate.name.clone(), restored),
            None => state.params.remove(&candidate.name),
        };
    }

    // c. Catch-all: validates and captures the joined remainder.
    if let Some(candidate) = &node.catch_all_child {
        if let Some(terminal) = &candidate.node.terminal {
            let mut buffer = acquire_buffer();
            for (i, segment) in state.segments[idx..].iter().enumerate() {
                if i > 0 {
                    buffer.push('/');
                }
                buffer.push_str(segment);
            }
            let accepted = candidate.constraints.iter().all(|c| c.evaluate(&buffer));
            if accepted {
                state.params.insert(candidate.name.clone(), buffer.clone());
                release_buffer(buffer);
                return Some(terminal);
            }
            release_buffer(buffer);
        }
    }

    // d. Wildcard: consumes the remainder unconditionally, each segment
    // surrounded by slashes.
    if let Some(wildcard) = &node.wildcard_child {
        if let Some(terminal) = &wildcard.terminal {
            let mut buffer = acquire_buffer();
            buffer.push('/');
            for segment in &state.segments[idx..] {
                buffer.push_str(segment);
                buffer.push('/');
            }
            state
                .params
                .insert(WILDCARD_PARAM.to_string(), buffer.clone());
            release_buffer(buffer);
            return Some(terminal);
        }
    }

    None
}
