//! Defines the core data structures for the route table, primarily `Node`
//! and `Router`.
//!
//! A `Node` represents one position in the routing tree. Branches are keyed
//! by static literal, discriminated by parameter name and constraint set
//! for dynamic candidates, or held in the reserved wildcard / catch-all
//! slots. A node additionally becomes a *terminal* when some inserted route
//! (or one of its truncations) ends there; the terminal records the winning
//! handler and the default values of any truncated-away suffix.
//!
//! The `Router` is the registry façade: it owns the tree root and the route
//! list behind reader-writer locks, plus the implicit-controller set and
//! the optional index handler for empty-path requests.

use crate::constraints::{Constraint, set_type_priority};
use crate::types::{Route, RouteHit, RouteId, RouteInfo};
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::AtomicU64;

/// Handler binding recorded at a routable node.
///
/// Holds route identity, a handler clone and the priority rather than a
/// reference back into the route list, so the tree stays a strict DAG.
#[derive(Debug, Clone)]
pub(crate) struct Terminal<T> {
    /// Identity and handler of the winning route.
    pub(crate) hit: RouteHit<T>,
    /// Defaults of the optional-or-defaulted suffix this truncation dropped,
    /// merged into the params of any match that ends here.
    pub(crate) suffix_defaults: Vec<(String, String)>,
}

/// One dynamic (or catch-all) candidate below a node.
///
/// Dynamic siblings are discriminated by parameter name and constraint set
/// and kept in tie-break order: narrower type priority first, then higher
/// route priority, then insertion order. The catch-all bucket holds at most
/// one candidate, so no ordering applies there.
#[derive(Debug, Clone)]
pub(crate) struct DynamicCandidate<T> {
    /// Lower-cased parameter name the candidate binds.
    pub(crate) name: String,
    /// Constraint set discriminating this candidate from its siblings.
    pub(crate) constraints: Vec<Constraint>,
    /// Cached `set_type_priority` of the constraint set.
    pub(crate) type_priority: u32,
    /// Highest priority among routes inserted through this candidate.
    pub(crate) route_priority: i32,
    /// Subtree below the candidate.
    pub(crate) node: Box<Node<T>>,
}

/// Represents a node in the routing tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Children for static path segments, keyed by lower-cased literal.
    pub(crate) static_children: AHashMap<String, Box<Node<T>>>,
    /// Dynamic candidates in tie-break order.
    pub(crate) dynamic_children: Vec<DynamicCandidate<T>>,
    /// Child for a trailing `*` segment (reserved key, at most one).
    pub(crate) wildcard_child: Option<Box<Node<T>>>,
    /// The single reserved catch-all bucket (`{**name}`), mirroring
    /// `wildcard_child`: at most one per node, reused only by catch-alls
    /// with the identical name and constraint set.
    pub(crate) catch_all_child: Option<DynamicCandidate<T>>,
    /// Handler binding when some route terminates at this node.
    pub(crate) terminal: Option<Terminal<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Node<T> {
    /// Constructs a new `Node` with no children and no terminal.
    pub fn new() -> Self {
        Self {
            static_children: AHashMap::default(),
            dynamic_children: Vec::new(),
            wildcard_child: None,
            catch_all_child: None,
            terminal: None,
        }
    }

    /// Records a route terminating at this node. The highest priority wins;
    /// at equal priority the last writer wins.
    pub(crate) fn bind_terminal(
        &mut self,
        hit: RouteHit<T>,
        suffix_defaults: Vec<(String, String)>,
    ) {
        match &self.terminal {
            Some(existing) if hit.priority < existing.hit.priority => {}
            _ => {
                self.terminal = Some(Terminal {
                    hit,
                    suffix_defaults,
                });
            }
        }
    }
}

/// The main registry structure: owns the routing tree and the route list.
///
/// Writes (`add_route`) serialize behind the write side of the locks;
/// lookups take the read side, so a match observes either the pre- or the
/// post-insertion tree, never a partially inserted route.
#[derive(Debug)]
pub struct Router<T> {
    /// The root sentinel of the routing tree.
    pub(crate) root: RwLock<Box<Node<T>>>,
    /// Every accepted route, keyed by stable id, in registration order.
    pub(crate) routes: RwLock<IndexMap<RouteId, Route<T>>>,
    /// Controller names registered for implicit `<name>/index` retry.
    pub(crate) controllers: RwLock<AHashSet<String>>,
    /// Handler returned for empty-path requests, if configured.
    pub(crate) index_route: RwLock<Option<RouteHit<T>>>,
    /// Source of stable per-route identifiers.
    pub(crate) next_route_id: AtomicU64,
}

impl<T: Clone> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Router<T> {
    /// Constructs a new, empty `Router`.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Box::new(Node::new())),
            routes: RwLock::new(IndexMap::new()),
            controllers: RwLock::new(AHashSet::default()),
            index_route: RwLock::new(None),
            next_route_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the live routes: id, pattern, priority and roles, in
    /// registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .read()
            .values()
            .map(|route| RouteInfo {
                id: route.id,
                pattern: route.pattern.clone(),
                priority: route.priority,
                authorized_roles: route.authorized_roles.clone(),
            })
            .collect()
    }
}

/// Builds a fresh dynamic/catch-all candidate for a compiled segment.
pub(crate) fn new_candidate<T>(
    name: &str,
    constraints: &[Constraint],
    route_priority: i32,
) -> DynamicCandidate<T> {
    DynamicCandidate {
        name: name.to_string(),
        constraints: constraints.to_vec(),
        type_priority: set_type_priority(constraints),
        route_priority,
        node: Box::new(Node::new()),
    }
}
