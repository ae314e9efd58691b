//! Contains type definitions used throughout the routier route table.
//!
//! This module defines the compiled representation of a route pattern
//! ([`RouteSegment`]), the registered route record ([`Route`]), and the
//! result of a match query ([`MatchResult`]).

use crate::constraints::Constraint;
use ahash::AHashMap;

/// Capture key under which a `*` wildcard exposes the remaining path.
///
/// Fixed by contract: always the literal `wildcard`, never derived from the
/// pattern text. Named catch-alls (`{**name}`) capture under their own name.
pub const WILDCARD_PARAM: &str = "wildcard";

/// Stable identifier assigned to a route at registration.
pub type RouteId = u64;

/// One compiled segment of a route pattern.
///
/// Produced by the segment compiler from the raw text between `/`
/// separators. The variants mirror the pattern grammar: literals, `{name}`
/// captures, the bare `*` wildcard and `{**name}` catch-alls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSegment {
    /// A literal segment, matched case-insensitively. Stored lower-cased,
    /// with `{{`/`}}` escapes already folded to plain braces.
    Static {
        /// The lower-cased literal text.
        literal: String,
    },
    /// A named single-segment capture, e.g. `{id:int}` or `{page=1}`.
    Dynamic {
        /// The lower-cased parameter name.
        name: String,
        /// Constraints the captured value must satisfy, in declaration order.
        constraints: Vec<Constraint>,
        /// Whether the segment may be absent from the request path.
        optional: bool,
        /// Value supplied for the parameter when the segment is absent.
        /// Mutually exclusive with `optional`.
        default: Option<String>,
    },
    /// A bare `*`: matches zero or more remaining segments, captured under
    /// [`WILDCARD_PARAM`].
    Wildcard,
    /// A named multi-segment capture, e.g. `{**rest}`. Always final, never
    /// optional.
    CatchAll {
        /// The lower-cased parameter name.
        name: String,
        /// Constraints evaluated against the joined remainder.
        constraints: Vec<Constraint>,
    },
}

impl RouteSegment {
    /// Whether a truncation may stop before this segment: true for dynamic
    /// segments that are optional or carry a default value.
    pub(crate) fn is_truncatable(&self) -> bool {
        matches!(
            self,
            RouteSegment::Dynamic {
                optional: true,
                ..
            } | RouteSegment::Dynamic {
                default: Some(_),
                ..
            }
        )
    }

    /// The default value this segment supplies when truncated away, if any.
    pub(crate) fn truncation_default(&self) -> Option<(&str, &str)> {
        match self {
            RouteSegment::Dynamic {
                name,
                default: Some(value),
                ..
            } => Some((name.as_str(), value.as_str())),
            _ => None,
        }
    }
}

/// A registered route. Immutable once inserted into the tree.
#[derive(Debug, Clone)]
pub struct Route<T> {
    /// Stable per-route identifier.
    pub id: RouteId,
    /// The original pattern text as passed to registration.
    pub pattern: String,
    /// Opaque handler identity associated by the caller.
    pub handler: T,
    /// Tie-break weight; higher wins, equals resolve last-writer-wins.
    pub priority: i32,
    /// Opaque role list passed through to the authorization collaborator.
    pub authorized_roles: Option<Vec<String>>,
    /// The compiled segment sequence.
    pub segments: Vec<RouteSegment>,
}

/// Identity of a route advertised by a terminal tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHit<T> {
    /// The matched route's stable identifier.
    pub route_id: RouteId,
    /// The matched route's handler.
    pub handler: T,
    /// The matched route's priority.
    pub priority: i32,
    /// The matched route's role list, passed through for the caller's
    /// authorization layer.
    pub authorized_roles: Option<Vec<String>>,
}

/// The outcome of a match query.
///
/// Either an exact match (handler plus fully bound parameters) or a miss.
/// On a miss no parameter bindings are exposed; `best_partial` reports the
/// deepest routable node the matcher saw, for diagnostics only.
#[derive(Debug, Clone)]
pub struct MatchResult<T> {
    /// Whether an exact match was found.
    pub is_match: bool,
    /// The matched route, when `is_match` is true.
    pub matched_route: Option<RouteHit<T>>,
    /// Captured parameters, keyed by lower-cased parameter name. Values
    /// preserve the casing of the request path.
    pub params: AHashMap<String, String>,
    /// Deepest routable node seen during the walk. Never a real match.
    pub best_partial: Option<RouteHit<T>>,
}

impl<T> MatchResult<T> {
    pub(crate) fn matched(hit: RouteHit<T>, params: AHashMap<String, String>) -> Self {
        Self {
            is_match: true,
            matched_route: Some(hit),
            params,
            best_partial: None,
        }
    }

    pub(crate) fn miss(best_partial: Option<RouteHit<T>>) -> Self {
        Self {
            is_match: false,
            matched_route: None,
            params: AHashMap::default(),
            best_partial,
        }
    }
}

/// Route metadata exposed by [`crate::Router::routes`] snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Stable per-route identifier.
    pub id: RouteId,
    /// The original pattern text.
    pub pattern: String,
    /// The route's priority.
    pub priority: i32,
    /// The route's role list, if any.
    pub authorized_roles: Option<Vec<String>>,
}
