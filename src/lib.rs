//! # routier
//!
//! routier is a priority-aware URL route table for Rust. A registry of
//! declarative patterns answers match queries for request paths, returning
//! the single best handler together with the extracted path parameters.
//!
//! The pattern grammar is dense: literal segments (case-insensitive), typed
//! parameters (e.g. `/users/{id:int}`), optional segments and default
//! values (`/list/{page=1:int}`), single-segment wildcards (`/*`) and named
//! multi-segment catch-alls (`/files/{**path}`). Matching is deterministic:
//! static beats dynamic beats catch-all beats wildcard at every level,
//! sibling dynamic candidates are ordered by how narrow their constraints
//! are, and route priority breaks the remaining ties.
//!
//! ## Features
//!
//! - Static, parameterized, wildcard and catch-all route matching.
//! - Typed parameter constraints (`int`, `guid`, `range(a,b)`, `regex(...)`
//!   and friends) validated during the tree walk.
//! - Optional segments and default values, expanded into route truncations.
//! - Priority-based shadowing with last-writer-wins at equal priority.
//! - Thread-safe registry using `parking_lot::RwLock`.
//! - Efficient data structures (`AHashMap`, `IndexMap`) for performance.
//! - Structured error handling with `thiserror`.
//!
//! ## Example
//!
//! ```rust
//! use routier::{Router, add_route, find_route};
//!
//! // Create a new router instance.
//! let router = Router::new();
//!
//! // Add some routes.
//! add_route(&router, "/home", "Welcome Home!", 0, None).expect("Failed to add /home");
//! add_route(&router, "/users/{id:int}", "User Profile", 0, None)
//!     .expect("Failed to add /users/{id:int}");
//! add_route(&router, "/files/{**filepath}", "Serve File", 0, None)
//!     .expect("Failed to add /files/{**filepath}");
//!
//! // Find a route. Parameters come back as raw strings keyed by name.
//! let result = find_route(&router, "/users/123");
//! assert!(result.is_match);
//! assert_eq!(result.matched_route.unwrap().handler, "User Profile");
//! assert_eq!(result.params.get("id").unwrap(), "123");
//!
//! // Constraint violations are clean misses, not errors.
//! let miss = find_route(&router, "/users/not-a-number");
//! assert!(!miss.is_match);
//!
//! // Catch-alls capture the joined remainder under their own name.
//! let file = find_route(&router, "/files/path/to/file.txt");
//! assert_eq!(file.params.get("filepath").unwrap(), "path/to/file.txt");
//! ```

pub mod constraints;
pub mod context;
pub mod error;
pub mod operations;
pub mod pattern;
pub mod types;

pub use constraints::Constraint;
pub use context::Router;
pub use error::RouterError;
pub use operations::add_controller;
pub use operations::add_route;
pub use operations::find_route;
pub use operations::set_index_route;
pub use types::{MatchResult, Route, RouteHit, RouteId, RouteInfo, RouteSegment, WILDCARD_PARAM};
