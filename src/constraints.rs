//! Constraint records and validators for dynamic route parameters.
//!
//! A constraint is a named, pure predicate attached to a dynamic segment,
//! written in the pattern as `{name:int}`, `{name:range(0,100)}` or
//! `{name:regex(...)}`. This module parses textual constraint specifiers
//! into the closed [`Constraint`] enum and evaluates them against candidate
//! segment values at match time.
//!
//! Parsed specifiers are memoized in an append-only, concurrency-safe cache
//! keyed by the specifier text, so registering many routes with the same
//! constraint does the parsing work once. Compiled regular expressions are
//! cached the same way.

use crate::error::RouterError;
use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use uuid::Uuid;

/// A typed parameter constraint.
///
/// The set of kinds is closed: callers cannot register new validators.
/// Unrecognized constraint names are carried as [`Constraint::Unknown`],
/// which is accepted at registration but rejects every candidate at match
/// time, so a typo in a pattern shows up as a route that never matches
/// rather than a crash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Value parses as a 32-bit signed integer.
    Int,
    /// Value is `true` or `false`, case-insensitive.
    Bool,
    /// Value parses as a calendar date or date-time.
    DateTime,
    /// Value parses as a decimal number.
    Decimal,
    /// Value parses as a 64-bit float.
    Double,
    /// Value parses as a 32-bit float.
    Float,
    /// Value is a canonically formatted GUID.
    Guid,
    /// Value parses as a 64-bit signed integer.
    Long,
    /// Value is at least this many characters long.
    MinLength(usize),
    /// Value is at most this many characters long.
    MaxLength(usize),
    /// Value is exactly this many characters long.
    Length(usize),
    /// Value length falls within the inclusive range.
    LengthRange(usize, usize),
    /// Value parses as an integer no smaller than the bound.
    Min(i64),
    /// Value parses as an integer no larger than the bound.
    Max(i64),
    /// Value parses as an integer within the inclusive range.
    Range(i64, i64),
    /// Value is non-empty and entirely alphabetic.
    Alpha,
    /// Value matches the regular expression. A malformed expression never
    /// errors; it simply matches nothing.
    Regex(String),
    /// Value is non-empty.
    Required,
    /// Constraint name that no validator is registered for.
    Unknown(String),
}

/// Memoized parse results, keyed by the exact specifier text.
static PARSE_CACHE: Lazy<RwLock<AHashMap<String, Constraint>>> =
    Lazy::new(|| RwLock::new(AHashMap::default()));

/// Compiled regex cache. `None` records a pattern that failed to compile.
static REGEX_CACHE: Lazy<RwLock<AHashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(AHashMap::default()));

impl Constraint {
    /// Parses a textual constraint specifier such as `int`, `min(1)`,
    /// `range(0,100)` or `regex(^\d+$)`.
    ///
    /// The `regex` kind captures the entire text between the first `(` and
    /// the last `)`, so embedded commas, colons and parentheses survive.
    /// Known kinds with malformed arguments are rejected with
    /// [`RouterError::ConstraintFormat`]; unknown names parse successfully
    /// into [`Constraint::Unknown`].
    pub fn parse(specifier: &str) -> Result<Constraint, RouterError> {
        if let Some(hit) = PARSE_CACHE.read().get(specifier) {
            return Ok(hit.clone());
        }

        let parsed = Self::parse_uncached(specifier)?;
        PARSE_CACHE
            .write()
            .entry(specifier.to_string())
            .or_insert_with(|| parsed.clone());
        Ok(parsed)
    }

    fn parse_uncached(specifier: &str) -> Result<Constraint, RouterError> {
        let bad = |reason: &str| RouterError::ConstraintFormat {
            specifier: specifier.to_string(),
            reason: reason.to_string(),
        };

        // `regex(...)` swallows everything up to the last ')', including
        // characters that would otherwise terminate an argument list.
        if specifier.starts_with("regex(") || specifier == "regex" {
            let open = specifier.find('(').ok_or_else(|| bad("missing '('"))?;
            let close = specifier.rfind(')').filter(|&c| c > open);
            let close = close.ok_or_else(|| bad("unterminated argument list"))?;
            return Ok(Constraint::Regex(specifier[open + 1..close].to_string()));
        }

        let (name, args): (&str, Vec<&str>) = match specifier.find('(') {
            Some(open) => {
                if !specifier.ends_with(')') {
                    return Err(bad("unterminated argument list"));
                }
                let inner = &specifier[open + 1..specifier.len() - 1];
                (&specifier[..open], inner.split(',').map(str::trim).collect())
            }
            None => (specifier, Vec::new()),
        };

        let parse_usize = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| bad("argument must be a non-negative integer"))
        };
        let parse_i64 = |s: &str| s.parse::<i64>().map_err(|_| bad("argument must be an integer"));

        let constraint = match (name, args.as_slice()) {
            ("int", []) => Constraint::Int,
            ("bool", []) => Constraint::Bool,
            ("datetime", []) => Constraint::DateTime,
            ("decimal", []) => Constraint::Decimal,
            ("double", []) => Constraint::Double,
            ("float", []) => Constraint::Float,
            ("guid", []) => Constraint::Guid,
            ("long", []) => Constraint::Long,
            ("alpha", []) => Constraint::Alpha,
            ("required", []) => Constraint::Required,
            ("minlength", [n]) => Constraint::MinLength(parse_usize(n)?),
            ("maxlength", [n]) => Constraint::MaxLength(parse_usize(n)?),
            ("length", [n]) => Constraint::Length(parse_usize(n)?),
            ("length", [min, max]) => Constraint::LengthRange(parse_usize(min)?, parse_usize(max)?),
            ("min", [n]) => Constraint::Min(parse_i64(n)?),
            ("max", [n]) => Constraint::Max(parse_i64(n)?),
            ("range", [min, max]) => Constraint::Range(parse_i64(min)?, parse_i64(max)?),
            (
                "int" | "bool" | "datetime" | "decimal" | "double" | "float" | "guid" | "long"
                | "alpha" | "required",
                _,
            ) => return Err(bad("constraint takes no arguments")),
            (
                "minlength" | "maxlength" | "min" | "max",
                _,
            ) => return Err(bad("constraint takes exactly one argument")),
            ("length", _) => return Err(bad("constraint takes one or two arguments")),
            ("range", _) => return Err(bad("constraint takes exactly two arguments")),
            (other, _) => Constraint::Unknown(other.to_string()),
        };
        Ok(constraint)
    }

    /// Evaluates this constraint against a candidate segment value.
    ///
    /// Pure predicate: no allocation on the hot paths, never panics, never
    /// errors. [`Constraint::Unknown`] always returns `false`.
    pub fn evaluate(&self, candidate: &str) -> bool {
        match self {
            Constraint::Int => candidate.parse::<i32>().is_ok(),
            Constraint::Bool => {
                candidate.eq_ignore_ascii_case("true") || candidate.eq_ignore_ascii_case("false")
            }
            Constraint::DateTime => parses_as_datetime(candidate),
            Constraint::Decimal | Constraint::Double => candidate.parse::<f64>().is_ok(),
            Constraint::Float => candidate.parse::<f32>().is_ok(),
            Constraint::Guid => Uuid::try_parse(candidate).is_ok(),
            Constraint::Long => candidate.parse::<i64>().is_ok(),
            Constraint::MinLength(n) => candidate.chars().count() >= *n,
            Constraint::MaxLength(n) => candidate.chars().count() <= *n,
            Constraint::Length(n) => candidate.chars().count() == *n,
            Constraint::LengthRange(min, max) => {
                let len = candidate.chars().count();
                *min <= len && len <= *max
            }
            Constraint::Min(n) => candidate.parse::<i64>().is_ok_and(|v| v >= *n),
            Constraint::Max(n) => candidate.parse::<i64>().is_ok_and(|v| v <= *n),
            Constraint::Range(min, max) => candidate
                .parse::<i64>()
                .is_ok_and(|v| *min <= v && v <= *max),
            Constraint::Alpha => {
                !candidate.is_empty() && candidate.chars().all(char::is_alphabetic)
            }
            Constraint::Regex(pattern) => regex_is_match(pattern, candidate),
            Constraint::Required => !candidate.is_empty(),
            Constraint::Unknown(_) => false,
        }
    }

    /// Type priority used to order sibling dynamic candidates: narrower
    /// value spaces are tried first.
    pub(crate) fn type_priority(&self) -> u32 {
        match self {
            Constraint::Int => 1,
            Constraint::Guid => 2,
            Constraint::Long => 3,
            _ => 10,
        }
    }
}

/// Type priority of a whole constraint set: the minimum over its members,
/// or `u32::MAX` for an unconstrained candidate.
pub(crate) fn set_type_priority(constraints: &[Constraint]) -> u32 {
    constraints
        .iter()
        .map(Constraint::type_priority)
        .min()
        .unwrap_or(u32::MAX)
}

fn parses_as_datetime(candidate: &str) -> bool {
    DateTime::parse_from_rfc3339(candidate).is_ok()
        || NaiveDateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(candidate, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(candidate, "%Y-%m-%d").is_ok()
}

fn regex_is_match(pattern: &str, candidate: &str) -> bool {
    if let Some(compiled) = REGEX_CACHE.read().get(pattern) {
        return compiled.as_ref().is_some_and(|re| re.is_match(candidate));
    }

    let compiled = Regex::new(pattern).ok();
    let mut cache = REGEX_CACHE.write();
    let entry = cache.entry(pattern.to_string()).or_insert(compiled);
    entry.as_ref().is_some_and(|re| re.is_match(candidate))
}
