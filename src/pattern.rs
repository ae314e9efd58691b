//! Pattern lexing and segment compilation.
//!
//! A route pattern is lexed into raw segments (the text between `/`
//! separators, with `/` inside parameter braces left alone), then each raw
//! segment is compiled into a typed [`RouteSegment`]. Structural rules that
//! span the whole pattern (wildcards last, optionals after required
//! segments) are enforced here, so every compiled segment list handed to
//! the tree is well formed.

use crate::constraints::Constraint;
use crate::error::RouterError;
use crate::types::RouteSegment;

/// Lexes a pattern into raw segment strings.
///
/// Splits on `/` only outside parameter braces, skips the leading `/`,
/// drops empty segments, and leaves doubled braces (`{{`, `}}`) intact for
/// the segment compiler to fold. An unmatched brace is a syntax error.
pub fn split_pattern(pattern: &str) -> Result<Vec<String>, RouterError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: u32 = 0;
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' | '}' if chars.peek() == Some(&ch) => {
                // Doubled braces are literal text, not delimiters.
                chars.next();
                current.push(ch);
                current.push(ch);
            }
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                if depth == 0 {
                    return Err(RouterError::PatternSyntax {
                        pattern: pattern.to_string(),
                        reason: "unmatched '}'".to_string(),
                    });
                }
                depth -= 1;
                current.push(ch);
            }
            '/' if depth == 0 => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if depth != 0 {
        return Err(RouterError::PatternSyntax {
            pattern: pattern.to_string(),
            reason: "unmatched '{'".to_string(),
        });
    }
    if !current.is_empty() {
        segments.push(current);
    }
    Ok(segments)
}

/// Compiles a single raw segment into its typed form.
fn compile_segment(raw: &str, pattern: &str) -> Result<RouteSegment, RouterError> {
    let trimmed = raw.trim();

    if trimmed == "*" {
        return Ok(RouteSegment::Wildcard);
    }

    let is_parameter =
        trimmed.starts_with('{') && !trimmed.starts_with("{{") && trimmed.ends_with('}');
    if is_parameter {
        return compile_parameter(&trimmed[1..trimmed.len() - 1], pattern);
    }

    Ok(RouteSegment::Static {
        literal: fold_brace_escapes(trimmed, pattern)?.to_lowercase(),
    })
}

/// Compiles the interior of `{...}` into a Dynamic or CatchAll segment.
///
/// The interior is split on `:` into the name part and constraint
/// specifiers. A `regex(...)` specifier re-absorbs everything after it, so
/// colons inside the expression survive. A trailing `?` on the name or on
/// the final specifier marks the parameter optional; `=` in the name part
/// introduces a default value.
fn compile_parameter(interior: &str, pattern: &str) -> Result<RouteSegment, RouterError> {
    let syntax = |reason: &str| RouterError::PatternSyntax {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = interior.split(':').collect();
    let mut optional = false;

    let mut name_part = parts[0];
    if let Some(stripped) = name_part.strip_suffix('?') {
        optional = true;
        name_part = stripped;
    }

    // Constraint specifiers, with the regex tail re-joined.
    let mut specifiers: Vec<String> = Vec::new();
    let mut idx = 1;
    while idx < parts.len() {
        if parts[idx].starts_with("regex(") || parts[idx] == "regex" {
            let mut tail = parts[idx..].join(":");
            if let Some(stripped) = tail.strip_suffix('?') {
                if stripped.ends_with(')') {
                    optional = true;
                    tail = stripped.to_string();
                }
            }
            specifiers.push(tail);
            break;
        }
        let mut spec = parts[idx];
        if idx == parts.len() - 1 {
            if let Some(stripped) = spec.strip_suffix('?') {
                optional = true;
                spec = stripped;
            }
        }
        if spec.is_empty() {
            return Err(syntax("empty constraint specifier"));
        }
        specifiers.push(spec.to_string());
        idx += 1;
    }

    let constraints = specifiers
        .iter()
        .map(|spec| Constraint::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(catch_all_name) = name_part.strip_prefix("**") {
        if catch_all_name.is_empty() {
            return Err(syntax("catch-all must be named"));
        }
        if catch_all_name.contains('=') {
            return Err(syntax("catch-all cannot carry a default value"));
        }
        if optional {
            return Err(RouterError::Structural {
                pattern: pattern.to_string(),
                reason: "catch-all cannot be optional".to_string(),
            });
        }
        return Ok(RouteSegment::CatchAll {
            name: catch_all_name.to_lowercase(),
            constraints,
        });
    }

    let (name, default) = match name_part.split_once('=') {
        Some((name, default)) => (name, Some(default.to_string())),
        None => (name_part, None),
    };
    if name.is_empty() {
        return Err(syntax("empty parameter name"));
    }
    if optional && default.is_some() {
        return Err(syntax(
            "a parameter cannot be both optional and carry a default value",
        ));
    }

    Ok(RouteSegment::Dynamic {
        name: name.to_lowercase(),
        constraints,
        optional,
        default,
    })
}

/// Folds `{{`/`}}` escapes in a literal segment down to single braces.
/// Any remaining lone brace means a parameter delimiter ended up mid-text.
fn fold_brace_escapes(raw: &str, pattern: &str) -> Result<String, RouterError> {
    let mut folded = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' | '}' if chars.peek() == Some(&ch) => {
                chars.next();
                folded.push(ch);
            }
            '{' | '}' => {
                return Err(RouterError::PatternSyntax {
                    pattern: pattern.to_string(),
                    reason: "parameter braces must enclose a whole segment".to_string(),
                });
            }
            _ => folded.push(ch),
        }
    }
    Ok(folded)
}

/// Compiles a full pattern into its segment sequence, enforcing the
/// structural invariants of the route table. Useful for validating a
/// pattern without registering it.
pub fn compile_pattern(pattern: &str) -> Result<Vec<RouteSegment>, RouterError> {
    let raw_segments = split_pattern(pattern)?;
    if raw_segments.is_empty() {
        return Err(RouterError::PatternSyntax {
            pattern: pattern.to_string(),
            reason: "pattern has no segments; use set_index_route for the empty path".to_string(),
        });
    }

    let segments = raw_segments
        .iter()
        .map(|raw| compile_segment(raw, pattern))
        .collect::<Result<Vec<_>, _>>()?;

    let structural = |reason: &str| RouterError::Structural {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let last = segments.len() - 1;
    let mut saw_optional = false;
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            RouteSegment::Wildcard if i != last => {
                return Err(structural("wildcard must be the final segment"));
            }
            RouteSegment::CatchAll { .. } if i != last => {
                return Err(structural("catch-all must be the final segment"));
            }
            _ => {}
        }
        // Once a segment is optional, everything after it must be
        // truncatable too, or truncations could skip a required segment.
        if saw_optional && !segment.is_truncatable() {
            return Err(structural(
                "optional segments must follow all required segments",
            ));
        }
        if matches!(segment, RouteSegment::Dynamic { optional: true, .. }) {
            saw_optional = true;
        }
    }

    Ok(segments)
}
