//! Route pattern compilation.
//!
//! A pattern is literal text mixed with placeholders and trailing optional
//! groups:
//!
//! - `{name}` captures one or more non-slash characters
//! - `{name:regex}` captures text matching `regex`; braces inside the regex
//!   must balance, so `{year:\d{4}}` works
//! - `[...]` wraps an optional tail; one further group may nest inside it
//!   (`/a[/{b}[/{c}]]`), and once a group closes only closing brackets may
//!   follow
//!
//! Patterns are turned into an ordered list of [`Segment`]s and a single
//! anchored [`Regex`]. Each optional group becomes a greedy `(?:...)?`, so the
//! regex engine expands the most nested groups first and gives them back
//! when the rest of the path does not fit.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

use super::core::ParamVec;
use crate::error::RouteError;

/// Deepest allowed nesting of optional groups (`/a[/{b}[/{c}]]`).
pub const MAX_OPTIONAL_DEPTH: usize = 2;

/// Constraint used for placeholders without an explicit regex.
pub const DEFAULT_PARAM_REGEX: &str = "[^/]+";

/// One parsed element of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must appear verbatim
    Literal(String),
    /// A named placeholder with its constraint regex
    Param {
        /// Placeholder name, unique within the pattern
        name: Arc<str>,
        /// Regex the captured text must match
        constraint: String,
    },
    /// `[`
    OptionalStart,
    /// `]`
    OptionalEnd,
}

/// A route pattern compiled for matching.
///
/// Built once per route when the route is registered and never recompiled.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    segments: Vec<Segment>,
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl CompiledPattern {
    /// Parse and validate `pattern`, then build its matcher.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidRoute`] for unbalanced, non-trailing or
    /// too deeply nested optional groups, empty groups, unterminated placeholders, invalid or
    /// duplicate parameter names, and constraints that fail to compile.
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let segments = parse_segments(pattern)?;
        validate_structure(pattern, &segments)?;

        let mut param_names: Vec<Arc<str>> = Vec::new();
        let mut seen = HashSet::new();
        let mut re = String::with_capacity(pattern.len() + 16);
        re.push('^');

        for segment in &segments {
            match segment {
                Segment::Literal(text) => re.push_str(&regex::escape(text)),
                Segment::Param { name, constraint } => {
                    if !seen.insert(Arc::clone(name)) {
                        return Err(RouteError::invalid(
                            pattern,
                            format!("duplicate parameter name `{name}`"),
                        ));
                    }
                    // Validate the constraint on its own so the error names the parameter
                    if let Err(e) = Regex::new(&format!("^(?:{constraint})$")) {
                        return Err(RouteError::invalid(
                            pattern,
                            format!("parameter `{name}` has an invalid regex: {e}"),
                        ));
                    }
                    re.push_str(&format!("(?P<{name}>{constraint})"));
                    param_names.push(Arc::clone(name));
                }
                Segment::OptionalStart => re.push_str("(?:"),
                Segment::OptionalEnd => re.push_str(")?"),
            }
        }
        re.push('$');

        let regex = Regex::new(&re)
            .map_err(|e| RouteError::invalid(pattern, format!("pattern does not compile: {e}")))?;

        Ok(Self {
            segments,
            regex,
            param_names,
        })
    }

    /// Parsed segments in declaration order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Whether `path` structurally matches, ignoring the HTTP method.
    #[inline]
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and return the URL-decoded values of every placeholder
    /// that took part in the match. Placeholders inside optional groups that
    /// were not consumed are absent.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for name in &self.param_names {
            if let Some(m) = caps.name(name) {
                params.push((Arc::clone(name), decode(m.as_str())));
            }
        }
        Some(params)
    }
}

/// Percent-decode a captured value; keep it raw if the bytes are not UTF-8.
fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_segments(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices();

    let flush = |literal: &mut String, segments: &mut Vec<Segment>| {
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(literal)));
        }
    };

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                flush(&mut literal, &mut segments);
                let mut depth = 1usize;
                let mut body = String::new();
                for (_, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    body.push(c);
                }
                if depth != 0 {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("unterminated placeholder starting at offset {start}"),
                    ));
                }
                let (name, constraint) = match body.split_once(':') {
                    Some((name, re)) => (name.trim(), re.trim()),
                    None => (body.trim(), DEFAULT_PARAM_REGEX),
                };
                if !is_valid_param_name(name) {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("invalid parameter name `{name}`"),
                    ));
                }
                if constraint.is_empty() {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("parameter `{name}` has an empty regex"),
                    ));
                }
                segments.push(Segment::Param {
                    name: Arc::from(name),
                    constraint: constraint.to_string(),
                });
            }
            '}' => {
                return Err(RouteError::invalid(
                    pattern,
                    format!("unexpected `}}` at offset {start}"),
                ));
            }
            '[' => {
                flush(&mut literal, &mut segments);
                segments.push(Segment::OptionalStart);
            }
            ']' => {
                flush(&mut literal, &mut segments);
                segments.push(Segment::OptionalEnd);
            }
            other => literal.push(other),
        }
    }
    flush(&mut literal, &mut segments);
    Ok(segments)
}

/// Check bracket balance, emptiness and the trailing-only rule.
fn validate_structure(pattern: &str, segments: &[Segment]) -> Result<(), RouteError> {
    let mut depth = 0usize;
    let mut closing = false;

    for (idx, segment) in segments.iter().enumerate() {
        match segment {
            Segment::OptionalStart => {
                if closing {
                    return Err(RouteError::invalid(
                        pattern,
                        "optional groups can only occur at the end of a route",
                    ));
                }
                if matches!(segments.get(idx + 1), Some(Segment::OptionalEnd) | None) {
                    return Err(RouteError::invalid(pattern, "empty optional group"));
                }
                depth += 1;
                if depth > MAX_OPTIONAL_DEPTH {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("optional groups nest at most {MAX_OPTIONAL_DEPTH} deep"),
                    ));
                }
            }
            Segment::OptionalEnd => {
                if depth == 0 {
                    return Err(RouteError::invalid(
                        pattern,
                        "unbalanced optional group: `]` without `[`",
                    ));
                }
                depth -= 1;
                closing = true;
            }
            Segment::Literal(_) | Segment::Param { .. } => {
                if closing {
                    return Err(RouteError::invalid(
                        pattern,
                        "optional groups can only occur at the end of a route",
                    ));
                }
            }
        }
    }

    if depth != 0 {
        return Err(RouteError::invalid(
            pattern,
            "unbalanced optional group: missing `]`",
        ));
    }
    Ok(())
}
