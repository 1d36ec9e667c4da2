//! # Path Patterns
//!
//! Route paths compile to anchored regular expressions:
//!
//! | Token | Matches |
//! |-------|---------|
//! | `*` | anything, including `/` |
//! | `:name` (whole segment) | one non-empty segment, captured as `name` |
//! | anything else | itself, literally |
//!
//! Matching is against the whole normalized path, never a prefix.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use super::errors::NavigationError;

/// Captured `:name` parameters.
pub type RouteParams = BTreeMap<String, String>;

/// A compiled route path.
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl PathPattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    /// `NavigationError::InvalidPattern` for malformed parameter names or
    /// duplicate parameters.
    pub fn compile(pattern: &str) -> Result<Self, NavigationError> {
        let source = normalize_path(pattern);
        let invalid = |reason: String| NavigationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut params = Vec::new();
        let mut expr = String::from("^");
        if source == "/" {
            expr.push('/');
        }
        for segment in source.split('/').filter(|s| !s.is_empty()) {
            expr.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                if !is_param_name(name) {
                    return Err(invalid(format!("bad parameter name `{name}`")));
                }
                if params.iter().any(|p| p == name) {
                    return Err(invalid(format!("duplicate parameter `{name}`")));
                }
                expr.push_str(&format!("(?P<{name}>[^/]+)"));
                params.push(name.to_string());
            } else {
                let literal: Vec<String> = segment.split('*').map(regex::escape).collect();
                expr.push_str(&literal.join(".*"));
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            source,
            regex,
            params,
        })
    }

    /// Normalized pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// Match a full path; returns the captured parameters.
    ///
    /// Query string and fragment are ignored.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let path = normalize_path(strip_query(path));
        let captures = self.regex.captures(&path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// True if `path` matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.source).finish()
    }
}

/// Leading `/`, no trailing `/` (except the root), no empty segments.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Join a child path onto its parent. Absolute children stay as they are.
#[must_use]
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        normalize_path(child)
    } else {
        normalize_path(&format!("{parent}/{child}"))
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
