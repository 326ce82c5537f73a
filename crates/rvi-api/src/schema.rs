//! Path schema for the forwarded API
//!
//! The schema lists every path template the gateway answers, together
//! with the HTTP methods allowed on it. It can be declared inline in the
//! daemon config or read from the `paths` section of an OpenAPI (Swagger)
//! YAML/JSON document.

use std::collections::HashMap;

use axum::http::Method;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a path schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse schema document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Schema document has no `paths` section")]
    MissingPaths,

    #[error("Invalid path template {0}: must start with '/'")]
    InvalidTemplate(String),
}

/// One path template and its allowed methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Absolute template, e.g. `/vehicles/{id}/odometer`
    pub template: String,
    /// Allowed methods, lowercase (`get`, `post`, ...)
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["get".to_string()]
}

impl PathEntry {
    pub fn new(template: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            template: template.into(),
            methods: methods.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }
}

/// A request path resolved against the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub entry: &'a PathEntry,
    /// Placeholder values keyed by placeholder name
    pub params: HashMap<String, String>,
}

impl RouteMatch<'_> {
    pub fn template(&self) -> &str {
        &self.entry.template
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.entry.allows(method)
    }
}

/// The set of path templates served by the gateway
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSchema {
    entries: Vec<PathEntry>,
}

impl PathSchema {
    pub fn new(entries: Vec<PathEntry>) -> Result<Self, SchemaError> {
        if let Some(bad) = entries.iter().find(|e| !e.template.starts_with('/')) {
            return Err(SchemaError::InvalidTemplate(bad.template.clone()));
        }
        Ok(Self { entries })
    }

    /// Demo schema used when no schema is configured
    pub fn vehicle_default() -> Self {
        Self {
            entries: vec![
                PathEntry::new("/vehicles", &["get"]),
                PathEntry::new("/vehicles/{id}", &["get"]),
                PathEntry::new("/vehicles/{id}/odometer", &["get"]),
                PathEntry::new("/vehicles/{id}/fuel", &["get"]),
                PathEntry::new("/vehicles/{id}/location", &["get"]),
                PathEntry::new("/vehicles/{id}/doors/lock", &["post"]),
                PathEntry::new("/vehicles/{id}/doors/unlock", &["post"]),
            ],
        }
    }

    /// Build a schema from the `paths` section of an OpenAPI document.
    ///
    /// Accepts YAML or JSON. Only the path keys and the HTTP method keys
    /// under them are read.
    pub fn from_openapi(document: &str) -> Result<Self, SchemaError> {
        const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

        let doc: serde_yaml::Value = serde_yaml::from_str(document)?;
        let paths = doc
            .get("paths")
            .and_then(serde_yaml::Value::as_mapping)
            .ok_or(SchemaError::MissingPaths)?;

        let mut entries = Vec::with_capacity(paths.len());
        for (template, operations) in paths {
            let Some(template) = template.as_str() else {
                continue;
            };
            let methods = operations
                .as_mapping()
                .map(|ops| {
                    ops.keys()
                        .filter_map(serde_yaml::Value::as_str)
                        .map(str::to_lowercase)
                        .filter(|m| METHODS.contains(&m.as_str()))
                        .collect()
                })
                .unwrap_or_default();
            entries.push(PathEntry {
                template: template.to_string(),
                methods,
            });
        }
        Self::new(entries)
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.template.as_str())
    }

    /// Find the template matching `path`.
    ///
    /// `{name}` matches exactly one non-empty segment, captured
    /// percent-decoded. A segment that decodes to something containing
    /// `/` matches no placeholder. When several templates match, the one
    /// with the most literal segments wins.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments = split_segments(path);
        self.entries
            .iter()
            .filter_map(|entry| {
                match_template(&entry.template, &segments).map(|(literals, params)| {
                    (literals, RouteMatch { entry, params })
                })
            })
            .max_by_key(|(literals, _)| *literals)
            .map(|(_, route)| route)
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Match `segments` against `template`, returning the number of literal
/// segments and the captured placeholders
fn match_template(
    template: &str,
    segments: &[&str],
) -> Option<(usize, HashMap<String, String>)> {
    let pattern = split_segments(template);
    if pattern.len() != segments.len() {
        return None;
    }

    let mut literals = 0;
    let mut params = HashMap::new();
    for (expected, actual) in pattern.iter().zip(segments) {
        match placeholder_name(expected) {
            Some(name) => {
                let value = percent_decode_str(actual).decode_utf8_lossy();
                if value.contains('/') {
                    return None;
                }
                params.insert(name.to_string(), value.into_owned());
            }
            None if expected == actual => literals += 1,
            None => return None,
        }
    }
    Some((literals, params))
}
