//! Routing helpers for resource-scoped path templates.
//!
//! The HTTP path schema addresses most endpoints per vehicle, e.g.
//! `/vehicles/{id}/odometer`. On the RVI side the same endpoint is a
//! service name relative to the vehicle (`/odometer`), while outbound
//! calls go to the fully addressed path (`/vehicles/123/odometer`).
//! These helpers centralise that prefix logic so the registrar, the
//! dispatcher and the mock transport all agree on it.

use serde::{Deserialize, Serialize};

/// The resource-scoping prefix `/{resource}/{placeholder}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointScope {
    /// Collection segment, e.g. `vehicles`
    pub resource: String,
    /// Placeholder name for the resource identifier, e.g. `id`
    pub placeholder: String,
}

impl Default for EndpointScope {
    fn default() -> Self {
        Self {
            resource: "vehicles".to_string(),
            placeholder: "id".to_string(),
        }
    }
}

impl EndpointScope {
    pub fn new(resource: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            placeholder: placeholder.into(),
        }
    }

    /// The template prefix, e.g. `/vehicles/{id}`
    pub fn prefix(&self) -> String {
        format!("/{}/{{{}}}", self.resource, self.placeholder)
    }

    /// The placeholder token as it appears in templates, e.g. `{id}`
    pub fn placeholder_token(&self) -> String {
        format!("{{{}}}", self.placeholder)
    }

    /// Derive the RVI-relative service name for a schema template.
    ///
    /// Returns `None` for templates that are not scoped to a resource.
    ///
    /// ```
    /// # use rvi_core::routing::EndpointScope;
    /// let scope = EndpointScope::default();
    /// assert_eq!(scope.relative_endpoint("/vehicles/{id}/odometer"), Some("/odometer".to_string()));
    /// assert_eq!(scope.relative_endpoint("/vehicles/{id}"), Some("/".to_string()));
    /// assert_eq!(scope.relative_endpoint("/vehicles"), None);
    /// ```
    pub fn relative_endpoint(&self, template: &str) -> Option<String> {
        let rest = template.strip_prefix(&self.prefix())?;
        relative_remainder(rest)
    }

    /// Derive the RVI-relative service name for an already addressed path,
    /// i.e. one where the placeholder has been replaced by a concrete id.
    ///
    /// ```
    /// # use rvi_core::routing::EndpointScope;
    /// let scope = EndpointScope::default();
    /// assert_eq!(scope.relative_endpoint_of_path("/vehicles/123/foo/bar"), Some("/foo/bar".to_string()));
    /// assert_eq!(scope.relative_endpoint_of_path("/vehicles/123"), Some("/".to_string()));
    /// ```
    pub fn relative_endpoint_of_path(&self, path: &str) -> Option<String> {
        let rest = path
            .strip_prefix('/')?
            .strip_prefix(self.resource.as_str())?
            .strip_prefix('/')?;
        let (id, rest) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if id.is_empty() {
            return None;
        }
        relative_remainder(rest)
    }

    /// Substitute the resource identifier into a template.
    ///
    /// Only the first placeholder occurrence is replaced.
    ///
    /// ```
    /// # use rvi_core::routing::EndpointScope;
    /// let scope = EndpointScope::default();
    /// assert_eq!(scope.address_path("/vehicles/{id}/foo/bar", "123"), "/vehicles/123/foo/bar");
    /// ```
    pub fn address_path(&self, template: &str, resource_id: &str) -> String {
        template.replacen(&self.placeholder_token(), resource_id, 1)
    }
}

/// Map what is left after the scoping prefix to a relative service name.
///
/// The remainder must be empty or start a new segment; `/vehicles/{id}x`
/// is not scoped.
fn relative_remainder(rest: &str) -> Option<String> {
    if rest.is_empty() || rest == "/" {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/vehicles/{id}", Some("/"))]
    #[case("/vehicles/{id}/", Some("/"))]
    #[case("/vehicles/{id}/foo/bar/baz", Some("/foo/bar/baz"))]
    #[case("/vehicles/{id}/odometer", Some("/odometer"))]
    #[case("/vehicles", None)]
    #[case("/vehicles/", None)]
    #[case("/vehicles/{id}extra", None)]
    #[case("/other/vehicles/{id}/foo", None)]
    #[case("/vehicles/{vin}/foo", None)]
    fn relative_endpoint_derivation(#[case] template: &str, #[case] expected: Option<&str>) {
        let scope = EndpointScope::default();
        assert_eq!(
            scope.relative_endpoint(template),
            expected.map(str::to_string)
        );
    }

    #[rstest]
    #[case("/vehicles/123", Some("/"))]
    #[case("/vehicles/123/", Some("/"))]
    #[case("/vehicles/123/foo/bar", Some("/foo/bar"))]
    #[case("/vehicles//foo", None)]
    #[case("/vehicles", None)]
    #[case("/fleets/123/foo", None)]
    fn relative_endpoint_of_addressed_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let scope = EndpointScope::default();
        assert_eq!(
            scope.relative_endpoint_of_path(path),
            expected.map(str::to_string)
        );
    }

    #[test]
    fn custom_scope_prefix() {
        let scope = EndpointScope::new("fleets", "fleet_id");
        assert_eq!(scope.prefix(), "/fleets/{fleet_id}");
        assert_eq!(
            scope.relative_endpoint("/fleets/{fleet_id}/status"),
            Some("/status".to_string())
        );
        assert_eq!(scope.relative_endpoint("/vehicles/{id}/status"), None);
        assert_eq!(
            scope.address_path("/fleets/{fleet_id}/status", "f-1"),
            "/fleets/f-1/status"
        );
    }

    #[test]
    fn address_path_replaces_first_placeholder_only() {
        let scope = EndpointScope::default();
        assert_eq!(
            scope.address_path("/vehicles/{id}/foo/{id}", "123"),
            "/vehicles/123/foo/{id}"
        );
    }

    #[test]
    fn address_path_without_placeholder_is_unchanged() {
        let scope = EndpointScope::default();
        assert_eq!(scope.address_path("/vehicles", "123"), "/vehicles");
    }
}
