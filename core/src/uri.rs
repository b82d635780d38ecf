//! Endpoint URI composition and scoped base-URI overrides.
//!
//! # Design
//! The base URI is the only piece of client state that changes after
//! construction. It lives in a `RefCell` so overrides can be taken through a
//! shared reference. Overrides are only available as closures (`scoped`), and
//! each one holds a private guard that puts the previous value back when it
//! drops, on normal exit, on an early `?` return or during panic unwinding.
//! Closures nest lexically, so overrides always unwind in LIFO order. The
//! `RefCell` also makes the resolver `!Sync`: overrides cannot be shared
//! across threads on one client.

use std::cell::RefCell;

/// Make `input` absolute.
///
/// Inputs that already start with `http://` or `https://` are returned
/// verbatim; anything else is a path under `https://{hostname}/`.
pub fn resolve_uri(input: &str, hostname: &str) -> String {
    if is_absolute(input) {
        return input.to_string();
    }
    let path = input.trim_start_matches('/');
    format!("https://{hostname}/{path}")
}

fn is_absolute(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Ensure a path begins with exactly one `/`.
pub fn normalize_action_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[derive(Debug)]
pub struct UriResolver {
    hostname: String,
    base_uri: RefCell<String>,
}

impl UriResolver {
    pub fn new(hostname: &str, base_uri: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            base_uri: RefCell::new(resolve_uri(base_uri, hostname)),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The active (possibly overridden) absolute base URI.
    pub fn base_uri(&self) -> String {
        self.base_uri.borrow().clone()
    }

    pub fn resolve(&self, input: &str) -> String {
        resolve_uri(input, &self.hostname)
    }

    /// Absolute URL for an action path under the active base URI.
    pub fn join(&self, action_path: &str) -> String {
        let base = self.base_uri.borrow();
        format!(
            "{}{}",
            base.trim_end_matches('/'),
            normalize_action_path(action_path)
        )
    }

    fn override_base_uri(&self, new_base_uri: &str) -> BaseUriGuard<'_> {
        let resolved = self.resolve(new_base_uri);
        let previous = self.base_uri.replace(resolved);
        BaseUriGuard {
            resolver: self,
            previous: Some(previous),
        }
    }

    /// Run `body` with `new_base_uri` active, then restore the previous base
    /// URI whatever `body` did.
    pub fn scoped<T>(&self, new_base_uri: &str, body: impl FnOnce() -> T) -> T {
        let _guard = self.override_base_uri(new_base_uri);
        body()
    }
}

/// Restores the base URI it replaced when dropped.
struct BaseUriGuard<'a> {
    resolver: &'a UriResolver,
    previous: Option<String>,
}

impl Drop for BaseUriGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.resolver.base_uri.borrow_mut() = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn relative_paths_are_placed_under_hostname() {
        assert_eq!(
            resolve_uri("admin/scaffolds", "x.example.com"),
            "https://x.example.com/admin/scaffolds"
        );
        assert_eq!(
            resolve_uri("//admin/scaffolds", "x.example.com"),
            "https://x.example.com/admin/scaffolds"
        );
    }

    #[test]
    fn absolute_urls_are_kept_verbatim() {
        assert_eq!(
            resolve_uri("http://127.0.0.1:3000/admin/scaffolds", "ignored"),
            "http://127.0.0.1:3000/admin/scaffolds"
        );
        assert_eq!(
            resolve_uri("HTTPS://Other.example.com/api", "ignored"),
            "HTTPS://Other.example.com/api"
        );
    }

    #[test]
    fn action_paths_get_one_leading_slash() {
        assert_eq!(normalize_action_path("sites"), "/sites");
        assert_eq!(normalize_action_path("/sites"), "/sites");
        assert_eq!(normalize_action_path("///sites/show/1"), "/sites/show/1");
    }

    #[test]
    fn join_does_not_double_slashes() {
        let resolver = UriResolver::new("x.example.com", "admin/scaffolds/");
        assert_eq!(
            resolver.join("/sites"),
            "https://x.example.com/admin/scaffolds/sites"
        );
    }

    #[test]
    fn scoped_override_restores_on_success() {
        let resolver = UriResolver::new("x.example.com", "admin/scaffolds");
        let before = resolver.base_uri();
        let inside = resolver.scoped("api/v2", || resolver.base_uri());
        assert_eq!(inside, "https://x.example.com/api/v2");
        assert_eq!(resolver.base_uri(), before);
    }

    #[test]
    fn scoped_override_restores_on_error() {
        let resolver = UriResolver::new("x.example.com", "admin/scaffolds");
        let before = resolver.base_uri();
        let result: Result<(), String> = resolver.scoped("api/v2", || Err("boom".to_string()));
        assert!(result.is_err());
        assert_eq!(resolver.base_uri(), before);
    }

    #[test]
    fn scoped_override_restores_on_panic() {
        let resolver = UriResolver::new("x.example.com", "admin/scaffolds");
        let before = resolver.base_uri();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            resolver.scoped("api/v2", || panic!("body failed"));
        }));
        assert!(outcome.is_err());
        assert_eq!(resolver.base_uri(), before);
    }

    #[test]
    fn nested_overrides_unwind_in_order() {
        let resolver = UriResolver::new("x.example.com", "admin/scaffolds");
        resolver.scoped("outer", || {
            assert_eq!(resolver.base_uri(), "https://x.example.com/outer");
            resolver.scoped("https://inner.example.com/api", || {
                assert_eq!(resolver.base_uri(), "https://inner.example.com/api");
            });
            assert_eq!(resolver.base_uri(), "https://x.example.com/outer");
        });
        assert_eq!(resolver.base_uri(), "https://x.example.com/admin/scaffolds");
    }
}
