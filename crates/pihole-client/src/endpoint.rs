//! Classification of appliance endpoints into public and admin.
//!
//! The public surface is an explicit allow-list; every other path requires a
//! session token.

/// Path prefixes reachable without a session.
pub const PUBLIC_ENDPOINTS: &[&str] = &["/api/info/client", "/api/info/login"];

/// Whether an endpoint needs authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointAccess {
    /// Reachable without a session.
    Public,
    /// Requires a session token.
    Admin,
}

impl EndpointAccess {
    /// Classifies a request path.
    #[must_use]
    pub fn of(path: &str) -> Self {
        if PUBLIC_ENDPOINTS.iter().any(|public| path.starts_with(public)) {
            Self::Public
        } else {
            Self::Admin
        }
    }

    /// Returns `true` for [`EndpointAccess::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Returns `true` if `path` requires authentication.
#[must_use]
pub fn is_admin_endpoint(path: &str) -> bool {
    EndpointAccess::of(path).is_admin()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_public_endpoints_are_not_admin() {
        for path in PUBLIC_ENDPOINTS {
            assert!(!is_admin_endpoint(path), "{path} should be public");
        }
        assert!(!is_admin_endpoint("/api/info/login?foo=bar"));
    }

    #[test]
    fn test_everything_else_is_admin() {
        assert!(is_admin_endpoint("/api/dns/blocking"));
        assert!(is_admin_endpoint("/api/stats/summary"));
        assert!(is_admin_endpoint("/api/domains/allow/exact/example.com"));
        assert!(is_admin_endpoint("/api/info/version"));
        assert!(is_admin_endpoint(""));
        assert!(is_admin_endpoint("/"));
    }

    #[test]
    fn test_no_substring_matches() {
        // Public prefixes only count at the start of the path.
        assert!(is_admin_endpoint("/api/stats/api/info/login"));
        assert!(is_admin_endpoint("api/info/login"));
    }
}

#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn classifier_is_total(path in ".*") {
            let access = EndpointAccess::of(&path);
            prop_assert_eq!(is_admin_endpoint(&path), access == EndpointAccess::Admin);
        }

        #[test]
        fn public_prefixes_stay_public(idx in 0..PUBLIC_ENDPOINTS.len(), suffix in "[a-z0-9/?=&]*") {
            let path = format!("{}{suffix}", PUBLIC_ENDPOINTS[idx]);
            prop_assert!(!is_admin_endpoint(&path));
        }

        #[test]
        fn unlisted_api_paths_are_admin(segment in "(dns|stats|domains|history|logs|action)[a-z_/]*") {
            let path = format!("/api/{segment}");
            prop_assert!(is_admin_endpoint(&path));
        }
    }
}
