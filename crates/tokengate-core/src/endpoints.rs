//! Paths of the authentication operations, relative to the API root.

/// Exchange credentials for a token pair.
pub const LOGIN: &str = "/auth/login";

/// Obtain a new access token. Sent without an access token.
pub const REFRESH: &str = "/auth/refresh";

/// End the session on the backend (best effort).
pub const LOGOUT: &str = "/auth/logout";

/// True if `path` addresses the refresh operation.
pub fn is_refresh_path(path: &str) -> bool {
    path.split('?')
        .next()
        .is_some_and(|p| p.trim_end_matches('/').ends_with(REFRESH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_path_matching() {
        assert!(is_refresh_path("/auth/refresh"));
        assert!(is_refresh_path("/auth/refresh/"));
        assert!(is_refresh_path("/api/auth/refresh?source=cookie"));
        assert!(!is_refresh_path("/auth/refresh-settings"));
        assert!(!is_refresh_path(LOGIN));
    }
}
