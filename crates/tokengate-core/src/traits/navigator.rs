//! Sign-in redirect hook.

/// Receives the signal to leave the authenticated area.
pub trait Navigator: Send + Sync {
    /// Navigate to the unauthenticated entry route.
    fn navigate_to(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate_to(&self, route: &str) {
        self(route)
    }
}
