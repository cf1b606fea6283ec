//! Route guard: the pre-navigation access check.
//!
//! ORDER
//! =====
//! 1. A credential without an identity (page reload) is confirmed first, so
//!    no role check ever runs against a stale cached role.
//! 2. Authentication requirement → redirect to the login route.
//! 3. Admin requirement → redirect home. A soft denial, not an error page.
//! 4. Otherwise allow.
//!
//! The guard never fails; every outcome is a [`Navigation`].

use std::rc::Rc;

use tracing::debug;

use crate::state::session::SessionStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

const MAX_REDIRECTS: usize = 8;

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// Static access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteRequirement {
    pub const PUBLIC: Self = Self { requires_auth: false, requires_admin: false };
    pub const AUTHENTICATED: Self = Self { requires_auth: true, requires_admin: false };
    pub const ADMIN: Self = Self { requires_auth: true, requires_admin: true };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    /// Name of the view the front end mounts for this route.
    pub view: &'static str,
    pub meta: RouteRequirement,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The portal's routes.
    #[must_use]
    pub fn portal() -> Self {
        Self::new(vec![
            Route { path: "/login", view: "Login", meta: RouteRequirement::PUBLIC },
            Route { path: "/signup", view: "Signup", meta: RouteRequirement::PUBLIC },
            Route { path: "/", view: "Upload", meta: RouteRequirement::AUTHENTICATED },
            Route { path: "/orders", view: "Orders", meta: RouteRequirement::AUTHENTICATED },
            Route { path: "/admin", view: "AdminDashboard", meta: RouteRequirement::ADMIN },
        ])
    }

    /// Route for `target`, ignoring any query string, fragment, or trailing separator.
    #[must_use]
    pub fn find(&self, target: &str) -> Option<&Route> {
        let path = normalize_target(target);
        self.routes.iter().find(|route| route.path == path)
    }

    /// Requirements for `target`. Unknown targets have none.
    #[must_use]
    pub fn requirement(&self, target: &str) -> RouteRequirement {
        self.find(target).map(|route| route.meta).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

fn normalize_target(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let path = &target[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { HOME_ROUTE } else { trimmed }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(String),
}

/// Where a navigation finally landed after following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: String,
    /// `None` when the path is not in the route table.
    pub view: Option<&'static str>,
    pub redirects: usize,
}

pub struct RouteGuard {
    session: Rc<SessionStore>,
    table: RouteTable,
}

impl RouteGuard {
    #[must_use]
    pub fn new(session: Rc<SessionStore>, table: RouteTable) -> Self {
        Self { session, table }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Decide whether navigation to `target` may proceed.
    pub async fn before_each(&self, target: &str) -> Navigation {
        if self.session.needs_identity() {
            // Expiry is handled inside the store by logging out.
            let _ = self.session.fetch_identity().await;
        }

        let meta = self.table.requirement(target);
        if meta.requires_auth && !self.session.is_authenticated() {
            debug!(%target, "navigation requires login");
            return Navigation::Redirect(LOGIN_ROUTE.to_owned());
        }
        if meta.requires_admin && !self.session.is_admin() {
            debug!(%target, "navigation requires admin; sending home");
            return Navigation::Redirect(HOME_ROUTE.to_owned());
        }
        Navigation::Allow
    }

    /// Navigate to `target`, re-running the guard on every redirect.
    pub async fn resolve(&self, target: &str) -> Resolved {
        let mut current = target.to_owned();
        let mut redirects = 0;
        while let Navigation::Redirect(next) = self.before_each(&current).await {
            if next == current || redirects == MAX_REDIRECTS {
                break;
            }
            current = next;
            redirects += 1;
        }
        let view = self.table.find(&current).map(|route| route.view);
        Resolved { path: current, view, redirects }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
