//! crates/session_core/src/gate.rs
//!
//! Route guard evaluated on every change of session state or current path.
//! Decisions are total: the gate never fails.

use std::sync::Arc;

use tracing::debug;

use crate::domain::SessionState;
use crate::redirect::RedirectMemory;

/// The fixed set of routes reachable without a session, plus the landing page
/// used after sign-in. Anything not listed here is protected.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub home: String,
    pub login: String,
    pub register: String,
    pub landing: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            login: "/login".to_string(),
            register: "/register".to_string(),
            landing: "/dashboard".to_string(),
        }
    }
}

impl RouteTable {
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        path == self.home || path == self.login || path == self.register
    }

    pub fn is_auth_page(&self, path: &str) -> bool {
        let path = normalize(path);
        path == self.login || path == self.register
    }
}

/// Strips query, fragment and a trailing slash; an empty path is the root.
pub fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Leave the user where they are.
    Stay,
    /// The path was remembered; send the user to the login page.
    RememberAndRedirectToLogin { login: String },
    /// Signed in on an auth page; go to the remembered path or the landing page.
    ConsumeRedirect { target: String },
}

pub struct SessionGate {
    routes: RouteTable,
    memory: Arc<RedirectMemory>,
}

impl SessionGate {
    pub fn new(routes: RouteTable, memory: Arc<RedirectMemory>) -> Self {
        Self { routes, memory }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn memory(&self) -> &RedirectMemory {
        &self.memory
    }

    pub fn evaluate(&self, state: &SessionState, path: &str) -> GateAction {
        self.decide(state.is_hydrated, state.is_authenticated, path)
    }

    pub fn decide(&self, is_hydrated: bool, is_authenticated: bool, path: &str) -> GateAction {
        if !is_hydrated {
            return GateAction::Stay;
        }

        if !is_authenticated && !self.routes.is_public(path) {
            debug!(path, "Blocked protected route, remembering it");
            self.memory.remember(path);
            return GateAction::RememberAndRedirectToLogin {
                login: self.routes.login.clone(),
            };
        }

        if is_authenticated && self.routes.is_auth_page(path) {
            let target = self
                .memory
                .take()
                .unwrap_or_else(|| self.routes.landing.clone());
            debug!(path, %target, "Signed in on an auth page, moving on");
            return GateAction::ConsumeRedirect { target };
        }

        GateAction::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SessionGate {
        SessionGate::new(RouteTable::default(), Arc::new(RedirectMemory::new()))
    }

    #[test]
    fn nothing_is_judged_before_hydration() {
        let gate = gate();
        assert_eq!(gate.decide(false, false, "/dashboard"), GateAction::Stay);
        assert_eq!(gate.memory().peek(), None);
    }

    #[test]
    fn protected_route_is_remembered() {
        let gate = gate();
        let action = gate.decide(true, false, "/dashboard/history");
        assert_eq!(
            action,
            GateAction::RememberAndRedirectToLogin {
                login: "/login".into()
            }
        );
        assert_eq!(gate.memory().peek().as_deref(), Some("/dashboard/history"));
    }

    #[test]
    fn public_routes_pass_without_a_session() {
        let gate = gate();
        for path in ["/", "/login", "/register", "/login/", "/register?next=x", ""] {
            assert_eq!(gate.decide(true, false, path), GateAction::Stay, "{path}");
        }
        assert_eq!(gate.memory().peek(), None);
    }

    #[test]
    fn unknown_routes_are_protected() {
        let gate = gate();
        assert!(matches!(
            gate.decide(true, false, "/reports/new"),
            GateAction::RememberAndRedirectToLogin { .. }
        ));
    }

    #[test]
    fn signed_in_user_leaves_auth_pages() {
        let gate = gate();
        assert_eq!(
            gate.decide(true, true, "/register"),
            GateAction::ConsumeRedirect {
                target: "/dashboard".into()
            }
        );
        assert_eq!(gate.decide(true, true, "/"), GateAction::Stay);
        assert_eq!(gate.decide(true, true, "/dashboard/profile"), GateAction::Stay);
    }

    #[test]
    fn normalize_handles_suffixes() {
        assert_eq!(normalize("/login/"), "/login");
        assert_eq!(normalize("/a/b?x=1#frag"), "/a/b");
        assert_eq!(normalize("///"), "/");
    }
}
