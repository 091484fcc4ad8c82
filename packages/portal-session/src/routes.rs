//! Route tables and the router that runs the guard on every transition.

use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::config::LOGIN_ROUTE;
use crate::guard::{GuardDecision, NavigationGuard, RouteMeta};
use crate::role::Role;

/// Upper bound on redirects followed by one navigation.
const MAX_REDIRECTS: usize = 8;

/// Capability to move the application to another route.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: Option<&'static str>,
    /// Static redirect resolved before the guard runs.
    pub redirect: Option<String>,
    pub meta: RouteMeta,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Public `/login` plus the role-gated subtree under `/`.
    pub fn for_role(role: Role) -> Self {
        let children: &[(&str, &'static str)] = match role {
            Role::Admin => &[
                ("dashboard", "Dashboard"),
                ("students", "StudentManagement"),
                ("teachers", "TeacherManagement"),
                ("courses", "CourseManagement"),
                ("selections", "SelectionManagement"),
                ("messages", "MessageManagement"),
                ("profile", "Profile"),
            ],
            Role::Teacher => &[
                ("dashboard", "Dashboard"),
                ("my-course", "MyCourse"),
                ("selection-management", "SelectionManagement"),
                ("grade-management", "GradeManagement"),
                ("message-center", "MessageCenter"),
                ("profile", "Profile"),
            ],
            Role::Student => &[
                ("dashboard", "Dashboard"),
                ("course-browse", "CourseBrowse"),
                ("my-selection", "MySelection"),
                ("grade-query", "GradeQuery"),
                ("profile", "Profile"),
                ("message-center", "MessageCenter"),
            ],
        };

        let protected = RouteMeta::protected(role);
        let mut routes = vec![
            Route {
                path: LOGIN_ROUTE.to_string(),
                name: Some("Login"),
                redirect: None,
                meta: RouteMeta::public(),
            },
            Route {
                path: "/".to_string(),
                name: None,
                redirect: Some("/dashboard".to_string()),
                meta: protected,
            },
        ];
        routes.extend(children.iter().map(|(path, name)| Route {
            path: format!("/{}", path),
            name: Some(*name),
            redirect: None,
            meta: protected,
        }));

        Self { routes }
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == Some(name))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Drop query/fragment and trailing slashes: `/dashboard/?tab=1` -> `/dashboard`.
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("No route matches {0}")]
    UnknownRoute(String),

    #[error("Too many redirects navigating to {0}")]
    RedirectLoop(String),
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: String,
    /// The path originally requested, when redirects were followed.
    pub redirected_from: Option<String>,
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: RwLock<Option<String>>,
}

impl Router {
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            table,
            guard,
            current: RwLock::new(None),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn current(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigate to `path`, following static and guard redirects.
    pub fn navigate(&self, path: &str) -> Result<Navigation, RouteError> {
        let requested = normalize(path).to_string();
        let mut target = requested.clone();

        for _ in 0..MAX_REDIRECTS {
            let route = self
                .table
                .resolve(&target)
                .ok_or_else(|| RouteError::UnknownRoute(target.clone()))?;

            if let Some(redirect) = &route.redirect {
                target = redirect.clone();
                continue;
            }

            match self.guard.check(&route.path, &route.meta) {
                GuardDecision::Proceed => {
                    *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                        Some(route.path.clone());
                    let redirected_from = (route.path != requested).then_some(requested);
                    return Ok(Navigation {
                        location: route.path.clone(),
                        redirected_from,
                    });
                }
                GuardDecision::Redirect { to, .. } => {
                    target = to;
                }
            }
        }

        Err(RouteError::RedirectLoop(requested))
    }
}

impl Navigator for Router {
    fn redirect(&self, path: &str) {
        if let Err(e) = self.navigate(path) {
            tracing::error!(path, error = %e, "Redirect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_share_login_and_root() {
        for role in Role::variants() {
            let table = RouteTable::for_role(*role);
            let login = table.resolve("/login").unwrap();
            assert!(!login.meta.requires_auth);

            let root = table.resolve("/").unwrap();
            assert_eq!(root.redirect.as_deref(), Some("/dashboard"));
            assert_eq!(root.meta, RouteMeta::protected(*role));

            assert!(table.by_name("Dashboard").is_some());
            assert!(table.by_name("Profile").is_some());
        }
    }

    #[test]
    fn test_role_specific_children() {
        let student = RouteTable::for_role(Role::Student);
        assert!(student.resolve("/grade-query").is_some());
        assert!(student.resolve("/students").is_none());

        let admin = RouteTable::for_role(Role::Admin);
        assert!(admin.resolve("/students").is_some());
        assert!(admin.resolve("/grade-query").is_none());

        let teacher = RouteTable::for_role(Role::Teacher);
        assert_eq!(
            teacher.by_name("GradeManagement").map(|r| r.path.as_str()),
            Some("/grade-management")
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/dashboard/"), "/dashboard");
        assert_eq!(normalize("/dashboard?tab=2"), "/dashboard");
        assert_eq!(normalize("/#top"), "/");
        assert_eq!(normalize(""), "/");
    }
}
