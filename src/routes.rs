//! Static route table and the authentication guard.
//!
//! Page commands resolve through this table before any page code runs.
//! Routes marked `requires_auth` are only reachable with a live session.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Catalog,
    Records,
    Returns,
    Readers,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Login => "Login",
            Self::Catalog => "Book Catalog",
            Self::Records => "Borrow Records",
            Self::Returns => "Return Desk",
            Self::Readers => "Readers",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Login => "login",
            Self::Catalog => "catalog",
            Self::Records => "records",
            Self::Returns => "returns",
            Self::Readers => "readers",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    pub page: Page,
    pub requires_auth: bool,
}

pub const ROUTES: &[Route] = &[
    Route {
        path: "home",
        page: Page::Home,
        requires_auth: false,
    },
    Route {
        path: "login",
        page: Page::Login,
        requires_auth: false,
    },
    Route {
        path: "catalog",
        page: Page::Catalog,
        requires_auth: true,
    },
    Route {
        path: "records",
        page: Page::Records,
        requires_auth: true,
    },
    Route {
        path: "returns",
        page: Page::Returns,
        requires_auth: true,
    },
    Route {
        path: "readers",
        page: Page::Readers,
        requires_auth: true,
    },
];

pub fn resolve(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.path == path)
}

/// Result of running a path through the route table and the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allowed(Page),
    LoginRequired,
    NotFound,
}

pub fn navigate(path: &str, authenticated: bool) -> Navigation {
    match resolve(path) {
        Some(route) if route.requires_auth && !authenticated => Navigation::LoginRequired,
        Some(route) => Navigation::Allowed(route.page),
        None => Navigation::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes_need_no_session() {
        assert_eq!(navigate("home", false), Navigation::Allowed(Page::Home));
        assert_eq!(navigate("login", false), Navigation::Allowed(Page::Login));
    }

    #[test]
    fn test_guard_blocks_unauthenticated() {
        for path in ["catalog", "records", "returns", "readers"] {
            assert_eq!(navigate(path, false), Navigation::LoginRequired);
        }
    }

    #[test]
    fn test_guard_admits_authenticated() {
        assert_eq!(
            navigate("records", true),
            Navigation::Allowed(Page::Records)
        );
        assert_eq!(
            navigate("returns", true),
            Navigation::Allowed(Page::Returns)
        );
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(navigate("admin", true), Navigation::NotFound);
        assert_eq!(navigate("", false), Navigation::NotFound);
    }
}
