use crate::api::{LibraryApi, User};
use anyhow::Result;

/// The login session. There is no token or cookie to hold; the backend's
/// only session endpoint is logout, so this is the client's source of
/// truth for "who is signed in".
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Sign in through the API client. A login while already signed in
    /// replaces the session.
    pub fn login(&mut self, api: &dyn LibraryApi, username: &str, password: &str) -> Result<&User> {
        let user = api.login(username, password)?;
        Ok(self.user.insert(user))
    }

    /// Sign out. The local session is cleared before the logout call; the
    /// error, if any, is still returned for logging. Returns the user that
    /// was signed out, or `None` if nobody was signed in (no API call is
    /// made).
    pub fn logout(&mut self, api: &dyn LibraryApi) -> Result<Option<User>> {
        let user = match self.user.take() {
            Some(u) => u,
            None => return Ok(None),
        };
        api.logout()?;
        Ok(Some(user))
    }
}
