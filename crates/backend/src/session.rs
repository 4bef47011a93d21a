//! Per-client session state.
//!
//! A [`Session`] belongs to exactly one interactive client and is passed
//! by reference into every operation. Nothing about the logged-in user is
//! kept on shared handles.

use crustline_core::{Login, Role};

use crate::error::{CoreError, Result};
use crate::models::OrderScope;

/// The authenticated user of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub login: Login,
    /// Role as last resolved from the account directory.
    pub role: Role,
}

impl Identity {
    /// The orders this identity may see: staff see every order,
    /// customers only their own.
    #[must_use]
    pub fn order_scope(&self) -> OrderScope {
        if self.role.is_staff() {
            OrderScope::All
        } else {
            OrderScope::Owner(self.login.clone())
        }
    }
}

/// One client's session: anonymous until a successful log-in.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    /// A session with nobody logged in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { identity: None }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The logged-in identity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` if nobody is logged in.
    pub fn identity(&self) -> Result<&Identity> {
        self.identity.as_ref().ok_or(CoreError::Unauthenticated)
    }

    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` if nobody is logged in.
    pub fn login(&self) -> Result<&Login> {
        self.identity().map(|identity| &identity.login)
    }

    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` if nobody is logged in.
    pub fn role(&self) -> Result<Role> {
        self.identity().map(|identity| identity.role)
    }

    /// Bind the session to a user, replacing any previous identity.
    pub fn log_in(&mut self, login: Login, role: Role) {
        self.identity = Some(Identity { login, role });
    }

    /// Drop the identity, returning it if there was one.
    pub const fn log_out(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    /// Record a freshly resolved role.
    pub(crate) const fn refresh_role(&mut self, role: Role) {
        if let Some(identity) = self.identity.as_mut() {
            identity.role = role;
        }
    }

    /// Follow a rename of the logged-in account.
    pub(crate) fn rename(&mut self, login: Login) {
        if let Some(identity) = self.identity.as_mut() {
            identity.login = login;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn login(s: &str) -> Login {
        Login::parse(s).unwrap()
    }

    #[test]
    fn test_anonymous_session_is_unauthenticated() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(matches!(session.login(), Err(CoreError::Unauthenticated)));
        assert!(matches!(session.role(), Err(CoreError::Unauthenticated)));
    }

    #[test]
    fn test_log_in_and_out() {
        let mut session = Session::default();
        session.log_in(login("alice"), Role::Customer);
        assert_eq!(session.login().unwrap().as_str(), "alice");
        assert_eq!(session.role().unwrap(), Role::Customer);

        let previous = session.log_out().unwrap();
        assert_eq!(previous.login, login("alice"));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_refresh_and_rename_follow_the_account() {
        let mut session = Session::anonymous();
        session.log_in(login("bob"), Role::Driver);
        session.refresh_role(Role::Manager);
        session.rename(login("robert"));

        let identity = session.identity().unwrap();
        assert_eq!(identity.role, Role::Manager);
        assert_eq!(identity.login, login("robert"));
    }

    #[test]
    fn test_order_visibility() {
        let customer = Identity {
            login: login("alice"),
            role: Role::Customer,
        };
        let driver = Identity {
            login: login("dave"),
            role: Role::Driver,
        };
        assert_eq!(customer.order_scope(), OrderScope::Owner(login("alice")));
        assert_eq!(driver.order_scope(), OrderScope::All);
    }
}
