//! Session marker
//!
//! "Who is logged in" is three plain string values in the key-value
//! store. Guards read them to allow or refuse role-specific actions.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Role;
use crate::outcome::Rejection;
use crate::storage::{KeyValueStore, StorageResult};

pub const USER_TYPE_KEY: &str = "userType";
pub const USERNAME_KEY: &str = "username";
pub const FULL_NAME_KEY: &str = "fullName";

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub role: Role,
    pub username: String,
    pub full_name: Option<String>,
}

impl Session {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// Mark `username` as logged in with `role`
pub fn login<S: KeyValueStore>(
    store: &mut S,
    role: Role,
    username: &str,
    full_name: &str,
) -> StorageResult<()> {
    store.set(USER_TYPE_KEY, role.as_str())?;
    store.set(USERNAME_KEY, username)?;
    store.set(FULL_NAME_KEY, full_name)?;
    debug!(username, %role, "session started");
    Ok(())
}

/// Clear the session marker
pub fn logout<S: KeyValueStore>(store: &mut S) -> StorageResult<()> {
    store.remove(USER_TYPE_KEY)?;
    store.remove(USERNAME_KEY)?;
    store.remove(FULL_NAME_KEY)?;
    debug!("session cleared");
    Ok(())
}

/// The current session, if the marker is complete
pub fn current<S: KeyValueStore>(store: &S) -> StorageResult<Option<Session>> {
    let Some(user_type) = store.get(USER_TYPE_KEY)? else {
        return Ok(None);
    };
    let role = match user_type.parse::<Role>() {
        Ok(role) => role,
        Err(_) => {
            warn!(user_type = %user_type, "ignoring session with unknown role");
            return Ok(None);
        }
    };

    let username = match store.get(USERNAME_KEY)? {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(None),
    };

    let full_name = store.get(FULL_NAME_KEY)?.filter(|n| !n.is_empty());

    Ok(Some(Session {
        role,
        username,
        full_name,
    }))
}

/// Whether someone is logged in with `role`
pub fn is_authenticated<S: KeyValueStore>(store: &S, role: Role) -> StorageResult<bool> {
    Ok(current(store)?.is_some_and(|s| s.role == role))
}

/// The current session if it has `role`, else a rejection
pub fn require<S: KeyValueStore>(
    store: &S,
    role: Role,
) -> StorageResult<Result<Session, Rejection>> {
    Ok(match current(store)? {
        Some(session) if session.role == role => Ok(session),
        _ => Err(Rejection::NotAuthorized(role)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_no_session_by_default() {
        let store = MemoryStore::new();
        assert!(current(&store).unwrap().is_none());
        assert!(!is_authenticated(&store, Role::Student).unwrap());
    }

    #[test]
    fn test_login_writes_marker() {
        let mut store = MemoryStore::new();
        login(&mut store, Role::Teacher, "mr_t", "Mr T").unwrap();

        assert_eq!(store.get("userType").unwrap().as_deref(), Some("teacher"));
        assert_eq!(store.get("username").unwrap().as_deref(), Some("mr_t"));
        assert_eq!(store.get("fullName").unwrap().as_deref(), Some("Mr T"));

        let session = current(&store).unwrap().unwrap();
        assert_eq!(session.role, Role::Teacher);
        assert_eq!(session.display_name(), "Mr T");
        assert!(is_authenticated(&store, Role::Teacher).unwrap());
        assert!(!is_authenticated(&store, Role::Student).unwrap());
    }

    #[test]
    fn test_logout_clears_marker() {
        let mut store = MemoryStore::new();
        login(&mut store, Role::Student, "alice", "Alice").unwrap();
        logout(&mut store).unwrap();

        assert!(current(&store).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_username_is_no_session() {
        let mut store = MemoryStore::new();
        store.set(USER_TYPE_KEY, "student").unwrap();
        assert!(current(&store).unwrap().is_none());
    }

    #[test]
    fn test_unknown_role_is_no_session() {
        let mut store = MemoryStore::new();
        store.set(USER_TYPE_KEY, "admin").unwrap();
        store.set(USERNAME_KEY, "root").unwrap();
        assert!(current(&store).unwrap().is_none());
    }

    #[test]
    fn test_full_name_optional() {
        let mut store = MemoryStore::new();
        store.set(USER_TYPE_KEY, "student").unwrap();
        store.set(USERNAME_KEY, "alice").unwrap();

        let session = current(&store).unwrap().unwrap();
        assert!(session.full_name.is_none());
        assert_eq!(session.display_name(), "alice");
    }

    #[test]
    fn test_require_role() {
        let mut store = MemoryStore::new();
        login(&mut store, Role::Student, "alice", "Alice").unwrap();

        assert!(require(&store, Role::Student).unwrap().is_ok());
        assert_eq!(
            require(&store, Role::Teacher).unwrap(),
            Err(Rejection::NotAuthorized(Role::Teacher))
        );
    }
}
