//! Typed access to persisted SDK state.
//!
//! Values are stored as text in the `preferences` table. Scalar counters
//! are decimal strings; structured values (session, user attributes) are
//! JSON.

use std::collections::BTreeMap;

use beacon_core::{Session, UniqueId, UserAttributes};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::PreferenceRepo;

/// Preference keys.
pub mod keys {
    /// Counter attached to each upload attempt.
    pub const BUNDLE_SEQUENCE_ID: &str = "event_bundle_sequence_id";
    /// Last paused session (JSON).
    pub const SESSION: &str = "session";
    /// Present and `false` once `_first_open` was recorded.
    pub const IS_FIRST_OPEN: &str = "isFirstOpen";
    /// Last seen app version.
    pub const APP_VERSION: &str = "appVersion";
    /// Last seen OS version.
    pub const OS_VERSION: &str = "osVersion";
    /// Full user attribute store (JSON).
    pub const USER_ATTRIBUTES: &str = "userAttributes";
    /// Installation id.
    pub const UNIQUE_ID: &str = "userUniqueId";
    /// Current user id; empty when signed out.
    pub const USER_ID: &str = "userId";
    /// User id to [`super::UserIdentity`] map (JSON).
    pub const USER_IDENTITIES: &str = "userUniqueIdMap";
}

/// First bundle sequence id handed out on a fresh install.
pub const DEFAULT_BUNDLE_SEQUENCE_ID: i64 = 1;

/// Identity bound to a signed-in user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Unique id events carry while this user is signed in.
    pub unique_id: UniqueId,
    /// First time this identity was seen, epoch ms.
    pub first_touch_timestamp: i64,
}

/// Key/value state on top of the shared pool.
pub struct PreferenceStore {
    pool: ConnectionPool,
}

impl PreferenceStore {
    /// Wrap a migrated pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ── Raw accessors ───────────────────────────────────────────────

    /// Read a string value.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        PreferenceRepo::get(&*self.conn()?, key)
    }

    /// Write a string value.
    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        PreferenceRepo::set(&*self.conn()?, key, value)
    }

    /// Remove a value.
    pub fn remove(&self, key: &str) -> Result<bool> {
        PreferenceRepo::delete(&*self.conn()?, key)
    }

    /// Read an integer value.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get_string(key)?
            .map(|raw| {
                raw.parse::<i64>().map_err(|e| StoreError::CorruptValue {
                    key: key.to_owned(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Write an integer value.
    pub fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_string(key, &value.to_string())
    }

    /// Read and deserialize a JSON value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_string(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }

    /// Serialize and write a JSON value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_string(key, &serde_json::to_string(value)?)
    }

    // ── Bundle sequence ─────────────────────────────────────────────

    /// Sequence id for the next upload attempt (starts at 1).
    pub fn bundle_sequence_id(&self) -> Result<i64> {
        Ok(self
            .get_i64(keys::BUNDLE_SEQUENCE_ID)?
            .unwrap_or(DEFAULT_BUNDLE_SEQUENCE_ID))
    }

    /// Persist the sequence id for the next upload attempt.
    pub fn set_bundle_sequence_id(&self, value: i64) -> Result<()> {
        self.set_i64(keys::BUNDLE_SEQUENCE_ID, value)
    }

    // ── Session ─────────────────────────────────────────────────────

    /// The last persisted session. An unreadable value is discarded.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self.get_string(keys::SESSION)? else {
            return Ok(None);
        };
        match Session::from_json(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted session");
                let _ = self.remove(keys::SESSION)?;
                Ok(None)
            }
        }
    }

    /// Persist a session.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = session.to_json().map_err(|e| StoreError::CorruptValue {
            key: keys::SESSION.into(),
            message: e.to_string(),
        })?;
        self.set_string(keys::SESSION, &json)
    }

    // ── First open / versions ───────────────────────────────────────

    /// Whether `_first_open` has not been recorded yet.
    pub fn is_first_open(&self) -> Result<bool> {
        Ok(self
            .get_string(keys::IS_FIRST_OPEN)?
            .is_none_or(|v| v != "false"))
    }

    /// Remember that `_first_open` was recorded.
    pub fn mark_first_open_recorded(&self) -> Result<()> {
        self.set_string(keys::IS_FIRST_OPEN, "false")
    }

    /// Last seen app version.
    pub fn app_version(&self) -> Result<Option<String>> {
        self.get_string(keys::APP_VERSION)
    }

    /// Store the current app version.
    pub fn set_app_version(&self, version: &str) -> Result<()> {
        self.set_string(keys::APP_VERSION, version)
    }

    /// Last seen OS version.
    pub fn os_version(&self) -> Result<Option<String>> {
        self.get_string(keys::OS_VERSION)
    }

    /// Store the current OS version.
    pub fn set_os_version(&self, version: &str) -> Result<()> {
        self.set_string(keys::OS_VERSION, version)
    }

    // ── User ────────────────────────────────────────────────────────

    /// Persisted user attributes (empty if none).
    pub fn user_attributes(&self) -> Result<UserAttributes> {
        Ok(self.get_json(keys::USER_ATTRIBUTES)?.unwrap_or_default())
    }

    /// Persist the full user attribute store.
    pub fn save_user_attributes(&self, attributes: &UserAttributes) -> Result<()> {
        self.set_json(keys::USER_ATTRIBUTES, attributes)
    }

    /// Installation id, generated and stored on first call.
    pub fn unique_id(&self) -> Result<UniqueId> {
        if let Some(existing) = self.get_string(keys::UNIQUE_ID)? {
            return Ok(UniqueId::from(existing));
        }
        let id = UniqueId::new();
        self.set_string(keys::UNIQUE_ID, id.as_str())?;
        Ok(id)
    }

    /// Replace the installation id.
    pub fn set_unique_id(&self, id: &UniqueId) -> Result<()> {
        self.set_string(keys::UNIQUE_ID, id.as_str())
    }

    /// Current user id, empty if none was set.
    pub fn current_user_id(&self) -> Result<String> {
        Ok(self.get_string(keys::USER_ID)?.unwrap_or_default())
    }

    /// Store the current user id.
    pub fn set_current_user_id(&self, user_id: &str) -> Result<()> {
        self.set_string(keys::USER_ID, user_id)
    }

    /// Resolve the identity for `user_id` and make its unique id current.
    ///
    /// The first user ever signed in adopts `current`. A returning user gets
    /// its stored identity back. Any other user gets a fresh unique id first
    /// touched at `now`.
    pub fn switch_user(
        &self,
        user_id: &str,
        current: UserIdentity,
        now: i64,
    ) -> Result<UserIdentity> {
        let mut known: BTreeMap<String, UserIdentity> =
            self.get_json(keys::USER_IDENTITIES)?.unwrap_or_default();

        let identity = if known.is_empty() {
            current
        } else if let Some(existing) = known.get(user_id) {
            existing.clone()
        } else {
            UserIdentity {
                unique_id: UniqueId::new(),
                first_touch_timestamp: now,
            }
        };

        if !known.contains_key(user_id) {
            let _ = known.insert(user_id.to_owned(), identity.clone());
            self.set_json(keys::USER_IDENTITIES, &known)?;
        }
        self.set_unique_id(&identity.unique_id)?;
        Ok(identity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::ConnectionConfig;
    use crate::sqlite::open_in_memory;
    use assert_matches::assert_matches;
    use beacon_core::{AttrValue, SessionTracker, UserAttribute};

    fn store() -> PreferenceStore {
        PreferenceStore::new(open_in_memory(&ConnectionConfig::default()).unwrap())
    }

    #[test]
    fn bundle_sequence_defaults_to_one() {
        let prefs = store();
        assert_eq!(prefs.bundle_sequence_id().unwrap(), 1);
        prefs.set_bundle_sequence_id(7).unwrap();
        assert_eq!(prefs.bundle_sequence_id().unwrap(), 7);
    }

    #[test]
    fn corrupt_integer_is_an_error() {
        let prefs = store();
        prefs.set_string(keys::BUNDLE_SEQUENCE_ID, "seven").unwrap();
        assert_matches!(
            prefs.bundle_sequence_id(),
            Err(StoreError::CorruptValue { .. })
        );
    }

    #[test]
    fn session_round_trips() {
        let prefs = store();
        assert!(prefs.load_session().unwrap().is_none());

        let mut tracker = SessionTracker::new("device-1", 1_000);
        let _ = tracker.start(10);
        let paused = tracker.pause(20).unwrap().clone();
        prefs.save_session(&paused).unwrap();

        assert_eq!(prefs.load_session().unwrap(), Some(paused));
    }

    #[test]
    fn unreadable_session_is_discarded() {
        let prefs = store();
        prefs.set_string(keys::SESSION, "{not json").unwrap();
        assert!(prefs.load_session().unwrap().is_none());
        assert!(prefs.get_string(keys::SESSION).unwrap().is_none());
    }

    #[test]
    fn first_open_flag() {
        let prefs = store();
        assert!(prefs.is_first_open().unwrap());
        prefs.mark_first_open_recorded().unwrap();
        assert!(!prefs.is_first_open().unwrap());
    }

    #[test]
    fn versions() {
        let prefs = store();
        assert!(prefs.app_version().unwrap().is_none());
        prefs.set_app_version("1.0").unwrap();
        prefs.set_os_version("14").unwrap();
        assert_eq!(prefs.app_version().unwrap().as_deref(), Some("1.0"));
        assert_eq!(prefs.os_version().unwrap().as_deref(), Some("14"));
    }

    #[test]
    fn user_attributes_round_trip() {
        let prefs = store();
        assert!(prefs.user_attributes().unwrap().is_empty());

        let mut attrs = UserAttributes::new();
        let _ = attrs.insert(
            "age".into(),
            UserAttribute {
                value: AttrValue::Int(30),
                set_timestamp: 5,
            },
        );
        prefs.save_user_attributes(&attrs).unwrap();
        assert_eq!(prefs.user_attributes().unwrap(), attrs);
    }

    #[test]
    fn unique_id_is_stable() {
        let prefs = store();
        let first = prefs.unique_id().unwrap();
        assert_eq!(prefs.unique_id().unwrap(), first);
        prefs.set_unique_id(&UniqueId::from("other")).unwrap();
        assert_eq!(prefs.unique_id().unwrap().as_str(), "other");
    }

    #[test]
    fn current_user_id_defaults_to_empty() {
        let prefs = store();
        assert_eq!(prefs.current_user_id().unwrap(), "");
        prefs.set_current_user_id("alice").unwrap();
        assert_eq!(prefs.current_user_id().unwrap(), "alice");
    }

    #[test]
    fn switching_users_keeps_one_identity_per_user() {
        let prefs = store();
        let anonymous = UserIdentity {
            unique_id: prefs.unique_id().unwrap(),
            first_touch_timestamp: 100,
        };

        let alice = prefs.switch_user("alice", anonymous.clone(), 200).unwrap();
        assert_eq!(alice, anonymous);

        let bob = prefs.switch_user("bob", alice.clone(), 300).unwrap();
        assert_ne!(bob.unique_id, alice.unique_id);
        assert_eq!(bob.first_touch_timestamp, 300);
        assert_eq!(prefs.unique_id().unwrap(), bob.unique_id);

        let back = prefs.switch_user("alice", bob, 400).unwrap();
        assert_eq!(back, alice);
        assert_eq!(prefs.unique_id().unwrap(), alice.unique_id);
    }
}
