//! The analytics client.
//!
//! Owns the event context, the attribute stores and the session tracker
//! behind one lock. Events take copies of all three at creation, so the
//! queue and uploader never reach back into client state.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::attributes::simple_user_view;
use beacon_core::validation::validate_attribute;
use beacon_core::{
    AttrValue, AttributeScope, AttributeSet, Clock, EventContext, EventId, EventRecord,
    PresetEvent, ReservedAttribute, Session, SessionTracker, UniqueId, UserAttribute,
    UserAttributes, Violation,
};
use beacon_settings::BeaconSettings;
use beacon_store::{
    ConnectionConfig, ConnectionPool, EventQueue, PreferenceStore, QueueConfig, UserIdentity,
};
use beacon_uploader::{EventRecorder, Submitter};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::options::ClientOptions;

struct ClientState {
    context: Arc<EventContext>,
    user_id: String,
    global: AttributeSet,
    user: UserAttributes,
    session: SessionTracker,
}

/// Records events into the local queue and triggers uploads.
pub struct AnalyticsClient {
    settings: BeaconSettings,
    clock: Arc<dyn Clock>,
    queue: Arc<EventQueue>,
    prefs: Arc<PreferenceStore>,
    submitter: Submitter,
    state: Mutex<ClientState>,
}

impl AnalyticsClient {
    /// Open (or create) the database at `path` and build a client on it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn open(path: &str, options: ClientOptions) -> Result<Self> {
        let pool = beacon_store::open_file(path, &ConnectionConfig::default())?;
        Self::new(pool, options)
    }

    /// Build a client on an already migrated pool.
    ///
    /// Restores the installation id, user attributes and the last paused
    /// session, and starts the periodic flush when
    /// `send_events_interval_ms` is non-zero. Must be called inside a Tokio
    /// runtime.
    pub fn new(pool: ConnectionPool, options: ClientOptions) -> Result<Self> {
        let prefs = Arc::new(PreferenceStore::new(pool.clone()));
        let unique_id = prefs.unique_id()?;
        let user_id = prefs.current_user_id()?;
        let now = options.clock.now_ms();

        let mut user = prefs.user_attributes()?;
        if !user.contains_key(ReservedAttribute::USER_FIRST_TOUCH_TIMESTAMP) {
            let _ = user.insert(
                ReservedAttribute::USER_FIRST_TOUCH_TIMESTAMP.to_owned(),
                UserAttribute {
                    value: AttrValue::Int(now),
                    set_timestamp: now,
                },
            );
            prefs.save_user_attributes(&user)?;
        }

        let settings = options.settings.clone();
        let queue = Arc::new(EventQueue::new(
            pool,
            QueueConfig {
                max_total_bytes: i64::try_from(settings.queue.max_db_size_bytes)
                    .unwrap_or(i64::MAX),
                eviction_chunk: settings.queue.eviction_chunk,
            },
        ));

        let recorder = Arc::new(EventRecorder::new(
            queue.clone(),
            prefs.clone(),
            options.transport.clone(),
            options.connectivity.clone(),
            options.upload_limits(),
        ));
        let mut submitter = Submitter::new(recorder, settings.uploader.max_pending_submissions);
        if settings.send_events_interval_ms > 0 {
            submitter.start_auto_submit(Duration::from_millis(settings.send_events_interval_ms));
        }

        let timeout_ms = i64::try_from(settings.session_timeout_ms).unwrap_or(i64::MAX);
        let session = SessionTracker::restore(unique_id.as_str(), timeout_ms, prefs.load_session()?);

        let mut app = options.app;
        if app.app_id.is_empty() {
            app.app_id.clone_from(&settings.app_id);
        }
        let context = Arc::new(EventContext {
            unique_id,
            device: options.device,
            app,
            sdk: options.sdk,
        });

        info!(unique_id = %context.unique_id, app_id = %context.app.app_id, "analytics client ready");

        Ok(Self {
            settings,
            clock: options.clock,
            queue,
            prefs,
            submitter,
            state: Mutex::new(ClientState {
                context,
                user_id,
                global: AttributeSet::new(AttributeScope::Event),
                user,
                session,
            }),
        })
    }

    /// Unique id stamped onto events. Changes when the signed-in user does.
    pub fn unique_id(&self) -> UniqueId {
        self.state.lock().context.unique_id.clone()
    }

    /// Settings in effect.
    pub fn settings(&self) -> &BeaconSettings {
        &self.settings
    }

    /// The local queue, for accounting queries.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Create an event stamped with the current globals, user view and
    /// session.
    ///
    /// An invalid `event_type` is not created: a `_clickstream_error` event
    /// describing the problem is queued instead and `None` is returned.
    pub fn create_event(&self, event_type: &str) -> Option<EventRecord> {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        let user = if event_type == PresetEvent::ProfileSet.as_str() {
            state.user.clone()
        } else {
            simple_user_view(&state.user)
        };
        let session = state.session.snapshot(now);

        match EventRecord::create(
            event_type,
            state.context.clone(),
            state.global.values(),
            user.clone(),
            session.clone(),
            now,
        ) {
            Ok(record) => Some(record),
            Err(violation) => {
                let context = state.context.clone();
                drop(state);
                warn!(event_type, code = violation.code, "invalid event type");
                let diagnostic = EventRecord::diagnostic(&violation, context, user, session, now);
                let _ = self.enqueue_logged(&diagnostic);
                None
            }
        }
    }

    /// Serialize and durably queue `record`. Returns the queue id.
    pub fn enqueue(&self, record: &EventRecord) -> Result<i64> {
        let json = record.to_json()?;
        let id = self.queue.append(&json)?;
        if self.settings.is_log_events {
            debug!(id, event_type = record.event_type(), payload = %json, "event recorded");
        }
        Ok(id)
    }

    /// Create an event, add `attributes`, and queue it.
    ///
    /// Rejected attributes are replaced by diagnostic entries on the event.
    /// Returns the event id, or `None` if the event type was invalid or the
    /// write failed.
    pub fn record_event<I, K, V>(&self, event_type: &str, attributes: I) -> Option<EventId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut record = self.create_event(event_type)?;
        for (name, value) in attributes {
            let _ = record.add_attribute(name.as_ref(), value.into());
        }
        match self.enqueue(&record) {
            Ok(_) => Some(record.event_id().clone()),
            Err(e) => {
                error!(event_type, error = %e, "failed to queue event");
                None
            }
        }
    }

    fn record_preset(&self, event: PresetEvent, attributes: Vec<(&str, AttrValue)>) -> bool {
        let Some(mut record) = self.create_event(event.as_str()) else {
            return false;
        };
        for (name, value) in attributes {
            record.add_reserved_attribute(name, value);
        }
        self.enqueue_logged(&record)
    }

    fn record_violation(&self, violation: &Violation) {
        let now = self.clock.now_ms();
        let (context, user, session) = {
            let state = self.state.lock();
            (
                state.context.clone(),
                simple_user_view(&state.user),
                state.session.snapshot(now),
            )
        };
        let diagnostic = EventRecord::diagnostic(violation, context, user, session, now);
        let _ = self.enqueue_logged(&diagnostic);
    }

    fn enqueue_logged(&self, record: &EventRecord) -> bool {
        match self.enqueue(record) {
            Ok(_) => true,
            Err(e) => {
                error!(event_type = record.event_type(), error = %e, "failed to queue event");
                false
            }
        }
    }

    // ── Uploads ─────────────────────────────────────────────────────

    /// Ask the uploader for a pass. Returns `false` if the request was
    /// dropped because the backlog is full.
    pub fn flush(&self) -> bool {
        self.submitter.submit()
    }

    /// Queue a pass and wait for it. Returns entries delivered.
    pub async fn flush_and_wait(&self) -> Result<usize> {
        Ok(self.submitter.submit_and_wait().await?)
    }

    /// Stop the flush timer and the uploader after pending passes finish.
    pub async fn shutdown(self) -> Result<()> {
        self.submitter.shutdown().await?;
        info!("analytics client shut down");
        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Start or resume the session. Records `_session_start` and returns
    /// `true` when a new session began.
    pub fn start_session(&self) -> bool {
        let now = self.clock.now_ms();
        let is_new = self.state.lock().session.start(now);
        if is_new {
            let _ = self.record_preset(PresetEvent::SessionStart, Vec::new());
        }
        is_new
    }

    /// Pause the active session and persist it.
    pub fn pause_session(&self) -> Result<()> {
        let now = self.clock.now_ms();
        let paused = self.state.lock().session.pause(now).cloned();
        if let Some(session) = paused {
            self.prefs.save_session(&session)?;
            debug!(session_id = session.session_id(), "session paused");
        }
        Ok(())
    }

    /// Whether the last [`Self::start_session`] began a new session.
    pub fn is_new_session(&self) -> bool {
        self.state.lock().session.is_new_session()
    }

    /// The active or paused session.
    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.current().cloned()
    }

    // ── Global attributes ───────────────────────────────────────────

    /// Add an attribute stamped onto every later event. Returns `false` and
    /// queues a diagnostic event if it was rejected.
    pub fn add_global_attribute(&self, name: &str, value: impl Into<AttrValue>) -> bool {
        let result = self.state.lock().global.insert(name, value.into());
        match result {
            Ok(()) => true,
            Err(violation) => {
                warn!(name, code = violation.code, "global attribute rejected");
                self.record_violation(&violation);
                false
            }
        }
    }

    /// Remove a global attribute.
    pub fn delete_global_attribute(&self, name: &str) -> bool {
        self.state.lock().global.remove(name).is_some()
    }

    /// Current global attribute value.
    pub fn global_attribute(&self, name: &str) -> Option<AttrValue> {
        self.state.lock().global.get(name).cloned()
    }

    // ── User attributes ─────────────────────────────────────────────

    /// Set a user attribute and persist the store. Returns `false` and
    /// queues a diagnostic event if it was rejected.
    pub fn add_user_attribute(&self, name: &str, value: impl Into<AttrValue>) -> Result<bool> {
        let value = value.into();
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let current = state.user.len() - usize::from(state.user.contains_key(name));

        if let Err(violation) = validate_attribute(AttributeScope::User, current, name, &value) {
            drop(state);
            warn!(name, code = violation.code, "user attribute rejected");
            self.record_violation(&violation);
            return Ok(false);
        }

        let _ = state.user.insert(
            name.to_owned(),
            UserAttribute {
                value,
                set_timestamp: now,
            },
        );
        self.prefs.save_user_attributes(&state.user)?;
        Ok(true)
    }

    /// Switch the signed-in user.
    ///
    /// Does nothing if `user_id` is already current. Signing in as a
    /// non-empty id clears the user attributes and adopts that user's
    /// unique id and first touch timestamp. An empty id signs out and
    /// removes `_user_id`.
    pub fn update_user_id(&self, user_id: &str) -> Result<()> {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        if state.user_id == user_id {
            return Ok(());
        }
        self.prefs.set_current_user_id(user_id)?;
        state.user_id = user_id.to_owned();

        if !user_id.is_empty() {
            let current = UserIdentity {
                unique_id: state.context.unique_id.clone(),
                first_touch_timestamp: first_touch_timestamp(&state.user).unwrap_or(now),
            };
            let identity = self.prefs.switch_user(user_id, current, now)?;
            if identity.unique_id != state.context.unique_id {
                info!(unique_id = %identity.unique_id, "switched user identity");
                let mut context = EventContext::clone(&state.context);
                context.unique_id = identity.unique_id;
                state.context = Arc::new(context);
            }
            state.user = UserAttributes::new();
            let _ = state.user.insert(
                ReservedAttribute::USER_FIRST_TOUCH_TIMESTAMP.to_owned(),
                UserAttribute {
                    value: AttrValue::Int(identity.first_touch_timestamp),
                    set_timestamp: now,
                },
            );
            let _ = state.user.insert(
                ReservedAttribute::USER_ID.to_owned(),
                UserAttribute {
                    value: AttrValue::from(user_id),
                    set_timestamp: now,
                },
            );
        } else {
            let _ = state.user.remove(ReservedAttribute::USER_ID);
        }
        Ok(self.prefs.save_user_attributes(&state.user)?)
    }

    /// Remove a user attribute and persist the store.
    pub fn delete_user_attribute(&self, name: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let removed = state.user.remove(name).is_some();
        if removed {
            self.prefs.save_user_attributes(&state.user)?;
        }
        Ok(removed)
    }

    /// Current user attribute.
    pub fn user_attribute(&self, name: &str) -> Option<UserAttribute> {
        self.state.lock().user.get(name).cloned()
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Record `_first_open` the first time this is called on an
    /// installation. Returns whether it was recorded.
    pub fn handle_first_open(&self) -> Result<bool> {
        if !self.prefs.is_first_open()? {
            return Ok(false);
        }
        let recorded = self.record_preset(PresetEvent::FirstOpen, Vec::new());
        if recorded {
            self.prefs.mark_first_open_recorded()?;
        }
        Ok(recorded)
    }

    /// Record `_app_update` when the app version differs from the stored
    /// one. The first sighting only stores the version.
    pub fn handle_app_update(&self) -> Result<bool> {
        let current = self.state.lock().context.app.app_version.clone();
        let previous = self.prefs.app_version()?;
        self.prefs.set_app_version(&current)?;
        Ok(self.record_version_change(
            PresetEvent::AppUpdate,
            ReservedAttribute::PREVIOUS_APP_VERSION,
            previous,
            &current,
        ))
    }

    /// Record `_os_update` when the OS version differs from the stored one.
    /// The first sighting only stores the version.
    pub fn handle_os_update(&self) -> Result<bool> {
        let current = self.state.lock().context.device.os_version.clone();
        let previous = self.prefs.os_version()?;
        self.prefs.set_os_version(&current)?;
        Ok(self.record_version_change(
            PresetEvent::OsUpdate,
            ReservedAttribute::PREVIOUS_OS_VERSION,
            previous,
            &current,
        ))
    }

    fn record_version_change(
        &self,
        event: PresetEvent,
        attribute: &str,
        previous: Option<String>,
        current: &str,
    ) -> bool {
        match previous {
            Some(previous) if previous != current => {
                info!(%event, from = %previous, to = current, "version changed");
                self.record_preset(event, vec![(attribute, AttrValue::from(previous))])
            }
            _ => false,
        }
    }
}

fn first_touch_timestamp(user: &UserAttributes) -> Option<i64> {
    match user.get(ReservedAttribute::USER_FIRST_TOUCH_TIMESTAMP)?.value {
        AttrValue::Int(ts) => Some(ts),
        _ => None,
    }
}
