//! Preset event types and reserved attribute names.

/// Event types recorded by the SDK itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresetEvent {
    /// A new session began.
    SessionStart,
    /// First launch after install.
    FirstOpen,
    /// App came to the foreground.
    AppStart,
    /// App went to the background.
    AppEnd,
    /// Foreground engagement interval.
    UserEngagement,
    /// A screen was shown.
    ScreenView,
    /// App version changed since last launch.
    AppUpdate,
    /// OS version changed since last launch.
    OsUpdate,
    /// Uncaught exception in the host app.
    AppException,
    /// User attributes changed.
    ProfileSet,
    /// A validation diagnostic.
    ClickstreamError,
}

impl PresetEvent {
    /// Wire name of the event type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionStart => "_session_start",
            Self::FirstOpen => "_first_open",
            Self::AppStart => "_app_start",
            Self::AppEnd => "_app_end",
            Self::UserEngagement => "_user_engagement",
            Self::ScreenView => "_screen_view",
            Self::AppUpdate => "_app_update",
            Self::OsUpdate => "_os_update",
            Self::AppException => "_app_exception",
            Self::ProfileSet => "_profile_set",
            Self::ClickstreamError => "_clickstream_error",
        }
    }
}

impl std::fmt::Display for PresetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute names written by the SDK.
pub struct ReservedAttribute;

impl ReservedAttribute {
    /// User identifier set by the host.
    pub const USER_ID: &'static str = "_user_id";
    /// When the installation was first seen.
    pub const USER_FIRST_TOUCH_TIMESTAMP: &'static str = "_user_first_touch_timestamp";
    /// Session identifier.
    pub const SESSION_ID: &'static str = "_session_id";
    /// Session start, epoch ms.
    pub const SESSION_START_TIMESTAMP: &'static str = "_session_start_timestamp";
    /// Session duration so far, ms.
    pub const SESSION_DURATION: &'static str = "_session_duration";
    /// Session index.
    pub const SESSION_NUMBER: &'static str = "_session_number";
    /// App version before an update.
    pub const PREVIOUS_APP_VERSION: &'static str = "_previous_app_version";
    /// OS version before an update.
    pub const PREVIOUS_OS_VERSION: &'static str = "_previous_os_version";
    /// Numeric diagnostic code on `_clickstream_error` events.
    pub const ERROR_CODE: &'static str = "_error_code";
    /// Diagnostic message on `_clickstream_error` events.
    pub const ERROR_MESSAGE: &'static str = "_error_message";
}
