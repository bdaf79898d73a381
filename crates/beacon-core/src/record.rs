//! The canonical event record and its wire format.
//!
//! An [`EventRecord`] is built from snapshots taken at creation time:
//! global attributes, a user-attribute view, and the session. Once
//! serialized with [`EventRecord::to_json`] and queued, it is never touched
//! again.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attributes::{AttrValue, AttributeSet, UserAttributes};
use crate::errors::Result;
use crate::events::{PresetEvent, ReservedAttribute};
use crate::ids::{EventId, UniqueId};
use crate::items::Item;
use crate::validation::{self, AttributeScope, Violation};

/// Device details captured by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    /// Platform device identifier.
    pub device_id: String,
    /// Platform name, e.g. `Android`.
    pub platform: String,
    /// OS version string.
    pub os_version: String,
    /// Manufacturer.
    pub make: String,
    /// Brand.
    pub brand: String,
    /// Model.
    pub model: String,
    /// Locale, e.g. `en_US`.
    pub locale: String,
    /// Mobile carrier name.
    pub carrier: String,
    /// `WIFI`, `Mobile` or `UNKNOWN`.
    pub network_type: String,
    /// Screen height in pixels.
    pub screen_height: i64,
    /// Screen width in pixels.
    pub screen_width: i64,
    /// Offset from UTC in ms.
    pub zone_offset: i64,
    /// System language code.
    pub system_language: String,
    /// Display country.
    pub country: String,
    /// ISO country code.
    pub country_code: String,
}

/// Host application details.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    /// Collection-side application id.
    pub app_id: String,
    /// Version name.
    pub app_version: String,
    /// Package name.
    pub app_package_name: String,
    /// Display title.
    pub app_title: String,
}

/// SDK identification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SdkInfo {
    /// SDK name.
    pub sdk_name: String,
    /// SDK version.
    pub sdk_version: String,
}

impl Default for SdkInfo {
    fn default() -> Self {
        Self {
            sdk_name: "beacon-rust".into(),
            sdk_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Everything about the installation that is stamped onto each event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventContext {
    /// Installation id.
    pub unique_id: UniqueId,
    /// Device details.
    pub device: DeviceInfo,
    /// App details.
    pub app: AppInfo,
    /// SDK details.
    pub sdk: SdkInfo,
}

/// Session fields written into an event's attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id.
    pub session_id: String,
    /// Session start, epoch ms.
    pub start_timestamp: i64,
    /// Duration so far, ms.
    pub duration: i64,
    /// Session index.
    pub session_number: u32,
}

/// One occurrence, ready to be serialized and queued.
#[derive(Clone, Debug)]
pub struct EventRecord {
    event_id: EventId,
    event_type: String,
    timestamp: i64,
    context: Arc<EventContext>,
    attributes: AttributeSet,
    user: UserAttributes,
    session: Option<SessionSnapshot>,
    items: Vec<Item>,
    item_violation: Option<Violation>,
}

impl EventRecord {
    /// Create a record after validating `event_type`.
    ///
    /// `global_attributes` is copied in first; callers then add
    /// event-specific attributes with [`EventRecord::add_attribute`].
    pub fn create(
        event_type: &str,
        context: Arc<EventContext>,
        global_attributes: &BTreeMap<String, AttrValue>,
        user: UserAttributes,
        session: Option<SessionSnapshot>,
        timestamp: i64,
    ) -> std::result::Result<Self, Violation> {
        validation::validate_event_name(event_type)?;
        Ok(Self::build(
            event_type,
            context,
            global_attributes.clone(),
            user,
            session,
            timestamp,
        ))
    }

    /// A `_clickstream_error` record describing `violation`.
    pub fn diagnostic(
        violation: &Violation,
        context: Arc<EventContext>,
        user: UserAttributes,
        session: Option<SessionSnapshot>,
        timestamp: i64,
    ) -> Self {
        let mut record = Self::build(
            PresetEvent::ClickstreamError.as_str(),
            context,
            BTreeMap::new(),
            user,
            session,
            timestamp,
        );
        record.add_reserved_attribute(ReservedAttribute::ERROR_CODE, violation.code.into());
        record.add_reserved_attribute(
            ReservedAttribute::ERROR_MESSAGE,
            violation.message.clone().into(),
        );
        record
    }

    fn build(
        event_type: &str,
        context: Arc<EventContext>,
        globals: BTreeMap<String, AttrValue>,
        user: UserAttributes,
        session: Option<SessionSnapshot>,
        timestamp: i64,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.to_owned(),
            timestamp,
            context,
            attributes: AttributeSet::from_snapshot(AttributeScope::Event, globals),
            user,
            session,
            items: Vec::new(),
            item_violation: None,
        }
    }

    /// Validate and add an attribute. Returns `false` if it was rejected
    /// (a diagnostic entry is kept instead).
    pub fn add_attribute(&mut self, name: &str, value: AttrValue) -> bool {
        self.attributes.insert(name, value).is_ok()
    }

    /// Validate and attach an item. Returns `false` if it was rejected; the
    /// first rejection is reported through `_error_code` and
    /// `_error_message` on the event.
    pub fn add_item(&mut self, item: Item) -> bool {
        match validation::validate_item(self.items.len(), &item) {
            Ok(()) => {
                self.items.push(item);
                true
            }
            Err(violation) => {
                if self.item_violation.is_none() {
                    self.item_violation = Some(violation);
                }
                false
            }
        }
    }

    /// Attached items, in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Add an SDK-owned attribute without validation.
    pub fn add_reserved_attribute(&mut self, name: &str, value: AttrValue) {
        self.attributes.insert_reserved(name, value);
    }

    /// Event id.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Event type name.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Creation time, epoch ms.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Attributes (globals plus event-specific).
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// User attribute view attached at creation.
    pub fn user(&self) -> &UserAttributes {
        &self.user
    }

    /// Session snapshot, if a session was active.
    pub fn session(&self) -> Option<&SessionSnapshot> {
        self.session.as_ref()
    }

    /// Serialize to the flat JSON wire object.
    pub fn to_json(&self) -> Result<String> {
        let ctx = &*self.context;
        let wire = WireEvent {
            unique_id: ctx.unique_id.as_str(),
            event_type: &self.event_type,
            event_id: self.event_id.as_str(),
            app_id: &ctx.app.app_id,
            timestamp: self.timestamp,
            device_id: &ctx.device.device_id,
            platform: &ctx.device.platform,
            os_version: &ctx.device.os_version,
            make: &ctx.device.make,
            brand: &ctx.device.brand,
            model: &ctx.device.model,
            locale: &ctx.device.locale,
            carrier: &ctx.device.carrier,
            network_type: &ctx.device.network_type,
            screen_height: ctx.device.screen_height,
            screen_width: ctx.device.screen_width,
            zone_offset: ctx.device.zone_offset,
            system_language: &ctx.device.system_language,
            country: &ctx.device.country,
            country_code: &ctx.device.country_code,
            sdk_version: &ctx.sdk.sdk_version,
            sdk_name: &ctx.sdk.sdk_name,
            app_version: &ctx.app.app_version,
            app_package_name: &ctx.app.app_package_name,
            app_title: &ctx.app.app_title,
            user: &self.user,
            attributes: self.wire_attributes(),
            items: &self.items,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    fn wire_attributes(&self) -> Map<String, Value> {
        let mut map = self.attributes.to_json_map();
        if let Some(violation) = &self.item_violation {
            let _ = map.insert(
                ReservedAttribute::ERROR_CODE.into(),
                Value::from(violation.code),
            );
            let _ = map.insert(
                ReservedAttribute::ERROR_MESSAGE.into(),
                Value::String(violation.message.clone()),
            );
        }
        if let Some(session) = &self.session {
            let _ = map.insert(
                ReservedAttribute::SESSION_ID.into(),
                Value::String(session.session_id.clone()),
            );
            let _ = map.insert(
                ReservedAttribute::SESSION_START_TIMESTAMP.into(),
                Value::from(session.start_timestamp),
            );
            let _ = map.insert(
                ReservedAttribute::SESSION_DURATION.into(),
                Value::from(session.duration),
            );
            let _ = map.insert(
                ReservedAttribute::SESSION_NUMBER.into(),
                Value::from(session.session_number),
            );
        }
        map
    }
}

#[derive(Serialize)]
struct WireEvent<'a> {
    unique_id: &'a str,
    event_type: &'a str,
    event_id: &'a str,
    app_id: &'a str,
    timestamp: i64,
    device_id: &'a str,
    platform: &'a str,
    os_version: &'a str,
    make: &'a str,
    brand: &'a str,
    model: &'a str,
    locale: &'a str,
    carrier: &'a str,
    network_type: &'a str,
    screen_height: i64,
    screen_width: i64,
    zone_offset: i64,
    system_language: &'a str,
    country: &'a str,
    country_code: &'a str,
    sdk_version: &'a str,
    sdk_name: &'a str,
    app_version: &'a str,
    app_package_name: &'a str,
    app_title: &'a str,
    user: &'a UserAttributes,
    attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "<[Item]>::is_empty")]
    items: &'a [Item],
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::UserAttribute;
    use crate::limits::codes;
    use crate::validation::ErrorKind;

    fn context() -> Arc<EventContext> {
        Arc::new(EventContext {
            unique_id: UniqueId::from("unique-1"),
            device: DeviceInfo {
                device_id: "dev-1".into(),
                platform: "Android".into(),
                os_version: "14".into(),
                screen_height: 2400,
                screen_width: 1080,
                ..DeviceInfo::default()
            },
            app: AppInfo {
                app_id: "app-1".into(),
                app_version: "1.2.0".into(),
                ..AppInfo::default()
            },
            sdk: SdkInfo::default(),
        })
    }

    fn parse(record: &EventRecord) -> Value {
        serde_json::from_str(&record.to_json().unwrap()).unwrap()
    }

    #[test]
    fn create_rejects_invalid_event_type() {
        let err = EventRecord::create("1bad", context(), &BTreeMap::new(), UserAttributes::new(), None, 1)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameInvalid);
    }

    #[test]
    fn create_copies_globals() {
        let globals: BTreeMap<String, AttrValue> =
            [("channel".to_owned(), AttrValue::from("store"))].into_iter().collect();
        let record =
            EventRecord::create("click", context(), &globals, UserAttributes::new(), None, 1).unwrap();
        assert_eq!(record.attributes().get("channel"), Some(&AttrValue::from("store")));
    }

    #[test]
    fn globals_count_toward_attribute_bound() {
        let globals: BTreeMap<String, AttrValue> =
            (0..500).map(|i| (format!("g{i}"), AttrValue::Int(i))).collect();
        let mut record =
            EventRecord::create("click", context(), &globals, UserAttributes::new(), None, 1).unwrap();
        assert!(!record.add_attribute("extra", AttrValue::Bool(true)));
        assert_eq!(record.attributes().len(), 500);
    }

    #[test]
    fn wire_format_has_flat_context_fields() {
        let record =
            EventRecord::create("click", context(), &BTreeMap::new(), UserAttributes::new(), None, 42).unwrap();
        let json = parse(&record);
        assert_eq!(json["unique_id"], "unique-1");
        assert_eq!(json["event_type"], "click");
        assert_eq!(json["event_id"], record.event_id().as_str());
        assert_eq!(json["app_id"], "app-1");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["device_id"], "dev-1");
        assert_eq!(json["platform"], "Android");
        assert_eq!(json["screen_height"], 2400);
        assert_eq!(json["app_version"], "1.2.0");
        assert_eq!(json["sdk_name"], "beacon-rust");
        assert!(json["attributes"].is_object());
        assert!(json["user"].is_object());
    }

    #[test]
    fn session_fields_written_into_attributes() {
        let session = SessionSnapshot {
            session_id: "abc-20240101-000000000".into(),
            start_timestamp: 100,
            duration: 25,
            session_number: 3,
        };
        let record = EventRecord::create(
            "click",
            context(),
            &BTreeMap::new(),
            UserAttributes::new(),
            Some(session),
            125,
        )
        .unwrap();
        let attrs = &parse(&record)["attributes"];
        assert_eq!(attrs["_session_id"], "abc-20240101-000000000");
        assert_eq!(attrs["_session_start_timestamp"], 100);
        assert_eq!(attrs["_session_duration"], 25);
        assert_eq!(attrs["_session_number"], 3);
    }

    #[test]
    fn user_attributes_serialize_with_timestamp() {
        let mut user = UserAttributes::new();
        let _ = user.insert(
            "_user_id".into(),
            UserAttribute {
                value: AttrValue::from("u-9"),
                set_timestamp: 77,
            },
        );
        let record = EventRecord::create("click", context(), &BTreeMap::new(), user, None, 1).unwrap();
        let json = parse(&record);
        assert_eq!(json["user"]["_user_id"]["value"], "u-9");
        assert_eq!(json["user"]["_user_id"]["set_timestamp"], 77);
    }

    #[test]
    fn rejected_attribute_leaves_diagnostic() {
        let mut record =
            EventRecord::create("click", context(), &BTreeMap::new(), UserAttributes::new(), None, 1).unwrap();
        assert!(!record.add_attribute("bad-name", AttrValue::Int(1)));
        let attrs = &parse(&record)["attributes"];
        assert!(attrs.get("bad-name").is_none());
        assert_eq!(attrs["_error_name_invalid"], "bad-name");
    }

    #[test]
    fn items_serialize_as_array() {
        let mut record =
            EventRecord::create("purchase", context(), &BTreeMap::new(), UserAttributes::new(), None, 1).unwrap();
        assert!(parse(&record).get("items").is_none());

        assert!(record.add_item(Item::new().with("id", "sku-1").with("price", 9.5)));
        let json = parse(&record);
        assert_eq!(json["items"], serde_json::json!([{"id": "sku-1", "price": 9.5}]));
    }

    #[test]
    fn rejected_item_reports_first_error_on_event() {
        let mut record =
            EventRecord::create("purchase", context(), &BTreeMap::new(), UserAttributes::new(), None, 1).unwrap();
        assert!(!record.add_item(Item::new().with("bad key", 1)));
        assert!(!record.add_item(Item::new().with("name", "n".repeat(300))));
        assert!(record.add_item(Item::new().with("id", "ok")));
        assert_eq!(record.items().len(), 1);

        let attrs = &parse(&record)["attributes"];
        assert_eq!(attrs["_error_code"], codes::ITEM_CUSTOM_ATTRIBUTE_KEY_INVALID);
        assert_eq!(attrs["_error_message"], "bad key");
    }

    #[test]
    fn item_count_is_bounded() {
        let mut record =
            EventRecord::create("purchase", context(), &BTreeMap::new(), UserAttributes::new(), None, 1).unwrap();
        for i in 0..100 {
            assert!(record.add_item(Item::new().with("id", i)));
        }
        assert!(!record.add_item(Item::new().with("id", 100)));
        assert_eq!(record.items().len(), 100);
        assert_eq!(parse(&record)["attributes"]["_error_code"], codes::ITEM_SIZE_EXCEED);
    }

    #[test]
    fn diagnostic_record_carries_code_and_message() {
        let violation = validation::validate_event_name("9lives").unwrap_err();
        let record = EventRecord::diagnostic(&violation, context(), UserAttributes::new(), None, 5);
        assert_eq!(record.event_type(), "_clickstream_error");
        let attrs = &parse(&record)["attributes"];
        assert_eq!(attrs["_error_code"], codes::EVENT_NAME_INVALID);
        assert!(attrs["_error_message"].as_str().unwrap().contains("9lives"));
    }
}
