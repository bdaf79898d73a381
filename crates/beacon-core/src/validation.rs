//! Naming and size rules for event types and attributes.
//!
//! Violations are values, not errors: callers turn a [`Violation`] into a
//! diagnostic attribute (or a `_clickstream_error` event) and carry on.
//!
//! Attribute checks run in a fixed order: count, name length, name
//! characters, then textual value length. The first failing rule wins.
//! Item checks follow the same shape, key by key.

use serde::{Deserialize, Serialize};

use crate::attributes::AttrValue;
use crate::items::{self, Item};
use crate::limits::{self, codes};

/// Category of a validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Name is empty, starts with a digit, or has characters outside `[0-9A-Za-z_]`.
    NameInvalid,
    /// Name is longer than [`limits::MAX_LENGTH_OF_NAME`].
    NameLengthExceeded,
    /// Textual value is longer than the scope's value limit.
    ValueLengthExceeded,
    /// The attribute set is already full.
    CountExceeded,
}

impl ErrorKind {
    /// Attribute key used for this kind's diagnostic on an event.
    pub fn diagnostic_key(self) -> &'static str {
        match self {
            Self::NameInvalid => "_error_name_invalid",
            Self::NameLengthExceeded => "_error_name_length_exceed",
            Self::ValueLengthExceeded => "_error_value_length_exceed",
            Self::CountExceeded => "_error_attribute_size_exceed",
        }
    }
}

/// Which family of limits applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeScope {
    /// Event (and global) attributes.
    Event,
    /// User attributes.
    User,
}

impl AttributeScope {
    /// Maximum number of attributes in a set of this scope.
    pub fn max_count(self) -> usize {
        match self {
            Self::Event => limits::MAX_NUM_OF_ATTRIBUTES,
            Self::User => limits::MAX_NUM_OF_USER_ATTRIBUTES,
        }
    }

    /// Maximum textual value length in this scope.
    pub fn max_value_length(self) -> usize {
        match self {
            Self::Event => limits::MAX_LENGTH_OF_VALUE,
            Self::User => limits::MAX_LENGTH_OF_USER_VALUE,
        }
    }

    /// Numeric code for a failure of `kind` in this scope.
    pub fn code(self, kind: ErrorKind) -> i64 {
        match (self, kind) {
            (Self::Event, ErrorKind::NameInvalid) => codes::ATTRIBUTE_NAME_INVALID,
            (Self::Event, ErrorKind::NameLengthExceeded) => codes::ATTRIBUTE_NAME_LENGTH_EXCEED,
            (Self::Event, ErrorKind::ValueLengthExceeded) => codes::ATTRIBUTE_VALUE_LENGTH_EXCEED,
            (Self::Event, ErrorKind::CountExceeded) => codes::ATTRIBUTE_SIZE_EXCEED,
            (Self::User, ErrorKind::NameInvalid) => codes::USER_ATTRIBUTE_NAME_INVALID,
            (Self::User, ErrorKind::NameLengthExceeded) => codes::USER_ATTRIBUTE_NAME_LENGTH_EXCEED,
            (Self::User, ErrorKind::ValueLengthExceeded) => codes::USER_ATTRIBUTE_VALUE_LENGTH_EXCEED,
            (Self::User, ErrorKind::CountExceeded) => codes::USER_ATTRIBUTE_SIZE_EXCEED,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Event => "attribute",
            Self::User => "user attribute",
        }
    }
}

/// A rejected event type or attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Failure category.
    pub kind: ErrorKind,
    /// Numeric diagnostic code.
    pub code: i64,
    /// Human-readable message, at most [`limits::MAX_LENGTH_OF_ERROR_VALUE`] chars plus `...`.
    pub message: String,
}

impl Violation {
    fn new(kind: ErrorKind, code: i64, message: &str) -> Self {
        Self {
            kind,
            code,
            message: clip_string(message, limits::MAX_LENGTH_OF_ERROR_VALUE),
        }
    }
}

/// Whether `name` is a legal event type or attribute name.
///
/// Non-empty, first character not a digit, the rest ASCII alphanumeric or `_`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Validate an event type name.
pub fn validate_event_name(name: &str) -> Result<(), Violation> {
    if !is_valid_name(name) {
        return Err(Violation::new(
            ErrorKind::NameInvalid,
            codes::EVENT_NAME_INVALID,
            &format!(
                "event name may only contain letters, digits and underscores and must not start with a digit. event name: {name}"
            ),
        ));
    }
    let len = name.chars().count();
    if len > limits::MAX_LENGTH_OF_NAME {
        return Err(Violation::new(
            ErrorKind::NameLengthExceeded,
            codes::EVENT_NAME_LENGTH_EXCEED,
            &format!(
                "event name is too long, the max length is {} characters. event name: {name}",
                limits::MAX_LENGTH_OF_NAME
            ),
        ));
    }
    Ok(())
}

/// Validate one attribute about to be added to a set that already holds
/// `current_count` attributes.
pub fn validate_attribute(
    scope: AttributeScope,
    current_count: usize,
    name: &str,
    value: &AttrValue,
) -> Result<(), Violation> {
    let label = scope.label();

    if current_count >= scope.max_count() {
        tracing::warn!(
            limit = scope.max_count(),
            name,
            "{label} limit reached, attribute dropped"
        );
        return Err(Violation::new(
            ErrorKind::CountExceeded,
            scope.code(ErrorKind::CountExceeded),
            &format!("attribute name: {name}"),
        ));
    }

    let name_len = name.chars().count();
    if name_len > limits::MAX_LENGTH_OF_NAME {
        tracing::warn!(name_len, name, "{label} name too long, attribute dropped");
        return Err(Violation::new(
            ErrorKind::NameLengthExceeded,
            scope.code(ErrorKind::NameLengthExceeded),
            &format!("{label} name length is:({name_len}) name is:{name}"),
        ));
    }

    if !is_valid_name(name) {
        tracing::warn!(name, "{label} name invalid, attribute dropped");
        return Err(Violation::new(
            ErrorKind::NameInvalid,
            scope.code(ErrorKind::NameInvalid),
            name,
        ));
    }

    if let AttrValue::String(text) = value {
        let value_len = text.chars().count();
        if value_len > scope.max_value_length() {
            tracing::warn!(name, value_len, "{label} value too long, attribute dropped");
            return Err(Violation::new(
                ErrorKind::ValueLengthExceeded,
                scope.code(ErrorKind::ValueLengthExceeded),
                &format!("{label} name:{name}, attribute value:{text}"),
            ));
        }
    }

    Ok(())
}

/// Validate one item about to be added to an event that already holds
/// `current_count` items.
///
/// Only keys outside [`items::keys::PRESET`] count toward the custom key
/// limit and are name-checked. Every value's text form is length-checked.
pub fn validate_item(current_count: usize, item: &Item) -> Result<(), Violation> {
    if current_count >= limits::MAX_NUM_OF_ITEMS {
        let message = format!(
            "reached the max number of items limit {}. and the item: {} will not be recorded",
            limits::MAX_NUM_OF_ITEMS,
            item.to_json()
        );
        tracing::warn!(limit = limits::MAX_NUM_OF_ITEMS, "item limit reached, item dropped");
        return Err(Violation::new(
            ErrorKind::CountExceeded,
            codes::ITEM_SIZE_EXCEED,
            &message,
        ));
    }

    let mut custom_keys = 0;
    for (key, value) in item.values() {
        if !items::is_preset_key(key) {
            custom_keys += 1;
            if custom_keys > limits::MAX_NUM_OF_CUSTOM_ITEM_ATTRIBUTE {
                tracing::warn!(key, "custom item key limit reached, item dropped");
                return Err(Violation::new(
                    ErrorKind::CountExceeded,
                    codes::ITEM_CUSTOM_ATTRIBUTE_SIZE_EXCEED,
                    &format!("item attribute key: {key}"),
                ));
            }
            let key_len = key.chars().count();
            if key_len > limits::MAX_LENGTH_OF_NAME {
                tracing::warn!(key_len, key, "item key too long, item dropped");
                return Err(Violation::new(
                    ErrorKind::NameLengthExceeded,
                    codes::ITEM_CUSTOM_ATTRIBUTE_KEY_LENGTH_EXCEED,
                    &format!("item attribute key length is:({key_len}) key is:{key}"),
                ));
            }
            if !is_valid_name(key) {
                tracing::warn!(key, "item key invalid, item dropped");
                return Err(Violation::new(
                    ErrorKind::NameInvalid,
                    codes::ITEM_CUSTOM_ATTRIBUTE_KEY_INVALID,
                    key,
                ));
            }
        }

        let text = value.to_string();
        let value_len = text.chars().count();
        if value_len > limits::MAX_LENGTH_OF_ITEM_VALUE {
            tracing::warn!(key, value_len, "item value too long, item dropped");
            return Err(Violation::new(
                ErrorKind::ValueLengthExceeded,
                codes::ITEM_ATTRIBUTE_VALUE_LENGTH_EXCEED,
                &format!("item attribute name: {key}, item attribute value: {text}"),
            ));
        }
    }

    Ok(())
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
pub fn clip_string(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &input[..byte_idx]),
        None => input.to_owned(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn text(s: &str) -> AttrValue {
        AttrValue::String(s.to_owned())
    }

    // ── Names ───────────────────────────────────────────────────────

    #[test]
    fn valid_names() {
        for name in ["a", "_", "abc", "_private", "name_1", "A1b2C3"] {
            assert!(is_valid_name(name), "{name}");
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "1abc", "9", "a-b", "a b", "a.b", "名字", "abc!"] {
            assert!(!is_valid_name(name), "{name}");
        }
    }

    #[test]
    fn event_name_starting_with_digit_rejected() {
        let err = validate_event_name("1abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameInvalid);
        assert_eq!(err.code, codes::EVENT_NAME_INVALID);
        assert!(err.message.ends_with("event name: 1abc"));
    }

    #[test]
    fn event_name_of_51_chars_rejected() {
        let name = "a".repeat(51);
        let err = validate_event_name(&name).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameLengthExceeded);
        assert_eq!(err.code, codes::EVENT_NAME_LENGTH_EXCEED);
    }

    #[test]
    fn event_name_of_50_chars_accepted() {
        assert!(validate_event_name(&"a".repeat(50)).is_ok());
    }

    // ── Attributes ──────────────────────────────────────────────────

    #[test]
    fn attribute_name_invalid() {
        let err = validate_attribute(AttributeScope::Event, 0, "1abc", &text("v")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameInvalid);
        assert_eq!(err.code, codes::ATTRIBUTE_NAME_INVALID);
        assert_eq!(err.message, "1abc");
    }

    #[test]
    fn attribute_name_too_long() {
        let name = "a".repeat(51);
        let err = validate_attribute(AttributeScope::Event, 0, &name, &text("v")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameLengthExceeded);
        assert_eq!(err.code, codes::ATTRIBUTE_NAME_LENGTH_EXCEED);
        assert!(err.message.starts_with("attribute name length is:(51)"));
    }

    #[test]
    fn attribute_count_checked_before_name() {
        let err = validate_attribute(AttributeScope::Event, 500, "1abc", &text("v")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CountExceeded);
        assert_eq!(err.code, codes::ATTRIBUTE_SIZE_EXCEED);
        assert_eq!(err.message, "attribute name: 1abc");
    }

    #[test]
    fn attribute_count_below_limit_accepted() {
        assert!(validate_attribute(AttributeScope::Event, 499, "ok", &text("v")).is_ok());
    }

    #[test]
    fn event_value_limit_is_1024() {
        let ok = text(&"x".repeat(1024));
        let too_long = text(&"x".repeat(1025));
        assert!(validate_attribute(AttributeScope::Event, 0, "k", &ok).is_ok());
        let err = validate_attribute(AttributeScope::Event, 0, "k", &too_long).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueLengthExceeded);
        assert_eq!(err.code, codes::ATTRIBUTE_VALUE_LENGTH_EXCEED);
    }

    #[test]
    fn user_limits_are_tighter() {
        let value = text(&"x".repeat(257));
        let err = validate_attribute(AttributeScope::User, 0, "k", &value).unwrap_err();
        assert_eq!(err.code, codes::USER_ATTRIBUTE_VALUE_LENGTH_EXCEED);

        let err = validate_attribute(AttributeScope::User, 100, "k", &text("v")).unwrap_err();
        assert_eq!(err.code, codes::USER_ATTRIBUTE_SIZE_EXCEED);
        assert_eq!(err.message, "attribute name: k");
    }

    #[test]
    fn non_text_values_skip_length_check() {
        assert!(validate_attribute(AttributeScope::Event, 0, "n", &AttrValue::Int(i64::MAX)).is_ok());
        assert!(validate_attribute(AttributeScope::Event, 0, "b", &AttrValue::Bool(true)).is_ok());
        assert!(validate_attribute(AttributeScope::Event, 0, "f", &AttrValue::Float(1.5)).is_ok());
    }

    #[test]
    fn long_messages_are_clipped() {
        let value = text(&"x".repeat(2000));
        let err = validate_attribute(AttributeScope::Event, 0, "k", &value).unwrap_err();
        assert_eq!(err.message.chars().count(), 256 + 3);
        assert!(err.message.ends_with("..."));
    }

    #[test]
    fn violation_codes_by_scope() {
        assert_matches!(AttributeScope::Event.code(ErrorKind::NameInvalid), 2002);
        assert_matches!(AttributeScope::User.code(ErrorKind::NameLengthExceeded), 3002);
    }

    // ── Items ───────────────────────────────────────────────────────

    fn item() -> Item {
        Item::new()
            .with(items::keys::ITEM_ID, "sku-1")
            .with(items::keys::PRICE, 9.5)
    }

    #[test]
    fn preset_item_accepted() {
        assert!(validate_item(0, &item()).is_ok());
    }

    #[test]
    fn item_count_limit() {
        assert!(validate_item(99, &item()).is_ok());
        let err = validate_item(100, &item()).unwrap_err();
        assert_eq!(err.code, codes::ITEM_SIZE_EXCEED);
        assert!(err.message.contains("sku-1"));
    }

    #[test]
    fn eleventh_custom_key_rejected() {
        let mut ten = item();
        for i in 0..10 {
            ten = ten.with(&format!("custom_{i:02}"), i);
        }
        assert!(validate_item(0, &ten).is_ok());

        let err = validate_item(0, &ten.with("custom_10", 10)).unwrap_err();
        assert_eq!(err.code, codes::ITEM_CUSTOM_ATTRIBUTE_SIZE_EXCEED);
        assert_eq!(err.message, "item attribute key: custom_10");
    }

    #[test]
    fn custom_item_key_rules() {
        let err = validate_item(0, &item().with(&"k".repeat(51), 1)).unwrap_err();
        assert_eq!(err.code, codes::ITEM_CUSTOM_ATTRIBUTE_KEY_LENGTH_EXCEED);

        let err = validate_item(0, &item().with("9key", 1)).unwrap_err();
        assert_eq!(err.code, codes::ITEM_CUSTOM_ATTRIBUTE_KEY_INVALID);
        assert_eq!(err.message, "9key");
    }

    #[test]
    fn item_value_limit_applies_to_preset_keys() {
        let ok = item().with(items::keys::ITEM_NAME, "n".repeat(256));
        assert!(validate_item(0, &ok).is_ok());

        let long = item().with(items::keys::ITEM_NAME, "n".repeat(257));
        let err = validate_item(0, &long).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueLengthExceeded);
        assert_eq!(err.code, codes::ITEM_ATTRIBUTE_VALUE_LENGTH_EXCEED);
        assert!(err.message.starts_with("item attribute name: name, item attribute value: nnn"));
    }

    // ── clip_string ─────────────────────────────────────────────────

    #[test]
    fn clip_short_string_unchanged() {
        assert_eq!(clip_string("abc", 5), "abc");
        assert_eq!(clip_string("abcde", 5), "abcde");
    }

    #[test]
    fn clip_long_string_appends_ellipsis() {
        assert_eq!(clip_string("abcdef", 3), "abc...");
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip_string("ééééé", 2), "éé...");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn generated_valid_names_pass(name in "[A-Za-z_][A-Za-z0-9_]{0,49}") {
                prop_assert!(validate_event_name(&name).is_ok());
            }

            #[test]
            fn digit_prefixed_names_fail(name in "[0-9][A-Za-z0-9_]{0,20}") {
                let err = validate_event_name(&name).unwrap_err();
                prop_assert_eq!(err.kind, ErrorKind::NameInvalid);
            }

            #[test]
            fn clipped_length_is_bounded(s in ".{0,400}") {
                let clipped = clip_string(&s, 256);
                prop_assert!(clipped.chars().count() <= 259);
            }
        }
    }
}
