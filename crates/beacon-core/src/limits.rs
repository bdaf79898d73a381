//! Fixed validation limits and diagnostic codes.

/// Maximum number of attributes on one event (globals included).
pub const MAX_NUM_OF_ATTRIBUTES: usize = 500;
/// Maximum number of user attributes in the user store.
pub const MAX_NUM_OF_USER_ATTRIBUTES: usize = 100;
/// Maximum length of an event type or attribute name, in characters.
pub const MAX_LENGTH_OF_NAME: usize = 50;
/// Maximum length of a textual event attribute value, in characters.
pub const MAX_LENGTH_OF_VALUE: usize = 1024;
/// Maximum length of a textual user attribute value, in characters.
pub const MAX_LENGTH_OF_USER_VALUE: usize = 256;
/// Maximum number of items on one event.
pub const MAX_NUM_OF_ITEMS: usize = 100;
/// Maximum number of non-preset keys on one item.
pub const MAX_NUM_OF_CUSTOM_ITEM_ATTRIBUTE: usize = 10;
/// Maximum length of an item value's text form, in characters.
pub const MAX_LENGTH_OF_ITEM_VALUE: usize = 256;
/// Diagnostic messages are clipped to this many characters.
pub const MAX_LENGTH_OF_ERROR_VALUE: usize = 256;

/// Numeric codes carried by `_clickstream_error` events.
pub mod codes {
    /// Event type name has illegal characters.
    pub const EVENT_NAME_INVALID: i64 = 1001;
    /// Event type name is too long.
    pub const EVENT_NAME_LENGTH_EXCEED: i64 = 1002;
    /// Attribute name is too long.
    pub const ATTRIBUTE_NAME_LENGTH_EXCEED: i64 = 2001;
    /// Attribute name has illegal characters.
    pub const ATTRIBUTE_NAME_INVALID: i64 = 2002;
    /// Attribute value is too long.
    pub const ATTRIBUTE_VALUE_LENGTH_EXCEED: i64 = 2003;
    /// Event already holds the maximum number of attributes.
    pub const ATTRIBUTE_SIZE_EXCEED: i64 = 2004;
    /// User store already holds the maximum number of attributes.
    pub const USER_ATTRIBUTE_SIZE_EXCEED: i64 = 3001;
    /// User attribute name is too long.
    pub const USER_ATTRIBUTE_NAME_LENGTH_EXCEED: i64 = 3002;
    /// User attribute name has illegal characters.
    pub const USER_ATTRIBUTE_NAME_INVALID: i64 = 3003;
    /// User attribute value is too long.
    pub const USER_ATTRIBUTE_VALUE_LENGTH_EXCEED: i64 = 3004;
    /// Event already holds the maximum number of items.
    pub const ITEM_SIZE_EXCEED: i64 = 4001;
    /// Item value is too long.
    pub const ITEM_ATTRIBUTE_VALUE_LENGTH_EXCEED: i64 = 4002;
    /// Item has too many custom keys.
    pub const ITEM_CUSTOM_ATTRIBUTE_SIZE_EXCEED: i64 = 4003;
    /// Custom item key is too long.
    pub const ITEM_CUSTOM_ATTRIBUTE_KEY_LENGTH_EXCEED: i64 = 4004;
    /// Custom item key has illegal characters.
    pub const ITEM_CUSTOM_ATTRIBUTE_KEY_INVALID: i64 = 4005;
}
