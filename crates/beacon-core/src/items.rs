//! Items attached to commerce-style events.
//!
//! An [`Item`] is a flat map of keys to [`AttrValue`]s. Keys listed in
//! [`keys::PRESET`] are understood by the collector; anything else is a
//! custom key and is bounded by [`crate::limits::MAX_NUM_OF_CUSTOM_ITEM_ATTRIBUTE`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::AttrValue;

/// Preset item keys.
pub mod keys {
    /// Item id.
    pub const ITEM_ID: &str = "id";
    /// Item name.
    pub const ITEM_NAME: &str = "name";
    /// Location id.
    pub const LOCATION_ID: &str = "location_id";
    /// Brand.
    pub const ITEM_BRAND: &str = "brand";
    /// Currency code.
    pub const CURRENCY: &str = "currency";
    /// Unit price.
    pub const PRICE: &str = "price";
    /// Quantity.
    pub const QUANTITY: &str = "quantity";
    /// Creative name.
    pub const CREATIVE_NAME: &str = "creative_name";
    /// Creative slot.
    pub const CREATIVE_SLOT: &str = "creative_slot";
    /// Primary category.
    pub const ITEM_CATEGORY: &str = "item_category";
    /// Second category level.
    pub const ITEM_CATEGORY2: &str = "item_category2";
    /// Third category level.
    pub const ITEM_CATEGORY3: &str = "item_category3";
    /// Fourth category level.
    pub const ITEM_CATEGORY4: &str = "item_category4";
    /// Fifth category level.
    pub const ITEM_CATEGORY5: &str = "item_category5";

    /// Every preset key.
    pub const PRESET: [&str; 14] = [
        ITEM_ID,
        ITEM_NAME,
        LOCATION_ID,
        ITEM_BRAND,
        CURRENCY,
        PRICE,
        QUANTITY,
        CREATIVE_NAME,
        CREATIVE_SLOT,
        ITEM_CATEGORY,
        ITEM_CATEGORY2,
        ITEM_CATEGORY3,
        ITEM_CATEGORY4,
        ITEM_CATEGORY5,
    ];
}

/// Whether `key` is one of [`keys::PRESET`].
pub fn is_preset_key(key: &str) -> bool {
    keys::PRESET.contains(&key)
}

/// One item: key/value pairs, serialized as a flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(BTreeMap<String, AttrValue>);

impl Item {
    /// Empty item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Item::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a key, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<AttrValue>) {
        let _ = self.0.insert(key.to_owned(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// All key/value pairs, by key.
    pub fn values(&self) -> &BTreeMap<String, AttrValue> {
        &self.0
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the item has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object form.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}
