//! The item catalogue the demo sells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::meta::{FieldSpec, ObjectSchema, ParamType};

/// Tax applied when a record never set one.
pub const DEFAULT_TAX: f64 = 10.1;

/// A purchasable item.
///
/// Optional fields are `None` when the data source never set them, and the
/// serde representation skips them, which is exactly the exclude-unset wire
/// shape: unset fields are omitted even though the schema declares defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Item {
    /// The effective tax, falling back to the schema default.
    #[must_use]
    pub fn effective_tax(&self) -> f64 {
        self.tax.unwrap_or(DEFAULT_TAX)
    }
}

/// Declared schema for [`Item`], used for body validation and as the
/// response contract of the buy endpoint.
#[must_use]
pub fn item_schema() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldSpec::required("name", ParamType::String),
        FieldSpec::optional("description", ParamType::String),
        FieldSpec::required("price", ParamType::Float),
        FieldSpec::defaulted("tax", ParamType::Float, json!(DEFAULT_TAX)),
        FieldSpec::defaulted("tags", ParamType::StringList, json!([])),
    ])
}

/// The fixed demo catalogue. Each record keeps only the fields its source
/// actually set.
#[must_use]
pub fn item_store() -> HashMap<String, Item> {
    let mut items = HashMap::new();
    items.insert(
        "sp1".to_string(),
        Item {
            name: "sp1".to_string(),
            description: None,
            price: 100.2,
            tax: None,
            tags: None,
        },
    );
    items.insert(
        "sp2".to_string(),
        Item {
            name: "sp2".to_string(),
            description: Some("Good things".to_string()),
            price: 1000.2,
            tax: Some(9.8),
            tags: None,
        },
    );
    items.insert(
        "sp3".to_string(),
        Item {
            name: "sp3".to_string(),
            description: Some("Good things".to_string()),
            price: 120.2,
            tax: Some(19.8),
            tags: Some(Vec::new()),
        },
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate_object;

    #[test]
    fn sparse_record_serializes_without_unset_fields() {
        let items = item_store();
        let value = serde_json::to_value(&items["sp1"]).unwrap();
        assert_eq!(value, json!({ "name": "sp1", "price": 100.2 }));
    }

    #[test]
    fn set_fields_survive_serialization() {
        let items = item_store();
        let value = serde_json::to_value(&items["sp3"]).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "sp3",
                "description": "Good things",
                "price": 120.2,
                "tax": 19.8,
                "tags": [],
            })
        );
    }

    #[test]
    fn schema_fills_defaults_for_validated_input() {
        let validated = validate_object(
            &item_schema(),
            &json!({ "name": "widget", "price": 5.0, "unknown": true }),
        )
        .unwrap();
        assert_eq!(validated["tax"], json!(DEFAULT_TAX));
        assert_eq!(validated["tags"], json!([]));
        assert!(validated.get("unknown").is_none());

        let item: Item = serde_json::from_value(validated).unwrap();
        assert_eq!(item.effective_tax(), DEFAULT_TAX);
    }

    #[test]
    fn schema_rejects_missing_required_fields() {
        assert!(validate_object(&item_schema(), &json!({ "price": 1.0 })).is_err());
    }
}
