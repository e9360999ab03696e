//! Order model written by the batch ingester.

use crate::time_utils::timestamp_millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order document stored in Firestore.
///
/// Fields are copied from the event payload as-is, whatever their JSON type.
/// Only an absent (or `null`) field is stored as `None`. The typed accessors
/// coerce on read and never change what is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Owning user id. Not checked against the users collection.
    pub user_id: Option<Value>,
    /// Line items, opaque
    pub items: Option<Value>,
    pub amount: Option<Value>,
    /// Shipping address, opaque
    pub address: Option<Value>,
    pub date: Option<Value>,
}

impl OrderRecord {
    /// Map an `order/created` data payload to a record.
    pub fn from_event_data(data: Option<&Value>) -> Self {
        let field = |key: &str| {
            data.and_then(|d| d.get(key))
                .filter(|v| !v.is_null())
                .cloned()
        };

        Self {
            user_id: field("userId"),
            items: field("items"),
            amount: field("amount"),
            address: field("address"),
            date: field("date"),
        }
    }

    /// Owner id as a string; numeric ids are rendered in decimal.
    pub fn user_id(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Amount as a number, accepting numeric strings.
    pub fn amount(&self) -> Option<f64> {
        match self.amount.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Order date in epoch milliseconds, if it parses as a date.
    pub fn date_millis(&self) -> Option<i64> {
        self.date.as_ref().and_then(timestamp_millis)
    }
}
