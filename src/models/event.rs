// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event envelopes delivered by the dispatcher and their typed payloads.

use crate::models::user::{display_name, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Event names the service subscribes to.
pub mod names {
    pub const USER_CREATED: &str = "clerk/user.created";
    pub const USER_UPDATED: &str = "clerk/user.updated";
    pub const USER_DELETED: &str = "clerk/user.deleted";
    pub const ORDER_CREATED: &str = "order/created";
}

/// Outer event object: a name, a data payload and delivery metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `null` and absent are both "no payload".
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Send time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl EventEnvelope {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
            ..Default::default()
        }
    }

    /// Decode and validate the data payload into `T`.
    pub fn payload<T>(&self) -> Result<T, PayloadError>
    where
        T: DeserializeOwned + Validate,
    {
        let data = self.data.as_ref().ok_or(PayloadError::MissingData)?;
        let payload: T = serde_json::from_value(data.clone())?;
        payload.validate()?;
        Ok(payload)
    }
}

/// Why an envelope's payload could not be used.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("event has no data payload")]
    MissingData,

    #[error("event data could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("event data failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Single entry of `email_addresses`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Data of `clerk/user.created` and `clerk/user.updated`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IdentityPayload {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl IdentityPayload {
    /// Address of the first entry in `email_addresses`.
    pub fn primary_email(&self) -> Option<String> {
        self.email_addresses
            .as_ref()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.email_address.clone())
    }

    /// Identity-derived user fields.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.primary_email(),
            name: display_name(self.first_name.as_deref(), self.last_name.as_deref()),
            image_url: self.image_url.clone(),
        }
    }
}

/// Data of `clerk/user.deleted`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IdentityDeletedPayload {
    #[validate(length(min = 1))]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_missing_data() {
        let envelope: EventEnvelope =
            serde_json::from_value(json!({ "name": names::USER_CREATED })).unwrap();
        assert!(matches!(
            envelope.payload::<IdentityPayload>(),
            Err(PayloadError::MissingData)
        ));

        let envelope: EventEnvelope =
            serde_json::from_value(json!({ "name": names::USER_CREATED, "data": null })).unwrap();
        assert!(matches!(
            envelope.payload::<IdentityPayload>(),
            Err(PayloadError::MissingData)
        ));
    }

    #[test]
    fn test_payload_requires_id() {
        let envelope = EventEnvelope::new(names::USER_DELETED, json!({ "deleted": true }));
        assert!(matches!(
            envelope.payload::<IdentityDeletedPayload>(),
            Err(PayloadError::Decode(_))
        ));

        let envelope = EventEnvelope::new(names::USER_DELETED, json!({ "id": "" }));
        assert!(matches!(
            envelope.payload::<IdentityDeletedPayload>(),
            Err(PayloadError::Invalid(_))
        ));
    }

    #[test]
    fn test_identity_profile() {
        let envelope = EventEnvelope::new(
            names::USER_CREATED,
            json!({
                "id": "u1",
                "first_name": "Jane",
                "last_name": "Doe",
                "email_addresses": [
                    { "email_address": "j@x.com" },
                    { "email_address": "other@x.com" }
                ],
                "image_url": "http://img"
            }),
        );

        let payload: IdentityPayload = envelope.payload().unwrap();
        let profile = payload.profile();

        assert_eq!(payload.id, "u1");
        assert_eq!(profile.email.as_deref(), Some("j@x.com"));
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.image_url.as_deref(), Some("http://img"));
    }

    #[test]
    fn test_identity_profile_optional_fields() {
        let envelope = EventEnvelope::new(
            names::USER_UPDATED,
            json!({ "id": "u2", "first_name": "Jane", "email_addresses": [] }),
        );

        let profile = envelope.payload::<IdentityPayload>().unwrap().profile();

        assert_eq!(profile.email, None);
        assert_eq!(profile.name, "Jane");
        assert_eq!(profile.image_url, None);
    }
}
