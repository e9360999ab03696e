//! User model mirrored from the identity provider.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity-derived fields, replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: Option<String>,
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// User document stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identity provider user ID (also used as document ID)
    #[serde(rename = "_id")]
    pub id: String,
    /// Email address (first address on the identity, if any)
    pub email: Option<String>,
    /// Display name
    pub name: String,
    /// Profile picture URL
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    /// Item id -> quantity. Owned by the storefront, never touched by sync.
    #[serde(rename = "cartItems", default)]
    pub cart_items: HashMap<String, u32>,
}

impl UserRecord {
    /// New record with an empty cart.
    pub fn new(id: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            id: id.into(),
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            cart_items: HashMap::new(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            name: self.name.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// Overwrite the identity-derived fields, keeping id and cart.
    pub fn apply_profile(&mut self, profile: UserProfile) {
        self.email = profile.email;
        self.name = profile.name;
        self.image_url = profile.image_url;
    }
}

/// Join given and family name with a single space, trimming the result.
/// Missing parts count as empty strings.
pub fn display_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    format!("{} {}", first_name.unwrap_or(""), last_name.unwrap_or(""))
        .trim()
        .to_string()
}
