use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ids::ModelId;

/// A registered chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: ModelId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Model name sent to the provider, e.g. `gpt-4o-mini`.
    #[validate(length(min = 1, max = 255))]
    pub provider_model_id: String,
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn new(name: String, provider_model_id: String, base_url: String, api_key: String) -> Self {
        Self {
            id: ModelId::new(),
            name,
            provider_model_id,
            base_url,
            api_key,
            created_at: Utc::now(),
        }
    }

    /// Masked form of the API key that is safe to return to clients.
    pub fn api_key_hint(&self) -> String {
        mask_secret(&self.api_key)
    }

    /// Applies a partial update. The identifier is never touched.
    pub fn apply(&mut self, update: ModelUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(provider_model_id) = update.provider_model_id {
            self.provider_model_id = provider_model_id;
        }
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(api_key) = update.api_key {
            self.api_key = api_key;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelUpdate {
    pub name: Option<String>,
    pub provider_model_id: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
