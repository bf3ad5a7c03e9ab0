//! Per-router settings sub-documents.
//!
//! Both documents are optional in the store. Readers always get a fully
//! populated value: an absent document yields the defaults, a partial one
//! is merged field by field over them and an unreadable one is logged and
//! replaced by the defaults.

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub primary_color: String,
    pub logo_url: Option<String>,
    pub welcome_message: Option<String>,
    pub footer_text: Option<String>,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            logo_url: None,
            welcome_message: None,
            footer_text: None,
        }
    }
}

/// Which buyer contact fields the buy page collects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedSettings {
    pub collect_name: bool,
    pub require_name: bool,
    pub collect_phone: bool,
    pub require_phone: bool,
    pub collect_email: bool,
    pub require_email: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            collect_name: true,
            require_name: false,
            collect_phone: true,
            require_phone: true,
            collect_email: false,
            require_email: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    pub appearance: AppearanceSettings,
    pub advanced: AdvancedSettings,
}

/// Body of `PUT /api/routers/{id}/settings`; either half may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub appearance: Option<AppearanceSettings>,
    pub advanced: Option<AdvancedSettings>,
}

impl RouterSettings {
    /// Build settings from the raw stored JSON documents.
    pub fn from_documents(appearance: Option<&str>, advanced: Option<&str>) -> Self {
        Self {
            appearance: parse_or_default("appearance", appearance),
            advanced: parse_or_default("advanced", advanced),
        }
    }
}

fn parse_or_default<T>(kind: &str, raw: Option<&str>) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    match raw {
        Some(doc) if !doc.trim().is_empty() => serde_json::from_str(doc).unwrap_or_else(|e| {
            tracing::warn!(document = kind, error = %e, "unreadable settings document, using defaults");
            T::default()
        }),
        _ => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_documents_fall_back_to_defaults() {
        let settings = RouterSettings::from_documents(None, None);
        assert!(settings.advanced.collect_name);
        assert!(settings.advanced.collect_phone);
        assert!(settings.advanced.require_phone);
        assert!(!settings.advanced.collect_email);
        assert_eq!(settings, RouterSettings::default());
    }

    #[test]
    fn test_partial_document_is_merged_with_defaults() {
        let settings =
            RouterSettings::from_documents(None, Some(r#"{"collectEmail": true}"#));
        assert!(settings.advanced.collect_email);
        assert!(settings.advanced.require_phone);
        assert!(settings.advanced.collect_name);
    }

    #[test]
    fn test_garbage_document_falls_back_to_defaults() {
        let settings =
            RouterSettings::from_documents(Some("{not json"), Some(r#"{"requirePhone": "yes"}"#));
        assert_eq!(settings, RouterSettings::default());
    }
}
