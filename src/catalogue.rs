//! Option catalogues served by individual tools.
//!
//! Two services publish the values their options accept:
//!
//! | Tool | Endpoint | Type |
//! |------|----------|------|
//! | `bg-remove` | `GET /api/background-options` | [`BackgroundCatalogue`] |
//! | `text-to-voice` | `GET /api/supported-languages` | [`LanguageCatalogue`] |
//!
//! Fetch them with [`crate::Dispatcher::background_options`] and
//! [`crate::Dispatcher::supported_languages`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BACKGROUND_OPTIONS_PATH: &str = "/api/background-options";
pub const SUPPORTED_LANGUAGES_PATH: &str = "/api/supported-languages";

/// Named backgrounds for `bg_option`, grouped by `bg_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCatalogue {
    /// Colour name → hex.
    #[serde(default)]
    pub solid_colors: BTreeMap<String, String>,
    /// Gradient name → its hex stops.
    #[serde(default)]
    pub gradients: BTreeMap<String, Vec<String>>,
    /// Pattern name → service-internal pattern id.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

impl BackgroundCatalogue {
    /// Names valid for `bg_option` under the given kind.
    pub fn names_for(&self, kind: crate::options::BackgroundKind) -> Vec<&str> {
        use crate::options::BackgroundKind;
        match kind {
            BackgroundKind::Solid => self.solid_colors.keys().map(String::as_str).collect(),
            BackgroundKind::Gradient => self.gradients.keys().map(String::as_str).collect(),
            BackgroundKind::Pattern => self.patterns.keys().map(String::as_str).collect(),
        }
    }
}

/// Languages, voices and styles understood by `text-to-voice`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageCatalogue {
    #[serde(default)]
    pub languages: Vec<LanguageInfo>,
    #[serde(default)]
    pub voice_styles: Vec<String>,
    #[serde(default)]
    pub speed_options: Vec<String>,
}

impl LanguageCatalogue {
    pub fn language(&self, code: &str) -> Option<&LanguageInfo> {
        self.languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Value for the `language` option, e.g. `en`.
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub voices: Vec<VoiceInfo>,
    #[serde(default)]
    pub styles: Vec<String>,
    /// e.g. `"-2Hz"`.
    #[serde(default)]
    pub pitch_adjustment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub locale: String,
}
