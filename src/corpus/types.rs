use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single style-guide line with its tagging metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleEntry {
    #[serde(alias = "sid")]
    pub id: String,
    #[serde(alias = "en_line")]
    pub text: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub feature_norm: Option<String>,
    #[serde(default)]
    pub style_tag: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

impl StyleEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            device: None,
            feature_norm: None,
            style_tag: None,
            tone: None,
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_feature(mut self, feature_norm: impl Into<String>) -> Self {
        self.feature_norm = Some(feature_norm.into());
        self
    }

    pub fn with_style_tag(mut self, style_tag: impl Into<String>) -> Self {
        self.style_tag = Some(style_tag.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    /// Check the entry against the exact-match filters.
    ///
    /// `tone` is never a lookup constraint; it only feeds style scoring.
    pub fn matches(&self, filters: &QueryFilters) -> bool {
        field_matches(filters.device(), self.device.as_deref())
            && field_matches(filters.feature_norm(), self.feature_norm.as_deref())
            && field_matches(filters.style_tag(), self.style_tag.as_deref())
    }

    /// Metadata copied onto retrieval results and vector payloads
    pub fn metadata(&self) -> BTreeMap<String, Option<String>> {
        let mut metadata = BTreeMap::new();
        metadata.insert("device".to_string(), self.device.clone());
        metadata.insert("feature_norm".to_string(), self.feature_norm.clone());
        metadata.insert("style_tag".to_string(), self.style_tag.clone());
        metadata.insert("tone".to_string(), self.tone.clone());
        metadata
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        Some(value) => actual == Some(value),
        None => true,
    }
}

/// Caller-supplied metadata constraints.
///
/// Every field is optional and independent. Empty strings are treated as
/// absent and unknown keys are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub feature_norm: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub style_tag: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tone: Option<String>,
}

impl QueryFilters {
    /// No constraints at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Build filters from loose `key=value` pairs, ignoring unknown keys
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let value = non_empty(value.into());
            match key.as_ref() {
                "device" => filters.device = value,
                "feature_norm" => filters.feature_norm = value,
                "style_tag" => filters.style_tag = value,
                "tone" => filters.tone = value,
                _ => {}
            }
        }
        filters
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref().filter(|v| !v.is_empty())
    }

    pub fn feature_norm(&self) -> Option<&str> {
        self.feature_norm.as_deref().filter(|v| !v.is_empty())
    }

    pub fn style_tag(&self) -> Option<&str> {
        self.style_tag.as_deref().filter(|v| !v.is_empty())
    }

    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref().filter(|v| !v.is_empty())
    }

    /// Keep only the device constraint (tier-2 relaxation)
    pub fn device_only(&self) -> Self {
        Self {
            device: self.device().map(str::to_string),
            ..Self::default()
        }
    }

    /// Constraints forwarded to the vector index as payload matches
    pub fn lookup_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(device) = self.device() {
            pairs.push(("device", device.to_string()));
        }
        if let Some(feature_norm) = self.feature_norm() {
            pairs.push(("feature_norm", feature_norm.to_string()));
        }
        if let Some(style_tag) = self.style_tag() {
            pairs.push(("style_tag", style_tag.to_string()));
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_pairs().is_empty() && self.tone().is_none()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(non_empty))
}
