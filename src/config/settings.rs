use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::embedding::{Capability, CapabilitySet};

/// Per embedded-language capability policy.
///
/// ```toml
/// [languages._]
/// deny = ["formatting"]
///
/// [languages.css]
/// allow = ["hover", "completion", "diagnostic"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageSettings {
    /// When set, only these capabilities survive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<Capability>>,
    /// Capabilities removed after `allow` is applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<Capability>,
}

impl LanguageSettings {
    /// Narrow the capabilities an extractor granted to a mapping.
    pub fn restrict(&self, granted: CapabilitySet) -> CapabilitySet {
        let allowed = match &self.allow {
            Some(allow) => granted.intersection(allow.iter().copied().collect()),
            None => granted,
        };
        allowed.difference(self.deny.iter().copied().collect())
    }
}

/// Top-level settings of the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MosaicSettings {
    /// Keyed by embedded language id; `_` applies to every language.
    #[serde(default)]
    pub languages: HashMap<String, LanguageSettings>,
}

impl MosaicSettings {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Effective settings for one embedded language (wildcard merged).
    pub fn language(&self, language_id: &str) -> LanguageSettings {
        super::resolve_language_settings_with_wildcard(&self.languages, language_id)
            .unwrap_or_default()
    }

    /// Capabilities a mapping of `language_id` ends up with.
    pub fn effective_capabilities(&self, language_id: &str, granted: CapabilitySet) -> CapabilitySet {
        self.language(language_id).restrict(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_tables() {
        let settings = MosaicSettings::from_toml(
            r#"
            [languages.css]
            allow = ["hover", "completion"]
            deny = ["completion"]
            "#,
        )
        .unwrap();

        let css = &settings.languages["css"];
        assert_eq!(
            css.allow.as_deref(),
            Some(&[Capability::Hover, Capability::Completion][..])
        );
        assert_eq!(css.deny, vec![Capability::Completion]);
    }

    #[test]
    fn rejects_unknown_capability() {
        let err = MosaicSettings::from_toml(
            r#"
            [languages.ts]
            deny = ["teleport"]
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn allow_then_deny_narrows_granted_set() {
        let settings = LanguageSettings {
            allow: Some(vec![Capability::Hover, Capability::Rename]),
            deny: vec![Capability::Rename],
        };
        let granted = CapabilitySet::empty()
            .with(Capability::Hover)
            .with(Capability::Rename)
            .with(Capability::Diagnostic);

        assert_eq!(
            settings.restrict(granted),
            CapabilitySet::empty().with(Capability::Hover)
        );
    }

    #[test]
    fn unconfigured_language_keeps_granted_set() {
        let settings = MosaicSettings::default();
        let granted = CapabilitySet::all();
        assert_eq!(settings.effective_capabilities("typescript", granted), granted);
    }
}
