pub mod settings;
pub mod user;

pub use settings::{LanguageSettings, MosaicSettings};
use std::collections::HashMap;
pub use user::{load_config_file, load_user_config, user_config_path};

/// Resolve a LanguageSettings key from a map with wildcard fallback and merging.
///
/// - If both wildcard ("_") and specific key exist: merge them (specific overrides wildcard)
/// - If only wildcard exists: return wildcard
/// - If only specific key exists: return specific key
/// - If neither exists: return None
///
/// `allow` is replaced as a whole by the specific entry when it sets one;
/// `deny` lists accumulate so a wildcard denial cannot be silently lifted.
pub fn resolve_language_settings_with_wildcard(
    map: &HashMap<String, LanguageSettings>,
    key: &str,
) -> Option<LanguageSettings> {
    let wildcard = map.get("_");
    let specific = map.get(key);

    match (wildcard, specific) {
        (Some(w), Some(s)) => {
            let mut deny = w.deny.clone();
            for capability in &s.deny {
                if !deny.contains(capability) {
                    deny.push(*capability);
                }
            }
            Some(LanguageSettings {
                allow: s.allow.clone().or_else(|| w.allow.clone()),
                deny,
            })
        }
        (Some(w), None) => Some(w.clone()),
        (None, Some(s)) => Some(s.clone()),
        (None, None) => None,
    }
}
