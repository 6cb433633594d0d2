//! Language code resolution.
//!
//! Raw language tags found in TMX files (`en-US`, `pt_br`, `ZH-hant`, `iw`)
//! are mapped to canonical codes (`en_US`, `pt_BR`, `zh_Hant`, `he`).
//! A user-supplied override map takes precedence over the registry: its
//! values are normalized like any other tag but not checked against the
//! registry.
//!
//! The registry only knows base languages (ISO 639-1 plus common ISO 639-3
//! codes). Region, script and `@variant` suffixes are normalized but not
//! validated.

use std::collections::{HashMap, HashSet};

use crate::config::LanguagesConfig;
use crate::error::{Result, TmError};

/// ISO 639-1 codes plus ISO 639-3 codes commonly seen in localization.
const BUILTIN_LANGUAGES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
    "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
    "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja",
    "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw",
    "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml",
    "mn", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
    "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro",
    "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr",
    "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr",
    "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
    "yo", "za", "zh", "zu", // ISO 639-3
    "ace", "ach", "ast", "bar", "ber", "brx", "ceb", "chr", "ckb", "crh", "csb", "dsb", "fil",
    "frp", "fur", "gsw", "haw", "hsb", "ilo", "jbo", "kab", "kmr", "lij", "lld", "ltg", "mai",
    "mhr", "mni", "nah", "nap", "nds", "nqo", "nso", "pap", "pms", "prs", "rue", "sah", "sat",
    "sco", "scn", "shn", "szl", "tlh", "tzm", "vec", "yue", "zgh", "zza",
];

/// Deprecated or region-implied codes and their canonical replacement.
const ALIASES: &[(&str, &str)] = &[
    ("iw", "he"),
    ("in", "id"),
    ("ji", "yi"),
    ("jw", "jv"),
    ("mo", "ro"),
    ("zh_CN", "zh_Hans"),
    ("zh_SG", "zh_Hans"),
    ("zh_TW", "zh_Hant"),
    ("zh_HK", "zh_Hant"),
    ("zh_MO", "zh_Hant"),
];

/// Read-only registry of canonical base languages.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    known: HashSet<String>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry {
    /// Registry with the built-in language list.
    pub fn new() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }

    /// Registry with the built-in list plus additional base codes.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known: HashSet<String> =
            BUILTIN_LANGUAGES.iter().map(|c| c.to_string()).collect();
        known.extend(extra.into_iter().map(|c| c.as_ref().trim().to_lowercase()));
        Self { known }
    }

    pub fn from_config(config: &LanguagesConfig) -> Self {
        Self::with_extra(&config.extra)
    }

    /// Returns `true` if the base language of `code` is registered.
    pub fn contains(&self, code: &str) -> bool {
        let normalized = canonical_form(code);
        self.known.contains(base_language(&normalized))
    }

    /// Resolve a raw language tag to its canonical code.
    ///
    /// Lookup order: override map keyed by the raw tag, then the override
    /// map keyed by the normalized tag, then the registry. A mapped value
    /// goes through [`canonical_form`], so `en-gb` and `en_GB` store alike.
    ///
    /// # Errors
    ///
    /// [`TmError::UnknownLanguage`] if no override applies and the base
    /// language is not registered.
    pub fn resolve(
        &self,
        raw_code: &str,
        override_map: Option<&HashMap<String, String>>,
    ) -> Result<String> {
        if let Some(mapped) = override_map.and_then(|m| m.get(raw_code)) {
            return Ok(canonical_form(mapped));
        }

        let normalized = canonical_form(raw_code);
        if let Some(mapped) = override_map.and_then(|m| m.get(&normalized)) {
            return Ok(canonical_form(mapped));
        }

        if !normalized.is_empty() && self.known.contains(base_language(&normalized)) {
            Ok(normalized)
        } else {
            Err(TmError::UnknownLanguage(raw_code.to_string()))
        }
    }
}

/// Normalize separators and casing, then apply legacy aliases.
pub fn canonical_form(raw: &str) -> String {
    let normalized = normalize_code(raw);
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        return canonical.to_string();
    }
    let base = base_language(&normalized);
    match ALIASES.iter().find(|(alias, _)| *alias == base) {
        Some((_, canonical)) => format!("{}{}", canonical, &normalized[base.len()..]),
        None => normalized,
    }
}

/// `pt-br` → `pt_BR`, `sr-latn` → `sr_Latn`, `ca@VALENCIA` → `ca@valencia`.
fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    let (main, variant) = match trimmed.split_once('@') {
        Some((main, variant)) => (main, Some(variant)),
        None => (trimmed, None),
    };

    let mut parts = main.split(['-', '_']).filter(|p| !p.is_empty());
    let mut code = parts.next().unwrap_or_default().to_lowercase();
    for part in parts {
        code.push('_');
        match part.len() {
            2 => code.push_str(&part.to_uppercase()),
            4 => {
                let mut chars = part.chars();
                if let Some(first) = chars.next() {
                    code.extend(first.to_uppercase());
                    code.push_str(&chars.as_str().to_lowercase());
                }
            }
            _ => code.push_str(&part.to_lowercase()),
        }
    }

    if let Some(variant) = variant {
        code.push('@');
        code.push_str(&variant.to_lowercase());
    }
    code
}

fn base_language(code: &str) -> &str {
    code.split(['_', '@']).next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_region_and_script() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.resolve("en-us", None).unwrap(), "en_US");
        assert_eq!(registry.resolve("PT_br", None).unwrap(), "pt_BR");
        assert_eq!(registry.resolve("sr-latn", None).unwrap(), "sr_Latn");
        assert_eq!(registry.resolve("es-419", None).unwrap(), "es_419");
        assert_eq!(registry.resolve("ca@VALENCIA", None).unwrap(), "ca@valencia");
        assert_eq!(registry.resolve(" de ", None).unwrap(), "de");
    }

    #[test]
    fn test_legacy_aliases() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.resolve("iw", None).unwrap(), "he");
        assert_eq!(registry.resolve("iw-IL", None).unwrap(), "he_IL");
        assert_eq!(registry.resolve("zh-cn", None).unwrap(), "zh_Hans");
        assert_eq!(registry.resolve("zh-TW", None).unwrap(), "zh_Hant");
    }

    #[test]
    fn test_override_by_raw_code_wins() {
        let registry = LanguageRegistry::new();
        let map = HashMap::from([("en-US".to_string(), "en".to_string())]);
        assert_eq!(registry.resolve("en-US", Some(&map)).unwrap(), "en");
    }

    #[test]
    fn test_override_by_normalized_code() {
        let registry = LanguageRegistry::new();
        let map = HashMap::from([("pt_BR".to_string(), "pt".to_string())]);
        assert_eq!(registry.resolve("pt-br", Some(&map)).unwrap(), "pt");
    }

    #[test]
    fn test_override_accepts_unregistered_language() {
        let registry = LanguageRegistry::new();
        let map = HashMap::from([("quenya".to_string(), "QYA-latn".to_string())]);
        assert_eq!(registry.resolve("quenya", Some(&map)).unwrap(), "qya_Latn");
    }

    #[test]
    fn test_override_value_is_canonicalized() {
        let registry = LanguageRegistry::new();
        let map = HashMap::from([
            ("en_US".to_string(), "en-gb".to_string()),
            ("hebrew".to_string(), " iw ".to_string()),
        ]);
        let mapped = registry.resolve("en_US", Some(&map)).unwrap();
        assert_eq!(mapped, "en_GB");
        assert_eq!(mapped, registry.resolve("en-gb", None).unwrap());
        assert_eq!(registry.resolve("hebrew", Some(&map)).unwrap(), "he");
    }

    #[test]
    fn test_unknown_language_fails() {
        let registry = LanguageRegistry::new();
        let err = registry.resolve("xx", None).unwrap_err();
        assert!(matches!(err, TmError::UnknownLanguage(code) if code == "xx"));
        assert!(registry.resolve("", None).is_err());
    }

    #[test]
    fn test_extra_languages() {
        let registry = LanguageRegistry::with_extra(["QYA"]);
        assert!(registry.contains("qya-x"));
        assert_eq!(registry.resolve("qya", None).unwrap(), "qya");
        assert!(!LanguageRegistry::new().contains("qya"));
    }
}
