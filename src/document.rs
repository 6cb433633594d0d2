//! Conversion of translation units into backend documents.

use crate::models::{IndexDocument, TranslationUnit};

/// Build the backend document for one (unit, target language) pair.
///
/// Text is copied verbatim; no whitespace or Unicode normalization is
/// applied. The unit's own target language is replaced by `target_language`
/// and the document is tagged with `origin`.
pub fn build(unit: &TranslationUnit, target_language: &str, origin: &str) -> IndexDocument {
    IndexDocument {
        source: unit.source_text.clone(),
        target: unit.target_text.clone(),
        source_language: unit.source_language.clone(),
        target_language: target_language.to_string(),
        origin: origin.to_string(),
    }
}

/// Build the document for a unit using its own target language and origin.
pub fn build_for_unit(unit: &TranslationUnit) -> IndexDocument {
    build(unit, &unit.target_language, &unit.origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> TranslationUnit {
        TranslationUnit {
            id: "42".to_string(),
            source_text: "  Hello,  world ".to_string(),
            target_text: "Hallo, Welt".to_string(),
            source_language: "en".to_string(),
            target_language: "de".to_string(),
            origin: "project/component".to_string(),
        }
    }

    #[test]
    fn test_build_copies_text_verbatim() {
        let doc = build(&unit(), "de_AT", "memory.tmx");
        assert_eq!(doc.source, "  Hello,  world ");
        assert_eq!(doc.target, "Hallo, Welt");
        assert_eq!(doc.source_language, "en");
        assert_eq!(doc.target_language, "de_AT");
        assert_eq!(doc.origin, "memory.tmx");
    }

    #[test]
    fn test_build_for_unit_uses_unit_metadata() {
        let doc = build_for_unit(&unit());
        assert_eq!(doc.target_language, "de");
        assert_eq!(doc.origin, "project/component");
    }

    #[test]
    fn test_document_json_shape() {
        let json = serde_json::to_value(build_for_unit(&unit())).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5);
        for key in ["source", "target", "source_language", "target_language", "origin"] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
    }
}
