//! TMX (Translation Memory eXchange) parsing.
//!
//! Extracts the declared source language from `<header srclang>` and, for
//! every `<tu>`, the text of each `<tuv>`'s `<seg>` keyed by its `xml:lang`
//! (or TMX 1.1 `lang`) attribute.
//!
//! - Inline markup inside `<seg>` (`<bpt>`, `<ph>`, `<hi>`, …) is dropped but
//!   its text content is kept. CDATA sections are kept.
//! - Whitespace is preserved unless the `<tu>` declares `xml:space="default"`,
//!   in which case runs of whitespace collapse to one space and the text is
//!   trimmed.
//! - A language repeated within one unit keeps its last text.
//!
//! Any XML error, unbalanced document, or missing header/`srclang` is a
//! [`TmError::MalformedFile`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use crate::error::{Result, TmError};

/// A parsed TMX document.
#[derive(Debug, Clone, PartialEq)]
pub struct TmxFile {
    /// Raw `srclang` value from the header.
    pub source_language: String,
    pub units: Vec<TmxUnit>,
}

/// One `<tu>` with its language variants in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TmxUnit {
    pub id: Option<String>,
    pub variants: Vec<(String, String)>,
}

impl TmxUnit {
    /// Text for a raw language tag, matched exactly.
    pub fn text(&self, language: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, text)| text.as_str())
    }

    fn insert(&mut self, language: String, text: String) {
        match self.variants.iter_mut().find(|(lang, _)| *lang == language) {
            Some(existing) => existing.1 = text,
            None => self.variants.push((language, text)),
        }
    }
}

struct UnitBuilder {
    unit: TmxUnit,
    preserve_space: bool,
}

/// Read and parse a TMX file from disk.
pub fn parse_tmx_file(path: &Path) -> Result<TmxFile> {
    let bytes = std::fs::read(path)?;
    parse_tmx(&bytes)
}

/// Parse TMX content.
pub fn parse_tmx(xml: &[u8]) -> Result<TmxFile> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut saw_header = false;
    let mut source_language: Option<String> = None;
    let mut units = Vec::new();

    let mut depth: usize = 0;
    let mut current: Option<UnitBuilder> = None;
    let mut current_lang: Option<String> = None;
    let mut in_seg = false;
    let mut seg_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"tmx" => saw_root = true,
                    b"header" => {
                        saw_header = true;
                        source_language = attribute(&e, b"srclang")?;
                    }
                    b"tu" => {
                        current = Some(UnitBuilder {
                            unit: TmxUnit {
                                id: attribute(&e, b"tuid")?,
                                variants: Vec::new(),
                            },
                            preserve_space: attribute(&e, b"space")?.as_deref() != Some("default"),
                        });
                    }
                    b"tuv" => current_lang = attribute(&e, b"lang")?,
                    b"seg" => {
                        in_seg = true;
                        seg_text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"header" => {
                    saw_header = true;
                    source_language = attribute(&e, b"srclang")?;
                }
                b"seg" => {
                    if let (Some(builder), Some(lang)) = (current.as_mut(), current_lang.as_ref()) {
                        builder.unit.insert(lang.clone(), String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_seg => {
                let text = t.unescape().map_err(malformed)?;
                seg_text.push_str(&text);
            }
            Ok(Event::CData(c)) if in_seg => {
                let raw = c.into_inner();
                let text = std::str::from_utf8(&raw).map_err(malformed)?;
                seg_text.push_str(text);
            }
            Ok(Event::End(e)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                match e.local_name().as_ref() {
                    b"seg" => {
                        in_seg = false;
                        if let (Some(builder), Some(lang)) = (current.as_mut(), current_lang.as_ref()) {
                            let text = if builder.preserve_space {
                                seg_text.clone()
                            } else {
                                collapse_whitespace(&seg_text)
                            };
                            builder.unit.insert(lang.clone(), text);
                        }
                    }
                    b"tuv" => current_lang = None,
                    b"tu" => {
                        if let Some(builder) = current.take() {
                            units.push(builder.unit);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TmError::MalformedFile(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(malformed("unexpected end of file"));
    }
    if !saw_root {
        return Err(malformed("missing <tmx> root element"));
    }
    if !saw_header {
        return Err(malformed("missing <header> element"));
    }
    let source_language = source_language
        .filter(|lang| !lang.trim().is_empty())
        .ok_or_else(|| malformed("header has no 'srclang' attribute"))?;

    Ok(TmxFile {
        source_language,
        units,
    })
}

/// Value of the first attribute whose local name is `name` (`xml:lang` matches `lang`).
fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn malformed(e: impl std::fmt::Display) -> TmError {
    TmError::MalformedFile(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tmx version="1.4">
  <header creationtool="test" srclang="en" adminlang="en" datatype="plaintext" segtype="sentence" o-tmf="none"/>
  <body>
    <tu tuid="1">
      <tuv xml:lang="en"><seg>Hello &amp; welcome</seg></tuv>
      <tuv xml:lang="de"><seg>Hallo &amp; willkommen</seg></tuv>
      <tuv xml:lang="fr"><seg>Bonjour</seg></tuv>
    </tu>
    <tu>
      <tuv lang="en"><seg>Open <bpt i="1">&lt;b&gt;</bpt>file<ept i="1">&lt;/b&gt;</ept></seg></tuv>
      <tuv lang="cs"><seg><![CDATA[Otevřít <soubor>]]></seg></tuv>
    </tu>
  </body>
</tmx>
"#;

    #[test]
    fn test_parse_header_and_units() {
        let tmx = parse_tmx(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tmx.source_language, "en");
        assert_eq!(tmx.units.len(), 2);

        let first = &tmx.units[0];
        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(first.text("en"), Some("Hello & welcome"));
        assert_eq!(first.text("de"), Some("Hallo & willkommen"));
        assert_eq!(first.variants.len(), 3);
    }

    #[test]
    fn test_inline_markup_text_and_cdata() {
        let tmx = parse_tmx(SAMPLE.as_bytes()).unwrap();
        let second = &tmx.units[1];
        assert_eq!(second.id, None);
        assert_eq!(second.text("en"), Some("Open <b>file</b>"));
        assert_eq!(second.text("cs"), Some("Otevřít <soubor>"));
    }

    #[test]
    fn test_whitespace_preserved_by_default() {
        let xml = r#"<tmx><header srclang="en"></header><body>
            <tu><tuv xml:lang="en"><seg>  two  spaces </seg></tuv></tu>
            <tu xml:space="default"><tuv xml:lang="en"><seg>  two
              spaces </seg></tuv></tu>
        </body></tmx>"#;
        let tmx = parse_tmx(xml.as_bytes()).unwrap();
        assert_eq!(tmx.units[0].text("en"), Some("  two  spaces "));
        assert_eq!(tmx.units[1].text("en"), Some("two spaces"));
    }

    #[test]
    fn test_duplicate_language_keeps_last() {
        let xml = r#"<tmx><header srclang="en"/><body><tu>
            <tuv xml:lang="en"><seg>a</seg></tuv>
            <tuv xml:lang="de"><seg>first</seg></tuv>
            <tuv xml:lang="de"><seg>second</seg></tuv>
        </tu></body></tmx>"#;
        let tmx = parse_tmx(xml.as_bytes()).unwrap();
        assert_eq!(tmx.units[0].variants.len(), 2);
        assert_eq!(tmx.units[0].text("de"), Some("second"));
    }

    #[test]
    fn test_empty_seg_recorded() {
        let xml = r#"<tmx><header srclang="en"/><body><tu>
            <tuv xml:lang="en"><seg>a</seg></tuv>
            <tuv xml:lang="de"><seg/></tuv>
        </tu></body></tmx>"#;
        let tmx = parse_tmx(xml.as_bytes()).unwrap();
        assert_eq!(tmx.units[0].text("de"), Some(""));
    }

    #[test]
    fn test_missing_srclang_is_malformed() {
        let xml = r#"<tmx><header/><body/></tmx>"#;
        let err = parse_tmx(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, TmError::MalformedFile(_)));
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let xml = r#"<tmx><body/></tmx>"#;
        assert!(matches!(
            parse_tmx(xml.as_bytes()).unwrap_err(),
            TmError::MalformedFile(_)
        ));
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        for xml in [
            "<tmx><header srclang=\"en\"/><body><tu></body></tmx>",
            "<tmx><header srclang=\"en\"/><body>",
            "not xml at all",
        ] {
            let err = parse_tmx(xml.as_bytes()).unwrap_err();
            assert!(matches!(err, TmError::MalformedFile(_)), "accepted {:?}", xml);
        }
    }

    #[test]
    fn test_parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tmx");
        std::fs::write(&path, SAMPLE).unwrap();
        let tmx = parse_tmx_file(&path).unwrap();
        assert_eq!(tmx.units.len(), 2);
        assert!(matches!(
            parse_tmx_file(&dir.path().join("missing.tmx")).unwrap_err(),
            TmError::Io(_)
        ));
    }
}
