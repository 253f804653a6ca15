use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

use super::ExtractError;

/// Paragraph text from the main document part of a `.docx` archive.
/// Formatting, tables-as-structure, headers and footers are ignored; each
/// `w:p` element becomes one line.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| ExtractError::Docx(err.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|err| ExtractError::Docx(err.to_string()))?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;
    extract_paragraphs(&xml)
}

fn extract_paragraphs(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                if let Ok(decoded) = e.decode() {
                    text.push_str(&decoded);
                }
            }
            Ok(Event::GeneralRef(e)) if in_text_run => {
                if let Ok(name) = e.decode() {
                    if let Ok(resolved) = unescape(&format!("&{};", name)) {
                        text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"br" => text.push('\n'),
            Ok(Event::Eof) => break,
            Err(err) => return Err(ExtractError::Docx(err.to_string())),
            Ok(_) => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::{extract_paragraphs, extract_text};
    use std::io::Write;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph</w:t></w:r></w:p>
    <w:p><w:r><w:t>a &amp; b</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn paragraphs_become_lines() {
        let text = extract_paragraphs(DOCUMENT_XML).expect("well-formed xml");
        let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
        assert_eq!(lines, vec!["First paragraph", "Second paragraph", "a & b"]);
    }

    #[test]
    fn runs_within_a_paragraph_stay_on_one_line() {
        let text = extract_paragraphs(DOCUMENT_XML).expect("well-formed xml");
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn roundtrip_through_a_real_archive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.docx");

        let file = std::fs::File::create(&path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .expect("start entry");
        writer
            .write_all(DOCUMENT_XML.as_bytes())
            .expect("write entry");
        writer.finish().expect("finish archive");

        let text = extract_text(&path).expect("extract from archive");
        assert!(text.contains("First paragraph"));
        assert!(text.contains("a & b"));
    }

    #[test]
    fn non_archive_input_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain bytes, not a zip").expect("write fixture");

        assert!(extract_text(&path).is_err());
    }

    #[test]
    fn archive_without_document_part_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.docx");

        let file = std::fs::File::create(&path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("unrelated.txt", zip::write::FileOptions::default())
            .expect("start entry");
        writer.write_all(b"nothing here").expect("write entry");
        writer.finish().expect("finish archive");

        assert!(extract_text(&path).is_err());
    }
}
