//! Word document text extraction
//!
//! Pulls the text of top-level body paragraphs out of a `.docx` package.
//! Tables, text boxes, images and formatting are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("invalid package: {0}")]
    Zip(#[from] ZipError),

    #[error("invalid document xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Reads a docx file and joins its paragraphs with one newline each
pub fn extract_text(path: &Path) -> Result<String, DocxError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    paragraphs_from_xml(&xml)
}

fn qualified_name(element: &BytesStart<'_>) -> Vec<u8> {
    element.name().as_ref().to_vec()
}

/// True when the elements opened after the paragraph are exactly a run,
/// optionally wrapped in a hyperlink.
fn inside_paragraph_run(stack: &[Vec<u8>], paragraph_at: usize) -> bool {
    match &stack[paragraph_at + 1..] {
        [run] => run.as_slice() == b"w:r",
        [link, run] => link.as_slice() == b"w:hyperlink" && run.as_slice() == b"w:r",
        _ => false,
    }
}

fn paragraphs_from_xml(xml: &str) -> Result<String, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    // Stack index of the open body paragraph, and its text so far
    let mut current: Option<(usize, String)> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = qualified_name(&element);
                let parent_is_body = stack.last().is_some_and(|p| p.as_slice() == b"w:body");

                match name.as_slice() {
                    b"w:p" if parent_is_body && current.is_none() => {
                        current = Some((stack.len(), String::new()));
                    }
                    b"w:t" => {
                        in_text = current
                            .as_ref()
                            .is_some_and(|(at, _)| inside_paragraph_run(&stack, *at));
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(element) => {
                let name = qualified_name(&element);
                let parent_is_body = stack.last().is_some_and(|p| p.as_slice() == b"w:body");

                if name.as_slice() == b"w:p" && parent_is_body && current.is_none() {
                    paragraphs.push(String::new());
                } else if let Some((at, text)) = current.as_mut() {
                    if inside_paragraph_run(&stack, *at) {
                        match name.as_slice() {
                            b"w:tab" => text.push('\t'),
                            b"w:br" | b"w:cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(content) => {
                if in_text {
                    if let Some((_, text)) = current.as_mut() {
                        text.push_str(&content.unescape()?);
                    }
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                match closed.as_deref() {
                    Some(b"w:t") => in_text = false,
                    Some(b"w:p") => {
                        if current.as_ref().is_some_and(|(at, _)| *at == stack.len()) {
                            if let Some((_, text)) = current.take() {
                                paragraphs.push(text);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    const FOOTER: &str = "<w:sectPr/></w:body></w:document>";

    /// Writes a minimal docx package whose body is `body_xml`
    pub(crate) fn write_docx_body(path: &Path, body_xml: &str) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(format!("{HEADER}{body_xml}{FOOTER}").as_bytes())
            .unwrap();
        writer.finish().unwrap();
    }

    /// Writes a docx with one single-run paragraph per entry
    pub(crate) fn write_docx(path: &Path, paragraphs: &[&str]) {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        write_docx_body(path, &body);
    }

    #[test]
    fn test_three_paragraphs_join_with_newlines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("doc.docx");
        write_docx(&path, &["A", "B", "C"]);

        assert_eq!(extract_text(&path).unwrap(), "A\nB\nC");
    }

    #[test]
    fn test_runs_are_concatenated_and_formatting_ignored() {
        let xml = r#"<w:body>
            <w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr>
                <w:r><w:rPr><w:b/></w:rPr><w:t>Hello</w:t></w:r>
                <w:r><w:t xml:space="preserve"> wide </w:t></w:r>
                <w:hyperlink><w:r><w:t>world</w:t></w:r></w:hyperlink>
            </w:p>
            <w:p/>
            <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>&amp;c</w:t></w:r></w:p>
        </w:body>"#;

        assert_eq!(
            paragraphs_from_xml(xml).unwrap(),
            "Hello wide world\n\na\tb\n&c"
        );
    }

    #[test]
    fn test_tables_and_drawings_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("doc.docx");
        write_docx_body(
            &path,
            "<w:p><w:r><w:t>before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r>\
             <w:r><w:t>after</w:t></w:r></w:p>",
        );

        assert_eq!(extract_text(&path).unwrap(), "before\nafter");
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fake.docx");
        std::fs::write(&path, b"plain text pretending").unwrap();

        assert!(matches!(extract_text(&path), Err(DocxError::Zip(_))));
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("empty.docx");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        writer
            .start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        writer.finish().unwrap();

        assert!(matches!(extract_text(&path), Err(DocxError::Zip(_))));
    }
}
