#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const WORKSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Test helper for constructing small synthetic XLSX packages.
///
/// Generates `[Content_Types].xml`, `_rels/.rels`, `xl/workbook.xml` and
/// `xl/_rels/workbook.xml.rels` for the configured sheets. Worksheet XML is
/// written verbatim so tests can feed malformed or unusual payloads.
#[derive(Debug, Clone, Default)]
pub struct XlsxBuilder {
    sheets: Vec<(String, String)>,
    extra_parts: Vec<(String, Vec<u8>)>,
    skip_root_rels: bool,
    active_tab: Option<usize>,
    defined_names: Vec<(String, Option<usize>, String)>,
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet stored at `xl/worksheets/sheet{N}.xml`.
    pub fn sheet(mut self, name: impl Into<String>, worksheet_xml: impl Into<String>) -> Self {
        self.sheets.push((name.into(), worksheet_xml.into()));
        self
    }

    pub fn part(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.extra_parts.push((name.into(), bytes.into()));
        self
    }

    /// Emit `<bookViews><workbookView activeTab="N"/></bookViews>`.
    pub fn active_tab(mut self, tab: usize) -> Self {
        self.active_tab = Some(tab);
        self
    }

    /// Add a `<definedName>`, optionally scoped to the sheet at `local_sheet_id`.
    pub fn defined_name(
        mut self,
        name: impl Into<String>,
        local_sheet_id: Option<usize>,
        refers_to: impl Into<String>,
    ) -> Self {
        self.defined_names.push((name.into(), local_sheet_id, refers_to.into()));
        self
    }

    /// Leave out `_rels/.rels` so readers must fall back to `xl/workbook.xml`.
    pub fn without_root_rels(mut self) -> Self {
        self.skip_root_rels = true;
        self
    }

    pub fn build_bytes(self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        parts.push((
            "[Content_Types].xml".to_string(),
            content_types_xml(self.sheets.len()).into_bytes(),
        ));
        if !self.skip_root_rels {
            parts.push(("_rels/.rels".to_string(), ROOT_RELS.as_bytes().to_vec()));
        }
        parts.push((
            "xl/workbook.xml".to_string(),
            workbook_xml(&self.sheets, self.active_tab, &self.defined_names).into_bytes(),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            workbook_rels_xml(self.sheets.len()).into_bytes(),
        ));
        for (idx, (_, xml)) in self.sheets.iter().enumerate() {
            parts.push((
                format!("xl/worksheets/sheet{}.xml", idx + 1),
                xml.clone().into_bytes(),
            ));
        }
        parts.extend(self.extra_parts);

        zip_bytes(&parts)
    }

    /// Write the package into `dir` and return its path.
    pub fn write_to(self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build_bytes()).expect("write workbook");
        path
    }
}

/// Wrap `body` (the children of `<worksheet>`) in a worksheet part.
pub fn worksheet(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{WORKSHEET_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{body}</worksheet>"#
    )
}

pub fn zip_bytes(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut writer = ZipWriter::new(cursor);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);

    for (name, bytes) in parts {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for idx in 1..=sheet_count {
        xml.push_str(&format!(
            r#"
  <Override PartName="/xl/worksheets/sheet{idx}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("\n</Types>");
    xml
}

fn workbook_xml(
    sheets: &[(String, String)],
    active_tab: Option<usize>,
    defined_names: &[(String, Option<usize>, String)],
) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if let Some(tab) = active_tab {
        xml.push_str(&format!(
            r#"
  <bookViews><workbookView xWindow="0" yWindow="0" windowWidth="16384" windowHeight="8192" activeTab="{tab}"/></bookViews>"#
        ));
    }
    xml.push_str("\n  <sheets>");
    for (idx, (name, _)) in sheets.iter().enumerate() {
        let n = idx + 1;
        xml.push_str(&format!(
            r#"
    <sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape_attr(name)
        ));
    }
    xml.push_str("\n  </sheets>");
    if !defined_names.is_empty() {
        xml.push_str("\n  <definedNames>");
        for (name, local_sheet_id, refers_to) in defined_names {
            let scope = local_sheet_id
                .map(|id| format!(r#" localSheetId="{id}""#))
                .unwrap_or_default();
            xml.push_str(&format!(
                r#"
    <definedName name="{}"{scope} hidden="1">{}</definedName>"#,
                escape_attr(name),
                escape_attr(refers_to)
            ));
        }
        xml.push_str("\n  </definedNames>");
    }
    xml.push_str("\n</workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"
  <Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    xml.push_str("\n</Relationships>");
    xml
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
