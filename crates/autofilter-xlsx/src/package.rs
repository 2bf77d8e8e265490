use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use autofilter_model::AutoFilter;
use roxmltree::Document;
use zip::ZipArchive;

use crate::autofilter::parse_worksheet_autofilter;
use crate::error::ExtractError;
use crate::path::{normalize_part_name, rels_for_part, resolve_target};
use crate::relationships::{
    parse_relationships, REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_OFFICE_DOCUMENT_STRICT,
};

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

const XLNM_FILTER_DATABASE: &str = "_xlnm._FilterDatabase";
const XLNM_CRITERIA: &str = "_xlnm.Criteria";
const XLNM_EXTRACT: &str = "_xlnm.Extract";

/// Maximum allowed *inflated* bytes for a single ZIP entry.
pub const MAX_PACKAGE_PART_BYTES: u64 = 256 * 1024 * 1024; // 256 MiB

/// Size limits enforced while inflating a package.
#[derive(Debug, Clone, Copy)]
pub struct PackageLimits {
    /// Maximum allowed uncompressed bytes for any single part.
    pub max_part_bytes: u64,
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: MAX_PACKAGE_PART_BYTES,
        }
    }
}

/// A `<sheet>` entry of the workbook part, with its worksheet part resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookSheet {
    pub name: String,
    pub rel_id: String,
    /// `None` when the relationship is missing or external.
    pub part: Option<String>,
}

/// An XLSX/XLSM package inflated into memory (part name -> bytes).
///
/// The file handle is only held while the ZIP is read.
pub struct WorkbookPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl WorkbookPackage {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        Self::open_with_limits(path, PackageLimits::default())
    }

    pub fn open_with_limits(path: &Path, limits: PackageLimits) -> Result<Self, ExtractError> {
        if path.as_os_str().is_empty() {
            return Err(ExtractError::unavailable(
                path,
                "save the workbook to a file in order to read its AutoFilter criteria",
            ));
        }

        let mut file =
            File::open(path).map_err(|err| ExtractError::unavailable(path, err.to_string()))?;

        let mut header = [0u8; 8];
        let n = read_header(&mut file, &mut header)
            .and_then(|n| file.rewind().map(|_| n))
            .map_err(|err| ExtractError::unavailable(path, err.to_string()))?;
        if n == OLE_MAGIC.len() && header == OLE_MAGIC {
            return Err(ExtractError::unavailable(
                path,
                "the file is an OLE compound document (encrypted or legacy .xls), \
                 not an XLSX package",
            ));
        }

        let parts =
            read_zip(file, limits).map_err(|reason| ExtractError::unavailable(path, reason))?;
        log::debug!("opened {} ({} parts)", path.display(), parts.len());
        Ok(Self { parts })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let parts = read_zip(Cursor::new(bytes), PackageLimits::default())
            .map_err(|reason| ExtractError::unavailable(Path::new("<memory>"), reason))?;
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|v| v.as_slice())
    }

    fn part_str(&self, name: &str) -> Result<&str, ExtractError> {
        let bytes = self.part(name).ok_or_else(|| ExtractError::MissingPart {
            part: name.to_string(),
        })?;
        let text = std::str::from_utf8(bytes).map_err(|e| ExtractError::xml(name, e))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    /// Name of the workbook part, following the package `officeDocument`
    /// relationship when present.
    pub fn workbook_part(&self) -> Result<String, ExtractError> {
        let root_rels = rels_for_part("");
        if self.part(&root_rels).is_some() {
            let rels = parse_relationships(self.part_str(&root_rels)?, &root_rels)?;
            if let Some(rel) = rels.iter().find(|rel| {
                !rel.external
                    && (rel.type_ == REL_TYPE_OFFICE_DOCUMENT
                        || rel.type_ == REL_TYPE_OFFICE_DOCUMENT_STRICT)
            }) {
                let part = resolve_target("", &rel.target);
                if self.part(&part).is_some() {
                    return Ok(part);
                }
                log::warn!("officeDocument relationship points at missing part {part}");
            }
        }

        if self.part(DEFAULT_WORKBOOK_PART).is_some() {
            return Ok(DEFAULT_WORKBOOK_PART.to_string());
        }
        Err(ExtractError::MissingPart {
            part: DEFAULT_WORKBOOK_PART.to_string(),
        })
    }

    /// Parse the workbook part: sheets (resolved to worksheet parts), the
    /// active tab and the defined names.
    fn workbook(&self) -> Result<WorkbookInfo, ExtractError> {
        let workbook_part = self.workbook_part()?;
        let workbook_doc = Document::parse(self.part_str(&workbook_part)?)
            .map_err(|e| ExtractError::xml(&workbook_part, e))?;

        let workbook_rels_part = rels_for_part(&workbook_part);
        let rels = match self.part(&workbook_rels_part) {
            Some(_) => {
                parse_relationships(self.part_str(&workbook_rels_part)?, &workbook_rels_part)?
            }
            None => Vec::new(),
        };

        let mut info = WorkbookInfo::default();
        for node in workbook_doc.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "sheet" => {
                    let Some(name) = node.attribute("name") else {
                        continue;
                    };
                    let Some(rel_id) = node
                        .attribute((REL_NS, "id"))
                        .or_else(|| node.attribute("r:id"))
                        .or_else(|| node.attribute("id"))
                    else {
                        continue;
                    };

                    let part = rels
                        .iter()
                        .find(|rel| rel.id == rel_id && !rel.external)
                        .map(|rel| resolve_target(&workbook_part, &rel.target));

                    info.sheets.push(WorkbookSheet {
                        name: name.to_string(),
                        rel_id: rel_id.to_string(),
                        part,
                    });
                }
                "workbookView" if info.active_tab.is_none() => {
                    info.active_tab = node
                        .attribute("activeTab")
                        .and_then(|v| v.trim().parse::<usize>().ok());
                }
                "definedName" => {
                    let Some(name) = node.attribute("name") else {
                        continue;
                    };
                    info.defined_names.push(DefinedName {
                        name: name.to_string(),
                        local_sheet_id: node
                            .attribute("localSheetId")
                            .and_then(|v| v.trim().parse::<usize>().ok()),
                    });
                }
                _ => {}
            }
        }

        Ok(info)
    }

    /// Sheets in workbook order.
    pub fn sheets(&self) -> Result<Vec<WorkbookSheet>, ExtractError> {
        Ok(self.workbook()?.sheets)
    }

    pub fn sheet_names(&self) -> Result<Vec<String>, ExtractError> {
        Ok(self.sheets()?.into_iter().map(|sheet| sheet.name).collect())
    }

    /// Name of the sheet that was active when the workbook was saved
    /// (`workbookView/@activeTab`), or the first sheet when that is missing or
    /// out of range.
    pub fn active_sheet(&self) -> Result<String, ExtractError> {
        let mut info = self.workbook()?;
        let index = match info.active_tab {
            Some(tab) if tab < info.sheets.len() => tab,
            Some(tab) => {
                log::warn!("activeTab {tab} is out of range; using the first sheet");
                0
            }
            None => 0,
        };
        if index >= info.sheets.len() {
            return Err(ExtractError::NoSheets);
        }
        Ok(info.sheets.swap_remove(index).name)
    }

    /// Part name of the worksheet called `sheet` (exact, case-sensitive match).
    pub fn worksheet_part(&self, sheet: &str) -> Result<String, ExtractError> {
        let info = self.workbook()?;
        let (_, part) = find_sheet(&info, sheet)?;
        Ok(part)
    }

    /// The sheet's AutoFilter, or `Ok(None)` when the sheet is not filtered.
    ///
    /// Fails with [`ExtractError::InvalidFilterState`] when the sheet reports
    /// filtered rows and keeps an AutoFilter database range
    /// (`_xlnm._FilterDatabase`) but has no `<autoFilter>` element. Rows hidden
    /// by an Advanced Filter (a sheet-scoped `_xlnm.Criteria` or
    /// `_xlnm.Extract` name) are not an AutoFilter.
    pub fn sheet_autofilter(&self, sheet: &str) -> Result<Option<AutoFilter>, ExtractError> {
        let info = self.workbook()?;
        let (index, part) = find_sheet(&info, sheet)?;
        let parsed = parse_worksheet_autofilter(self.part_str(&part)?)
            .map_err(|e| ExtractError::xml(&part, e))?;

        if let Some(filter) = parsed.auto_filter {
            return Ok(Some(filter));
        }
        if !parsed.filter_mode {
            log::debug!("sheet {sheet:?} has no AutoFilter");
            return Ok(None);
        }

        if info.has_sheet_name(index, XLNM_CRITERIA) || info.has_sheet_name(index, XLNM_EXTRACT)
        {
            log::debug!("sheet {sheet:?} is filtered by an Advanced Filter");
            return Ok(None);
        }
        if info.has_sheet_name(index, XLNM_FILTER_DATABASE) {
            return Err(ExtractError::InvalidFilterState {
                sheet: sheet.to_string(),
            });
        }

        log::debug!("sheet {sheet:?} reports filtered rows without an AutoFilter");
        Ok(None)
    }
}

#[derive(Debug, Default)]
struct WorkbookInfo {
    sheets: Vec<WorkbookSheet>,
    active_tab: Option<usize>,
    defined_names: Vec<DefinedName>,
}

impl WorkbookInfo {
    /// Whether a defined name called `name` is scoped to the sheet at `index`.
    fn has_sheet_name(&self, index: usize, name: &str) -> bool {
        self.defined_names
            .iter()
            .any(|d| d.local_sheet_id == Some(index) && d.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug)]
struct DefinedName {
    name: String,
    /// 0-based index into the workbook's `<sheets>`.
    local_sheet_id: Option<usize>,
}

/// Index and worksheet part of the sheet called `sheet`.
fn find_sheet(info: &WorkbookInfo, sheet: &str) -> Result<(usize, String), ExtractError> {
    let (index, found) = info
        .sheets
        .iter()
        .enumerate()
        .find(|(_, s)| s.name == sheet)
        .ok_or_else(|| ExtractError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
    let part = found.part.clone().ok_or_else(|| ExtractError::MissingPart {
        part: format!("worksheet relationship {}", found.rel_id),
    })?;
    log::debug!("sheet {sheet:?} resolved to {part}");
    Ok((index, part))
}

fn read_header(file: &mut File, header: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn read_zip<R: Read + Seek>(
    reader: R,
    limits: PackageLimits,
) -> Result<BTreeMap<String, Vec<u8>>, String> {
    let mut zip =
        ZipArchive::new(reader).map_err(|err| format!("not a valid XLSX package: {err}"))?;

    let mut parts = BTreeMap::new();
    for i in 0..zip.len() {
        let file = zip
            .by_index(i)
            .map_err(|err| format!("failed to read zip entry {i}: {err}"))?;
        if file.is_dir() {
            continue;
        }
        let name = normalize_part_name(file.name());

        // Do not trust the advertised size for allocation; read at most one byte past the limit.
        let mut buf = Vec::new();
        file.take(limits.max_part_bytes + 1)
            .read_to_end(&mut buf)
            .map_err(|err| format!("failed to read part {name}: {err}"))?;
        if buf.len() as u64 > limits.max_part_bytes {
            return Err(format!(
                "part {name} is larger than {} bytes",
                limits.max_part_bytes
            ));
        }

        if parts.insert(name.clone(), buf).is_some() {
            return Err(format!("duplicate part name {name}"));
        }
    }

    Ok(parts)
}
