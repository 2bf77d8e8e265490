//! Read worksheet AutoFilter criteria out of XLSX/XLSM packages.
//!
//! Spreadsheet object models rarely expose which values a filtered column is
//! showing. The information is stored in the worksheet part (`<autoFilter>`),
//! so this crate reads it straight from the package:
//!
//! - [`WorkbookPackage`]: inflates the ZIP, resolves sheet names to worksheet
//!   parts via `xl/_rels/workbook.xml.rels`, and parses the sheet's filter.
//! - [`parse_autofilter`]: parses an `<autoFilter>` element (or a whole
//!   worksheet part) into an [`autofilter_model::AutoFilter`].
//! - [`extract_filter_criteria`]: one-shot helper returning the criteria
//!   strings for a sheet, in column order.

pub mod autofilter;
pub mod cli;
mod error;
mod package;
mod path;
mod relationships;

use std::path::Path;

use autofilter_model::{column_criteria, ColumnCriteria};
use serde::Serialize;

pub use autofilter::{
    parse_autofilter, parse_worksheet_autofilter, AutoFilterParseError, WorksheetAutoFilter,
};
pub use error::ExtractError;
pub use package::{PackageLimits, WorkbookPackage, WorkbookSheet, MAX_PACKAGE_PART_BYTES};

/// Criteria read from one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetCriteria {
    pub sheet: String,
    /// `false` when the sheet has no AutoFilter.
    pub active: bool,
    pub columns: Vec<ColumnCriteria>,
}

impl SheetCriteria {
    /// All criteria strings, in column order then item order.
    pub fn criteria(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|column| column.criteria.iter().cloned())
            .collect()
    }
}

/// Read the criteria of `sheet`, or of the workbook's active sheet when `None`.
pub fn read_sheet_criteria(
    package: &WorkbookPackage,
    sheet: Option<&str>,
) -> Result<SheetCriteria, ExtractError> {
    let sheet = match sheet {
        Some(sheet) => sheet.to_string(),
        None => package.active_sheet()?,
    };

    let Some(filter) = package.sheet_autofilter(&sheet)? else {
        return Ok(SheetCriteria {
            sheet,
            active: false,
            columns: Vec::new(),
        });
    };

    let columns = column_criteria(&filter)?;
    log::debug!(
        "sheet {sheet:?}: {} filter column(s) with criteria",
        columns.len()
    );
    Ok(SheetCriteria {
        sheet,
        active: true,
        columns,
    })
}

/// Open `path` and read the criteria of `sheet` (or of the active sheet).
pub fn extract_sheet_criteria(
    path: &Path,
    sheet: Option<&str>,
) -> Result<SheetCriteria, ExtractError> {
    let package = WorkbookPackage::open(path)?;
    read_sheet_criteria(&package, sheet)
}

/// Open `path` and return the criteria strings of `sheet` (or of the active
/// sheet). A sheet without an AutoFilter yields an empty list.
pub fn extract_filter_criteria(
    path: &Path,
    sheet: Option<&str>,
) -> Result<Vec<String>, ExtractError> {
    Ok(extract_sheet_criteria(path, sheet)?.criteria())
}
