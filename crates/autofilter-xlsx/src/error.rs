use std::path::{Path, PathBuf};

use autofilter_model::CriteriaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The workbook could not be opened (unsaved, missing, locked, corrupt or
    /// encrypted).
    #[error("couldn't open the workbook {}: {reason}", path.display())]
    DocumentUnavailable { path: PathBuf, reason: String },
    #[error("worksheet {sheet:?} not found in workbook")]
    SheetNotFound { sheet: String },
    #[error("workbook has no worksheets")]
    NoSheets,
    #[error("missing package part: {part}")]
    MissingPart { part: String },
    #[error("failed to parse {part}: {message}")]
    Xml { part: String, message: String },
    /// The sheet reports filtered rows (`sheetPr/@filterMode`) and keeps an
    /// AutoFilter database range, but carries no `<autoFilter>` element.
    #[error(
        "couldn't get AutoFilter data from the {sheet:?} sheet: \
         it reports an active filter but has no autoFilter element"
    )]
    InvalidFilterState { sheet: String },
    /// A filter item has an unsupported shape; the whole extraction is aborted.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
}

impl ExtractError {
    pub(crate) fn unavailable(path: &Path, reason: impl Into<String>) -> Self {
        ExtractError::DocumentUnavailable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        ExtractError::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}
