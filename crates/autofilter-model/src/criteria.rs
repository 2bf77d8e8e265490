//! Flatten an [`AutoFilter`] into human-readable criteria strings.
//!
//! Extraction is all-or-nothing: the first item that is neither a literal, a
//! date group nor a custom predicate fails the whole walk, and no criteria are
//! returned for any column.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::autofilter::{AutoFilter, FilterContainer, FilterItem, FilterJoin, FilterMode};
use crate::date_group::format_date_group;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("unsupported <{element}> item in <{container}> of filter column {col_id}")]
    UnsupportedFilterItem {
        col_id: u32,
        container: &'static str,
        element: String,
    },
}

/// Criteria for a single filter column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCriteria {
    pub col_id: u32,
    pub mode: FilterMode,
    #[serde(default)]
    pub join: FilterJoin,
    pub criteria: Vec<String>,
}

/// Criteria strings for every column, in column order then item order.
pub fn filter_criteria(filter: &AutoFilter) -> Result<Vec<String>, CriteriaError> {
    Ok(column_criteria(filter)?
        .into_iter()
        .flat_map(|column| column.criteria)
        .collect())
}

/// Per-column criteria. Columns without a value-list or custom container are
/// skipped.
pub fn column_criteria(filter: &AutoFilter) -> Result<Vec<ColumnCriteria>, CriteriaError> {
    let mut out = Vec::with_capacity(filter.columns.len());

    for column in &filter.columns {
        let Some(container) = &column.container else {
            log::debug!("filter column {} has no criteria container", column.col_id);
            continue;
        };

        let (mode, join, criteria) = match container {
            FilterContainer::Values { items } => (
                FilterMode::ValueList,
                FilterJoin::Any,
                value_criteria(column.col_id, items)?,
            ),
            FilterContainer::Custom { join, items } => (
                FilterMode::Custom,
                *join,
                custom_criteria(column.col_id, items)?,
            ),
            FilterContainer::Other { .. } => {
                log::debug!(
                    "skipping filter column {}: <{}> is not a value or custom filter",
                    column.col_id,
                    container.element_name()
                );
                continue;
            }
        };

        out.push(ColumnCriteria {
            col_id: column.col_id,
            mode,
            join,
            criteria,
        });
    }

    Ok(out)
}

/// Criteria for the items of a `<filters>` container.
pub fn value_criteria(col_id: u32, items: &[FilterItem]) -> Result<Vec<String>, CriteriaError> {
    items
        .iter()
        .map(|item| match item {
            FilterItem::Literal(value) => Ok(value.clone()),
            FilterItem::DateGroup(group) => Ok(format_date_group(group)),
            other => Err(unsupported(col_id, "filters", other)),
        })
        .collect()
}

/// Criteria for the items of a `<customFilters>` container, as
/// `"<operator>, <value>"`.
pub fn custom_criteria(col_id: u32, items: &[FilterItem]) -> Result<Vec<String>, CriteriaError> {
    items
        .iter()
        .map(|item| match item {
            FilterItem::CustomPredicate(predicate) => {
                Ok(format!("{}, {}", predicate.operator, predicate.value))
            }
            other => Err(unsupported(col_id, "customFilters", other)),
        })
        .collect()
}

fn unsupported(col_id: u32, container: &'static str, item: &FilterItem) -> CriteriaError {
    CriteriaError::UnsupportedFilterItem {
        col_id,
        container,
        element: item.element_name().to_string(),
    }
}

impl AutoFilter {
    /// Shorthand for [`filter_criteria`].
    pub fn criteria(&self) -> Result<Vec<String>, CriteriaError> {
        filter_criteria(self)
    }
}
