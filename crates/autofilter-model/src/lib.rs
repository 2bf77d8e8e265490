//! `autofilter-model` defines the in-memory shape of a worksheet AutoFilter and
//! the logic that turns it into criteria strings.
//!
//! The crate has no XML or packaging dependencies so it can be reused by any
//! reader that produces an [`AutoFilter`]:
//! - [`autofilter`]: columns, containers and filter items
//! - [`criteria`]: column walker plus the value-list and custom classifiers
//! - [`date_group`]: `dateGroupItem` rendering

pub mod autofilter;
pub mod criteria;
pub mod date_group;

pub use autofilter::{
    AutoFilter, CustomPredicate, DateGroupItem, FilterColumn, FilterContainer, FilterItem,
    FilterJoin, FilterMode, Granularity,
};
pub use criteria::{
    column_criteria, custom_criteria, filter_criteria, value_criteria, ColumnCriteria,
    CriteriaError,
};
pub use date_group::format_date_group;
