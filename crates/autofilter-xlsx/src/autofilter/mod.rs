//! Worksheet `<autoFilter>` parsing.

mod parse;

pub use parse::{
    parse_autofilter, parse_worksheet_autofilter, AutoFilterParseError, WorksheetAutoFilter,
};
