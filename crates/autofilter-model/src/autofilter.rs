use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterJoin {
    /// Any criterion may match (logical OR).
    #[default]
    Any,
    /// All criteria must match (logical AND).
    All,
}

/// Precision of a `<dateGroupItem>` bucket (`dateTimeGrouping`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Granularity {
    /// Parse an OOXML `ST_DateTimeGrouping` value.
    pub fn from_xml(value: &str) -> Option<Self> {
        match value.trim() {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "hour" => Some(Self::Hour),
            "minute" => Some(Self::Minute),
            "second" => Some(Self::Second),
            _ => None,
        }
    }
}

/// A date bucket from a value-list filter (`<dateGroupItem .../>`).
///
/// Only the fields up to `granularity` are meaningful; producers usually omit
/// the rest. Missing fields are rendered as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateGroupItem {
    pub year: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u16>,
    pub granularity: Granularity,
}

impl DateGroupItem {
    pub fn year(year: u16) -> Self {
        Self {
            year,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            granularity: Granularity::Year,
        }
    }
}

/// `<customFilter operator="..." val="..."/>`.
///
/// The operator is kept verbatim (`greaterThan`, `notEqual`, ...) rather than
/// decoded, so unknown operators still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPredicate {
    pub operator: String,
    pub value: String,
}

impl CustomPredicate {
    pub fn new(operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// One child of a filter container, resolved once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterItem {
    /// `<filter val="..."/>`
    Literal(String),
    /// `<dateGroupItem .../>`
    DateGroup(DateGroupItem),
    /// `<customFilter .../>`
    CustomPredicate(CustomPredicate),
    /// Any other element, identified by its local name.
    Unsupported(String),
}

impl FilterItem {
    /// Local XML name of the element this item was read from.
    pub fn element_name(&self) -> &str {
        match self {
            FilterItem::Literal(_) => "filter",
            FilterItem::DateGroup(_) => "dateGroupItem",
            FilterItem::CustomPredicate(_) => "customFilter",
            FilterItem::Unsupported(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    ValueList,
    Custom,
}

/// The single child element of a `<filterColumn>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterContainer {
    /// `<filters>`: literal values and date groups.
    Values { items: Vec<FilterItem> },
    /// `<customFilters>`: one or two operator/value predicates.
    Custom {
        #[serde(default)]
        join: FilterJoin,
        items: Vec<FilterItem>,
    },
    /// A container shape this crate does not classify (`top10`,
    /// `dynamicFilter`, `colorFilter`, `iconFilter`, ...).
    Other { element: String },
}

impl FilterContainer {
    pub fn mode(&self) -> Option<FilterMode> {
        match self {
            FilterContainer::Values { .. } => Some(FilterMode::ValueList),
            FilterContainer::Custom { .. } => Some(FilterMode::Custom),
            FilterContainer::Other { .. } => None,
        }
    }

    pub fn element_name(&self) -> &str {
        match self {
            FilterContainer::Values { .. } => "filters",
            FilterContainer::Custom { .. } => "customFilters",
            FilterContainer::Other { element } => element,
        }
    }
}

/// A filter definition for a column within an AutoFilter range.
///
/// `col_id` is a 0-based offset from the AutoFilter range start column, matching
/// Excel's `filterColumn/@colId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterColumn {
    pub col_id: u32,
    /// `None` for an empty `<filterColumn/>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<FilterContainer>,
}

impl FilterColumn {
    pub fn values(col_id: u32, items: Vec<FilterItem>) -> Self {
        Self {
            col_id,
            container: Some(FilterContainer::Values { items }),
        }
    }

    pub fn custom(col_id: u32, join: FilterJoin, items: Vec<FilterItem>) -> Self {
        Self {
            col_id,
            container: Some(FilterContainer::Custom { join, items }),
        }
    }

    pub fn mode(&self) -> Option<FilterMode> {
        self.container.as_ref().and_then(FilterContainer::mode)
    }
}

/// Worksheet-level `<autoFilter>` element.
///
/// Columns are kept in document order; criteria output depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFilter {
    /// The `ref` attribute (e.g. `A1:D20`), verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<FilterColumn>,
}
