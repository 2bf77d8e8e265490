use autofilter_model::{
    AutoFilter, CustomPredicate, DateGroupItem, FilterColumn, FilterContainer, FilterItem,
    FilterJoin, Granularity,
};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoFilterParseError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] AttrError),
    #[error("missing {element} {attr} attribute")]
    MissingAttr {
        element: &'static str,
        attr: &'static str,
    },
    #[error("invalid {attr} value: {value:?}")]
    InvalidNumber { attr: &'static str, value: String },
}

/// AutoFilter state read from a worksheet part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorksheetAutoFilter {
    /// `sheetPr/@filterMode`: the sheet claims rows are currently filtered.
    pub filter_mode: bool,
    /// The worksheet `<autoFilter>` element, if present.
    pub auto_filter: Option<AutoFilter>,
}

/// A `<filters>` or `<customFilters>` element whose children are being read.
enum OpenContainer {
    Values(Vec<FilterItem>),
    Custom(FilterJoin, Vec<FilterItem>),
}

impl OpenContainer {
    fn items_mut(&mut self) -> &mut Vec<FilterItem> {
        match self {
            OpenContainer::Values(items) | OpenContainer::Custom(_, items) => items,
        }
    }

    fn finish(self) -> FilterContainer {
        match self {
            OpenContainer::Values(items) => FilterContainer::Values { items },
            OpenContainer::Custom(join, items) => FilterContainer::Custom { join, items },
        }
    }
}

fn parse_xml_bool(val: &str) -> bool {
    let trimmed = val.trim();
    trimmed == "1" || trimmed.eq_ignore_ascii_case("true")
}

/// Parse the sheet-level `<autoFilter>` element in `xml`.
///
/// `xml` may be a full worksheet part (the element must be a direct child of
/// the root) or just the `<autoFilter>` fragment.
/// Returns `Ok(None)` when no `<autoFilter>` element exists.
pub fn parse_autofilter(xml: &str) -> Result<Option<AutoFilter>, AutoFilterParseError> {
    Ok(parse_worksheet_autofilter(xml)?.auto_filter)
}

/// Parse `sheetPr/@filterMode` and the `<autoFilter>` element of a worksheet part.
pub fn parse_worksheet_autofilter(xml: &str) -> Result<WorksheetAutoFilter, AutoFilterParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut out = WorksheetAutoFilter::default();

    // Only the document root is descended into outside `<autoFilter>`; the
    // `<autoFilter>` of a `customSheetView` is not the sheet's own filter.
    let mut entered_root = false;
    let mut in_autofilter = false;
    let mut column: Option<FilterColumn> = None;
    let mut open_container: Option<OpenContainer> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let (e, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"filters" | b"customFilters" => {
                        if let (Some(col), Some(container)) =
                            (column.as_mut(), open_container.take())
                        {
                            col.container = Some(container.finish());
                        }
                    }
                    b"filterColumn" => {
                        if let (Some(col), Some(filter)) =
                            (column.take(), out.auto_filter.as_mut())
                        {
                            filter.columns.push(col);
                        }
                    }
                    b"autoFilter" if in_autofilter => break,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let local = e.local_name().as_ref().to_vec();
        let mut skip_children = !is_empty;

        if !in_autofilter {
            match local.as_slice() {
                b"sheetPr" if entered_root => {
                    if let Some(val) = attr(&e, b"filterMode")? {
                        out.filter_mode = parse_xml_bool(&val);
                    }
                }
                b"autoFilter" => {
                    out.auto_filter = Some(AutoFilter {
                        range: attr(&e, b"ref")?,
                        columns: Vec::new(),
                    });
                    if is_empty {
                        break;
                    }
                    in_autofilter = true;
                    skip_children = false;
                }
                _ if !entered_root => {
                    entered_root = true;
                    skip_children = false;
                }
                // sheetData, customSheetViews, extLst, ...
                _ => {}
            }
        } else if let Some(container) = open_container.as_mut() {
            container.items_mut().push(parse_filter_item(&e, &local)?);
        } else if let Some(col) = column.as_mut() {
            if col.container.is_some() {
                log::warn!(
                    "ignoring extra <{}> in filter column {}",
                    String::from_utf8_lossy(&local),
                    col.col_id
                );
            } else {
                let container = match local.as_slice() {
                    b"filters" => Some(OpenContainer::Values(Vec::new())),
                    b"customFilters" => {
                        let join = match attr(&e, b"and")? {
                            Some(val) if parse_xml_bool(&val) => FilterJoin::All,
                            _ => FilterJoin::Any,
                        };
                        Some(OpenContainer::Custom(join, Vec::new()))
                    }
                    _ => None,
                };
                match container {
                    Some(container) if !is_empty => {
                        open_container = Some(container);
                        skip_children = false;
                    }
                    Some(container) => col.container = Some(container.finish()),
                    None => {
                        col.container = Some(FilterContainer::Other {
                            element: String::from_utf8_lossy(&local).into_owned(),
                        });
                    }
                }
            }
        } else if local.as_slice() == b"filterColumn" {
            let col_id = required_u32(&e, "filterColumn", b"colId", "colId")?;
            let col = FilterColumn {
                col_id,
                container: None,
            };
            if is_empty {
                if let Some(filter) = out.auto_filter.as_mut() {
                    filter.columns.push(col);
                }
            } else {
                column = Some(col);
                skip_children = false;
            }
        }

        if skip_children {
            // The subtree (sortState, extLst, item payloads, ...) carries nothing we read.
            let name = e.name().as_ref().to_vec();
            reader.read_to_end_into(QName(&name), &mut skip_buf)?;
            skip_buf.clear();
        }
    }

    Ok(out)
}

fn parse_filter_item(e: &BytesStart<'_>, local: &[u8]) -> Result<FilterItem, AutoFilterParseError> {
    let item = match local {
        b"filter" => FilterItem::Literal(attr(e, b"val")?.unwrap_or_default()),
        b"dateGroupItem" => FilterItem::DateGroup(parse_date_group_item(e)?),
        b"customFilter" => {
            // `operator` defaults to `equal` in the schema.
            let operator = attr(e, b"operator")?.unwrap_or_else(|| "equal".to_string());
            let value = attr(e, b"val")?.unwrap_or_default();
            FilterItem::CustomPredicate(CustomPredicate { operator, value })
        }
        other => FilterItem::Unsupported(String::from_utf8_lossy(other).into_owned()),
    };
    Ok(item)
}

fn parse_date_group_item(e: &BytesStart<'_>) -> Result<DateGroupItem, AutoFilterParseError> {
    let year = optional_u16(e, b"year", "year")?.ok_or(AutoFilterParseError::MissingAttr {
        element: "dateGroupItem",
        attr: "year",
    })?;

    let granularity = match attr(e, b"dateTimeGrouping")? {
        Some(val) => Granularity::from_xml(&val).unwrap_or_else(|| {
            log::debug!("unknown dateTimeGrouping {val:?}; rendering with second precision");
            Granularity::Second
        }),
        None => Granularity::Second,
    };

    Ok(DateGroupItem {
        year,
        month: optional_u16(e, b"month", "month")?,
        day: optional_u16(e, b"day", "day")?,
        hour: optional_u16(e, b"hour", "hour")?,
        minute: optional_u16(e, b"minute", "minute")?,
        second: optional_u16(e, b"second", "second")?,
        granularity,
    })
}

/// Unescaped value of the attribute whose local name is `key`.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, AutoFilterParseError> {
    for a in e.attributes().with_checks(false) {
        let a = a?;
        if a.key.local_name().as_ref() == key {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn optional_u16(
    e: &BytesStart<'_>,
    key: &[u8],
    name: &'static str,
) -> Result<Option<u16>, AutoFilterParseError> {
    attr(e, key)?
        .map(|val| {
            val.trim()
                .parse::<u16>()
                .map_err(|_| AutoFilterParseError::InvalidNumber { attr: name, value: val })
        })
        .transpose()
}

fn required_u32(
    e: &BytesStart<'_>,
    element: &'static str,
    key: &[u8],
    name: &'static str,
) -> Result<u32, AutoFilterParseError> {
    let val = attr(e, key)?.ok_or(AutoFilterParseError::MissingAttr { element, attr: name })?;
    val.trim()
        .parse::<u32>()
        .map_err(|_| AutoFilterParseError::InvalidNumber { attr: name, value: val })
}
