//! Rectangular views of the result rows
//!
//! Every row type has a fixed, named column order. Values are flattened to
//! text, a number, or blank; nothing nested ever reaches an exporter.

use crate::output::traits::Record;
use crate::state::{AssetRow, ContentRow, FileSize, LinkStatus, LinkStatusRow, PageRow};
use serde::Serialize;
use serde_json::Value;

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }

    fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::text(v),
            _ => Self::Blank,
        }
    }

    fn optional_number(value: Option<f64>) -> Self {
        value.map_or(Self::Blank, Self::Number)
    }

    /// JSON value used in records; non-finite numbers become null
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Blank => Value::Null,
        }
    }
}

/// A row type with a fixed column layout
pub trait TabularRow {
    /// Table name used by exporters and record stores
    const TABLE: &'static str;

    /// Column names in output order
    const COLUMNS: &'static [&'static str];

    /// Columns identifying a row for create-or-update
    const KEY_COLUMNS: &'static [&'static str];

    /// Cell values, one per column in [`Self::COLUMNS`] order
    fn cells(&self) -> Vec<Cell>;

    /// The row as a field→value record
    fn to_record(&self) -> Record {
        Self::COLUMNS
            .iter()
            .zip(self.cells())
            .map(|(column, cell)| (column.to_string(), cell.to_value()))
            .collect()
    }
}

impl TabularRow for PageRow {
    const TABLE: &'static str = "Pages";
    const COLUMNS: &'static [&'static str] = &["URL", "Title", "Screenshot URL", "Audited At"];
    const KEY_COLUMNS: &'static [&'static str] = &["URL"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.url),
            Cell::optional_text(self.title.as_deref()),
            Cell::optional_text(self.screenshot_url.as_deref()),
            Cell::text(&self.audited_at),
        ]
    }
}

impl TabularRow for ContentRow {
    const TABLE: &'static str = "Content";
    const COLUMNS: &'static [&'static str] = &[
        "URL",
        "Block Name",
        "Instance ID",
        "Component",
        "Value",
        "HTML Element",
        "CSS Classes",
        "Readability Score",
        "Grade Level",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["URL", "Instance ID", "Component"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.url),
            Cell::text(&self.block_name),
            Cell::text(&self.instance_id),
            Cell::text(&self.component_name),
            Cell::text(&self.value),
            Cell::text(&self.source_element_tag),
            Cell::optional_text(Some(self.css_classes.as_str())),
            Cell::optional_number(self.readability_score),
            Cell::optional_number(self.grade_level),
        ]
    }
}

impl TabularRow for AssetRow {
    const TABLE: &'static str = "Assets";
    const COLUMNS: &'static [&'static str] = &[
        "Source Page",
        "Asset URL",
        "Asset Type",
        "Link Text / Alt Text",
        "File Size (KB)",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["Source Page", "Asset URL"];

    fn cells(&self) -> Vec<Cell> {
        let size = match self.file_size {
            FileSize::Kilobytes(kb) => Cell::Number(kb),
            other => Cell::Text(other.to_string()),
        };

        vec![
            Cell::text(&self.source_page_url),
            Cell::text(&self.asset_url),
            Cell::text(&self.asset_type),
            Cell::optional_text(Some(self.link_text.as_str())),
            size,
        ]
    }
}

impl TabularRow for LinkStatusRow {
    const TABLE: &'static str = "Links";
    const COLUMNS: &'static [&'static str] = &[
        "Source Page",
        "Linked URL",
        "Status Code",
        "Block Name",
        "Component",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &["Source Page", "Linked URL"];

    fn cells(&self) -> Vec<Cell> {
        let status = match &self.status {
            LinkStatus::Http(code) => Cell::Number(f64::from(*code)),
            other => Cell::Text(other.to_string()),
        };

        vec![
            Cell::text(&self.source_page_url),
            Cell::text(&self.linked_url),
            status,
            Cell::optional_text(self.block_name.as_deref()),
            Cell::optional_text(self.component_name.as_deref()),
        ]
    }
}

/// A named rectangular table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_rows<R: TabularRow>(rows: &[R]) -> Self {
        Self {
            name: R::TABLE.to_string(),
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(|row| row.cells()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
