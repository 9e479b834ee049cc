//! Column descriptors

use serde::{Deserialize, Serialize};

/// Horizontal text alignment inside a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

/// Per-column colour overrides (CSS-style colour strings)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnTheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    /// Minimum width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub align: Align,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ColumnTheme>,
}

/// Minimum width of the row number column
pub const IDENTITY_MIN_WIDTH: u32 = 60;
/// Minimum width of a header-derived data column
pub const DATA_MIN_WIDTH: u32 = 120;

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            min_width: None,
            align: Align::Left,
            theme: None,
        }
    }

    /// The row number column (`id`, labelled `#`)
    pub fn identity() -> Self {
        Self::new("id", "#")
            .with_min_width(IDENTITY_MIN_WIDTH)
            .with_align(Align::Right)
    }

    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = Some(min_width);
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_theme(mut self, theme: ColumnTheme) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Identity column followed by one column per header label.
///
/// Keys are `{key_prefix}{i}`. Blank labels become `col{i + 1}`. A blank
/// header line (a single empty field) produces no data columns.
pub fn columns_from_header(labels: &[String], key_prefix: &str) -> Vec<Column> {
    let mut columns = vec![Column::identity()];
    if labels.len() == 1 && labels[0].trim().is_empty() {
        return columns;
    }
    columns.extend(labels.iter().enumerate().map(|(i, label)| {
        let label = if label.trim().is_empty() {
            format!("col{}", i + 1)
        } else {
            label.clone()
        };
        Column::new(format!("{}{}", key_prefix, i), label).with_min_width(DATA_MIN_WIDTH)
    }));
    columns
}
