// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::collections::HashMap;

use serde_json::{Map, Value};

pub use crate::notebook::CellKind;
use crate::notebook::{NotebookCell, Output};

pub const MAX_HEADER_LEVEL: usize = 6;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    CoverPage,
    ExecutiveSummary,
    Appendix,
    #[default]
    Body,
}

impl Category {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::CoverPage => "cover-page-content",
            Self::ExecutiveSummary => "executive-summary-content",
            Self::Appendix => "appendix-content",
            Self::Body => "body-content",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    pub outputs: Vec<Output>,
    pub metadata: Map<String, Value>,
    pub level: Option<usize>,
    pub section_number: Option<String>,
    pub anchor_id: Option<String>,
    pub heading_line: Option<usize>,
    pub category: Category,
}

impl Cell {
    pub fn new(kind: CellKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            outputs: Vec::new(),
            metadata: Map::new(),
            level: None,
            section_number: None,
            anchor_id: None,
            heading_line: None,
            category: Category::Body,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellKind::Markdown, source)
    }

    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellKind::Code, source)
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<Output>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Metadata value rendered as display text; strings lose their quotes.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(value_text)
    }
}

impl From<&NotebookCell> for Cell {
    fn from(cell: &NotebookCell) -> Self {
        Self::new(cell.cell_type, cell.source.joined())
            .with_metadata(cell.metadata.clone())
            .with_outputs(cell.outputs.clone())
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
    pub level: usize,
    pub text: String,
    pub anchor_id: String,
    pub section_number: String,
    pub category: Category,
}

#[derive(Default, Debug)]
pub struct DocumentStructure {
    pub cover_page: Option<Cell>,
    pub executive_summary: Option<Cell>,
    pub body: Vec<Cell>,
    pub appendices: Vec<Cell>,
    pub headers: Vec<HeaderRecord>,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct FigureTable {
    numbers: HashMap<String, usize>,
}

impl FigureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next number to `id` unless it already has one.
    pub fn assign(&mut self, id: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(id.to_string()).or_insert(next)
    }

    pub fn number(&self, id: &str) -> Option<usize> {
        self.numbers.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
