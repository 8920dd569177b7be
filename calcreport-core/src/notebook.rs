// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Notebook {
    pub cells: Vec<NotebookCell>,
}

impl Notebook {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotebookCell {
    pub cell_type: CellKind,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Markdown,
    Code,
    Raw,
}

/// Notebook text fields are either one string or a list of lines that still
/// carry their own newlines.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Source {
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub output_type: Option<String>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl Output {
    pub fn fragment(&self, mime: &str) -> Option<String> {
        match self.data.as_ref()?.get(mime)? {
            Value::String(text) => Some(text.clone()),
            Value::Array(lines) => Some(
                lines
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<String>(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 行为：source 既可以是字符串，也可以是逐行数组，拼接后内容一致。
    #[test]
    fn source_accepts_string_and_line_list() {
        let notebook = Notebook::from_json_str(
            r##"{"cells": [
                {"cell_type": "markdown", "source": "# A\ntext"},
                {"cell_type": "markdown", "source": ["# A\n", "text"]}
            ]}"##,
        )
        .unwrap();

        assert_eq!(notebook.cells[0].source.joined(), "# A\ntext");
        assert_eq!(notebook.cells[1].source.joined(), "# A\ntext");
    }

    // 行为：没有 data 的输出（如 stream）不提供任何片段。
    #[test]
    fn stream_output_has_no_fragment() {
        let notebook = Notebook::from_json_str(
            r#"{"cells": [{"cell_type": "code", "source": "", "outputs": [
                {"output_type": "stream", "name": "stdout", "text": ["hi\n"]},
                {"output_type": "display_data", "data": {"text/html": ["<b>", "x</b>"]}}
            ]}]}"#,
        )
        .unwrap();

        let outputs = &notebook.cells[0].outputs;
        assert_eq!(outputs[0].fragment("text/html"), None);
        assert_eq!(outputs[1].fragment("text/html").as_deref(), Some("<b>x</b>"));
    }

    // 行为：未知的 cell_type 会导致解析失败。
    #[test]
    fn unknown_cell_type_is_rejected() {
        let result = Notebook::from_json_str(r#"{"cells": [{"cell_type": "widget"}]}"#);
        assert!(result.is_err());
    }
}
