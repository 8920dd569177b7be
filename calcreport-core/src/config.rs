// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::path::Path;

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub author: String,
    pub figure_call: String,
    pub placeholder: String,
    pub toc_lookahead: TocLookahead,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            author: String::new(),
            figure_call: "Image".to_string(),
            placeholder: "{content}".to_string(),
            toc_lookahead: TocLookahead::default(),
        }
    }
}

/// Decides whether a table-of-contents entry is left open for nested children.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TocLookahead {
    /// Leave the entry open only when the next numbered heading is deeper.
    #[default]
    Subtree,
    /// Leave the entry open when any heading in the document is deeper.
    Document,
}

pub fn load_options_from_yaml_file(path: &Path) -> crate::Result<Options> {
    let content =
        std::fs::read_to_string(path).map_err(|source| crate::Error::io(path, source))?;
    let options = serde_yaml::from_str::<Options>(&content)?;
    Ok(options)
}
