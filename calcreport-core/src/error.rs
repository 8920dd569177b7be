// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid notebook: {0}")]
    Notebook(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("template has no `{placeholder}` placeholder")]
    MissingPlaceholder { placeholder: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
