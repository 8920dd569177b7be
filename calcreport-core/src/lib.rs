// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

pub mod assemble;
pub mod code;
pub mod config;
pub mod diagnostics;
pub mod directive;
pub mod error;
pub mod figures;
pub mod html;
pub mod markdown;
pub mod model;
pub mod notebook;
pub mod structure;

pub use assemble::{convert, default_html_template};
pub use config::{Options, TocLookahead};
pub use diagnostics::Diagnostics;
pub use error::Error;
pub use notebook::Notebook;

pub type Result<T> = std::result::Result<T, Error>;

pub fn convert_str(notebook_json: &str, template: &str) -> Result<String> {
    convert_str_with_options(
        notebook_json,
        template,
        &Options::default(),
        &mut Diagnostics::new(),
    )
}

pub fn convert_str_with_options(
    notebook_json: &str,
    template: &str,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Result<String> {
    let notebook = Notebook::from_json_str(notebook_json)?;
    convert(&notebook, template, options, diagnostics)
}
