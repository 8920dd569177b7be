// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

mod cli;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use calcreport_core::{Diagnostics, Error};
use clap::{CommandFactory, Parser};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    env_logger::init();
    let args = cli::CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("错误：{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &Path) -> calcreport_core::Result<String> {
    fs::read_to_string(path).map_err(|source| Error::io(path, source))
}

fn run(args: cli::CliArgs) -> Result<()> {
    let Some(input) = args.input else {
        if args.output.is_some() {
            return Err("没有输入文件".into());
        }
        cli::CliArgs::command().print_help()?;
        return Ok(());
    };

    let options = calcreport::config::load_options(args.config.as_deref())?;
    let notebook = read_file(&input)?;
    let template = match &args.template {
        Some(path) => read_file(path)?,
        None => calcreport_core::default_html_template().to_string(),
    };

    log::info!("converting {}", input.display());
    let mut diagnostics = Diagnostics::new();
    let report = calcreport_core::convert_str_with_options(
        &notebook,
        &template,
        &options,
        &mut diagnostics,
    );
    if let Some(path) = &args.debug_log {
        let mut file = fs::File::create(path).map_err(|source| Error::io(path, source))?;
        diagnostics.flush(&mut file)?;
    }
    let report = report?;

    match &args.output {
        Some(path) => fs::write(path, report).map_err(|source| Error::io(path, source))?,
        None => std::io::stdout().lock().write_all(report.as_bytes())?,
    }
    Ok(())
}
