// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use crate::code::render_code_cell;
use crate::config::TocLookahead;
use crate::diagnostics::Diagnostics;
use crate::figures::collect_figure_references;
use crate::html::{escape_html, extract_first_element};
use crate::markdown::{markdown_to_html, render_markdown_cell};
use crate::model::{Category, Cell, CellKind, DocumentStructure, FigureTable, HeaderRecord};
use crate::notebook::Notebook;
use crate::structure::extract_structure;
use crate::{Error, Options, Result};

pub fn default_html_template() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Calculation Report</title>
</head>
<body>
{content}
</body>
</html>
"#
}

/// Converts a parsed notebook and substitutes the report into `template`.
pub fn convert(
    notebook: &Notebook,
    template: &str,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Result<String> {
    let cells = notebook.cells.iter().map(Cell::from).collect();
    let content = assemble_content(cells, options, diagnostics);
    substitute_template(template, &options.placeholder, &content)
}

/// Runs both passes over `cells` and concatenates every report section.
pub fn assemble_content(
    cells: Vec<Cell>,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> String {
    diagnostics.debug(format!("collecting figure references from {} cells", cells.len()));
    let figures = collect_figure_references(&cells, options, diagnostics);
    diagnostics.debug("extracting document structure");
    let structure = extract_structure(cells, diagnostics);

    let header_footer = render_header_footer(&structure, options);
    let cover_page = render_cover_page(&structure);
    let executive_summary = render_executive_summary(&structure);
    let toc = render_toc(&structure, options.toc_lookahead);
    let body = render_body(&structure, &figures, options, diagnostics);
    let appendices = render_appendix_pages(&structure).join("\n");

    [
        header_footer.unwrap_or_default(),
        cover_page.unwrap_or_default(),
        executive_summary.unwrap_or_default(),
        toc,
        body,
        appendices,
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn substitute_template(template: &str, placeholder: &str, content: &str) -> Result<String> {
    if placeholder.is_empty() || !template.contains(placeholder) {
        return Err(Error::MissingPlaceholder {
            placeholder: placeholder.to_string(),
        });
    }
    Ok(template.replace(placeholder, content))
}

fn render_body(
    structure: &DocumentStructure,
    figures: &FigureTable,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut parts = Vec::new();
    for cell in &structure.body {
        let rendered = match cell.kind {
            CellKind::Markdown => Some(render_markdown_cell(cell, figures, diagnostics)),
            CellKind::Code => render_code_cell(cell, figures, options, diagnostics),
            CellKind::Raw => None,
        };
        if let Some(rendered) = rendered.filter(|rendered| !rendered.is_empty()) {
            parts.push(rendered);
        }
    }
    parts.join("\n")
}

fn metadata_or(cell: &Cell, key: &str, fallback: &str) -> String {
    cell.metadata_text(key)
        .unwrap_or_else(|| fallback.to_string())
}

fn render_header_footer(structure: &DocumentStructure, options: &Options) -> Option<String> {
    let cover = structure.cover_page.as_ref()?;
    let lines = [
        "<div class=\"running-header\">".to_string(),
        "<div class=\"header-content\">".to_string(),
        format!("<div class=\"header-left\">{}</div>", options.author),
        format!("<div class=\"header-center\">{}</div>", metadata_or(cover, "title", "")),
        "<div class=\"header-right\">".to_string(),
        format!("<div class=\"client\">Client: {}</div>", metadata_or(cover, "client", "")),
        format!("<div class=\"project\">Project: {}</div>", metadata_or(cover, "project", "")),
        "</div>".to_string(),
        "</div>".to_string(),
        "</div>".to_string(),
        "<div class=\"running-footer\">".to_string(),
        "<div class=\"footer-content\">".to_string(),
        "<div class=\"footer-left\">".to_string(),
        format!("<div class=\"docid\">Document ID: {}</div>", metadata_or(cover, "docid", "")),
        format!("<div class=\"revision\">Revision: {}</div>", metadata_or(cover, "revision", "")),
        "</div>".to_string(),
        "<div class=\"footer-right\">".to_string(),
        "<div class=\"page-count\">Page <span class=\"page-number\"></span> of <span class=\"page-total\"></span></div>".to_string(),
        "</div>".to_string(),
        "</div>".to_string(),
        "</div>".to_string(),
    ];
    Some(lines.join("\n"))
}

fn render_cover_page(structure: &DocumentStructure) -> Option<String> {
    let cover = structure.cover_page.as_ref()?;
    let html = markdown_to_html(&cover.source);
    let revision_table = extract_first_element(&html, "table").unwrap_or_default();

    Some(format!(
        r#"<div class="cover-page">
<div class="cover-content">
<h1>{client}</h1>
<h1>{project}</h1>
<h1>{title}</h1>
<div class="cover-info">
<p>Document ID: {docid}</p>
</div>
</div>
<div class="revision-table">
{revision_table}
</div>
</div>"#,
        client = metadata_or(cover, "client", "Client"),
        project = metadata_or(cover, "project", "Project"),
        title = metadata_or(cover, "title", "Document Title"),
        docid = metadata_or(cover, "docid", ""),
    ))
}

fn render_executive_summary(structure: &DocumentStructure) -> Option<String> {
    let summary = structure.executive_summary.as_ref()?;
    let content = markdown_to_html(&summary.source);
    Some(format!(
        "<div class=\"executive-summary\" id=\"executive-summary\">\n{content}</div>"
    ))
}

fn toc_entry(href: &str, title: &str) -> String {
    format!(
        "<a href=\"#{href}\"><span class=\"title\">{title}<span class=\"leaders\"></span></span><span class=\"pagenumber\"></span></a>"
    )
}

fn has_children(
    structure: &DocumentStructure,
    numbered: &[&HeaderRecord],
    index: usize,
    lookahead: TocLookahead,
) -> bool {
    let level = numbered[index].level;
    match lookahead {
        TocLookahead::Subtree => numbered
            .get(index + 1)
            .is_some_and(|next| next.level > level),
        TocLookahead::Document => structure.headers.iter().any(|header| header.level > level),
    }
}

pub fn render_toc(structure: &DocumentStructure, lookahead: TocLookahead) -> String {
    let mut out = vec!["<nav class=\"toc\"><ol class=\"toc-list\">".to_string()];
    if structure.executive_summary.is_some() {
        out.push(format!(
            "<li class=\"front-matter\">{}</li>",
            toc_entry("executive-summary", "Executive Summary")
        ));
    }

    let numbered = structure
        .headers
        .iter()
        .filter(|header| header.category != Category::Appendix)
        .collect::<Vec<_>>();
    let mut depth = 0;
    let mut entry_open = false;
    for (index, header) in numbered.iter().enumerate() {
        let target = header.level - 1;
        while depth < target {
            // A skipped level still needs an item to hold the nested list.
            if !entry_open {
                out.push("<li>".to_string());
            }
            out.push("<ol>".to_string());
            depth += 1;
            entry_open = false;
        }
        while depth > target {
            out.push("</ol></li>".to_string());
            depth -= 1;
        }

        let title = format!("{}. {}", header.section_number, escape_html(&header.text));
        out.push(format!("<li>{}", toc_entry(&header.anchor_id, &title)));
        entry_open = has_children(structure, &numbered, index, lookahead);
        if !entry_open {
            out.push("</li>".to_string());
        }
    }
    while depth > 0 {
        out.push("</ol></li>".to_string());
        depth -= 1;
    }

    for index in 0..structure.appendices.len() {
        let letter = appendix_letter(index);
        out.push(format!(
            "<li class=\"appendix-entry\">{}</li>",
            toc_entry(
                &format!("appendix-{}", letter.to_lowercase()),
                &format!("Appendix {letter}")
            )
        ));
    }

    out.push("</ol></nav>".to_string());
    out.join("\n")
}

/// `A`..`Z`, then `AA`, `AB`, ...
pub fn appendix_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

pub fn render_appendix_pages(structure: &DocumentStructure) -> Vec<String> {
    structure
        .appendices
        .iter()
        .enumerate()
        .map(|(index, appendix)| render_appendix_page(appendix, &appendix_letter(index)))
        .collect()
}

fn render_appendix_page(appendix: &Cell, letter: &str) -> String {
    let sections = [
        ("title", "appendix-subtitle", ""),
        ("filename", "appendix-filename", "File: "),
        ("date", "appendix-date", "Date: "),
        ("revision", "appendix-revision", "Revision: "),
    ]
    .into_iter()
    .filter_map(|(key, class, label)| {
        appendix
            .metadata_text(key)
            .map(|value| format!("<div class=\"{class}\">{label}{value}</div>\n"))
    })
    .collect::<String>();

    format!(
        "<div class=\"appendix-cover no-page-numbers\">\n<div class=\"appendix-content\" id=\"appendix-{}\">\n<div class=\"appendix-title\">Appendix {letter}</div>\n{sections}</div>\n</div>",
        letter.to_lowercase()
    )
}
