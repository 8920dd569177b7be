// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use crate::diagnostics::Diagnostics;
use crate::model::{
    Category, Cell, CellKind, DocumentStructure, HeaderRecord, MAX_HEADER_LEVEL,
};

const COVER_PAGE_SENTINEL: &str = "# Cover Page";
const EXECUTIVE_SUMMARY_SENTINEL: &str = "# Executive Summary";
const APPENDIX_SENTINEL: &str = "# Appendix";
const SENTINEL_PHRASES: [&str; 3] = ["Cover Page", "Executive Summary", "Appendix"];

/// Splits a markdown line into heading depth and trimmed heading text.
pub(crate) fn parse_heading_line(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&byte| byte == b'#').count();
    if !(1..=MAX_HEADER_LEVEL).contains(&hashes) {
        return None;
    }
    let mut rest = line[hashes..].chars();
    if !rest.next().is_some_and(char::is_whitespace) {
        return None;
    }
    let text = rest.as_str();
    if text.is_empty() {
        return None;
    }
    Some((hashes, text.trim()))
}

fn strip_closing_sequence(text: &str) -> &str {
    let stripped = text.trim_end_matches('#');
    if stripped.len() == text.len() {
        return text;
    }
    if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
        stripped.trim_end()
    } else {
        text
    }
}

struct SectionCounters([usize; MAX_HEADER_LEVEL + 1]);

impl SectionCounters {
    fn new() -> Self {
        Self([0; MAX_HEADER_LEVEL + 1])
    }

    fn advance(&mut self, level: usize) -> &[usize] {
        self.0[level] += 1;
        for deeper in &mut self.0[level + 1..] {
            *deeper = 0;
        }
        &self.0[1..=level]
    }
}

fn join_numbers(numbers: &[usize], separator: &str) -> String {
    numbers
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

enum Sentinel {
    CoverPage,
    ExecutiveSummary,
    Appendix,
}

fn match_sentinel(line: &str) -> Option<Sentinel> {
    if line.starts_with(COVER_PAGE_SENTINEL) {
        Some(Sentinel::CoverPage)
    } else if line.starts_with(EXECUTIVE_SUMMARY_SENTINEL) {
        Some(Sentinel::ExecutiveSummary)
    } else if line.starts_with(APPENDIX_SENTINEL) {
        Some(Sentinel::Appendix)
    } else {
        None
    }
}

/// Classifies every cell and numbers the first heading of each body cell.
pub fn extract_structure(cells: Vec<Cell>, diagnostics: &mut Diagnostics) -> DocumentStructure {
    let mut structure = DocumentStructure::default();
    let mut counters = SectionCounters::new();

    for (index, mut cell) in cells.into_iter().enumerate() {
        cell.category = Category::Body;
        if cell.kind == CellKind::Markdown {
            classify_markdown_cell(&mut cell, &mut counters, &mut structure, index, diagnostics);
        }

        match cell.category {
            Category::CoverPage => {
                if structure.cover_page.replace(cell).is_some() {
                    diagnostics.warn(format!(
                        "cell {index}: replaces an earlier cover page; the last one is used"
                    ));
                }
            }
            Category::ExecutiveSummary => {
                if structure.executive_summary.replace(cell).is_some() {
                    diagnostics.warn(format!(
                        "cell {index}: replaces an earlier executive summary; the last one is used"
                    ));
                }
            }
            Category::Appendix => structure.appendices.push(cell),
            Category::Body => structure.body.push(cell),
        }
    }

    for header in &structure.headers {
        diagnostics.debug(format!(
            "level {}: {} ({}) [{}]",
            header.level, header.text, header.section_number, header.anchor_id
        ));
    }
    structure
}

fn classify_markdown_cell(
    cell: &mut Cell,
    counters: &mut SectionCounters,
    structure: &mut DocumentStructure,
    index: usize,
    diagnostics: &mut Diagnostics,
) {
    let mut numbered = None;
    for (line_index, line) in cell.source.split('\n').enumerate() {
        if let Some(sentinel) = match_sentinel(line) {
            cell.category = match sentinel {
                Sentinel::CoverPage => Category::CoverPage,
                Sentinel::ExecutiveSummary => Category::ExecutiveSummary,
                Sentinel::Appendix => Category::Appendix,
            };
            return;
        }

        let Some((level, text)) = parse_heading_line(line) else {
            continue;
        };
        if SENTINEL_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            continue;
        }
        numbered = Some((line_index, level, strip_closing_sequence(text).to_string()));
        break;
    }

    let Some((line_index, level, text)) = numbered else {
        return;
    };
    let numbers = counters.advance(level);
    let section_number = join_numbers(numbers, ".");
    let anchor_id = format!("s{}", join_numbers(numbers, "s"));
    diagnostics.debug(format!(
        "cell {index}: heading `{text}` at level {level} is section {section_number} ({anchor_id})"
    ));

    cell.level = Some(level);
    cell.section_number = Some(section_number.clone());
    cell.anchor_id = Some(anchor_id.clone());
    cell.heading_line = Some(line_index);
    structure.headers.push(HeaderRecord {
        level,
        text,
        anchor_id,
        section_number,
        category: cell.category,
    });
}
