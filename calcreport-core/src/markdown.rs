// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use crate::diagnostics::Diagnostics;
use crate::model::{Cell, FigureTable};
use crate::structure::parse_heading_line;

pub(crate) fn comrak_options() -> comrak::Options<'static> {
    let mut options = comrak::Options::default();
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true;
    options
}

pub fn markdown_to_html(markdown: &str) -> String {
    comrak::markdown_to_html(markdown, &comrak_options())
}

pub fn render_markdown_cell(
    cell: &Cell,
    figures: &FigureTable,
    diagnostics: &mut Diagnostics,
) -> String {
    let source = resolve_figure_citations(&cell.source, figures);
    let html = match numbered_heading(&source, cell, diagnostics) {
        Some(heading) => render_with_anchor(&heading, diagnostics),
        None => markdown_to_html(&source),
    };
    format!(
        "<div class=\"markdown-cell {}\">{html}</div>",
        cell.category.css_class()
    )
}

/// Replaces `[id]` with a link to the figure when `id` is a known figure.
///
/// Anything else in brackets is left byte-for-byte as written.
pub fn resolve_figure_citations(source: &str, figures: &FigureTable) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find('[') {
        let (before, after_start) = rest.split_at(start);
        out.push_str(before);

        let body = &after_start[1..];
        let Some(end) = body.find([']', '\n']).filter(|&end| end > 0 && body[end..].starts_with(']'))
        else {
            out.push('[');
            rest = body;
            continue;
        };

        let id = &body[..end];
        match figures.number(id) {
            Some(number) => out.push_str(&format!(
                "<a href=\"#fig-{id}\" data-ref=\"fig-{id}\" class=\"figure-ref\">Figure {number}</a>"
            )),
            None => out.push_str(&after_start[..end + 2]),
        }
        rest = &body[end + 1..];
    }
    out.push_str(rest);
    out
}

struct NumberedHeading<'a> {
    source: String,
    level: usize,
    line: usize,
    anchor_id: &'a str,
}

fn numbered_heading<'a>(
    source: &str,
    cell: &'a Cell,
    diagnostics: &mut Diagnostics,
) -> Option<NumberedHeading<'a>> {
    let level = cell.level?;
    let section_number = cell.section_number.as_deref()?;
    let anchor_id = cell.anchor_id.as_deref()?;
    let line_index = cell.heading_line?;

    if !is_heading_at_line(source, level, line_index) {
        diagnostics.warn(format!(
            "section {section_number}: line {} is not rendered as a level {level} heading; left unnumbered",
            line_index + 1
        ));
        return None;
    }

    let line = source.split('\n').nth(line_index)?;
    let (_, text) = parse_heading_line(line)?;
    let numbered = format!("{} {section_number}. {text}", &line[..level]);
    let source = source
        .split('\n')
        .enumerate()
        .map(|(index, line)| if index == line_index { numbered.as_str() } else { line })
        .collect::<Vec<_>>()
        .join("\n");
    Some(NumberedHeading {
        source,
        level,
        line: line_index + 1,
        anchor_id,
    })
}

fn is_heading_at_line(source: &str, level: usize, line_index: usize) -> bool {
    let arena = comrak::Arena::new();
    let root = comrak::parse_document(&arena, source, &comrak_options());
    root.descendants().any(|node| {
        let data = node.data.borrow();
        matches!(&data.value, comrak::nodes::NodeValue::Heading(heading) if usize::from(heading.level) == level)
            && data.sourcepos.start.line == line_index + 1
    })
}

// Source positions locate the numbered heading; they are dropped everywhere else.
fn render_with_anchor(heading: &NumberedHeading, diagnostics: &mut Diagnostics) -> String {
    let mut options = comrak_options();
    options.render.sourcepos = true;
    let html = comrak::markdown_to_html(&heading.source, &options);

    let level = heading.level;
    let tag = format!("<h{level} data-sourcepos=\"{}:", heading.line);
    let Some(open) = html
        .find(&tag)
        .and_then(|start| html[start..].find('>').map(|end| start..start + end + 1))
    else {
        diagnostics.warn(format!(
            "no level {level} heading rendered for line {}; anchor `{}` dropped",
            heading.line, heading.anchor_id
        ));
        return strip_sourcepos(&html);
    };

    let mut anchored = strip_sourcepos(&html[..open.start]);
    anchored.push_str(&format!(
        "<h{level} id=\"{}\" class=\"section-number\">",
        heading.anchor_id
    ));
    anchored.push_str(&strip_sourcepos(&html[open.end..]));
    anchored
}

fn strip_sourcepos(html: &str) -> String {
    const ATTR: &str = " data-sourcepos=\"";
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(ATTR) {
        out.push_str(&rest[..start]);
        let value = &rest[start + ATTR.len()..];
        let Some(end) = value.find('"') else {
            rest = &rest[start..];
            break;
        };
        rest = &value[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::extract_structure;

    fn figures(ids: &[&str]) -> FigureTable {
        let mut figures = FigureTable::new();
        for id in ids {
            figures.assign(id);
        }
        figures
    }

    fn render_body(cells: Vec<Cell>, figures: &FigureTable) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        let structure = extract_structure(cells, &mut diagnostics);
        structure
            .body
            .iter()
            .map(|cell| render_markdown_cell(cell, figures, &mut diagnostics))
            .collect()
    }

    // 行为：已知图号的引用被替换为“Figure N”链接。
    #[test]
    fn known_citation_becomes_figure_link() {
        let out = resolve_figure_citations("See [A].", &figures(&["B", "A"]));
        assert_eq!(
            out,
            "See <a href=\"#fig-A\" data-ref=\"fig-A\" class=\"figure-ref\">Figure 2</a>."
        );
    }

    // 行为：未知引用与不完整的括号保持原样。
    #[test]
    fn unknown_citation_is_unchanged() {
        let figures = figures(&["A"]);
        for input in ["[Z]", "a [] b", "[open\nA]", "trailing [", "[[A]"] {
            assert_eq!(resolve_figure_citations(input, &figures), input);
        }
    }

    // 行为：被编号的标题带有编号前缀、锚点 id 与 section-number 类。
    #[test]
    fn numbered_heading_carries_anchor() {
        let out = render_body(
            vec![Cell::markdown("# Loads"), Cell::markdown("## *Wind* loads ##\nBody text.")],
            &FigureTable::new(),
        );

        assert!(out[0].contains("<h1 id=\"s1\" class=\"section-number\">1. Loads</h1>"));
        assert!(out[1].starts_with("<div class=\"markdown-cell body-content\">"));
        assert!(
            out[1].contains("<h2 id=\"s1s1\" class=\"section-number\">1.1. <em>Wind</em> loads</h2>")
        );
        assert!(out[1].contains("<p>Body text.</p>"));
    }

    // 行为：同一单元格中的后续标题保持原样，不带锚点。
    #[test]
    fn later_headings_in_cell_are_plain() {
        let out = render_body(vec![Cell::markdown("# One\n\n# Two")], &FigureTable::new());
        assert!(out[0].contains("1. One"));
        assert!(out[0].contains("<h1>Two</h1>"));
    }

    // 行为：标题中的图引用在编号后同样被解析。
    #[test]
    fn citation_inside_heading_is_resolved() {
        let out = render_body(vec![Cell::markdown("# About [F]")], &figures(&["F"]));
        assert!(out[0].contains("1. About <a href=\"#fig-F\""));
    }

    // 行为：以列表或引用记号开头的标题文本仍按行内内容渲染，引用链接不被转义。
    #[test]
    fn heading_text_that_looks_like_a_block_stays_inline() {
        let out = render_body(
            vec![
                Cell::markdown("# 2. See [F]"),
                Cell::markdown("## 3) Loads *bold*"),
                Cell::markdown("## > quoted - text"),
            ],
            &figures(&["F"]),
        );

        assert!(out[0].contains(
            "<h1 id=\"s1\" class=\"section-number\">1. 2. See <a href=\"#fig-F\" data-ref=\"fig-F\" class=\"figure-ref\">Figure 1</a></h1>"
        ));
        assert!(!out[0].contains("&lt;a"));
        assert!(out[1].contains(
            "<h2 id=\"s1s1\" class=\"section-number\">1.1. 3) Loads <em>bold</em></h2>"
        ));
        assert!(out[2].contains("<h2 id=\"s1s2\" class=\"section-number\">1.2. "));
    }

    // 行为：标题中的引用式链接使用同一单元格中的链接定义。
    #[test]
    fn reference_link_in_heading_resolves_within_cell() {
        let out = render_body(
            vec![Cell::markdown("# See [ref]\n\n[ref]: http://x.com")],
            &FigureTable::new(),
        );
        assert!(out[0].contains(
            "<h1 id=\"s1\" class=\"section-number\">1. See <a href=\"http://x.com\">ref</a></h1>"
        ));
    }

    // 行为：输出中不残留源码位置属性。
    #[test]
    fn source_positions_are_not_emitted() {
        let out = render_body(
            vec![Cell::markdown("text\n\n## Loads\n\n- item\n\n| a |\n|---|\n| 1 |")],
            &FigureTable::new(),
        );
        assert!(out[0].contains("<h2 id=\"s0s1\" class=\"section-number\">0.1. Loads</h2>"));
        assert!(out[0].contains("<li>item</li>"));
        assert!(!out[0].contains("data-sourcepos"));
    }

    // 行为：缺少值的源码位置属性按原样保留。
    #[test]
    fn unterminated_sourcepos_attribute_is_kept() {
        assert_eq!(strip_sourcepos("<p data-sourcepos=\"1:1-1:3\">x</p>"), "<p>x</p>");
        assert_eq!(strip_sourcepos("<p data-sourcepos=\"1"), "<p data-sourcepos=\"1");
    }

    // 行为：代码块中形似标题的行不会被改写，并记录警告。
    #[test]
    fn fenced_pseudo_heading_is_not_rewritten() {
        let mut diagnostics = Diagnostics::new();
        let structure =
            extract_structure(vec![Cell::markdown("```\n# not a heading\n```")], &mut diagnostics);
        let out = render_markdown_cell(&structure.body[0], &FigureTable::new(), &mut diagnostics);

        assert!(out.contains("# not a heading"));
        assert!(!out.contains("section-number"));
        assert_eq!(diagnostics.warnings().count(), 1);
    }
}
