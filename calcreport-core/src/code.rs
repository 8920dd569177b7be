// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use crate::Options;
use crate::diagnostics::Diagnostics;
use crate::directive::{DirectiveMetadata, FigureDirective, find_figure_directive};
use crate::html::escape_html;
use crate::model::{Cell, FigureTable, value_text};

const HTML_MIME: &str = "text/html";
const TYPESETTING_MARKER: &str = "MathJax";
const EQUATION_MARKER: &str = "math-equation";

/// Renders a code cell's figure or rich output; `None` when nothing is visible.
pub fn render_code_cell(
    cell: &Cell,
    figures: &FigureTable,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    if let Some(directive) = find_figure_directive(&cell.source, &options.figure_call) {
        return Some(render_figure(&directive, figures, diagnostics));
    }

    let fragments = cell
        .outputs
        .iter()
        .filter_map(|output| output.fragment(HTML_MIME))
        .map(|html| strip_typesetting_scripts(&html))
        .filter(|html| !html.trim().is_empty())
        .collect::<Vec<_>>();
    if fragments.is_empty() {
        return None;
    }
    Some(wrap_output(&fragments.join("\n")))
}

fn render_figure(
    directive: &FigureDirective,
    figures: &FigureTable,
    diagnostics: &mut Diagnostics,
) -> String {
    let src = escape_html(&directive.path);
    let metadata = match &directive.metadata {
        DirectiveMetadata::Parsed(metadata) => Some(metadata),
        DirectiveMetadata::Absent => None,
        DirectiveMetadata::Malformed(err) => {
            diagnostics.warn(format!(
                "error parsing image metadata for `{}`: {err}",
                directive.path
            ));
            return format!("<figure class=\"figure\"><img src=\"{src}\" alt=\"figure\" /></figure>");
        }
    };

    let id = metadata.and_then(|metadata| metadata.get("ID")).map(value_text);
    let caption = metadata
        .and_then(|metadata| metadata.get("caption"))
        .map(value_text)
        .unwrap_or_default();
    let number = id
        .as_deref()
        .and_then(|id| figures.number(id))
        .map_or_else(|| "?".to_string(), |number| number.to_string());
    let anchor = id
        .map(|id| {
            let id = escape_html(&id);
            format!(" id=\"fig-{id}\" data-label=\"fig-{id}\"")
        })
        .unwrap_or_default();

    format!(
        "<figure class=\"figure\"{anchor}>\n<img src=\"{src}\" alt=\"{}\" />\n<figcaption>Figure {number}: {caption}</figcaption>\n</figure>",
        escape_html(&caption)
    )
}

/// Removes `<script>` elements that bootstrap the typesetting library,
/// together with the whitespace that follows them.
pub fn strip_typesetting_scripts(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<script") {
        let Some(close) = rest[start..].find("</script>") else {
            break;
        };
        let end = start + close + "</script>".len();
        let element = &rest[start..end];
        out.push_str(&rest[..start]);
        if element.contains(TYPESETTING_MARKER) {
            rest = rest[end..].trim_start();
        } else {
            out.push_str(element);
            rest = &rest[end..];
        }
    }
    out.push_str(rest);
    out
}

fn wrap_output(content: &str) -> String {
    let class = if content.contains(EQUATION_MARKER) {
        "math-group"
    } else {
        "code-output"
    };
    format!("<div class=\"{class}\">\n{content}\n</div>")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notebook::Output;

    const BOOTSTRAP: &str = "<script type=\"text/javascript\" async src=\"https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.7/MathJax.js?config=TeX-MML-AM_CHTML\"></script>\n    <script type=\"text/javascript\">\n         MathJax.Hub.Queue([\"Typeset\", MathJax.Hub]);\n    </script>\n    ";

    fn html_output(html: &str) -> Output {
        serde_json::from_value(json!({
            "output_type": "display_data",
            "data": {"text/html": [html]}
        }))
        .unwrap()
    }

    fn render(cell: &Cell, figures: &FigureTable) -> (Option<String>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let out = render_code_cell(cell, figures, &Options::default(), &mut diagnostics);
        (out, diagnostics)
    }

    // 行为：带 ID 的图片指令生成带图号、题注与锚点的 figure。
    #[test]
    fn figure_with_metadata() {
        let mut figures = FigureTable::new();
        figures.assign("load");
        let cell = Cell::code("Image('img/load.png', metadata={'ID': 'load', 'caption': 'Load path'})");

        let (out, _) = render(&cell, &figures);
        let out = out.unwrap();
        assert!(out.contains("<figure class=\"figure\" id=\"fig-load\" data-label=\"fig-load\">"));
        assert!(out.contains("<img src=\"img/load.png\" alt=\"Load path\" />"));
        assert!(out.contains("<figcaption>Figure 1: Load path</figcaption>"));
    }

    // 行为：未登记的图片 ID 显示为“?”。
    #[test]
    fn unknown_figure_number_is_question_mark() {
        let cell = Cell::code("Image('a.png', metadata={'ID': 'late'})");
        let (out, _) = render(&cell, &FigureTable::new());
        assert!(out.unwrap().contains("Figure ?: "));
    }

    // 行为：metadata 无法解析时退化为只有图片的 figure，并记录警告。
    #[test]
    fn malformed_metadata_degrades() {
        let cell = Cell::code("Image('a.png', metadata={'ID': })");
        let (out, diagnostics) = render(&cell, &FigureTable::new());
        assert_eq!(
            out.as_deref(),
            Some("<figure class=\"figure\"><img src=\"a.png\" alt=\"figure\" /></figure>")
        );
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    // 行为：只有排版引导脚本的输出被整体省略。
    #[test]
    fn bootstrap_only_output_is_omitted() {
        let cell = Cell::code("display(x)").with_outputs(vec![html_output(BOOTSTRAP)]);
        let (out, _) = render(&cell, &FigureTable::new());
        assert_eq!(out, None);
    }

    // 行为：公式输出去掉脚本后包裹在 math-group 中。
    #[test]
    fn equation_output_is_math_group() {
        let html = format!(
            "{BOOTSTRAP}<div class=\"math\"><div class=\"math-equation\">\\[ F = 10 \\]</div></div>"
        );
        let cell = Cell::code("displaymath(F)").with_outputs(vec![html_output(&html)]);

        let out = render(&cell, &FigureTable::new()).0.unwrap();
        assert!(out.starts_with("<div class=\"math-group\">\n<div class=\"math\">"));
        assert!(!out.contains("<script"));
    }

    // 行为：普通 HTML 输出使用 code-output，多段输出按顺序拼接。
    #[test]
    fn generic_outputs_are_joined() {
        let cell = Cell::code("show()").with_outputs(vec![
            html_output("<table>1</table>"),
            html_output("  "),
            html_output("<p>2</p>"),
        ]);

        let out = render(&cell, &FigureTable::new()).0.unwrap();
        assert_eq!(
            out,
            "<div class=\"code-output\">\n<table>1</table>\n<p>2</p>\n</div>"
        );
    }

    // 行为：与排版无关的脚本被保留。
    #[test]
    fn unrelated_scripts_are_kept() {
        assert_eq!(
            strip_typesetting_scripts("<script>plot()</script><p>x</p>"),
            "<script>plot()</script><p>x</p>"
        );
    }
}
