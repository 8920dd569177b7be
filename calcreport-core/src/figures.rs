// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use crate::Options;
use crate::diagnostics::Diagnostics;
use crate::directive::{DirectiveMetadata, find_figure_directive};
use crate::model::{Cell, CellKind, FigureTable, value_text};

/// Numbers every figure id referenced by a code cell, in cell order.
///
/// Must run before any cell is rendered; the returned table is read-only
/// afterwards.
pub fn collect_figure_references(
    cells: &[Cell],
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> FigureTable {
    let mut figures = FigureTable::new();
    for (index, cell) in cells.iter().enumerate() {
        if cell.kind != CellKind::Code {
            continue;
        }
        let Some(directive) = find_figure_directive(&cell.source, &options.figure_call) else {
            continue;
        };
        match directive.metadata {
            DirectiveMetadata::Parsed(metadata) => {
                if let Some(id) = metadata.get("ID").map(value_text) {
                    let number = figures.assign(&id);
                    diagnostics.debug(format!("figure `{id}` is Figure {number}"));
                }
            }
            DirectiveMetadata::Malformed(err) => {
                diagnostics.warn(format!(
                    "cell {index}: error parsing figure metadata for `{}`: {err}",
                    directive.path
                ));
            }
            DirectiveMetadata::Absent => {}
        }
    }
    figures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(cells: &[Cell]) -> (FigureTable, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let figures = collect_figure_references(cells, &Options::default(), &mut diagnostics);
        (figures, diagnostics)
    }

    // 行为：图号按首次出现顺序分配，重复引用不会重新编号。
    #[test]
    fn numbers_follow_first_occurrence() {
        let (figures, _) = collect(&[
            Cell::code("Image('b.png', metadata={'ID': 'B'})"),
            Cell::markdown("Image('x.png', metadata={'ID': 'X'})"),
            Cell::code("Image('a.png', metadata={'ID': 'A'})"),
            Cell::code("Image('b2.png', metadata={'ID': 'B'})"),
        ]);

        assert_eq!(figures.number("B"), Some(1));
        assert_eq!(figures.number("A"), Some(2));
        assert_eq!(figures.number("X"), None);
        assert_eq!(figures.len(), 2);
    }

    // 行为：格式错误的 metadata 只记录警告并跳过，不影响后续编号。
    #[test]
    fn malformed_metadata_is_logged_and_skipped() {
        let (figures, diagnostics) = collect(&[
            Cell::code("Image('a.png', metadata={'ID': 'A',"),
            Cell::code("Image('c.png', metadata={'ID': 'C'})"),
        ]);

        assert_eq!(figures.number("A"), None);
        assert_eq!(figures.number("C"), Some(1));
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    // 行为：没有 ID 的图片不占用编号；数字 ID 按文本形式登记。
    #[test]
    fn figures_without_id_are_not_numbered() {
        let (figures, _) = collect(&[
            Cell::code("Image('a.png', metadata={'caption': 'no id'})"),
            Cell::code("Image('b.png')"),
            Cell::code("Image('c.png', metadata={'ID': 7})"),
        ]);

        assert_eq!(figures.len(), 1);
        assert_eq!(figures.number("7"), Some(1));
    }
}
