// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Returns the first `<tag ...>...</tag>` element of `html`, without nesting
/// awareness.
pub fn extract_first_element<'a>(html: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut search_from = 0;
    while let Some(offset) = html[search_from..].find(&open) {
        let start = search_from + offset;
        let after_name = start + open.len();
        let is_tag = html[after_name..]
            .chars()
            .next()
            .is_some_and(|ch| ch == '>' || ch == '/' || ch.is_whitespace());
        if is_tag {
            let end = html[after_name..].find(&close)? + after_name + close.len();
            return Some(&html[start..end]);
        }
        search_from = after_name;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // 行为：特殊字符被转义为实体。
    #[test]
    fn escapes_attribute_characters() {
        assert_eq!(
            escape_html(r#"a<b>&"c"'d'"#),
            "a&lt;b&gt;&amp;&quot;c&quot;&#39;d&#39;"
        );
    }

    // 行为：提取第一个完整的 table 元素，忽略名字相近的标签。
    #[test]
    fn extracts_first_table() {
        let html = "<p>x</p>\n<tablet></tablet><table>\n<tr><td>A</td></tr>\n</table>\n<table>2</table>";
        assert_eq!(
            extract_first_element(html, "table"),
            Some("<table>\n<tr><td>A</td></tr>\n</table>")
        );
        assert_eq!(extract_first_element("<p>none</p>", "table"), None);
    }
}
