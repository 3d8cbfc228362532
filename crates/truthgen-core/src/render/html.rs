//! HTML projection of the markdown report.
//!
//! Not an independent template: the markdown output is re-parsed line by line
//! and each recognised construct (heading, fence, list item, table row,
//! quote, rule, blank line) is wrapped in the matching tag. Anything else
//! becomes a paragraph. All literal text is escaped.

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;line-height:1.5}\
pre{background:#f6f8fa;padding:1rem;overflow-x:auto}\
table{border-collapse:collapse}td,th{border:1px solid #d0d7de;padding:.3rem .6rem}\
blockquote{color:#57606a;border-left:4px solid #d0d7de;margin:0;padding-left:1rem}";

/// Escape `& < > " '`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Default)]
struct Builder {
    lines: Vec<String>,
    list_open: bool,
    table: Vec<String>,
}

impl Builder {
    fn close_blocks(&mut self) {
        if self.list_open {
            self.lines.push("</ul>".to_string());
            self.list_open = false;
        }
        if !self.table.is_empty() {
            let rows = std::mem::take(&mut self.table);
            self.emit_table(&rows);
        }
    }

    fn emit_table(&mut self, rows: &[String]) {
        self.lines.push("<table>".to_string());
        let mut header_done = false;
        for row in rows {
            let cells = split_cells(row);
            if is_separator_row(&cells) {
                continue;
            }
            let tag = if header_done { "td" } else { "th" };
            header_done = true;
            let rendered: String = cells
                .iter()
                .map(|c| format!("<{tag}>{}</{tag}>", escape_html(c)))
                .collect();
            self.lines.push(format!("<tr>{rendered}</tr>"));
        }
        self.lines.push("</table>".to_string());
    }
}

/// Convert the markdown report into a standalone HTML document.
pub fn markdown_to_html(markdown: &str, title: &str) -> String {
    let mut b = Builder::default();
    let mut fence: Option<(String, String)> = None;
    let mut code: Vec<String> = Vec::new();

    for line in markdown.lines() {
        if let Some((open, class)) = fence.as_ref() {
            if line.trim_end() == open {
                b.lines
                    .push(format!("<pre><code{class}>{}</code></pre>", code.join("\n")));
                code.clear();
                fence = None;
            } else {
                code.push(escape_html(line));
            }
            continue;
        }

        if line.starts_with("```") {
            b.close_blocks();
            let ticks = line.chars().take_while(|c| *c == '`').count();
            let lang = line[ticks..].trim();
            let class = if lang.is_empty() {
                String::new()
            } else {
                format!(" class=\"language-{}\"", escape_html(lang))
            };
            fence = Some(("`".repeat(ticks), class));
            continue;
        }

        if line.starts_with('|') {
            if b.list_open {
                b.lines.push("</ul>".to_string());
                b.list_open = false;
            }
            b.table.push(line.to_string());
            continue;
        }

        if line.trim().is_empty() {
            b.close_blocks();
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if !b.table.is_empty() {
                let rows = std::mem::take(&mut b.table);
                b.emit_table(&rows);
            }
            if !b.list_open {
                b.lines.push("<ul>".to_string());
                b.list_open = true;
            }
            b.lines.push(format!("<li>{}</li>", escape_html(item)));
            continue;
        }

        b.close_blocks();
        if let Some((level, text)) = heading(line) {
            b.lines
                .push(format!("<h{level}>{}</h{level}>", escape_html(text)));
        } else if line.trim() == "---" {
            b.lines.push("<hr>".to_string());
        } else if let Some(quote) = line.strip_prefix("> ") {
            b.lines
                .push(format!("<blockquote>{}</blockquote>", escape_html(quote)));
        } else {
            b.lines.push(format!("<p>{}</p>", escape_html(line)));
        }
    }

    if let Some((_, class)) = fence {
        b.lines
            .push(format!("<pre><code{class}>{}</code></pre>", code.join("\n")));
    }
    b.close_blocks();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>{} Truth Report</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        escape_html(title)
    ));
    for line in &b.lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) {
        line[level..].strip_prefix(' ').map(|text| (level, text))
    } else {
        None
    }
}

/// Split a table row on unescaped `|`, unescaping `\|` inside cells.
fn split_cells(row: &str) -> Vec<String> {
    let inner = row.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            other => current.push(other),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{fixtures, render_markdown, RenderOptions};

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_headings_lists_and_paragraphs() {
        let html = markdown_to_html("# Title\n\n- one\n- <two>\n\nplain & text\n", "t");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<ul>\n<li>one</li>\n<li>&lt;two&gt;</li>\n</ul>"));
        assert!(html.contains("<p>plain &amp; text</p>"));
    }

    #[test]
    fn test_fenced_code_escaped_verbatim() {
        let html = markdown_to_html("```bash\n$ echo \"<hi>\"\n# not a heading\n```\n", "t");
        assert!(html.contains(
            "<pre><code class=\"language-bash\">$ echo &quot;&lt;hi&gt;&quot;\n# not a heading</code></pre>"
        ));
        assert!(!html.contains("<h1>"));
    }

    #[test]
    fn test_longer_fence_contains_backticks() {
        let html = markdown_to_html("````\n```\ninner\n````\n", "t");
        assert!(html.contains("<pre><code>```\ninner</code></pre>"));
    }

    #[test]
    fn test_table_rows() {
        let html = markdown_to_html("| A | B |\n|---|---|\n| x \\| y | z |\n", "t");
        assert!(html.contains("<tr><th>A</th><th>B</th></tr>"));
        assert!(html.contains("<tr><td>x | y</td><td>z</td></tr>"));
        assert!(!html.contains("---"));
    }

    #[test]
    fn test_report_derivation() {
        let tree = fixtures::tree();
        let md = render_markdown(&tree, &fixtures::errors(), &RenderOptions::default());
        let html = markdown_to_html(&md, &tree.meta.project);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>demo Truth Report</title>"));
        assert!(html.contains("<h3>Echo [ESSENTIAL]</h3>"));
        assert!(html.contains("<blockquote>Generated: 2026-01-01 00:00:00 UTC"));
        assert!(html.contains("<hr>"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
