/// Elements whose text is chrome, code or boilerplate rather than authored content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "footer", "header", "aside",
];

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible body text of an HTML document with navigation and boilerplate
/// containers removed, whitespace collapsed.
///
/// Falls back to the whole document when there is no `<body>` (fragments).
pub fn visible_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let doc = html_scraper::Html::parse_document(html);
    let root = html_scraper::Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| SKIP_TAGS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        out.push_str(text);
        out.push(' ');
    }
    norm_ws(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_scripts_and_page_chrome() {
        let html = r#"<html><head><title>t</title><style>p{}</style></head><body>
            <header>サイト名</header>
            <nav>メニュー</nav>
            <article><p>私の 体験談です。</p><script>var x = "公式";</script></article>
            <aside>人気記事</aside>
            <footer>会社概要</footer>
        </body></html>"#;
        assert_eq!(visible_text(html), "私の 体験談です。");
    }

    #[test]
    fn empty_input_yields_empty_text() {
        assert_eq!(visible_text(""), "");
        assert_eq!(visible_text("   "), "");
    }

    #[test]
    fn fragments_still_produce_text() {
        assert_eq!(visible_text("<p>hello <b>world</b></p>"), "hello world");
    }
}
