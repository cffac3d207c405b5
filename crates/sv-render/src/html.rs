//! HTML rendering.
//!
//! A pure transform from a story document to a self-contained HTML page
//! with inlined CSS. No I/O, deterministic: the same story always produces
//! byte-identical output.

use std::fmt::Write;

use sv_models::Story;

const STYLESHEET: &str = r#"    body {
      font-family: Arial, sans-serif;
      line-height: 1.6;
      max-width: 800px;
      margin: 0 auto;
      padding: 20px;
    }
    h1 {
      text-align: center;
      color: #2c3e50;
    }
    .child-name {
      text-align: center;
      font-style: italic;
      margin-bottom: 30px;
    }
    .page {
      margin-bottom: 30px;
      border-bottom: 1px solid #eee;
      padding-bottom: 20px;
    }
    .page-number {
      font-weight: bold;
      color: #7f8c8d;
    }
    .page-text {
      margin-top: 10px;
    }
    .page-image {
      max-width: 100%;
      margin: 20px 0;
      border-radius: 5px;
      box-shadow: 0 2px 5px rgba(0,0,0,0.1);
    }
    footer {
      text-align: center;
      margin-top: 50px;
      font-style: italic;
      color: #7f8c8d;
    }
"#;

/// Render a story to a complete HTML document.
pub fn render_html(story: &Story) -> String {
    let title = escape_html(story.title_or_default());

    // Writing into a String is infallible.
    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
{STYLESHEET}  </style>
</head>
<body>
  <h1>{title}</h1>
"#
    );

    if let Some(child_name) = story.child_name.as_deref() {
        let _ = writeln!(
            html,
            "  <div class=\"child-name\">A special story for {}</div>",
            escape_html(child_name)
        );
    }

    let pages = story.pages();
    if !pages.is_empty() {
        for page in pages {
            let _ = write!(
                html,
                r#"  <div class="page">
    <div class="page-number">Page {}</div>
    <div class="page-text">{}</div>
"#,
                page.page_number,
                escape_html(page.text.as_deref().unwrap_or(""))
            );

            if let Some(image_url) = page.image_url.as_deref() {
                let _ = writeln!(
                    html,
                    "    <img class=\"page-image\" src=\"{}\" alt=\"Illustration for page {}\">",
                    escape_html(image_url),
                    page.page_number
                );
            }

            html.push_str("  </div>\n");
        }
    } else if let Some(text) = story.flat_text() {
        let _ = write!(
            html,
            r#"  <div class="page">
    <div class="page-text">{}</div>
  </div>
"#,
            escape_html(text)
        );
    }

    html.push_str("  <footer>Created with StoryVerse</footer>\n</body>\n</html>\n");
    html
}

/// Escape text for HTML body and attribute contexts.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
