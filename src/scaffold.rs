//! Starter snippets built around an image caption.
//!
//! Captioning backends ([`crate::backend::OutputKind::Caption`]) describe a
//! screenshot instead of writing code. [`render`] places that description in
//! a fixed, minimal page or component for the selected framework so the
//! caller still receives code it can open and edit.

use crate::config::Framework;

/// Wrap `caption` in a starter snippet for `framework`.
///
/// The caption is HTML-escaped; for React it is also safe inside JSX text.
pub fn render(framework: Framework, caption: &str) -> String {
    let caption = escape_html(caption.trim());
    match framework {
        Framework::Html => html_page(&caption),
        Framework::Tailwind => tailwind_page(&caption),
        Framework::React => react_component(&caption),
    }
}

fn html_page(caption: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{caption}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
            background: #f3f4f6;
        }}
        .container {{
            background: white;
            padding: 40px;
            border-radius: 16px;
            box-shadow: 0 10px 30px rgba(0, 0, 0, 0.1);
            max-width: 500px;
            width: 100%;
        }}
        h1 {{ color: #111827; margin-bottom: 16px; font-size: 28px; }}
        p {{ color: #4b5563; line-height: 1.6; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Welcome</h1>
        <p>{caption}</p>
    </div>
</body>
</html>"#
    )
}

fn tailwind_page(caption: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{caption}</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100 min-h-screen flex items-center justify-center p-6">
    <div class="bg-white rounded-2xl shadow-xl p-8 max-w-md w-full">
        <h1 class="text-3xl font-bold text-gray-900 mb-4">Welcome</h1>
        <p class="text-gray-600 leading-relaxed">{caption}</p>
    </div>
</body>
</html>"#
    )
}

fn react_component(caption: &str) -> String {
    // JSX treats `{` and `}` in text as expression delimiters.
    let caption = caption.replace('{', "&#123;").replace('}', "&#125;");
    format!(
        r#"import React from 'react';

export default function Component() {{
  return (
    <div className="min-h-screen bg-gray-100 flex items-center justify-center p-6">
      <div className="bg-white rounded-2xl shadow-xl p-8 max-w-md w-full">
        <h1 className="text-3xl font-bold text-gray-900 mb-4">Welcome</h1>
        <p className="text-gray-600 leading-relaxed">{caption}</p>
      </div>
    </div>
  );
}}"#
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
