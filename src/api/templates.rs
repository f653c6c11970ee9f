/// Values shown on the index page.
#[derive(Debug, Default)]
pub struct IndexPage<'a> {
    pub greeting: &'a str,
    pub response: Option<&'a str>,
    pub error: Option<&'a str>,
    pub name: Option<&'a str>,
    pub dob: Option<&'a str>,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_index(page: &IndexPage<'_>) -> String {
    let name = escape_html(page.name.unwrap_or_default());
    let dob = escape_html(page.dob.unwrap_or_default());

    let mut sections = String::new();
    if let Some(response) = page.response {
        sections.push_str(&format!(
            "    <section class=\"response\">\n      <h2>Answer</h2>\n      <p>{}</p>\n    </section>\n",
            escape_html(response).replace('\n', "<br>")
        ));
    }
    if let Some(error) = page.error {
        sections.push_str(&format!(
            "    <section class=\"error\">\n      <p>{}</p>\n    </section>\n",
            escape_html(error)
        ));
    }

    let exit_link = if name.is_empty() {
        "/exit".to_string()
    } else {
        format!("/exit?name={}", urlencoding::encode(page.name.unwrap_or_default()))
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Document Assistant</title>
  <style>
    body {{ font-family: sans-serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; }}
    label {{ display: block; margin-top: 0.75rem; }}
    input, textarea {{ width: 100%; padding: 0.4rem; }}
    .response {{ background: #f3f7f3; padding: 0.75rem; margin-top: 1rem; }}
    .error {{ background: #fbeaea; padding: 0.75rem; margin-top: 1rem; }}
  </style>
</head>
<body>
  <main>
    <h1 class="greeting">{greeting}</h1>
    <form method="post" action="/">
      <label>Name <input type="text" name="name" value="{name}" required></label>
      <label>Date of birth <input type="date" name="dob" value="{dob}" required></label>
      <label>Question <textarea name="question" rows="3" required></textarea></label>
      <button type="submit">Ask</button>
    </form>
{sections}    <p><a href="{exit_link}">Exit</a></p>
  </main>
</body>
</html>
"#,
        greeting = escape_html(page.greeting),
        name = name,
        dob = dob,
        sections = sections,
        exit_link = escape_html(&exit_link),
    )
}
