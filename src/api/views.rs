//! HTML rendering for the submission form

use crate::domain::user::{FormErrors, USERNAME_FIELD, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH};
use crate::infrastructure::csrf::CSRF_FIELD;

/// Everything the form template needs
#[derive(Debug, Default)]
pub struct FormView<'a> {
    /// Previously submitted value, echoed back on failure
    pub username: Option<&'a str>,
    pub csrf_token: Option<&'a str>,
    pub errors: Option<&'a FormErrors>,
}

pub fn render_form(view: &FormView<'_>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Submit</title>\n</head>\n<body>\n<h1>Submit</h1>\n",
    );

    if let Some(errors) = view.errors {
        let form_level: Vec<&String> = errors
            .iter()
            .filter(|(field, _)| *field != USERNAME_FIELD)
            .flat_map(|(_, messages)| messages.iter())
            .collect();
        push_error_list(&mut html, form_level);
    }

    html.push_str("<form method=\"post\" action=\"/submit\">\n");

    if let Some(token) = view.csrf_token {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
            CSRF_FIELD,
            escape_html(token)
        ));
    }

    html.push_str(&format!(
        "<label for=\"{field}\">Username</label>\n\
         <input id=\"{field}\" name=\"{field}\" type=\"text\" minlength=\"{min}\" \
         maxlength=\"{max}\" required value=\"{value}\">\n",
        field = USERNAME_FIELD,
        min = USERNAME_MIN_LENGTH,
        max = USERNAME_MAX_LENGTH,
        value = escape_html(view.username.unwrap_or_default()),
    ));

    if let Some(errors) = view.errors {
        push_error_list(&mut html, errors.get(USERNAME_FIELD).iter().collect());
    }

    html.push_str("<button type=\"submit\">Submit</button>\n</form>\n</body>\n</html>\n");
    html
}

fn push_error_list(html: &mut String, messages: Vec<&String>) {
    if messages.is_empty() {
        return;
    }

    html.push_str("<ul class=\"errors\">\n");
    for message in messages {
        html.push_str(&format!("<li>{}</li>\n", escape_html(message)));
    }
    html.push_str("</ul>\n");
}

/// Escape text for use in element content and quoted attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }

    out
}
