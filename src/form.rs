//! HTML rendering for the interactive ranking form.
//!
//! The page is a single form: a bio textarea and a Submit button. After a
//! submission the same page is rendered again with either an inline error,
//! the ranked stories as links, or a "No stories found." notice.

use crate::models::Story;

pub const PAGE_TITLE: &str = "Hacker News Story Ranker";

const INTRO: &str = "Enter your bio and see the current top stories from Hacker News, \
ranked in order of decreasing similarity to your interests.";

/// What to show below the form.
#[derive(Debug)]
pub enum FormOutcome<'a> {
    /// First visit.
    Blank,
    Error(&'a str),
    Ranked(&'a [Story]),
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Only http(s) links are clickable; anything else falls back to `#`.
fn safe_href(url: &str) -> String {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        escape_html(url)
    } else {
        "#".to_string()
    }
}

fn render_results(stories: &[Story]) -> String {
    if stories.is_empty() {
        return "<p class=\"empty\">No stories found.</p>\n".to_string();
    }

    let mut html = String::from("<h2>Ranked Stories:</h2>\n<ol>\n");
    for story in stories {
        html.push_str(&format!(
            "  <li><a href=\"{}\">{}</a></li>\n",
            safe_href(&story.url),
            escape_html(story.display_title())
        ));
    }
    html.push_str("</ol>\n");
    html
}

/// Render the full page, keeping `bio` in the textarea.
pub fn render_page(bio: &str, outcome: FormOutcome<'_>) -> String {
    let below = match outcome {
        FormOutcome::Blank => String::new(),
        FormOutcome::Error(message) => {
            format!("<p class=\"error\">{}</p>\n", escape_html(message))
        }
        FormOutcome::Ranked(stories) => render_results(stories),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }}
textarea {{ width: 100%; height: 150px; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{intro}</p>
<form method="post" action="/">
<label for="bio">Enter your bio:</label>
<textarea id="bio" name="bio">{bio}</textarea>
<button type="submit">Submit</button>
</form>
{below}</body>
</html>
"#,
        title = PAGE_TITLE,
        intro = INTRO,
        bio = escape_html(bio),
        below = below,
    )
}
