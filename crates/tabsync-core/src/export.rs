//! Session export and import transforms shared by all clients.
//!
//! `json` is lossless. `txt` and `html` keep names, titles and URLs only:
//! importing them yields fresh ids, a fresh save time and a single window
//! per session.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Session, Tab, Window};

const TXT_SESSION_PREFIX: &str = "Session: ";

static HTML_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[\s>]").expect("Invalid regex"));
static HTML_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[\s>]").expect("Invalid regex"));
static HTML_BODY_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("Invalid regex"));
static HTML_SESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div\s+class\s*=\s*["']session["']\s*>"#).expect("Invalid regex")
});
static HTML_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2[^>]*>(.*?)</h2\s*>").expect("Invalid regex"));
static HTML_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]*)"[^>]*>(.*?)</a\s*>"#).expect("Invalid regex")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Export/import format shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Txt,
    Html,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
            Self::Html => "html",
        }
    }

    /// Infer the format from a file extension (`.htm` counts as html).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        if extension.eq_ignore_ascii_case("htm") {
            return Ok(Self::Html);
        }
        extension.parse()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Txt),
            "html" => Ok(Self::Html),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Render sessions as a pretty-printed JSON array.
pub fn render_json_export(sessions: &[Session]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(sessions)
}

/// Render sessions as `Session:` blocks of title/URL line pairs.
#[must_use]
pub fn render_txt_export(sessions: &[Session]) -> String {
    let mut output = String::new();

    for session in sessions {
        let _ = writeln!(output, "{TXT_SESSION_PREFIX}{}", session.name);
        for tab in session.tabs() {
            let _ = writeln!(output, "{}", tab.title);
            let _ = writeln!(output, "{}", tab.url);
            let _ = writeln!(output);
        }
        let _ = writeln!(output);
    }

    output
}

/// Render sessions as a minimal standalone HTML page.
#[must_use]
pub fn render_html_export(sessions: &[Session]) -> String {
    let mut output = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Session Export</title>\n<style>\n\
         body { font-family: Arial, sans-serif; margin: 20px; }\n\
         .session { margin-bottom: 20px; }\n\
         .tab { margin: 10px 0; }\n\
         </style>\n</head>\n<body>\n",
    );

    for session in sessions {
        output.push_str("<div class=\"session\">\n");
        let _ = writeln!(output, "<h2>{}</h2>", escape_html(&session.name));
        output.push_str("<div class=\"tabs\">\n");
        for tab in session.tabs() {
            let _ = writeln!(
                output,
                "<div class=\"tab\"><a href=\"{}\">{}</a></div>",
                escape_html(&tab.url),
                escape_html(&tab.title)
            );
        }
        output.push_str("</div>\n</div>\n");
    }

    output.push_str("</body>\n</html>\n");
    output
}

/// Render sessions based on the selected format.
pub fn render_sessions_export(sessions: &[Session], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(render_json_export(sessions)?),
        ExportFormat::Txt => Ok(render_txt_export(sessions)),
        ExportFormat::Html => Ok(render_html_export(sessions)),
    }
}

/// Parse a JSON session array, keeping every field verbatim.
pub fn parse_json_import(data: &str) -> Result<Vec<Session>> {
    serde_json::from_str(data).map_err(|error| Error::MalformedImport {
        format: "json",
        reason: error.to_string(),
    })
}

/// Parse the `txt` export format.
///
/// A `Session: ` line opens a session. Any other non-blank line is a tab
/// title and the line right after it, whatever it holds, is the URL.
pub fn parse_txt_import(data: &str) -> Result<Vec<Session>> {
    let mut sessions = Vec::new();
    let mut current: Option<(String, Vec<Tab>)> = None;
    let mut lines = data.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        if let Some(name) = line.strip_prefix(TXT_SESSION_PREFIX) {
            if let Some((name, tabs)) = current.take() {
                sessions.push(imported_session(name, tabs));
            }
            current = Some((name.trim().to_string(), Vec::new()));
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let Some((_, tabs)) = current.as_mut() else {
            return Err(Error::MalformedImport {
                format: "txt",
                reason: format!("line {} appears before the first session header", index + 1),
            });
        };
        let url = lines.next().map_or("", |(_, url)| url);
        tabs.push(Tab::new(line.trim(), url.trim()));
    }

    if let Some((name, tabs)) = current {
        sessions.push(imported_session(name, tabs));
    }
    Ok(sessions)
}

/// Parse the `html` export format.
pub fn parse_html_import(data: &str) -> Result<Vec<Session>> {
    let malformed = |reason: &str| Error::MalformedImport {
        format: "html",
        reason: reason.to_string(),
    };
    if !HTML_ROOT.is_match(data) || !HTML_BODY.is_match(data) {
        return Err(malformed("document has no <html> or <body> element"));
    }

    let body_end = HTML_BODY_END
        .find(data)
        .map_or(data.len(), |found| found.start());
    let starts = HTML_SESSION
        .find_iter(&data[..body_end])
        .map(|found| found.end())
        .collect::<Vec<_>>();

    let mut sessions = Vec::with_capacity(starts.len());
    for (position, &start) in starts.iter().enumerate() {
        let end = starts
            .get(position + 1)
            .map_or(body_end, |&next| next);
        let block = &data[start..end];

        let heading = HTML_HEADING
            .captures(block)
            .ok_or_else(|| malformed(&format!("session {} has no <h2> name", position + 1)))?;
        let name = html_text(&heading[1]);

        let tabs = HTML_LINK
            .captures_iter(&block[heading.get(0).map_or(0, |found| found.end())..])
            .map(|link| Tab::new(html_text(&link[2]), unescape_html(link[1].trim())))
            .collect();
        sessions.push(imported_session(name, tabs));
    }

    Ok(sessions)
}

/// Parse sessions from the given format.
pub fn parse_sessions_import(data: &str, format: ExportFormat) -> Result<Vec<Session>> {
    match format {
        ExportFormat::Json => parse_json_import(data),
        ExportFormat::Txt => parse_txt_import(data),
        ExportFormat::Html => parse_html_import(data),
    }
}

/// Default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat) -> String {
    format!("sessions.{}", format.extension())
}

fn imported_session(name: String, tabs: Vec<Tab>) -> Session {
    Session::new(name, vec![Window::synthetic(tabs)])
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Text content of an HTML fragment: inner tags dropped, entities decoded.
fn html_text(fragment: &str) -> String {
    unescape_html(HTML_TAG.replace_all(fragment, "").trim())
}
