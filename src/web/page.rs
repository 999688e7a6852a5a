//! Server-rendered HTML for the planner page.

use std::fmt::Write;

use crate::orchestration::CrewOutput;
use crate::travel::TripRequest;
use crate::travel::crew_def::{GUIDE_TASK, LOCATION_TASK};

use super::session::{PlanRecord, Theme};

pub const TITLE: &str = "AI Travel Planner";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Everything one render of the page needs.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub theme: Theme,
    pub request: Option<&'a TripRequest>,
    pub history: &'a [PlanRecord],
    pub flash: Option<Flash>,
    pub result: Option<&'a CrewOutput>,
    /// Render only the flash message (session was terminated).
    pub stopped: bool,
}

/// Escape text for HTML element content and attribute values.
pub fn escape(input: &str) -> String {
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

pub fn render_page(view: &PageView<'_>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>🌍 {TITLE}</h1>");

    if let Some(flash) = &view.flash {
        body.push_str(&render_flash(flash));
    }

    if !view.stopped {
        body.push_str(&render_sidebar(view.theme));
        let default_request = TripRequest::default();
        body.push_str(&render_form(view.request.unwrap_or(&default_request)));

        if let Some(result) = view.result {
            body.push_str(&render_result(result));
        }
        body.push_str(&render_history(view.history));
    }

    document(view.theme, &body)
}

/// Standalone error page, the equivalent of an uncaught exception display.
pub fn render_error(message: &str) -> String {
    let body = format!(
        "<h1>🌍 {TITLE}</h1>\n{}<p><a href=\"/\">Back to the planner</a></p>\n",
        render_flash(&Flash::error(message))
    );
    document(Theme::Light, &body)
}

fn document(theme: Theme, body: &str) -> String {
    let theme_css = match theme {
        Theme::Light => "",
        Theme::Dark => "body { background-color: #121212; color: white; } \
                        pre.report, details { background-color: #1e1e1e; }",
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>\n{BASE_CSS}\n{theme_css}\n</style>\n</head>\n\
         <body>\n<main>\n{body}</main>\n</body>\n</html>\n"
    )
}

const BASE_CSS: &str = "body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; } \
aside { border: 1px solid #8884; padding: 0.5rem 1rem; margin-bottom: 1rem; } \
label { display: block; margin-top: 0.75rem; } \
input, textarea { width: 100%; } \
pre.report { white-space: pre-wrap; background-color: #f5f5f5; padding: 1rem; } \
.flash-success { color: #1b7f3a; } .flash-error { color: #b00020; }";

fn render_flash(flash: &Flash) -> String {
    let (class, icon) = match flash.kind {
        FlashKind::Success => ("flash-success", "✅"),
        FlashKind::Error => ("flash-error", "⚠️"),
    };
    format!(
        "<p class=\"{class}\" role=\"status\">{icon} {}</p>\n",
        escape(&flash.message)
    )
}

fn render_sidebar(theme: Theme) -> String {
    let checked = |t: Theme| if t == theme { " checked" } else { "" };
    format!(
        "<aside>\n\
         <form method=\"post\" action=\"/theme\">\n<fieldset><legend>Theme Mode</legend>\n\
         <label><input type=\"radio\" name=\"theme\" value=\"Light\"{light}> Light</label>\n\
         <label><input type=\"radio\" name=\"theme\" value=\"Dark\"{dark}> Dark</label>\n\
         <button type=\"submit\">Apply</button>\n</fieldset>\n</form>\n\
         <form method=\"post\" action=\"/session/kill\"><button type=\"submit\">🛑 Kill Session</button></form>\n\
         <form method=\"post\" action=\"/history/clear\"><button type=\"submit\">🧹 Clear History</button></form>\n\
         </aside>\n",
        light = checked(Theme::Light),
        dark = checked(Theme::Dark),
    )
}

fn render_form(req: &TripRequest) -> String {
    format!(
        "<form method=\"post\" action=\"/plan\">\n\
         <label>From City <input name=\"origin\" value=\"{origin}\"></label>\n\
         <label>Destination City <input name=\"destination\" value=\"{destination}\"></label>\n\
         <label>Departure Date <input name=\"departure_date\" value=\"{depart}\"></label>\n\
         <label>Return Date <input name=\"return_date\" value=\"{ret}\"></label>\n\
         <label>Interests <textarea name=\"interests\">{interests}</textarea></label>\n\
         <p><button type=\"submit\">Plan My Trip</button></p>\n\
         </form>\n",
        origin = escape(&req.origin),
        destination = escape(&req.destination),
        depart = escape(&req.departure_date),
        ret = escape(&req.return_date),
        interests = escape(&req.interests),
    )
}

fn render_result(output: &CrewOutput) -> String {
    let mut html = format!(
        "<section id=\"result\">\n<pre class=\"report\">{}</pre>\n",
        escape(&output.raw)
    );
    for (name, label) in [(LOCATION_TASK, "City report"), (GUIDE_TASK, "Guide report")] {
        if let Some(task) = output.task(name) {
            let _ = writeln!(
                html,
                "<details><summary>{label}</summary><pre class=\"report\">{}</pre></details>",
                escape(&task.raw)
            );
        }
    }
    html.push_str("</section>\n");
    html
}

fn render_history(history: &[PlanRecord]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut html = String::from("<section id=\"history\">\n<h2>History</h2>\n");
    for record in history.iter().rev() {
        let _ = writeln!(
            html,
            "<details><summary>{from} → {to}, {depart} to {ret} ({at})</summary>\
             <pre class=\"report\">{plan}</pre></details>",
            from = escape(&record.request.origin),
            to = escape(&record.request.destination),
            depart = escape(&record.request.departure_date),
            ret = escape(&record.request.return_date),
            at = record.created_at.format("%Y-%m-%d %H:%M UTC"),
            plan = escape(&record.output.raw),
        );
    }
    html.push_str("</section>\n");
    html
}
