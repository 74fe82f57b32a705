//! Tera rendering engine — [`InvitationRenderer`].
//!
//! # Templates
//!
//! | Name          | Output                         | Autoescape |
//! |---------------|--------------------------------|------------|
//! | `subject.txt` | event subject (collapsed to one line) | no  |
//! | `body.html`   | event body, sent as HTML        | yes        |
//!
//! Embedded defaults can be overridden by `<name>.tera` files in a user
//! template directory (e.g. `body.html.tera`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::InvitationContext;
use crate::error::RenderError;

pub const SUBJECT_TEMPLATE: &str = "subject.txt";
pub const BODY_TEMPLATE: &str = "body.html";

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (SUBJECT_TEMPLATE, include_str!("templates/subject.txt.tera")),
    (BODY_TEMPLATE, include_str!("templates/body.html.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

/// `Body.HTML.tera` → `body.html`
fn normalize_template_name(path: &Path) -> String {
    let name = path.to_string_lossy().replace('\\', "/").to_lowercase();
    name.strip_suffix(".tera").map(str::to_owned).unwrap_or(name)
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// InvitationRenderer
// ---------------------------------------------------------------------------

/// Rendered subject and HTML body of one invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInvitation {
    pub subject: String,
    pub body_html: String,
}

/// Renders invitations from embedded templates plus optional overrides.
///
/// Create once per run with [`InvitationRenderer::new`] or
/// [`InvitationRenderer::with_overrides`] and reuse.
pub struct InvitationRenderer {
    tera: Tera,
}

impl InvitationRenderer {
    /// Construct a renderer with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Construct a renderer, loading `.tera` overrides from `user_template_dir`.
    pub fn with_overrides(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(InvitationRenderer {
            tera: build_tera(user_template_dir)?,
        })
    }

    /// Render subject and body for `ctx`.
    pub fn render(&self, ctx: &InvitationContext) -> Result<RenderedInvitation, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;

        let subject = self.tera.render(SUBJECT_TEMPLATE, &tera_ctx)?;
        let subject = subject.split_whitespace().collect::<Vec<_>>().join(" ");
        if subject.is_empty() {
            return Err(RenderError::EmptySubject);
        }

        let body_html = self
            .tera
            .render(BODY_TEMPLATE, &tera_ctx)?
            .replace("\r\n", "\n");

        Ok(RenderedInvitation { subject, body_html })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use provision_core::Recipient;

    fn ctx(names: &[&str]) -> InvitationContext {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let recipients: Vec<Recipient> = names
            .iter()
            .map(|n| Recipient {
                email: format!("{}@example.com", n.to_lowercase()),
                display_name: (*n).to_string(),
            })
            .collect();
        InvitationContext::new(
            &recipients,
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(18, 0, 0).unwrap(),
            "Tokyo Standard Time",
        )
    }

    #[test]
    fn renderer_new_succeeds() {
        InvitationRenderer::new().expect("embedded templates should compile");
    }

    #[test]
    fn subject_is_single_line_with_date() {
        let renderer = InvitationRenderer::new().unwrap();
        let rendered = renderer.render(&ctx(&["Alice"])).unwrap();
        assert!(!rendered.subject.contains('\n'));
        assert!(rendered.subject.contains("2026-10-19"), "got: {}", rendered.subject);
    }

    #[test]
    fn body_lists_recipients_and_window() {
        let renderer = InvitationRenderer::new().unwrap();
        let rendered = renderer.render(&ctx(&["Alice", "Bob"])).unwrap();
        assert!(rendered.body_html.contains("<li>Alice</li>"));
        assert!(rendered.body_html.contains("<li>Bob</li>"));
        assert!(rendered.body_html.contains("09:00 - 18:00 (Tokyo Standard Time)"));
    }

    #[test]
    fn body_escapes_display_names() {
        let renderer = InvitationRenderer::new().unwrap();
        let rendered = renderer.render(&ctx(&["<script>x</script>"])).unwrap();
        assert!(!rendered.body_html.contains("<script>"));
        assert!(rendered.body_html.contains("&lt;script&gt;"));
    }

    #[test]
    fn template_names_drop_tera_suffix() {
        assert_eq!(normalize_template_name(Path::new("Body.HTML.tera")), "body.html");
        assert_eq!(normalize_template_name(Path::new("subject.txt")), "subject.txt");
    }
}
