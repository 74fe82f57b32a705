use chrono::NaiveDate;
use provision_core::Recipient;
use provision_renderer::{InvitationContext, InvitationRenderer, RenderError};
use tempfile::TempDir;

fn make_ctx() -> InvitationContext {
    let day = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    InvitationContext::new(
        &[
            Recipient {
                email: "alice@example.com".to_string(),
                display_name: "Alice".to_string(),
            },
            Recipient {
                email: "bob@example.com".to_string(),
                display_name: "Bob".to_string(),
            },
        ],
        day.and_hms_opt(9, 0, 0).expect("start"),
        day.and_hms_opt(18, 0, 0).expect("end"),
        "Tokyo Standard Time",
    )
}

#[test]
fn user_body_template_overrides_embedded_default() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("body.html.tera"),
        "<p>Welcome {{ recipient_count }} people</p>\r\n",
    )
    .expect("write override");

    let renderer = InvitationRenderer::with_overrides(Some(dir.path())).expect("renderer");
    let rendered = renderer.render(&make_ctx()).expect("render");
    assert_eq!(rendered.body_html, "<p>Welcome 2 people</p>\n");
    assert!(
        rendered.subject.contains("2026-10-19"),
        "subject falls back to the embedded template"
    );
}

#[test]
fn user_subject_template_is_collapsed_to_one_line() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("subject.txt.tera"),
        "Orientation\n  {{ event.date }}\n",
    )
    .expect("write override");

    let renderer = InvitationRenderer::with_overrides(Some(dir.path())).expect("renderer");
    let rendered = renderer.render(&make_ctx()).expect("render");
    assert_eq!(rendered.subject, "Orientation 2026-10-19");
}

#[test]
fn blank_subject_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("subject.txt.tera"), "   \n").expect("write override");

    let renderer = InvitationRenderer::with_overrides(Some(dir.path())).expect("renderer");
    let err = renderer.render(&make_ctx()).unwrap_err();
    assert!(matches!(err, RenderError::EmptySubject), "got: {err}");
}

#[test]
fn missing_override_dir_uses_embedded_templates() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("does-not-exist");
    let renderer = InvitationRenderer::with_overrides(Some(&missing)).expect("renderer");
    let rendered = renderer.render(&make_ctx()).expect("render");
    assert!(rendered.body_html.contains("<li>Alice</li>"));
}

#[test]
fn broken_override_fails_at_construction() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("body.html.tera"), "{% for x in %}").expect("write override");

    let result = InvitationRenderer::with_overrides(Some(dir.path()));
    assert!(matches!(result, Err(RenderError::Tera(_))));
}
