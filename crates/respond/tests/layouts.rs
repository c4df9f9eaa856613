//! Layout composition over the on-disk fixtures.

use http::{Response, StatusCode};
use insta::assert_snapshot;
use respond::fs::{EmbeddedFileSystem, OsFileSystem};
use serde_json::json;
use respond::{HtmlOptions, Options, RenderError, Renderer};

fn fixtures(directory: &str) -> Options {
    Options::new()
        .file_system(OsFileSystem::rooted(env!("CARGO_MANIFEST_DIR")))
        .directory(format!("tests/fixtures/{directory}"))
}

#[test]
fn test_layout_wraps_content() {
    let renderer = Renderer::new(fixtures("basic").layout("layout")).unwrap();
    let mut res = Response::new(Vec::new());
    renderer
        .html(&mut res, StatusCode::OK, "hello", "gophers", None)
        .unwrap();

    assert_eq!(
        String::from_utf8(res.body().clone()).unwrap(),
        "head\n<h1>Hello gophers</h1>\n\nfoot\n"
    );
}

#[test]
fn test_layout_current() {
    let renderer = Renderer::new(fixtures("basic").layout("current_layout")).unwrap();
    let out = renderer.render_html("hello", "gophers", None).unwrap();

    assert_snapshot!(out, @r"
    hello head
    <h1>Hello gophers</h1>

    hello foot
    ");
}

#[test]
fn test_per_call_layout() {
    let renderer = Renderer::new(fixtures("basic")).unwrap();
    let opts = HtmlOptions::new().layout("layout");
    let out = renderer.render_html("hello", "gophers", Some(&opts)).unwrap();
    assert_eq!(out, "head\n<h1>Hello gophers</h1>\n\nfoot\n");
}

#[test]
fn test_yield_without_layout_fails() {
    let renderer = Renderer::new(fixtures("basic")).unwrap();
    let mut res = Response::new(Vec::new());
    let err = renderer
        .html(&mut res, StatusCode::OK, "layout", &(), None)
        .unwrap_err();

    assert!(err.to_string().contains("yield called with no layout defined"));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_missing_layout_unit() {
    let renderer = Renderer::new(fixtures("basic").layout("no-such-layout")).unwrap();
    let err = renderer.render_html("hello", "gophers", None).unwrap_err();
    assert!(matches!(err, RenderError::TemplateNotFound(_)));
}

#[test]
fn test_partials() {
    let renderer = Renderer::new(fixtures("partials").layout("layout")).unwrap();
    let out = renderer.render_html("content", "gophers", None).unwrap();

    assert_snapshot!(out, @r"
    <head><script>before</script></head>
    <h1>gophers</h1>
    <foot></foot>
    ");
}

#[test]
fn test_partials_without_prefix() {
    let options = Options {
        render_partials_without_prefix: true,
        ..fixtures("partials").layout("layout")
    };
    let renderer = Renderer::new(options).unwrap();
    let out = renderer.render_html("content", "gophers", None).unwrap();

    assert_snapshot!(out, @r"
    <head><script>before</script></head>
    <h1>gophers</h1>
    <foot>generic after</foot>
    ");
}

#[test]
fn test_require_partials() {
    let options = Options {
        require_partials: true,
        ..fixtures("partials").layout("layout")
    };
    let renderer = Renderer::new(options).unwrap();
    let err = renderer.render_html("content", "gophers", None).unwrap_err();
    assert!(err.to_string().contains("after-content"));
}

#[test]
fn test_partial_called_from_content() {
    static FILES: &[(&str, &[u8])] = &[
        ("templates/layout.tmpl", b"<L>{{ yield() }}</L>"),
        ("templates/content.tmpl", b"{{ partial(\"css\") }}body"),
        ("templates/css-content.tmpl", b"<style/>"),
    ];
    let renderer = Renderer::new(
        Options::new()
            .file_system(EmbeddedFileSystem::new(FILES))
            .layout("layout"),
    )
    .unwrap();

    let out = renderer.render_html("content", &(), None).unwrap();
    assert_eq!(out, "<L><style/>body</L>");
}

#[test]
fn test_binding_fields_named_like_helpers() {
    static FILES: &[(&str, &[u8])] = &[
        ("templates/layout.tmpl", b"[{{ yield() }}]"),
        ("templates/page.tmpl", b"{{ this.current.title }} {{ shout(this.name) }}"),
    ];
    let renderer = Renderer::new(
        Options::new()
            .file_system(EmbeddedFileSystem::new(FILES))
            .func(|env| env.add_function("shout", |s: String| s.to_uppercase())),
    )
    .unwrap();
    let binding = json!({"current": {"title": "T"}, "name": "a", "shout": true});

    let plain = renderer.render_html("page", &binding, None).unwrap();
    assert_eq!(plain, "T A");

    let wrapped = HtmlOptions::new().layout("layout");
    let out = renderer.render_html("page", &binding, Some(&wrapped)).unwrap();
    assert_eq!(out, "[T A]");
}
