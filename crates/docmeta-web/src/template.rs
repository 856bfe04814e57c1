use axum::response::Html;

const DOCS_HTML: &str = include_str!("../templates/docs.html");

/// Render the interactive API docs page pointing at `spec_url`.
pub fn render_docs(spec_url: &str) -> Html<String> {
    Html(DOCS_HTML.replace("{{ spec_url }}", spec_url))
}
