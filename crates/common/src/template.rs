use handlebars::Handlebars;
use serde_json::Value;

#[derive(Debug)]
pub struct TemplateError(pub String);

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "template: {}", self.0)
    }
}

impl std::error::Error for TemplateError {}

/// Renders `tmpl` against a serialized alert context. Strict mode: a
/// reference to an undefined field is an error, not an empty string.
pub fn render(tmpl: &str, ctx: &Value) -> Result<String, TemplateError> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry
        .render_template(tmpl, ctx)
        .map_err(|e| TemplateError(e.to_string()))
}

/// Non-failing variant: substitutes `fallback` when rendering fails.
pub fn render_or(tmpl: &str, ctx: &Value, fallback: &str) -> String {
    render(tmpl, ctx).unwrap_or_else(|_| fallback.to_string())
}
