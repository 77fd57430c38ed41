//! Template rendering for HTML actions.
//!
//! Actions receive a [`Renderer`] at construction instead of reaching for a
//! global template environment, so tests can swap in a stub.

use anyhow::{Context, Result};
use minijinja::Environment;
use serde_json::Value;

/// Name of the bundled welcome page template.
pub const WELCOME_TEMPLATE: &str = "welcome.html";

const WELCOME_SOURCE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>KickStart</title></head>
<body>
<h1>Hello, {{ name }}!</h1>
{% if route %}<p>Served by <code>{{ route }}</code></p>{% endif %}
</body>
</html>
"#;

/// Renders a named template with a JSON context.
pub trait Renderer: Send + Sync {
    /// # Errors
    ///
    /// Unknown template or a rendering failure.
    fn render(&self, template: &str, ctx: &Value) -> Result<String>;
}

/// [`Renderer`] backed by a `minijinja` environment.
///
/// HTML auto-escaping applies to templates whose name ends in `.html`.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// An environment holding the bundled templates.
    ///
    /// # Errors
    ///
    /// A bundled template fails to parse.
    pub fn new() -> Result<Self> {
        Self::empty().with_template(WELCOME_TEMPLATE, WELCOME_SOURCE)
    }

    /// An environment with no templates.
    pub fn empty() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Add or replace a template.
    ///
    /// # Errors
    ///
    /// The source is not valid template syntax.
    pub fn with_template(mut self, name: &'static str, source: &'static str) -> Result<Self> {
        self.env
            .add_template(name, source)
            .with_context(|| format!("Failed to compile template `{name}`"))?;
        Ok(self)
    }
}

impl Renderer for MiniJinjaRenderer {
    fn render(&self, template: &str, ctx: &Value) -> Result<String> {
        let tmpl = self
            .env
            .get_template(template)
            .with_context(|| format!("Unknown template `{template}`"))?;
        tmpl.render(ctx)
            .with_context(|| format!("Failed to render template `{template}`"))
    }
}
