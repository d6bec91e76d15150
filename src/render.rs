//! Template rendering.
//!
//! Templates use mustache-style partial references (`{{> name}}`). No data
//! context is supplied, so the partial mapping is the only input besides the
//! template text.
//!
//! Only partials reachable from the template are compiled, so a broken
//! partial that nothing includes cannot fail a render. Templates are parsed as
//! handlebars: block syntax that handlebars rejects, such as a top-level
//! `{{else}}`, is a [`Error::RenderFailed`] rather than empty output.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use handlebars::Handlebars;
use regex::Regex;

use crate::error::{Error, Result};
use crate::store::PartialSet;

fn partial_ref() -> &'static Regex {
    static PARTIAL_REF: OnceLock<Regex> = OnceLock::new();
    PARTIAL_REF.get_or_init(|| {
        Regex::new(r"\{\{~?>\s*([^\s{}~]+)").expect("partial reference pattern is valid")
    })
}

/// Render `template` against `partials`.
///
/// A reference to a partial that is not in the set renders as empty text.
/// The output depends only on the two inputs.
pub fn render(template: &str, partials: &PartialSet) -> Result<String> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(false);
    registry.register_escape_fn(handlebars::no_escape);

    for name in reachable_references(template, partials) {
        let content = match partials.get(&name) {
            Some(content) => content.as_str(),
            None => {
                tracing::debug!(partial = %name, "Unresolved partial renders empty");
                ""
            }
        };
        registry
            .register_partial(&name, content)
            .map_err(|e| Error::RenderFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
    }

    registry
        .render_template(template, &serde_json::json!({}))
        .map_err(|e| Error::RenderFailed {
            name: "template".to_string(),
            reason: e.to_string(),
        })
}

/// Every partial name the template references, directly or through other
/// partials. Names missing from `partials` are included and not followed.
fn reachable_references(template: &str, partials: &PartialSet) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut pending = references(template);
    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(content) = partials.get(&name) {
            pending.extend(references(content));
        }
    }
    seen
}

fn references(text: &str) -> Vec<String> {
    partial_ref()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
