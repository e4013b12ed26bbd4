//! Placeholder substitution for the listing template
//!
//! Placeholders are `{name}`. Substitution is a single left-to-right pass:
//! unknown placeholders are copied verbatim and inserted values are never
//! scanned again.

use std::collections::HashMap;

/// Render `template`, replacing `{key}` with `bindings[key]`
pub fn render(template: &str, bindings: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| bindings.get(&after[..close]).map(|v| (close, v)));
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn test_substitutes_every_occurrence() {
        let b = bindings(&[("path", "/docs/"), ("list", "<li>x</li>")]);
        assert_eq!(
            render("<title>{path}</title><h1>{path}</h1><ul>{list}</ul>", &b),
            "<title>/docs/</title><h1>/docs/</h1><ul><li>x</li></ul>"
        );
    }

    #[test]
    fn test_unknown_placeholders_stay_verbatim() {
        let b = bindings(&[("path", "/")]);
        assert_eq!(render("{path} {missing} {", &b), "/ {missing} {");
        assert_eq!(render("a { b } {path}", &b), "a { b } /");
        assert_eq!(render("{{path}}", &b), "{/}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let b = bindings(&[("path", "{list}"), ("list", "LIST")]);
        assert_eq!(render("{path}|{list}", &b), "{list}|LIST");
    }

    #[test]
    fn test_css_braces_survive() {
        let b = bindings(&[("path", "/")]);
        let css = "body {\n  margin: 0;\n}\n<h1>{path}</h1>";
        assert_eq!(render(css, &b), "body {\n  margin: 0;\n}\n<h1>/</h1>");
    }
}
