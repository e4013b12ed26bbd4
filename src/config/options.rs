// Serve options module
// Parses the options string given on the command line into typed overrides

use serde::Deserialize;
use thiserror::Error;

use super::types::{DotfilesMode, ExtensionsSetting, IndexSetting, MaxAgeInput, ServeConfig};

/// Errors raised while parsing the options string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("options must be a JSON object or key=value pairs")]
    NotAnObject,
    #[error("option '{0}' is missing a value (expected key=value)")]
    MissingValue(String),
    #[error("setHeaders is a code hook and cannot be set from the options string; use [serve.headers] instead")]
    SetHeadersNotAllowed,
    #[error("extensions accepts a list of extensions or false")]
    ExtensionsTrue,
    #[error("invalid options: {0}")]
    Invalid(String),
}

/// Typed overrides for [`ServeConfig`], every field optional
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServeOptions {
    pub accept_ranges: Option<bool>,
    pub cache_control: Option<bool>,
    pub dotfiles: Option<DotfilesMode>,
    pub etag: Option<bool>,
    pub extensions: Option<ExtensionsSetting>,
    pub fallthrough: Option<bool>,
    pub immutable: Option<bool>,
    pub index: Option<IndexSetting>,
    pub last_modified: Option<bool>,
    pub max_age: Option<MaxAgeInput>,
    pub redirect: Option<bool>,
}

impl ServeOptions {
    /// Parse `{"dotfiles":"deny"}` or `dotfiles=deny, maxAge=1d, index=["a.html"]`
    pub fn parse(raw: &str) -> Result<Self, OptionsError> {
        let raw = raw.trim();
        let options = if raw.is_empty() {
            Self::default()
        } else if raw.starts_with('{') {
            Self::parse_json(raw)?
        } else {
            Self::parse_pairs(raw)?
        };
        options.validate()?;
        Ok(options)
    }

    fn parse_json(raw: &str) -> Result<Self, OptionsError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| OptionsError::Invalid(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(OptionsError::NotAnObject);
        };
        if object.contains_key("setHeaders") {
            return Err(OptionsError::SetHeadersNotAllowed);
        }
        serde_json::from_value(value).map_err(|e| OptionsError::Invalid(e.to_string()))
    }

    fn parse_pairs(raw: &str) -> Result<Self, OptionsError> {
        let mut table = toml::Table::new();
        for pair in split_pairs(raw) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(OptionsError::MissingValue(pair.to_string()));
            };
            let key = key.trim();
            if key == "setHeaders" {
                return Err(OptionsError::SetHeadersNotAllowed);
            }
            table.insert(key.to_string(), pair_value(value.trim()));
        }
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| OptionsError::Invalid(e.message().to_string()))
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if self.extensions == Some(ExtensionsSetting::Enabled(true)) {
            return Err(OptionsError::ExtensionsTrue);
        }
        Ok(())
    }

    /// Overlay the options that were set onto `serve`
    pub fn apply(self, serve: &mut ServeConfig) {
        if let Some(v) = self.accept_ranges {
            serve.accept_ranges = v;
        }
        if let Some(v) = self.cache_control {
            serve.cache_control = v;
        }
        if let Some(v) = self.dotfiles {
            serve.dotfiles = v;
        }
        if let Some(v) = self.etag {
            serve.etag = v;
        }
        if let Some(v) = self.extensions {
            serve.extensions = v;
        }
        if let Some(v) = self.fallthrough {
            serve.fallthrough = v;
        }
        if let Some(v) = self.immutable {
            serve.immutable = v;
        }
        if let Some(v) = self.index {
            serve.index = v;
        }
        if let Some(v) = self.last_modified {
            serve.last_modified = v;
        }
        if let Some(v) = self.max_age {
            serve.max_age = v;
        }
        if let Some(v) = self.redirect {
            serve.redirect = v;
        }
    }
}

/// Values are read as TOML (`false`, `3600`, `["a", "b"]`), falling back to a bare string
fn pair_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Split on `,` and `;` that sit outside brackets and quotes
fn split_pairs(raw: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',' | ';') if depth == 0 => {
                let piece = raw[start..i].trim();
                if !piece.is_empty() {
                    pairs.push(piece);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = raw[start..].trim();
    if !tail.is_empty() {
        pairs.push(tail);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(ServeOptions::parse("").unwrap(), ServeOptions::default());
        assert_eq!(ServeOptions::parse("{}").unwrap(), ServeOptions::default());
    }

    #[test]
    fn test_parse_json_object() {
        let opts =
            ServeOptions::parse(r#"{"dotfiles":"deny","maxAge":"1d","etag":false}"#).unwrap();
        assert_eq!(opts.dotfiles, Some(DotfilesMode::Deny));
        assert_eq!(opts.max_age, Some(MaxAgeInput::Text("1d".to_string())));
        assert_eq!(opts.etag, Some(false));
    }

    #[test]
    fn test_parse_pairs() {
        let opts = ServeOptions::parse(
            r#"dotfiles=ignore, maxAge=3600000; immutable=true, index=["home.html", "index.htm"]"#,
        )
        .unwrap();
        assert_eq!(opts.dotfiles, Some(DotfilesMode::Ignore));
        assert_eq!(opts.max_age, Some(MaxAgeInput::Millis(3_600_000.0)));
        assert_eq!(opts.immutable, Some(true));
        assert_eq!(
            opts.index,
            Some(IndexSetting::Many(vec![
                "home.html".to_string(),
                "index.htm".to_string()
            ]))
        );
    }

    #[test]
    fn test_bare_string_values() {
        let opts = ServeOptions::parse("maxAge=2h,index=default.htm").unwrap();
        assert_eq!(opts.max_age, Some(MaxAgeInput::Text("2h".to_string())));
        assert_eq!(opts.index, Some(IndexSetting::One("default.htm".to_string())));
    }

    #[test]
    fn test_rejects_unknown_and_bad_values() {
        assert!(matches!(
            ServeOptions::parse("colour=blue"),
            Err(OptionsError::Invalid(_))
        ));
        assert!(matches!(
            ServeOptions::parse("dotfiles=maybe"),
            Err(OptionsError::Invalid(_))
        ));
        assert!(matches!(
            ServeOptions::parse(r#"{"etag":"yes"}"#),
            Err(OptionsError::Invalid(_))
        ));
        assert_eq!(
            ServeOptions::parse("[1, 2]"),
            Err(OptionsError::MissingValue("[1, 2]".to_string()))
        );
        assert_eq!(ServeOptions::parse("etag"), Err(OptionsError::MissingValue("etag".into())));
    }

    #[test]
    fn test_rejects_code_hooks() {
        assert_eq!(
            ServeOptions::parse(r#"{"setHeaders":"function(){}"}"#),
            Err(OptionsError::SetHeadersNotAllowed)
        );
        assert_eq!(
            ServeOptions::parse("setHeaders=x"),
            Err(OptionsError::SetHeadersNotAllowed)
        );
    }

    #[test]
    fn test_extensions_true_rejected() {
        assert_eq!(
            ServeOptions::parse("extensions=true"),
            Err(OptionsError::ExtensionsTrue)
        );
        let opts = ServeOptions::parse(r#"extensions=["html"]"#).unwrap();
        assert_eq!(
            opts.extensions,
            Some(ExtensionsSetting::List(vec!["html".to_string()]))
        );
    }

    #[test]
    fn test_apply_overlays_only_set_fields() {
        let mut serve = ServeConfig::default();
        ServeOptions::parse("dotfiles=deny, redirect=false")
            .unwrap()
            .apply(&mut serve);
        assert_eq!(serve.dotfiles, DotfilesMode::Deny);
        assert!(!serve.redirect);
        assert!(serve.etag);
        assert!(serve.fallthrough);
    }
}
