//! Rendering the Kubernetes manifests we print: the `Pod` for a task and the
//! skeleton `Secret` holding AWS credentials.

use handlebars::Handlebars;

use crate::prelude::*;

/// Render a `Pod` or `Secret` template from this crate with [Handlebars][].
///
/// Templates run in strict mode, so a typo in a parameter name is an error
/// rather than an empty field. Values are escaped with `yaml_escape`, so every
/// `{{value}}` in a template must sit inside a double-quoted YAML string.
///
/// [Handlebars]: https://handlebarsjs.com/
pub fn render_manifest<T: Serialize>(
    template_yml: &str,
    params: &T,
) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(yaml_escape);
    handlebars
        .render_template(template_yml, params)
        .context("error rendering manifest template")
}

/// Escape env var names, secret names and keys for use inside a
/// double-quoted YAML scalar. Single quotes need no escaping there.
///
/// See http://yaml.org/spec/1.2/spec.html#id2776092 for details.
fn yaml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            ' ' => result.push(' '),
            c if c.is_ascii_graphic() => result.push(c),
            c if c as u32 <= 0xFFFF => {
                result.push_str(&format!("\\u{:04x}", c as u32))
            }
            c => result.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    result
}

#[test]
fn yaml_escape_handles_common_chars() {
    let examples = &[
        ("AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"),
        ("my secret", "my secret"),
        ("'", "'"),
        ("\\", "\\\\"),
        ("\"", "\\\""),
        ("\n", "\\n"),
        ("\t", "\\t"),
        ("\0", "\\0"),
        ("\u{0007}", "\\u0007"),
        ("é", "\\u00e9"),
        ("\u{1F511}", "\\U0001f511"),
    ];
    for &(input, expected) in examples {
        assert_eq!(yaml_escape(input), expected);
    }
}

#[test]
fn escaped_values_survive_a_yaml_round_trip() {
    #[derive(Serialize)]
    struct Params {
        value: &'static str,
    }

    let value = "quote \" backslash \\ tab \t key \u{1F511}";
    let rendered = render_manifest("value: \"{{value}}\"\n", &Params { value })
        .expect("render failed");
    let parsed: serde_json::Value =
        serde_yaml::from_str(&rendered).expect("rendered invalid YAML");
    assert_eq!(parsed["value"], value);
}

#[test]
fn strict_mode_rejects_missing_values() {
    let result = render_manifest("name: \"{{missing}}\"\n", &serde_json::json!({}));
    assert!(result.is_err());
}
