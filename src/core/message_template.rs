//! Message templates with named placeholders
//!
//! A template such as `"Dividing {A} by {B}"` is parsed once into text and
//! property tokens. Rendering substitutes property values from an event's
//! property bag.

use super::property::Properties;
use std::fmt;

/// Capturing hint written before a placeholder name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destructuring {
    Default,
    /// `{@Name}`
    Destructure,
    /// `{$Name}`
    Stringify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    Text(String),
    Property {
        name: String,
        format: Option<String>,
        destructuring: Destructuring,
        /// Source text including braces, rendered when the property is missing
        raw: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<TemplateToken>,
}

impl MessageTemplate {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = parse_tokens(&text);
        Self { text, tokens }
    }

    /// The original template text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Names of all placeholders, without hint characters
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            TemplateToken::Property { name, .. } => Some(name.as_str()),
            TemplateToken::Text(_) => None,
        })
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property_names().any(|n| n == name)
    }

    /// Render the template against a property bag
    pub fn render(&self, properties: &Properties) -> String {
        let mut output = String::with_capacity(self.text.len());
        self.render_into(properties, None, &mut output);
        output
    }

    /// Render into an existing buffer
    ///
    /// `format_override` (from an output template's `{Message:l}`) applies
    /// to every placeholder that has no format of its own.
    pub fn render_into(&self, properties: &Properties, format_override: Option<&str>, output: &mut String) {
        for token in &self.tokens {
            match token {
                TemplateToken::Text(text) => output.push_str(text),
                TemplateToken::Property {
                    name, format, raw, ..
                } => match properties.get(name) {
                    Some(value) => {
                        value.render(format.as_deref().or(format_override), output)
                    }
                    None => output.push_str(raw),
                },
            }
        }
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        MessageTemplate::parse(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        MessageTemplate::parse(text)
    }
}

fn parse_tokens(text: &str) -> Vec<TemplateToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if rest.starts_with("{{") {
            literal.push('{');
            rest = &rest[2..];
        } else if rest.starts_with("}}") {
            literal.push('}');
            rest = &rest[2..];
        } else if ch == '{' {
            match rest.find('}') {
                Some(end) => {
                    let raw = &rest[..=end];
                    match parse_property(&raw[1..raw.len() - 1], raw) {
                        Some(token) => {
                            if !literal.is_empty() {
                                tokens.push(TemplateToken::Text(std::mem::take(&mut literal)));
                            }
                            tokens.push(token);
                        }
                        None => literal.push_str(raw),
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    literal.push_str(rest);
                    rest = "";
                }
            }
        } else {
            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    if !literal.is_empty() {
        tokens.push(TemplateToken::Text(literal));
    }
    tokens
}

fn parse_property(content: &str, raw: &str) -> Option<TemplateToken> {
    let (destructuring, body) = match content.chars().next()? {
        '@' => (Destructuring::Destructure, &content[1..]),
        '$' => (Destructuring::Stringify, &content[1..]),
        _ => (Destructuring::Default, content),
    };

    let (name_part, format) = match body.split_once(':') {
        Some((name, format)) => (name, Some(format.to_string())),
        None => (body, None),
    };
    // Alignment (`{Name,10}`) is accepted but not applied
    let name = name_part.split(',').next().unwrap_or_default();

    let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return None;
    }

    Some(TemplateToken::Property {
        name: name.to_string(),
        format,
        destructuring,
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::PropertyValue;

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_parse_placeholders() {
        let template = MessageTemplate::parse("Dividing {A} by {B}");
        let names: Vec<_> = template.property_names().collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(template.tokens().len(), 4);
    }

    #[test]
    fn test_render_numbers() {
        let template = MessageTemplate::parse("Dividing {A} by {B}");
        let rendered = template.render(&props(&[("A", 10.into()), ("B", 0.into())]));
        assert_eq!(rendered, "Dividing 10 by 0");
    }

    #[test]
    fn test_render_strings_quoted_unless_literal() {
        let template = MessageTemplate::parse("User {Name} / {Name:l}");
        let rendered = template.render(&props(&[("Name", "bob".into())]));
        assert_eq!(rendered, "User \"bob\" / bob");
    }

    #[test]
    fn test_missing_property_renders_source_text() {
        let template = MessageTemplate::parse("Hello {Who}");
        assert_eq!(template.render(&Properties::new()), "Hello {Who}");
    }

    #[test]
    fn test_escaped_braces_and_invalid_tokens() {
        let template = MessageTemplate::parse("{{literal}} {not valid} {");
        assert_eq!(template.property_names().count(), 0);
        assert_eq!(template.render(&Properties::new()), "{literal} {not valid} {");
    }

    #[test]
    fn test_hints_are_stripped_from_names() {
        let template = MessageTemplate::parse("{@Order} {$Id:x}");
        let tokens = template.tokens();
        match &tokens[0] {
            TemplateToken::Property {
                name,
                destructuring,
                ..
            } => {
                assert_eq!(name, "Order");
                assert_eq!(*destructuring, Destructuring::Destructure);
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert!(template.has_property("Id"));
    }
}
