//! Instruction templates with `{name}` placeholders.

/// A fixed instruction text rendered against variable bindings.
///
/// Placeholders are `{identifier}`. A placeholder without a binding is kept
/// verbatim, so literal braces in instructions survive rendering. Bound
/// values are inserted as-is and are never re-scanned for placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn render(&self, bindings: &[(&str, &str)]) -> String {
        let src = self.template.as_str();
        let mut out = String::with_capacity(src.len());
        let mut rest = src;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let name = &after[..close];
            match bindings.iter().find(|(k, _)| *k == name) {
                Some((_, value)) if is_identifier(name) => out.push_str(value),
                _ => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
