//! Per-chunk heading and summary generation.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use docent_llm::{GenerationOptions, LlmProvider, Message, PromptTemplate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::prompts;

pub const NO_HEADING: &str = "No Heading Provided";
pub const NO_SUMMARY: &str = "No Summary Provided";

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)["']?\b(heading|summary)\b["']?[ \t]*:\s*"#).unwrap());

/// Which parser stage produced the metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    Strict,
    Lenient,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub heading: String,
    pub summary: String,
    pub source: MetadataSource,
}

impl ChunkMetadata {
    fn fallback() -> Self {
        Self {
            heading: NO_HEADING.into(),
            summary: NO_SUMMARY.into(),
            source: MetadataSource::Fallback,
        }
    }
}

#[derive(Debug, Default)]
pub struct MetadataStats {
    strict: AtomicU64,
    lenient: AtomicU64,
    fallback: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetadataCounts {
    pub strict: u64,
    pub lenient: u64,
    pub fallback: u64,
}

impl MetadataStats {
    pub fn record(&self, source: MetadataSource) {
        let counter = match source {
            MetadataSource::Strict => &self.strict,
            MetadataSource::Lenient => &self.lenient,
            MetadataSource::Fallback => &self.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetadataCounts {
        MetadataCounts {
            strict: self.strict.load(Ordering::Relaxed),
            lenient: self.lenient.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
        }
    }
}

#[derive(Deserialize)]
struct StrictMetadata {
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "Summary")]
    summary: String,
}

/// Remove a surrounding markdown code fence and its language tag.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn field_ci<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn from_object(obj: &Map<String, Value>) -> Option<(Option<String>, Option<String>)> {
    let heading = non_empty(field_ci(obj, "heading"));
    let summary = non_empty(field_ci(obj, "summary"));
    (heading.is_some() || summary.is_some()).then_some((heading, summary))
}

fn parse_object(text: &str) -> Option<(Option<String>, Option<String>)> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(obj) => from_object(&obj),
        _ => None,
    }
}

/// Reads a quoted value starting at `text[0]`, honouring backslash escapes.
/// Returns the value and the bytes consumed, or `None` if the quote never
/// closes.
fn quoted_value(text: &str) -> Option<(String, usize)> {
    let mut chars = text.char_indices();
    let (_, quote) = chars.next()?;
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Some((value, i + c.len_utf8())),
            c => value.push(c),
        }
    }
    None
}

/// Reads an unquoted value up to the end of the line or the next key.
fn bare_value(text: &str) -> (&str, usize) {
    let line = text.split('\n').next().unwrap_or_default();
    let end = KEY_RE.find(line).map_or(line.len(), |m| m.start());
    let value = line[..end]
        .trim()
        .trim_start_matches(['"', '\''])
        .trim_end_matches([',', ';', '}'])
        .trim_end();
    (value, end)
}

fn parse_key_values(text: &str) -> Option<(Option<String>, Option<String>)> {
    let mut heading = None;
    let mut summary = None;
    let mut pos = 0;
    while let Some(cap) = KEY_RE.captures_at(text, pos) {
        let after = cap.get(0).map_or(text.len(), |m| m.end());
        let rest = &text[after..];
        let quoted = rest
            .starts_with(['"', '\''])
            .then(|| quoted_value(rest))
            .flatten();
        let (value, consumed) = match quoted {
            Some((value, consumed)) => (value.trim().to_owned(), consumed),
            None => {
                let (value, consumed) = bare_value(rest);
                (value.to_owned(), consumed)
            }
        };
        pos = after + consumed;
        if value.is_empty() {
            continue;
        }
        let slot = if cap[1].eq_ignore_ascii_case("heading") {
            &mut heading
        } else {
            &mut summary
        };
        slot.get_or_insert(value);
    }
    (heading.is_some() || summary.is_some()).then_some((heading, summary))
}

fn lenient(text: &str) -> Option<(Option<String>, Option<String>)> {
    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}'))
        && open < close
        && let Some(found) = parse_object(&text[open..=close])
    {
        return Some(found);
    }
    if let Some(found) = parse_object(&format!("{{{text}}}")) {
        return Some(found);
    }
    parse_key_values(text)
}

/// Parse a model reply into heading and summary.
///
/// Strict JSON after fence stripping is tried first, then permissive forms.
/// Fields that cannot be recovered take the `No ... Provided` sentinels.
#[must_use]
pub fn parse_metadata(raw: &str) -> ChunkMetadata {
    let text = strip_fences(raw);

    if let Ok(strict) = serde_json::from_str::<StrictMetadata>(text)
        && !strict.heading.trim().is_empty()
        && !strict.summary.trim().is_empty()
    {
        return ChunkMetadata {
            heading: strict.heading,
            summary: strict.summary,
            source: MetadataSource::Strict,
        };
    }

    match lenient(text) {
        Some((heading, summary)) => ChunkMetadata {
            heading: heading.unwrap_or_else(|| NO_HEADING.into()),
            summary: summary.unwrap_or_else(|| NO_SUMMARY.into()),
            source: MetadataSource::Lenient,
        },
        None => ChunkMetadata::fallback(),
    }
}

/// Asks the model for a heading and summary of each chunk.
#[derive(Debug, Clone)]
pub struct MetadataSynthesizer<P> {
    provider: P,
    template: PromptTemplate,
    stats: std::sync::Arc<MetadataStats>,
}

impl<P: LlmProvider> MetadataSynthesizer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            template: PromptTemplate::new(prompts::METADATA),
            stats: std::sync::Arc::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &MetadataStats {
        &self.stats
    }

    /// # Errors
    ///
    /// Returns [`crate::DocentError::Model`] if the model call fails. Parse
    /// failures never error; they fall back to sentinels.
    pub async fn synthesize(&self, chunk: &str) -> Result<ChunkMetadata> {
        let prompt = self.template.render(&[("text", chunk)]);
        let raw = self
            .provider
            .chat(
                &[Message::user(prompt)],
                GenerationOptions::with_temperature(0.0),
            )
            .await?;

        let metadata = parse_metadata(&raw);
        self.stats.record(metadata.source);
        match metadata.source {
            MetadataSource::Strict => {}
            MetadataSource::Lenient => {
                tracing::warn!(heading = %metadata.heading, "metadata recovered by lenient parser");
            }
            MetadataSource::Fallback => {
                tracing::warn!(reply = %raw, "unparseable metadata reply, using sentinels");
            }
        }
        Ok(metadata)
    }
}
