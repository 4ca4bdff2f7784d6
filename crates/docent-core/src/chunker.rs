//! Boundary-aware text splitter with exact character overlap.

/// Cut points in priority order. Separators on the same level compete on
/// position only.
const SEPARATOR_LEVELS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "? ", "! "], &[" "]];

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl SplitterConfig {
    /// Size is at least 1 and overlap strictly below size.
    #[must_use]
    pub fn normalized(self) -> Self {
        let chunk_size = self.chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: self.chunk_overlap.min(chunk_size - 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        let normalized = config.normalized();
        if normalized != config {
            tracing::warn!(
                chunk_size = normalized.chunk_size,
                chunk_overlap = normalized.chunk_overlap,
                "clamped splitter configuration"
            );
        }
        Self { config: normalized }
    }

    #[must_use]
    pub fn config(&self) -> SplitterConfig {
        self.config
    }

    /// Split `text` into chunks of at most `chunk_size` chars. Each chunk
    /// after the first starts with the last `chunk_overlap` chars of its
    /// predecessor.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let SplitterConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        } = self.config;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            if chars.len() - start <= size {
                chunks.push(chars[start..].iter().collect());
                break;
            }
            let end = find_cut(&chars, start, start + overlap + 1, start + size);
            chunks.push(chars[start..end].iter().collect());
            start = end - overlap;
        }
        chunks
    }
}

/// Best cut position in `[min_end, max_end]`: the latest position right after
/// the highest-priority separator found, or `max_end` for a hard cut.
fn find_cut(chars: &[char], start: usize, min_end: usize, max_end: usize) -> usize {
    for level in SEPARATOR_LEVELS {
        let best = (min_end..=max_end)
            .rev()
            .find(|&end| level.iter().any(|sep| ends_with(chars, start, end, sep)));
        if let Some(end) = best {
            return end;
        }
    }
    max_end
}

fn ends_with(chars: &[char], start: usize, end: usize, sep: &str) -> bool {
    let n = sep.chars().count();
    end >= start + n && chars[end - n..end].iter().copied().eq(sep.chars())
}

/// Convenience wrapper over [`TextSplitter`].
#[must_use]
pub fn split(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    TextSplitter::new(SplitterConfig {
        chunk_size,
        chunk_overlap,
    })
    .split(text)
}
