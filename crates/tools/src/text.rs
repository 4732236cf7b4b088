//! Case-insensitive phrase lookup with bounded context snippets.
//!
//! Text and phrases are lowercased with full Unicode case mapping. A
//! lowercase form can differ in byte length from the original, so every
//! byte of the lowered text keeps the offset of the original char it came
//! from.

/// Characters of context kept on each side of a match.
pub const SNIPPET_RADIUS: usize = 40;

/// A transcript prepared for repeated phrase lookups.
pub struct ScanText<'a> {
    original: &'a str,
    lowered: String,
    /// Original byte offset for each lowered byte, plus one end entry
    offsets: Vec<usize>,
}

impl<'a> ScanText<'a> {
    /// Prepare `text` for lookups.
    pub fn new(original: &'a str) -> Self {
        let mut lowered = String::with_capacity(original.len());
        let mut offsets = Vec::with_capacity(original.len() + 1);
        for (pos, ch) in original.char_indices() {
            lowered.extend(ch.to_lowercase());
            offsets.resize(lowered.len(), pos);
        }
        offsets.push(original.len());
        Self {
            original,
            lowered,
            offsets,
        }
    }

    /// Original byte span `[start, end)` of the first case-insensitive
    /// occurrence of `phrase`.
    pub fn span(&self, phrase: &str) -> Option<(usize, usize)> {
        let needle: String = phrase.chars().flat_map(char::to_lowercase).collect();
        if needle.trim().is_empty() {
            return None;
        }
        self.lowered
            .find(&needle)
            .map(|i| (self.offsets[i], self.offsets[i + needle.len()]))
    }

    /// Byte offset in the original text of the first occurrence of `phrase`.
    pub fn find(&self, phrase: &str) -> Option<usize> {
        self.span(phrase).map(|(start, _)| start)
    }

    /// Whether `phrase` occurs anywhere in the text.
    pub fn contains(&self, phrase: &str) -> bool {
        self.find(phrase).is_some()
    }

    /// Snippet around the first occurrence of `phrase`, if any.
    pub fn snippet_for(&self, phrase: &str) -> Option<String> {
        self.span(phrase)
            .map(|(start, end)| self.snippet(start, end, SNIPPET_RADIUS))
    }

    /// Context of `radius` bytes on each side of `[start, end)`, snapped to
    /// char boundaries and with whitespace collapsed.
    pub fn snippet(&self, start: usize, end: usize, radius: usize) -> String {
        let text = self.original;
        let end = end.min(text.len());
        let start = start.min(end);

        let mut lo = start.saturating_sub(radius);
        while lo < start && !text.is_char_boundary(lo) {
            lo += 1;
        }
        let mut hi = (end + radius).min(text.len());
        while hi > end && !text.is_char_boundary(hi) {
            hi -= 1;
        }

        let body = text[lo..hi].split_whitespace().collect::<Vec<_>>().join(" ");
        let prefix = if lo > 0 { "..." } else { "" };
        let suffix = if hi < text.len() { "..." } else { "" };
        format!("{}{}{}", prefix, body, suffix)
    }
}
