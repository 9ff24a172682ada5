//! Post-encoding character substitution.
//!
//! JSON that ends up reflected into an HTML page, or sniffed as UTF-7 by an
//! old browser, can execute. Replacing `+`, `<` and `>` with their `\uXXXX`
//! forms keeps the document equivalent as JSON while removing the bytes
//! those attacks need. The filter runs on the final encoded bytes so it also
//! catches characters the encoder itself produced.

use tracing::trace;

/// Default substitutions.
pub const DEFAULT_ESCAPES: [(char, &str); 3] = [('+', "\\u002b"), ('<', "\\u003c"), ('>', "\\u003e")];

/// One trigger character and its replacement; `None` disables the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeEntry {
    pub trigger: char,
    pub replacement: Option<String>,
}

/// Single-pass character substitution over encoded JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeFilter {
    entries: Vec<EscapeEntry>,
    /// Replacement index per ASCII byte, rebuilt on every table change
    ascii_lookup: [Option<usize>; 128],
    has_non_ascii: bool,
}

impl EscapeFilter {
    /// A filter with no entries; `escape` is the identity
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            ascii_lookup: [None; 128],
            has_non_ascii: false,
        }
    }

    /// Enable `trigger`, replacing it with `replacement`
    pub fn set(mut self, trigger: char, replacement: impl Into<String>) -> Self {
        self.upsert(trigger, Some(replacement.into()));
        self
    }

    /// Disable `trigger`; occurrences pass through untouched
    pub fn disable(mut self, trigger: char) -> Self {
        self.upsert(trigger, None);
        self
    }

    /// Overlay entries key-by-key; overlay entries win
    pub fn overlay<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (char, Option<String>)>,
    {
        for (trigger, replacement) in entries {
            self.upsert(trigger, replacement);
        }
        self
    }

    pub fn entries(&self) -> &[EscapeEntry] {
        &self.entries
    }

    /// Replacement for `trigger` if the entry is enabled
    pub fn replacement(&self, trigger: char) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.trigger == trigger)
            .and_then(|e| e.replacement.as_deref())
    }

    /// Whether no entry is enabled
    pub fn is_noop(&self) -> bool {
        self.entries.iter().all(|e| e.replacement.is_none())
    }

    /// Replace every enabled trigger in `input`.
    pub fn escape(&self, input: &[u8]) -> Vec<u8> {
        if self.is_noop() {
            return input.to_vec();
        }

        if self.has_non_ascii {
            return self.escape_chars(&String::from_utf8_lossy(input)).into_bytes();
        }

        // ASCII bytes never occur inside a multi-byte UTF-8 sequence, so a
        // byte scan is exact for ASCII triggers.
        let mut out = Vec::with_capacity(input.len() + input.len() / 8);
        let mut replaced = 0usize;
        for &byte in input {
            match self.ascii_replacement(byte) {
                Some(replacement) => {
                    out.extend_from_slice(replacement.as_bytes());
                    replaced += 1;
                }
                None => out.push(byte),
            }
        }
        trace!(replaced, "escape filter applied");
        out
    }

    /// [`escape`](Self::escape) for text
    pub fn escape_str(&self, input: &str) -> String {
        if self.has_non_ascii {
            return self.escape_chars(input);
        }
        let bytes = self.escape(input.as_bytes());
        // Replacements are `String`s, so the output is valid UTF-8
        String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }

    fn escape_chars(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match self.replacement(c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        out
    }

    fn ascii_replacement(&self, byte: u8) -> Option<&str> {
        if !byte.is_ascii() {
            return None;
        }
        self.ascii_lookup[byte as usize]
            .and_then(|idx| self.entries[idx].replacement.as_deref())
    }

    fn upsert(&mut self, trigger: char, replacement: Option<String>) {
        match self.entries.iter_mut().find(|e| e.trigger == trigger) {
            Some(entry) => entry.replacement = replacement,
            None => self.entries.push(EscapeEntry {
                trigger,
                replacement,
            }),
        }
        self.rebuild_lookup();
    }

    fn rebuild_lookup(&mut self) {
        self.ascii_lookup = [None; 128];
        self.has_non_ascii = false;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.replacement.is_none() {
                continue;
            }
            if entry.trigger.is_ascii() {
                self.ascii_lookup[entry.trigger as usize] = Some(idx);
            } else {
                self.has_non_ascii = true;
            }
        }
    }
}

impl Default for EscapeFilter {
    fn default() -> Self {
        DEFAULT_ESCAPES
            .iter()
            .fold(Self::empty(), |filter, (trigger, replacement)| {
                filter.set(*trigger, *replacement)
            })
    }
}
