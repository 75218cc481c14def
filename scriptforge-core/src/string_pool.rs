//! Deduplicated string constants of a generated program.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault};

/// Content-addressed table of string constants.
///
/// Lookups go through a 64-bit hash of the value, but a hash hit is
/// confirmed by comparing the stored text, so two different strings that
/// happen to share a hash still get separate constants.
///
/// The default hasher is the standard library's `DefaultHasher` (SipHash),
/// not a CRC-64 style checksum. Constants are only ever compared within
/// one compilation, so hash values need not be stable across builds, and
/// the hit check makes the pool correct under any hash function.
#[derive(Debug, Clone)]
pub struct StringPool<S = BuildHasherDefault<DefaultHasher>> {
    strings: Vec<String>,
    by_hash: HashMap<u64, Vec<usize>>,
    hasher: S,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        Self::with_hasher(BuildHasherDefault::default())
    }
}

impl<S: BuildHasher> StringPool<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            strings: Vec::new(),
            by_hash: HashMap::new(),
            hasher,
        }
    }

    /// Returns the constant name for `value`, registering it on first sight.
    pub fn intern(&mut self, value: &str) -> String {
        let hash = self.hasher.hash_one(value);
        let candidates = self.by_hash.entry(hash).or_default();
        if let Some(&index) = candidates
            .iter()
            .find(|&&index| self.strings[index] == value)
        {
            return const_name(index);
        }
        let index = self.strings.len();
        if !candidates.is_empty() {
            tracing::debug!(index, "string constant shares a hash with an earlier one");
        }
        candidates.push(index);
        self.strings.push(value.to_string());
        tracing::trace!(index, "interned string constant");
        const_name(index)
    }

    /// Interned strings in first-seen order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }
}

pub fn const_name(index: usize) -> String {
    format!("STR{index}")
}

/// Renders `input` as a string literal of the target language.
///
/// Text free of backticks, `%` and `$` goes into a raw backtick literal;
/// anything else becomes a double-quoted literal with `\` and `"` escaped.
pub fn quote_literal(input: &str) -> String {
    if input.contains(['`', '%', '$']) {
        let escaped = input.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        format!("`{input}`")
    }
}
