use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("valid newline regex"));
static TAB_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+").expect("valid tab regex"));

/// Collapses repeated newlines and tabs, then trims surrounding whitespace.
pub fn normalize_text(text: &str) -> String {
    let collapsed = NEWLINE_RUNS.replace_all(text, "\n");
    let collapsed = TAB_RUNS.replace_all(&collapsed, "\t");
    collapsed.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub target_lang: String,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Unbounded memo of finished translations, keyed by normalized source text
/// and target language. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    entries: HashMap<CacheKey, String>,
    stats: CacheStats,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an already normalized text and updates hit/miss counters.
    pub fn lookup(&mut self, text: &str, target_lang: &str) -> Option<&str> {
        let key = CacheKey::new(text, target_lang);
        match self.entries.get(&key) {
            Some(translated) => {
                self.stats.hits += 1;
                Some(translated.as_str())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Lookup without touching the counters.
    pub fn peek(&self, text: &str, target_lang: &str) -> Option<&str> {
        self.entries
            .get(&CacheKey::new(text, target_lang))
            .map(String::as_str)
    }

    pub fn store(&mut self, text: &str, target_lang: &str, translated: impl Into<String>) {
        self.entries
            .insert(CacheKey::new(text, target_lang), translated.into());
        self.stats.stores += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
