//! Batch translation engine: normalization, cache, token-bounded batching and
//! the retrying client, composed behind [`BatchTranslationEngine::translate_batch`].

pub mod batcher;
pub mod cache;
pub mod client;
pub mod tokens;

use crate::ai::{GeminiTranslator, RemoteError, RemoteTranslator, TranslationPrompt};
use crate::config::{EngineConfig, TranslatorConfig};
use crate::time::{Sleeper, ThreadSleeper};
use log::{debug, error};

pub use batcher::{Batch, Batcher, TranslationUnit};
pub use cache::{normalize_text, CacheKey, CacheStats, TranslationCache};
pub use client::{BatchFailure, SlotTranslation, TranslationClient};
pub use tokens::TokenEstimator;

pub struct BatchTranslationEngine {
    client: TranslationClient,
    batcher: Batcher,
    cache: TranslationCache,
}

pub struct EngineBuilder {
    config: EngineConfig,
    file_description: Option<String>,
    sleeper: Box<dyn Sleeper>,
    cache: TranslationCache,
}

impl EngineBuilder {
    pub fn file_description(mut self, description: impl Into<String>) -> Self {
        self.file_description = Some(description.into());
        self
    }

    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Starts from an existing cache, e.g. one carried over from an earlier run.
    pub fn cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn build(self, remote: Box<dyn RemoteTranslator>) -> BatchTranslationEngine {
        let client = TranslationClient::new(
            remote,
            TranslationPrompt::new(self.file_description),
            self.config.retry_policy(),
            self.config.request_delay(),
            self.sleeper,
        );
        BatchTranslationEngine {
            client,
            batcher: Batcher::new(
                self.config.max_tokens_per_request,
                TokenEstimator::new(self.config.chars_per_token),
            ),
            cache: self.cache,
        }
    }
}

impl BatchTranslationEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            file_description: None,
            sleeper: Box::new(ThreadSleeper),
            cache: TranslationCache::new(),
        }
    }

    /// Engine with default settings and real sleeps.
    pub fn new(remote: Box<dyn RemoteTranslator>, file_description: Option<String>) -> Self {
        let mut builder = Self::builder(EngineConfig::default());
        builder.file_description = file_description;
        builder.build(remote)
    }

    /// Engine backed by Gemini with the given API key.
    pub fn gemini(
        api_key: impl Into<String>,
        file_description: Option<String>,
        config: &TranslatorConfig,
    ) -> Result<Self, RemoteError> {
        let remote = GeminiTranslator::new(&config.gemini)?.with_api_key(Some(api_key.into()));
        let mut builder = Self::builder(config.engine.clone());
        builder.file_description = file_description;
        Ok(builder.build(Box::new(remote)))
    }

    pub fn batcher(&self) -> &Batcher {
        &self.batcher
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn into_cache(self) -> TranslationCache {
        self.cache
    }

    /// Remote invocations so far, retries and split halves included.
    pub fn remote_calls(&self) -> u64 {
        self.client.remote_calls()
    }

    /// Translates `texts` into `target_lang`.
    ///
    /// The result always has one entry per input, in input order. Cached texts
    /// are answered without a remote call; texts of a batch whose retries ran
    /// out come back unchanged.
    pub fn translate_batch<S: AsRef<str>>(&mut self, texts: &[S], target_lang: &str) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let mut slots: Vec<Option<String>> = vec![None; texts.len()];
        let mut misses = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            let normalized = normalize_text(text.as_ref());
            match self.cache.lookup(&normalized, target_lang) {
                Some(hit) => slots[index] = Some(hit.to_string()),
                None => misses.push(TranslationUnit::new(index, normalized)),
            }
        }

        if !misses.is_empty() {
            let batches = self.batcher.pack(misses);
            let total = batches.len();
            for (position, batch) in batches.into_iter().enumerate() {
                debug!(
                    "Dispatching batch {}/{} ({} texts, ~{} tokens)",
                    position + 1,
                    total,
                    batch.len(),
                    batch.estimated_tokens()
                );
                self.dispatch(batch, target_lang, texts, &mut slots);
            }
        }

        let stats = self.cache.stats();
        debug!(
            "Cache: {} entries, {} hits, {} misses",
            self.cache.len(),
            stats.hits,
            stats.misses
        );

        slots
            .into_iter()
            .zip(texts)
            .map(|(slot, original)| slot.unwrap_or_else(|| original.as_ref().to_string()))
            .collect()
    }

    fn dispatch<S: AsRef<str>>(
        &mut self,
        batch: Batch,
        target_lang: &str,
        originals: &[S],
        slots: &mut [Option<String>],
    ) {
        match self.client.call(&batch.texts(), target_lang) {
            Ok(translations) => {
                for (unit, translation) in batch.units().iter().zip(translations) {
                    match translation {
                        SlotTranslation::Translated(text) => {
                            self.cache.store(&unit.text, target_lang, text.clone());
                            slots[unit.index] = Some(text);
                        }
                        SlotTranslation::Degraded => slots[unit.index] = Some(String::new()),
                    }
                }
            }
            Err(failure) => {
                error!("{failure}. Returning original text for failed translations.");
                for unit in batch.units() {
                    if slots[unit.index].is_none() {
                        slots[unit.index] = Some(originals[unit.index].as_ref().to_string());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TranslationRequest;
    use crate::time::RecordingSleeper;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Tagging {
        calls: Arc<AtomicUsize>,
    }

    impl RemoteTranslator for Tagging {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn translate(&mut self, request: &TranslationRequest<'_>) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let out: Vec<String> = request.texts.iter().map(|t| format!("T:{t}")).collect();
            Ok(serde_json::to_string(&out).unwrap())
        }
    }

    fn engine() -> (BatchTranslationEngine, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = BatchTranslationEngine::builder(EngineConfig::default())
            .sleeper(RecordingSleeper::new())
            .build(Box::new(Tagging {
                calls: Arc::clone(&calls),
            }));
        (engine, calls)
    }

    #[test]
    fn empty_input_short_circuits() {
        let (mut engine, calls) = engine();
        let empty: [&str; 0] = [];
        assert!(engine.translate_batch(&empty, "French").is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sends_normalized_text_and_caches_under_it() {
        let (mut engine, calls) = engine();
        let result = engine.translate_batch(&["  Hello\n\n\nthere\t\t"], "French");
        assert_eq!(result, vec!["T:Hello\nthere".to_string()]);
        assert_eq!(engine.cache().peek("Hello\nthere", "French"), Some("T:Hello\nthere"));

        // differently padded input normalizes to the same key
        let again = engine.translate_batch(&["Hello\n\nthere "], "French");
        assert_eq!(again, result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mixes_cache_hits_and_misses_in_order() {
        let (mut engine, calls) = engine();
        engine.translate_batch(&["b"], "German");

        let result = engine.translate_batch(&["a", "b", "c"], "German");
        assert_eq!(result, vec!["T:a", "T:b", "T:c"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache().stats().hits, 1);
    }

    #[test]
    fn oversized_inputs_are_split_into_several_requests() {
        let (mut engine, calls) = engine();
        let long = "y".repeat(1200);
        let result = engine.translate_batch(&[long.as_str(), long.as_str()], "Spanish");

        assert_eq!(result.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_can_be_carried_into_a_new_engine() {
        let (mut first, _) = engine();
        first.translate_batch(&["carry"], "Chinese");
        let cache = first.into_cache();

        let calls = Arc::new(AtomicUsize::new(0));
        let mut second = BatchTranslationEngine::builder(EngineConfig::default())
            .sleeper(RecordingSleeper::new())
            .cache(cache)
            .build(Box::new(Tagging {
                calls: Arc::clone(&calls),
            }));

        assert_eq!(second.translate_batch(&["carry"], "Chinese"), vec!["T:carry"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.remote_calls(), 0);
    }
}
