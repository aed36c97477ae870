//! Document adapters: walk an in-memory document model, hand its text to the
//! engine and write the translations back to the same positions.
//!
//! Parsing and serializing the actual OOXML containers is left to callers;
//! adapters only see the already-loaded structure.
pub mod presentation;
pub mod spreadsheet;
pub mod word;

use crate::document::DocumentKind;
use crate::translate::{BatchTranslationEngine, TranslationUnit};
use log::info;
use thiserror::Error;

pub use presentation::{Presentation, Shape, Slide, TextFrame};
pub use spreadsheet::{CellRange, SheetSelection, Workbook};
pub use word::WordDocument;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("Invalid cell range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },
}

/// Receives `(done, total)` updates while a document is translated.
pub trait ProgressObserver {
    fn on_progress(&mut self, done: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: FnMut(usize, usize),
{
    fn on_progress(&mut self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Observer that only logs.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, done: usize, total: usize) {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        info!("{}: {}% ({}/{})", self.label, percent, done, total);
    }
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _done: usize, _total: usize) {}
}

/// A loaded document whose text can be translated in place.
pub trait DocumentAdapter {
    fn kind(&self) -> DocumentKind;

    fn translate(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(), AdapterError>;
}

/// Texts extracted from a document, each tagged with the position it goes back to.
#[derive(Debug, Clone)]
pub struct SegmentCollector<K> {
    keys: Vec<K>,
    texts: Vec<String>,
}

impl<K> Default for SegmentCollector<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            texts: Vec::new(),
        }
    }
}

impl<K> SegmentCollector<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, text: impl Into<String>) {
        self.keys.push(key);
        self.texts.push(text.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Translates everything with a single engine call.
    pub fn translate_all(
        self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
    ) -> Vec<(K, String)> {
        if self.is_empty() {
            return Vec::new();
        }
        let translations = engine.translate_batch(&self.texts, target_lang);
        self.keys.into_iter().zip(translations).collect()
    }

    /// Translates in groups packed by the engine's batcher, notifying
    /// `observer` after each group with `(group, total_groups)`.
    pub fn translate_grouped(
        self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Vec<(K, String)> {
        let units = self
            .texts
            .iter()
            .enumerate()
            .map(|(index, text)| TranslationUnit::new(index, text.as_str()));
        let groups = engine.batcher().pack(units);
        let total = groups.len();

        let mut translated: Vec<Option<String>> = vec![None; self.texts.len()];
        for (position, group) in groups.into_iter().enumerate() {
            let texts = group.texts();
            let results = engine.translate_batch(&texts, target_lang);
            for (index, text) in group.indices().into_iter().zip(results) {
                translated[index] = Some(text);
            }
            observer.on_progress(position + 1, total);
        }

        self.keys
            .into_iter()
            .zip(translated.into_iter().zip(self.texts))
            .map(|(key, (translation, original))| (key, translation.unwrap_or(original)))
            .collect()
    }
}
