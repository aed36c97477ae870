use super::{AdapterError, DocumentAdapter, NoProgress, ProgressObserver, SegmentCollector};
use crate::document::DocumentKind;
use crate::translate::BatchTranslationEngine;
use log::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTable {
    pub rows: Vec<Vec<String>>,
}

/// Paragraph and table text of a word-processing document. PDFs are
/// converted to this form before translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDocument {
    pub paragraphs: Vec<String>,
    pub tables: Vec<WordTable>,
}

/// Trimmed text that is neither empty nor purely numeric.
pub fn is_translatable_paragraph(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.chars().all(char::is_numeric)
}

impl WordDocument {
    pub fn new(paragraphs: Vec<String>, tables: Vec<WordTable>) -> Self {
        Self { paragraphs, tables }
    }

    fn translate_paragraphs(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) {
        let mut collector = SegmentCollector::new();
        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            if is_translatable_paragraph(paragraph) {
                collector.push(index, paragraph.trim());
            }
        }
        for (index, text) in collector.translate_grouped(engine, target_lang, observer) {
            self.paragraphs[index] = text;
        }
    }

    fn translate_tables(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) {
        let total = self.tables.len();
        for (position, table) in self.tables.iter_mut().enumerate() {
            let mut collector = SegmentCollector::new();
            for (row, cells) in table.rows.iter().enumerate() {
                for (column, text) in cells.iter().enumerate() {
                    if is_translatable_paragraph(text) {
                        collector.push((row, column), text.trim());
                    }
                }
            }
            for ((row, column), text) in collector.translate_grouped(engine, target_lang, &mut NoProgress) {
                table.rows[row][column] = text;
            }
            observer.on_progress(position + 1, total);
        }
    }
}

impl DocumentAdapter for WordDocument {
    fn kind(&self) -> DocumentKind {
        DocumentKind::WordProcessing
    }

    /// Observer sees `(group, groups)` while paragraphs are sent, then
    /// `(table, tables)` once per table.
    fn translate(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(), AdapterError> {
        info!("Translating paragraphs");
        self.translate_paragraphs(engine, target_lang, observer);
        info!("Translating tables");
        self.translate_tables(engine, target_lang, observer);
        Ok(())
    }
}
