use super::{AdapterError, DocumentAdapter, ProgressObserver, SegmentCollector};
use crate::document::DocumentKind;
use crate::translate::BatchTranslationEngine;
use log::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// One paragraph per entry, one run per string.
    pub fn from_runs<I, P, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraphs: paragraphs
                .into_iter()
                .map(|runs| Paragraph {
                    runs: runs.into_iter().map(Run::new).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Cell text, row by row.
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Text(TextFrame),
    Group(Vec<Shape>),
    Table(Table),
    /// Pictures, charts and anything else without text.
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }
}

impl DocumentAdapter for Presentation {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Presentation
    }

    /// Tables are translated one call per table; all remaining run text of a
    /// slide goes out in one call. Slides without run text are skipped and
    /// not counted as progress.
    fn translate(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(), AdapterError> {
        let total = self.slides.len();
        let mut processed = 0;

        for (position, slide) in self.slides.iter_mut().enumerate() {
            translate_tables(&mut slide.shapes, engine, target_lang);

            let mut runs = Vec::new();
            collect_runs(&mut slide.shapes, &mut runs);
            if runs.is_empty() {
                info!("Slide {} has no text. Skipping", position + 1);
                continue;
            }

            info!("Process slide {}", position + 1);
            let texts: Vec<String> = runs.iter().map(|run| run.text.clone()).collect();
            let translated = engine.translate_batch(&texts, target_lang);
            for (run, text) in runs.into_iter().zip(translated) {
                run.text = text;
            }

            processed += 1;
            observer.on_progress(processed, total);
        }
        Ok(())
    }
}

fn collect_runs<'a>(shapes: &'a mut [Shape], out: &mut Vec<&'a mut Run>) {
    for shape in shapes {
        match shape {
            Shape::Text(frame) => {
                for paragraph in &mut frame.paragraphs {
                    out.extend(paragraph.runs.iter_mut());
                }
            }
            Shape::Group(children) => collect_runs(children, out),
            Shape::Table(_) | Shape::Other => {}
        }
    }
}

fn translate_tables(shapes: &mut [Shape], engine: &mut BatchTranslationEngine, target_lang: &str) {
    for shape in shapes {
        match shape {
            Shape::Table(table) => translate_table(table, engine, target_lang),
            Shape::Group(children) => translate_tables(children, engine, target_lang),
            Shape::Text(_) | Shape::Other => {}
        }
    }
}

fn translate_table(table: &mut Table, engine: &mut BatchTranslationEngine, target_lang: &str) {
    let mut cells = SegmentCollector::new();
    for (row, texts) in table.rows.iter().enumerate() {
        for (column, text) in texts.iter().enumerate() {
            if !text.is_empty() {
                cells.push((row, column), text.as_str());
            }
        }
    }
    for ((row, column), text) in cells.translate_all(engine, target_lang) {
        table.rows[row][column] = text;
    }
}
