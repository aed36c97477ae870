//! Spreadsheet adapter: cell text, hyperlink labels, dropdown lists and sheet titles.

use super::{AdapterError, DocumentAdapter, LogProgress, ProgressObserver, SegmentCollector};
use crate::document::DocumentKind;
use crate::translate::BatchTranslationEngine;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;

static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*|\s+").expect("valid list separator regex"));
static CELL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("valid cell reference regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Stored formula, including the leading `=`.
    Formula(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    pub target: String,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub hyperlink: Option<Hyperlink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    List,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataValidation {
    pub kind: ValidationKind,
    /// Cells the rule applies to, e.g. `B2:B20`.
    pub sqref: String,
    pub formula1: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub title: String,
    /// Keyed by 1-based `(row, column)`; iteration is row-major.
    pub cells: BTreeMap<(u32, u32), Cell>,
    pub data_validations: Vec<DataValidation>,
}

impl Sheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn set_value(&mut self, row: u32, column: u32, value: CellValue) -> &mut Cell {
        let cell = self.cells.entry((row, column)).or_default();
        cell.value = Some(value);
        cell
    }

    pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    pub fn text(&self, row: u32, column: u32) -> Option<&str> {
        match self.cell(row, column)?.value.as_ref()? {
            CellValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn collect_cells(&self, range: Option<&CellRange>) -> SegmentCollector<(u32, u32)> {
        let mut collector = SegmentCollector::new();
        for (&(row, column), cell) in &self.cells {
            if range.is_some_and(|range| !range.contains(row, column)) {
                continue;
            }
            if let Some(CellValue::Text(text)) = &cell.value {
                if is_translatable_text(text) {
                    collector.push((row, column), text.as_str());
                }
            }
        }
        collector
    }

    fn collect_hyperlinks(&self) -> SegmentCollector<(u32, u32)> {
        let mut collector = SegmentCollector::new();
        for (&position, cell) in &self.cells {
            let display = cell.hyperlink.as_ref().and_then(|link| link.display.as_deref());
            if let Some(display) = display.filter(|display| !display.is_empty()) {
                collector.push(position, display);
            }
        }
        collector
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Which sheets to translate, optionally restricted to one cell range.
///
/// With a range only the cells inside it are translated; hyperlinks and
/// dropdown lists are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSelection {
    pub sheets: Option<Vec<String>>,
    pub range: Option<CellRange>,
}

impl SheetSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn sheets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sheets: Some(names.into_iter().map(Into::into).collect()),
            range: None,
        }
    }

    pub fn with_range(mut self, range: CellRange) -> Self {
        self.range = Some(range);
        self
    }
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, title: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.title == title)
    }

    pub fn sheet_mut(&mut self, title: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.title == title)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.title.clone()).collect()
    }

    /// Translates the selected sheets, then their titles.
    ///
    /// `observer` receives `(sheets_done, sheets_selected)` after each sheet.
    pub fn translate_selection(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        selection: &SheetSelection,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(), AdapterError> {
        let names = match &selection.sheets {
            Some(names) => names.clone(),
            None => self.sheet_names(),
        };
        if let Some(missing) = names.iter().find(|name| self.sheet(name).is_none()) {
            return Err(AdapterError::UnknownSheet(missing.clone()));
        }

        let total = names.len();
        for (position, name) in names.iter().enumerate() {
            let Some(sheet) = self.sheet_mut(name) else {
                return Err(AdapterError::UnknownSheet(name.clone()));
            };
            translate_sheet(sheet, engine, target_lang, selection.range.as_ref());
            observer.on_progress(position + 1, total);
        }

        self.translate_titles(engine, target_lang, &names);
        Ok(())
    }

    fn translate_titles(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        names: &[String],
    ) {
        if names.is_empty() {
            return;
        }
        // positions are fixed before any rename so a new title matching a
        // later name cannot retarget that lookup
        let positions: Vec<Option<usize>> = names
            .iter()
            .map(|name| self.sheets.iter().position(|sheet| &sheet.title == name))
            .collect();
        let translated = engine.translate_batch(names, target_lang);
        for (position, new) in positions.into_iter().zip(translated) {
            if let Some(sheet) = position.and_then(|index| self.sheets.get_mut(index)) {
                sheet.title = sanitize_sheet_title(&new);
            }
        }
    }
}

impl DocumentAdapter for Workbook {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Spreadsheet
    }

    fn translate(
        &mut self,
        engine: &mut BatchTranslationEngine,
        target_lang: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(), AdapterError> {
        self.translate_selection(engine, target_lang, &SheetSelection::all(), observer)
    }
}

fn translate_sheet(
    sheet: &mut Sheet,
    engine: &mut BatchTranslationEngine,
    target_lang: &str,
    range: Option<&CellRange>,
) {
    let cells = sheet.collect_cells(range);
    info!("Processing sheet {}: {} cells", sheet.title, cells.len());
    let mut progress = LogProgress::new(format!("Processing sheet {}", sheet.title));
    for ((row, column), translation) in cells.translate_grouped(engine, target_lang, &mut progress) {
        sheet.set_value(row, column, CellValue::Text(translation));
    }

    if range.is_some() {
        return;
    }

    for (position, translation) in sheet.collect_hyperlinks().translate_all(engine, target_lang) {
        if let Some(link) = sheet
            .cells
            .get_mut(&position)
            .and_then(|cell| cell.hyperlink.as_mut())
        {
            link.display = Some(translation);
        }
    }

    for validation in &mut sheet.data_validations {
        if validation.kind != ValidationKind::List {
            continue;
        }
        let items = validation
            .formula1
            .as_deref()
            .map(parse_list_formula)
            .unwrap_or_default();
        if items.is_empty() {
            continue;
        }
        let translated = engine.translate_batch(&items, target_lang);
        validation.formula1 = Some(encode_list_formula(&translated));
    }
}

pub fn is_formula(value: &CellValue) -> bool {
    match value {
        CellValue::Formula(_) => true,
        CellValue::Text(text) => text.starts_with('='),
        _ => false,
    }
}

/// Non-blank text that is not a formula.
pub fn is_translatable_cell(value: &CellValue) -> bool {
    match value {
        CellValue::Text(text) => is_translatable_text(text),
        _ => false,
    }
}

fn is_translatable_text(text: &str) -> bool {
    !text.starts_with('=') && !text.trim().is_empty()
}

/// Items of an inline list validation such as `"Yes, No Maybe"`.
pub fn parse_list_formula(formula: &str) -> Vec<String> {
    let unquoted = formula.replace('"', "");
    LIST_SEPARATOR
        .split(&unquoted)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn encode_list_formula<S: AsRef<str>>(items: &[S]) -> String {
    let joined: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    format!("\"{}\"", joined.join(","))
}

/// Sheet titles may not contain `/`.
pub fn sanitize_sheet_title(title: &str) -> String {
    title.replace('/', " ")
}

/// Rectangular `A1:C10` style range with 1-based, inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_column: u32,
    pub last_row: u32,
    pub last_column: u32,
}

impl CellRange {
    pub fn contains(&self, row: u32, column: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&column)
    }
}

impl FromStr for CellRange {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| AdapterError::InvalidRange {
            range: s.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = match trimmed.split_once(':') {
            Some((start, end)) => (start, end),
            None => (trimmed, trimmed),
        };
        let (row_a, col_a) = parse_cell_ref(start).ok_or_else(|| invalid("bad start cell"))?;
        let (row_b, col_b) = parse_cell_ref(end).ok_or_else(|| invalid("bad end cell"))?;

        Ok(Self {
            first_row: row_a.min(row_b),
            first_column: col_a.min(col_b),
            last_row: row_a.max(row_b),
            last_column: col_a.max(col_b),
        })
    }
}

fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let captures = CELL_REF.captures(reference.trim())?;
    let column = column_index(&captures[1])?;
    let row: u32 = captures[2].parse().ok()?;
    (row > 0).then_some((row, column))
}

/// `A` → 1, `Z` → 26, `AA` → 27.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, ch| {
        let ch = ch.to_ascii_uppercase();
        ch.is_ascii_uppercase()
            .then(|| acc * 26 + (ch as u32 - 'A' as u32 + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::upper_engine;
    use crate::adapters::NoProgress;
    use crate::ai::{RemoteError, RemoteTranslator, TranslationRequest};
    use crate::config::EngineConfig;
    use crate::time::RecordingSleeper;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    fn sample_sheet(title: &str) -> Sheet {
        let mut sheet = Sheet::new(title);
        sheet.set_value(1, 1, text("hello"));
        sheet.set_value(1, 2, CellValue::Formula("=SUM(A2:A3)".into()));
        sheet.set_value(2, 1, text("=not translated"));
        sheet.set_value(2, 2, text("   "));
        sheet.set_value(3, 1, CellValue::Number(3.5));
        sheet.set_value(3, 2, text("world")).hyperlink = Some(Hyperlink {
            target: "https://example.com".into(),
            display: Some("link".into()),
        });
        sheet.data_validations.push(DataValidation {
            kind: ValidationKind::List,
            sqref: "C1:C10".into(),
            formula1: Some("\"yes, no maybe\"".into()),
        });
        sheet.data_validations.push(DataValidation {
            kind: ValidationKind::Other("whole".into()),
            sqref: "D1".into(),
            formula1: Some("0".into()),
        });
        sheet
    }

    #[test]
    fn formula_detection() {
        assert!(is_formula(&CellValue::Formula("=A1".into())));
        assert!(is_formula(&text("=1+1")));
        assert!(!is_formula(&text(" =1+1")));
        assert!(!is_formula(&CellValue::Bool(true)));
    }

    #[test]
    fn translatable_cells() {
        assert!(is_translatable_cell(&text("Total")));
        assert!(!is_translatable_cell(&text("=A1")));
        assert!(!is_translatable_cell(&text(" \t")));
        assert!(!is_translatable_cell(&CellValue::Number(1.0)));
    }

    #[test]
    fn list_formulas() {
        assert_eq!(parse_list_formula("\"Yes, No  Maybe,\""), vec!["Yes", "No", "Maybe"]);
        assert!(parse_list_formula("\"\"").is_empty());
        assert_eq!(encode_list_formula(&["Oui", "Non"]), "\"Oui,Non\"");
    }

    #[test]
    fn sheet_titles_drop_slashes() {
        assert_eq!(sanitize_sheet_title("Q1/Q2 report"), "Q1 Q2 report");
    }

    #[test]
    fn ranges_parse_and_normalize() {
        let range: CellRange = "c10:A2".parse().unwrap();
        assert_eq!(
            range,
            CellRange {
                first_row: 2,
                first_column: 1,
                last_row: 10,
                last_column: 3
            }
        );
        assert!(range.contains(5, 2));
        assert!(!range.contains(11, 2));

        let single: CellRange = "$AA$7".parse().unwrap();
        assert!(single.contains(7, 27));
        assert!(matches!(
            "A0:B2".parse::<CellRange>(),
            Err(AdapterError::InvalidRange { .. })
        ));
        assert!("1A".parse::<CellRange>().is_err());
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("z"), Some(26));
        assert_eq!(column_index("AB"), Some(28));
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn translates_cells_links_lists_and_titles() {
        let (mut engine, _) = upper_engine();
        let mut workbook = Workbook::new(vec![sample_sheet("Sales/2024")]);
        let mut progress = Vec::new();

        workbook
            .translate_selection(
                &mut engine,
                "English",
                &SheetSelection::all(),
                &mut |done: usize, total: usize| progress.push((done, total)),
            )
            .unwrap();

        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.title, "SALES 2024");
        assert_eq!(sheet.text(1, 1), Some("HELLO"));
        assert_eq!(sheet.text(2, 1), Some("=not translated"));
        assert_eq!(sheet.text(2, 2), Some("   "));
        assert_eq!(sheet.text(3, 2), Some("WORLD"));
        assert_eq!(
            sheet.cell(3, 2).unwrap().hyperlink.as_ref().unwrap().display.as_deref(),
            Some("LINK")
        );
        assert_eq!(sheet.data_validations[0].formula1.as_deref(), Some("\"YES,NO,MAYBE\""));
        assert_eq!(sheet.data_validations[1].formula1.as_deref(), Some("0"));
        assert_eq!(progress, vec![(1, 1)]);
    }

    #[test]
    fn range_mode_skips_links_and_lists() {
        let (mut engine, _) = upper_engine();
        let mut workbook = Workbook::new(vec![sample_sheet("Data"), sample_sheet("Other")]);
        let selection = SheetSelection::sheets(["Data"]).with_range("A1:A3".parse().unwrap());

        workbook
            .translate_selection(&mut engine, "English", &selection, &mut NoProgress)
            .unwrap();

        let data = workbook.sheet("DATA").unwrap();
        assert_eq!(data.text(1, 1), Some("HELLO"));
        assert_eq!(data.text(3, 2), Some("world"));
        assert_eq!(
            data.cell(3, 2).unwrap().hyperlink.as_ref().unwrap().display.as_deref(),
            Some("link")
        );
        assert_eq!(data.data_validations[0].formula1.as_deref(), Some("\"yes, no maybe\""));

        let other = workbook.sheet("Other").unwrap();
        assert_eq!(other.text(1, 1), Some("hello"));
    }

    /// Maps each title to the next one in `chain`.
    struct Successor {
        chain: Vec<&'static str>,
    }

    impl RemoteTranslator for Successor {
        fn name(&self) -> &'static str {
            "successor"
        }

        fn translate(&mut self, request: &TranslationRequest<'_>) -> Result<String, RemoteError> {
            let out: Vec<String> = request
                .texts
                .iter()
                .map(|text| {
                    let at = self.chain.iter().position(|name| name == text).unwrap();
                    self.chain[at + 1].to_string()
                })
                .collect();
            Ok(serde_json::to_string(&out).unwrap())
        }
    }

    #[test]
    fn each_sheet_is_renamed_once() {
        let mut engine = BatchTranslationEngine::builder(EngineConfig::default())
            .sleeper(RecordingSleeper::new())
            .build(Box::new(Successor {
                chain: vec!["First", "Second", "Third"],
            }));
        let mut workbook = Workbook::new(vec![Sheet::new("First"), Sheet::new("Second")]);

        workbook
            .translate_selection(&mut engine, "English", &SheetSelection::all(), &mut NoProgress)
            .unwrap();

        assert_eq!(workbook.sheet_names(), vec!["Second", "Third"]);
    }

    #[test]
    fn unknown_sheet_is_rejected_before_any_call() {
        let (mut engine, requests) = upper_engine();
        let mut workbook = Workbook::new(vec![sample_sheet("Data")]);
        let err = workbook
            .translate_selection(
                &mut engine,
                "English",
                &SheetSelection::sheets(["Missing"]),
                &mut NoProgress,
            )
            .unwrap_err();

        assert_eq!(err, AdapterError::UnknownSheet("Missing".into()));
        assert!(requests.lock().unwrap().is_empty());
    }
}
