use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Spreadsheet,
    Presentation,
    WordProcessing,
    /// Translated through its word-processing conversion.
    Pdf,
}

impl DocumentKind {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 5] = ["xlsx", "xls", "pptx", "pdf", "docx"];

    /// Detect kind from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            "pptx" => Some(Self::Presentation),
            "docx" => Some(Self::WordProcessing),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect kind from path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type of the translated file.
    pub fn output_mime_type(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Presentation => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::WordProcessing | Self::Pdf => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// `({lang})_{name}`; PDFs come out as `.docx`.
    pub fn output_file_name(&self, file_name: &str, target_lang: &str) -> String {
        match self {
            Self::Pdf => {
                let stem = Path::new(file_name)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or(file_name);
                format!("({target_lang})_{stem}.docx")
            }
            _ => format!("({target_lang})_{file_name}"),
        }
    }
}
