pub mod adapters;
pub mod ai;
pub mod config;
pub mod document;
pub mod language;
pub mod time;
pub mod translate;

pub use adapters::{
    AdapterError, DocumentAdapter, LogProgress, NoProgress, ProgressObserver, SegmentCollector,
};
pub use ai::{GeminiTranslator, RemoteError, RemoteTranslator, TranslationPrompt, TranslationRequest};
pub use config::{ConfigError, EngineConfig, GeminiConfig, TranslatorConfig};
pub use document::DocumentKind;
pub use language::{Language, UnknownLanguage};
pub use time::{RecordingSleeper, Sleeper, ThreadSleeper};
pub use translate::{BatchTranslationEngine, CacheStats, EngineBuilder, TranslationCache};
