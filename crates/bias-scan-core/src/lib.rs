pub mod history;
pub mod notice;
pub mod report;
pub mod scanner;

pub use history::{AnalysisHistory, HistoryStore, DEFAULT_HISTORY_CAPACITY};
pub use notice::{Notice, NoticeLevel};
pub use scanner::{
    bias_scanner::BiasScanner, file_repository::FilePatternRepository, patterns::BuiltinPatterns,
    AnalysisResult, BiasBand, FlaggedPhrase, Pattern, PatternRepository, PatternValidationError,
    PhraseValidationError, Severity, Span,
};
