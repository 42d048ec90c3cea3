pub mod ai_prompt;
pub mod analytics;
pub mod app;
pub mod data_source;
pub mod legal_document;
pub mod library;
pub mod procedure;
pub mod prompt;
pub mod qa_prompt;
pub mod session;
pub mod style_guide;
pub mod writing_style;

pub use ai_prompt::{AiImagePrompt, AiImagePromptInput, AiPromptSort};
pub use analytics::{DailyStats, EventType, StatTotals, StatType};
pub use app::{MiniApp, MiniAppInput, MiniAppSummary, NewMiniApp, RunResult};
pub use data_source::{DataSource, DataSourceUpdate};
pub use legal_document::{LegalDocument, LegalDocumentInput, LegalDocumentSummary, NewLegalDocument};
pub use library::{ImportResults, ImportTally, LibraryBundle, LibraryDocument, LibraryProcedure};
pub use procedure::{NewProcedure, Procedure, ProcedureInput, ProcedureSummary};
pub use prompt::{Prompt, PromptInput, PromptPatch, PromptVersion, PromptVersionAction};
pub use qa_prompt::{LinkedWritingStyle, QaPrompt, QaPromptHistory, QaPromptInput, QaPromptWithStyles};
pub use session::{AdminUser, Session};
pub use style_guide::{
    ExampleInput, StyleGuide, StyleGuideExample, StyleGuideInput, StyleGuideSummary,
    StyleGuideWithExamples,
};
pub use writing_style::{WritingStyle, WritingStyleInput};
