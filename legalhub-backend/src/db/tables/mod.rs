//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod ai_prompts;     // ai_image_prompts
mod analytics;      // app_events, app_stats_daily
mod apps;           // apps
mod auth;           // admin_users, auth_sessions
mod dashboard;      // aggregate counts
mod data_sources;   // data_sources
mod documents;      // legal_documents
mod procedures;     // procedures
mod prompts;        // prompts, prompt_versions
mod qa_prompts;     // qa_prompts, qa_prompt_writing_styles, qa_prompt_history
mod results;        // results
mod style_guides;   // style_guides, style_guide_examples
mod writing_styles; // legal_writing_styles

pub use ai_prompts::AiPromptQuery;
pub use apps::AppQuery;
pub use dashboard::DashboardCounts;
pub use documents::{AdminDocumentQuery, DocumentQuery};
pub use procedures::{AdminProcedureQuery, ProcedureQuery};
pub use prompts::PromptQuery;
