mod sqlite;
mod tables;

pub use sqlite::Database;
pub use tables::{
    AdminDocumentQuery, AdminProcedureQuery, AiPromptQuery, AppQuery, DashboardCounts, DocumentQuery,
    ProcedureQuery, PromptQuery,
};
