use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::db::{DocumentQuery, ProcedureQuery};
use crate::AppState;

use super::{db_failure, non_empty, not_found, page};

#[derive(Deserialize)]
pub struct LibraryParams {
    search: Option<String>,
    categories: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl LibraryParams {
    fn categories(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/law")
            .route("/documents", web::get().to(list_documents))
            .route("/documents/{id}", web::get().to(get_document))
            .route("/procedures", web::get().to(list_procedures))
            .route("/procedures/{id}", web::get().to(get_procedure)),
    );
}

async fn list_documents(
    state: web::Data<AppState>,
    params: web::Query<LibraryParams>,
) -> impl Responder {
    let (limit, offset) = page(&params.limit, &params.offset);
    let query = DocumentQuery {
        search: non_empty(&params.search).map(str::to_string),
        categories: params.categories(),
        limit,
        offset,
    };

    match state.db.search_documents(&query) {
        Ok((documents, total)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "documents": documents,
            "total": total,
            "limit": limit,
            "offset": offset
        })),
        Err(e) => db_failure("Failed to fetch documents", e),
    }
}

async fn get_document(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_document(&path) {
        Ok(Some(document)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "document": document
        })),
        Ok(None) => not_found("Document not found"),
        Err(e) => db_failure("Failed to fetch document", e),
    }
}

async fn list_procedures(
    state: web::Data<AppState>,
    params: web::Query<LibraryParams>,
) -> impl Responder {
    let (limit, offset) = page(&params.limit, &params.offset);
    let query = ProcedureQuery {
        search: non_empty(&params.search).map(str::to_string),
        categories: params.categories(),
        limit,
        offset,
    };

    match state.db.search_procedures(&query) {
        Ok((procedures, total)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "procedures": procedures,
            "total": total,
            "limit": limit,
            "offset": offset
        })),
        Err(e) => db_failure("Failed to fetch procedures", e),
    }
}

async fn get_procedure(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_procedure(&path) {
        Ok(Some(procedure)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "procedure": procedure
        })),
        Ok(None) => not_found("Procedure not found"),
        Err(e) => db_failure("Failed to fetch procedure", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{NewLegalDocument, NewProcedure};
    use crate::test_support::{init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    fn document(title: &str, category: &str, issue_date: &str, tags: &[&str]) -> NewLegalDocument {
        NewLegalDocument {
            title: title.to_string(),
            doc_number: Some(format!("{}/QH15", title.len())),
            doc_type: "law".to_string(),
            authority: "Quốc hội".to_string(),
            issue_date: issue_date.to_string(),
            effective_date: issue_date.to_string(),
            summary: None,
            content: json!({ "articles": [] }),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.to_string(),
            status: "active".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_document_search_filters_and_pages() {
        let state = test_state();
        state.db.create_document(&document("Luật Đất đai", "land", "2024-01-18", &["đất"])).unwrap();
        state.db.create_document(&document("Luật Nhà ở", "housing", "2023-11-27", &["nhà"])).unwrap();
        state.db.create_document(&document("Luật Hôn nhân", "family", "2014-06-19", &["ly hôn"])).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/law/documents?categories=land,housing&limit=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["documents"].as_array().unwrap().len(), 1);
        assert_eq!(body["documents"][0]["title"], "Luật Đất đai");
        assert!(body["documents"][0].get("content").is_none());

        let req = test::TestRequest::get()
            .uri("/api/law/documents?search=ly%20h%C3%B4n")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["documents"][0]["category"], "family");

        // "đất đai" in lowercase still matches the capitalised title
        let req = test::TestRequest::get()
            .uri("/api/law/documents?search=%C4%91%E1%BA%A5t%20%C4%91ai")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["documents"][0]["title"], "Luật Đất đai");
    }

    #[actix_web::test]
    async fn test_single_rows_and_not_found() {
        let state = test_state();
        let doc = state.db.create_document(&document("Bộ luật Dân sự", "civil", "2015-11-24", &[])).unwrap();
        let procedure = state
            .db
            .create_procedure(&NewProcedure {
                title: "Đăng ký kết hôn".to_string(),
                authority: "UBND cấp xã".to_string(),
                time_est: "3 ngày".to_string(),
                category: "family".to_string(),
                steps: json!(["Nộp hồ sơ", "Nhận giấy chứng nhận"]),
                documents: json!(["CCCD"]),
                fees: None,
                notes: None,
                tags: vec![],
                status: "active".to_string(),
            })
            .unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/api/law/documents/{}", doc.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["document"]["type"], "law");
        assert_eq!(body["document"]["content"], json!({ "articles": [] }));

        let req = test::TestRequest::get()
            .uri(&format!("/api/law/procedures/{}", procedure.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["procedure"]["steps"][1], "Nhận giấy chứng nhận");

        let req = test::TestRequest::get().uri("/api/law/procedures").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);

        for uri in ["/api/law/documents/missing", "/api/law/procedures/missing"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 404);
        }
    }
}
