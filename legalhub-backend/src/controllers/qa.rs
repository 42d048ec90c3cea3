use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::{qa_prompt, GenerationOptions};
use crate::AppState;

use super::{ai_failure, bad_request, db_failure, error_response, not_found};

const MAX_QUESTION_CHARS: usize = 1000;
const NO_ANSWER: &str = "Không thể tạo câu trả lời. Vui lòng thử lại.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRequest {
    question: Option<Value>,
    style_guide_id: Option<String>,
}

#[derive(Serialize)]
pub struct GuideRef {
    id: String,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaResponse {
    success: bool,
    answer: String,
    question: String,
    style_guide: Option<GuideRef>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/qa").route(web::post().to(ask)));
    cfg.service(web::resource("/api/style-guides").route(web::get().to(list_style_guides)));
}

/// Trimmed question or the validation message for it
fn validate_question(question: Option<&Value>) -> Result<&str, &'static str> {
    let Some(Value::String(question)) = question else {
        return Err("Câu hỏi không hợp lệ");
    };
    if question.is_empty() {
        return Err("Câu hỏi không hợp lệ");
    }
    if question.trim().is_empty() {
        return Err("Câu hỏi không được để trống");
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err("Câu hỏi quá dài (tối đa 1000 ký tự)");
    }
    Ok(question.trim())
}

async fn ask(state: web::Data<AppState>, body: web::Json<QaRequest>) -> impl Responder {
    let question = match validate_question(body.question.as_ref()) {
        Ok(question) => question,
        Err(message) => return bad_request(message),
    };

    let active = match state.db.get_active_qa_prompt() {
        Ok(active) => active,
        Err(e) => return db_failure("Failed to load active Q&A prompt", e),
    };

    let guide = match body.style_guide_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => match state.db.get_style_guide(id) {
            Ok(Some(guide)) => Some(guide),
            Ok(None) => return not_found("Style guide không tồn tại"),
            Err(e) => return db_failure("Failed to load style guide", e),
        },
        None => match state.db.get_default_style_guide() {
            Ok(guide) => guide,
            Err(e) => return db_failure("Failed to load default style guide", e),
        },
    };

    let prompt = qa_prompt::build(active.as_ref(), guide.as_ref(), question);
    log::info!(
        "Answering question ({} chars, prompt: {}, style guide: {})",
        question.chars().count(),
        active.as_ref().map_or("default", |a| a.prompt.name.as_str()),
        guide.as_ref().map_or("none", |g| g.guide.name.as_str())
    );

    let answer = match state.ai.generate(&prompt, GenerationOptions::default()).await {
        Ok(answer) => answer,
        Err(e) => return ai_failure("Failed to answer question", &e),
    };
    if answer.trim().is_empty() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NO_ANSWER);
    }

    HttpResponse::Ok().json(QaResponse {
        success: true,
        answer: answer.trim().to_string(),
        question: question.to_string(),
        style_guide: guide.map(|g| GuideRef {
            id: g.guide.id,
            name: g.guide.name,
        }),
    })
}

async fn list_style_guides(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_style_guide_summaries() {
        Ok(guides) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": guides
        })),
        Err(e) => db_failure("Failed to fetch style guides", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExampleInput, QaPromptInput, StyleGuideInput};
    use crate::test_support::{init_app, test_state_with, StubGenerator};
    use actix_web::test;
    use serde_json::json;

    fn guide_input(name: &str, is_default: bool) -> StyleGuideInput {
        StyleGuideInput {
            name: Some(name.to_string()),
            description: Some(format!("Hướng dẫn {}", name)),
            characteristics: Some(vec!["Ngắn gọn".to_string()]),
            tone: Some("Thân thiện".to_string()),
            language: Some("vi".to_string()),
            is_default: Some(is_default),
            examples: Some(vec![ExampleInput {
                before: Some("Theo quy định tại Điều 51".to_string()),
                after: Some("Luật cho phép".to_string()),
            }]),
        }
    }

    #[actix_web::test]
    async fn test_question_validation() {
        assert_eq!(validate_question(Some(&json!("  Hỏi?  "))), Ok("Hỏi?"));
        assert_eq!(validate_question(None), Err("Câu hỏi không hợp lệ"));
        assert_eq!(validate_question(Some(&json!(42))), Err("Câu hỏi không hợp lệ"));
        assert_eq!(validate_question(Some(&json!("   "))), Err("Câu hỏi không được để trống"));
        assert_eq!(
            validate_question(Some(&json!("ệ".repeat(1001)))),
            Err("Câu hỏi quá dài (tối đa 1000 ký tự)")
        );
        assert!(validate_question(Some(&json!("ệ".repeat(1000)))).is_ok());
    }

    #[actix_web::test]
    async fn test_answer_uses_active_prompt_and_default_guide() {
        let stub = StubGenerator::replying("  Bạn cần nộp đơn tại tòa án.  ");
        let state = test_state_with(stub.clone());
        state
            .db
            .create_qa_prompt(&QaPromptInput {
                name: Some("Chính".to_string()),
                system_prompt: Some("Bạn là luật sư gia đình.".to_string()),
                is_active: Some(true),
                ..Default::default()
            })
            .unwrap();
        let guide = state.db.create_style_guide(&guide_input("Bình dân", true)).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/qa")
            .set_json(json!({ "question": " Thủ tục ly hôn? " }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["answer"], "Bạn cần nộp đơn tại tòa án.");
        assert_eq!(body["question"], "Thủ tục ly hôn?");
        assert_eq!(body["styleGuide"]["id"], guide.guide.id);

        let prompt = stub.last_prompt().unwrap();
        assert!(prompt.starts_with("Bạn là luật sư gia đình."));
        assert!(prompt.contains("VĂN PHONG TRẢ LỜI: Bình dân"));
        assert!(prompt.contains("TRƯỚC: Theo quy định tại Điều 51"));
        assert!(prompt.contains("CÂU HỎI: Thủ tục ly hôn?"));
    }

    #[actix_web::test]
    async fn test_explicit_guide_and_errors() {
        let stub = StubGenerator::replying("Trả lời");
        let state = test_state_with(stub.clone());
        state.db.create_style_guide(&guide_input("Mặc định", true)).unwrap();
        let chosen = state.db.create_style_guide(&guide_input("Chuyên sâu", false)).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/qa")
            .set_json(json!({ "question": "Hỏi", "styleGuideId": chosen.guide.id }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["styleGuide"]["name"], "Chuyên sâu");
        assert!(stub.last_prompt().unwrap().starts_with(qa_prompt::DEFAULT_SYSTEM_PROMPT));

        let req = test::TestRequest::post()
            .uri("/api/qa")
            .set_json(json!({ "question": "Hỏi", "styleGuideId": "missing" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Style guide không tồn tại");

        let req = test::TestRequest::post()
            .uri("/api/qa")
            .set_json(json!({ "question": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_blank_answer_is_an_error() {
        let state = test_state_with(StubGenerator::replying("   "));
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/qa")
            .set_json(json!({ "question": "Hỏi" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], NO_ANSWER);
    }

    #[actix_web::test]
    async fn test_public_style_guide_list_puts_default_first() {
        let state = test_state_with(StubGenerator::replying("x"));
        state.db.create_style_guide(&guide_input("A", false)).unwrap();
        state.db.create_style_guide(&guide_input("Z", true)).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/style-guides").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["name"], "Z");
        assert_eq!(body["data"][0]["is_default"], true);
        assert_eq!(body["data"][1]["name"], "A");
        assert!(body["data"][1].get("characteristics").is_none());
    }
}
