//! Assembles the full prompt sent to the model for a legal question

use crate::models::{QaPromptWithStyles, StyleGuideWithExamples};

/// Used when no Q&A prompt is active
pub const DEFAULT_SYSTEM_PROMPT: &str = "Bạn là một trợ lý pháp lý AI chuyên nghiệp của Việt Nam. Nhiệm vụ của bạn là:\n\n\
1. Trả lời các câu hỏi về pháp luật và thủ tục hành chính Việt Nam\n\
2. Cung cấp thông tin chính xác, dễ hiểu, có cấu trúc rõ ràng\n\
3. Trích dẫn điều luật, văn bản pháp luật khi có thể\n\
4. Lưu ý người dùng tham khảo ý kiến chuyên gia cho các vấn đề phức tạp\n\
5. Sử dụng ngôn ngữ thân thiện, dễ hiểu với người dân";

const ANSWER_FORMAT: &str = "Định dạng câu trả lời:\n\
- Ngắn gọn, súc tích (200-300 từ)\n\
- Chia thành các đoạn rõ ràng\n\
- Liệt kê các bước nếu là thủ tục\n\
- Đưa ra ví dụ minh họa nếu cần\n\n\
LƯU Ý: Đây chỉ là thông tin tham khảo, không thay thế tư vấn pháp lý chính thức.";

const MAX_GUIDE_EXAMPLES: usize = 2;

/// System prompt, style sections, formatting footer and the question
pub fn build(
    active: Option<&QaPromptWithStyles>,
    guide: Option<&StyleGuideWithExamples>,
    question: &str,
) -> String {
    let mut prompt = match active {
        Some(active) => {
            let mut text = active.prompt.system_prompt.clone();
            append_writing_styles(&mut text, active);
            text
        }
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    if let Some(guide) = guide {
        append_style_guide(&mut prompt, guide);
    }

    if let Some(instructions) = active
        .and_then(|a| a.prompt.formatting_instructions.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        prompt.push_str("\n\n");
        prompt.push_str(instructions);
    }

    prompt.push_str("\n\n");
    prompt.push_str(ANSWER_FORMAT);

    format!(
        "{}\n\nCÂU HỎI: {}\n\nHãy trả lời câu hỏi trên một cách chuyên nghiệp và dễ hiểu.",
        prompt,
        question.trim()
    )
}

fn append_writing_styles(prompt: &mut String, active: &QaPromptWithStyles) {
    if active.writing_styles.is_empty() {
        return;
    }

    let mut linked: Vec<_> = active.writing_styles.iter().collect();
    linked.sort_by_key(|l| l.priority);

    prompt.push_str("\n\nCÁC VĂN PHONG TRẢ LỜI (ưu tiên theo thứ tự):\n");
    for (i, link) in linked.iter().enumerate() {
        let style = &link.style;
        prompt.push_str(&format!("\n{}. {}\n   {}\n", i + 1, style.name, style.description));
        if let Some(example) = style.example_content.as_deref().filter(|e| !e.is_empty()) {
            prompt.push_str(&format!("   Ví dụ: {}\n", example));
        }
    }
}

fn append_style_guide(prompt: &mut String, guide: &StyleGuideWithExamples) {
    let g = &guide.guide;
    let characteristics = g
        .characteristics
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n");

    prompt.push_str(&format!(
        "\n\nVĂN PHONG TRẢ LỜI: {}\n{}\n\nĐẶC ĐIỂM VĂN PHONG:\n{}\n\nGIỌNG ĐIỆU: {}",
        g.name, g.description, characteristics, g.tone
    ));

    if guide.examples.is_empty() {
        return;
    }

    let examples = guide
        .examples
        .iter()
        .take(MAX_GUIDE_EXAMPLES)
        .enumerate()
        .map(|(i, ex)| format!("Ví dụ {}:\nTRƯỚC: {}\nSAU: {}\n", i + 1, ex.before, ex.after))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str("\n\nVÍ DỤ CÁCH TRẢ LỜI:\n\n");
    prompt.push_str(&examples);
}
