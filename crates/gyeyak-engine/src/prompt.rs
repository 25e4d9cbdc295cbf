//! Prompt assembly
//!
//! Free-form text prompts with two hard rules: analysis and situation
//! prompts demand strictly JSON replies against an explicit schema, and
//! chat prompts demand Markdown grounded only in the supplied context.

use gyeyak_domain::{GroundingChunk, Issue, SituationRequest};
use gyeyak_llm::ChatMessage;
use gyeyak_store::ContractHit;

/// Role preamble for contract analysis
pub const ANALYSIS_SYSTEM: &str = "\
당신은 한국 노동법(근로기준법, 기간제법, 최저임금법 등)에 정통한 계약서 위험 분석 전문가입니다. \
근로계약서와 프리랜서 계약서를 검토하여 근로자에게 불리하거나 위법 소지가 있는 조항을 찾아냅니다.

규칙:
1. 제공된 계약서 내용과 법령/가이드라인 발췌만 근거로 판단합니다.
2. 각 이슈의 original_text에는 계약서 본문을 그대로 인용합니다.
3. 응답은 반드시 지정된 JSON 스키마 하나만 출력합니다. 설명 문장, 마크다운 코드 블록을 붙이지 않습니다.
4. 확실하지 않은 경우 severity를 낮추고 reason에 불확실성을 명시합니다.";

/// The strict reply schema for analysis tasks
pub const ANALYSIS_SCHEMA: &str = r#"{
  "risk_score": <0-100 정수>,
  "risk_level": "low" | "medium" | "high",
  "summary": "<계약 전체 요약>",
  "issues": [
    {
      "issue_id": "<고유 id>",
      "clause_id": "<article-N 또는 null>",
      "category": "wage" | "working_hours" | "probation_termination" | "stock_option_ip" | "leave" | "non_compete",
      "severity": "low" | "medium" | "high",
      "summary": "<이슈 한 줄 요약>",
      "reason": "<법적 근거를 포함한 설명>",
      "original_text": "<계약서 원문 인용>",
      "suggested_revision": "<수정 제안 또는 null>",
      "legal_basis": ["<근거 법령/자료>"]
    }
  ],
  "recommendations": [
    { "title": "<제목>", "description": "<설명>", "steps": ["<단계>"] }
  ]
}"#;

/// Role preamble for grounded chat
pub const CHAT_SYSTEM: &str = "\
당신은 계약서 분석 결과를 바탕으로 질문에 답하는 노동법 상담 보조원입니다. \
제공된 계약서 발췌와 법령/가이드라인 발췌에 근거해서만 답하고, 근거가 없으면 없다고 말합니다. \
답변은 마크다운 형식의 한국어로 작성하며, 법률 자문이 아닌 참고 정보임을 유의합니다.";

/// Role preamble for situation analysis
pub const SITUATION_SYSTEM: &str = "\
당신은 근로자의 상황 설명을 듣고 관련 법령과 유사 사례에 비추어 진단하는 노동법 분석 보조원입니다. \
응답은 반드시 지정된 JSON 스키마 하나만 출력합니다.";

/// The strict reply schema for situation analysis
pub const SITUATION_SCHEMA: &str = r#"{
  "risk_level": "low" | "medium" | "high",
  "summary": "<상황 진단 요약>",
  "advice": ["<권고 사항>"]
}"#;

fn push_grounding_section(prompt: &mut String, title: &str, chunks: &[GroundingChunk]) {
    prompt.push_str(&format!("## {}\n", title));
    if chunks.is_empty() {
        prompt.push_str("(검색된 자료 없음)\n\n");
        return;
    }
    for chunk in chunks {
        prompt.push_str(&format!(
            "- [{}] {}: {}\n",
            chunk.source_type, chunk.title, chunk.snippet
        ));
    }
    prompt.push('\n');
}

/// Compose the single analysis prompt: task, contract window, the
/// retrieved contract chunks ("계약서 내용"), the retrieved corpus
/// chunks ("관련 법령/가이드라인"), and the reply schema.
pub fn build_analysis_prompt(
    contract_window: &str,
    contract_hits: &[ContractHit],
    legal_chunks: &[GroundingChunk],
    description: Option<&str>,
) -> Vec<ChatMessage> {
    let mut prompt = String::new();

    prompt.push_str("다음 계약서의 위험 요소를 분석해 주세요.\n\n");
    if let Some(description) = description {
        if !description.trim().is_empty() {
            prompt.push_str(&format!("## 요청 배경\n{}\n\n", description.trim()));
        }
    }

    prompt.push_str("## 계약서 전문 (일부)\n");
    prompt.push_str(contract_window);
    prompt.push_str("\n\n");

    prompt.push_str("## 계약서 내용\n");
    if contract_hits.is_empty() {
        prompt.push_str("(검색된 조항 없음)\n\n");
    } else {
        for hit in contract_hits {
            let label = match hit.chunk.article_number {
                Some(n) => format!("제{}조", n),
                None => "전문".to_string(),
            };
            prompt.push_str(&format!("- [{}] {}\n", label, hit.chunk.content));
        }
        prompt.push('\n');
    }

    push_grounding_section(&mut prompt, "관련 법령/가이드라인", legal_chunks);

    prompt.push_str("## 응답 형식\n아래 JSON 스키마로만 응답하세요.\n");
    prompt.push_str(ANALYSIS_SCHEMA);

    vec![ChatMessage::system(ANALYSIS_SYSTEM), ChatMessage::user(prompt)]
}

/// Compose a grounded chat prompt, carrying the selected issue, the
/// prior analysis summary, and bounded conversation history.
pub fn build_chat_prompt(
    query: &str,
    contract_hits: &[ContractHit],
    legal_chunks: &[GroundingChunk],
    selected_issue: Option<&Issue>,
    analysis_summary: Option<&str>,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut context = String::new();

    if let Some(summary) = analysis_summary {
        context.push_str(&format!("## 기존 분석 요약\n{}\n\n", summary));
    }
    if let Some(issue) = selected_issue {
        context.push_str(&format!(
            "## 선택된 이슈\n[{} / {}] {}\n{}\n",
            issue.category, issue.severity, issue.summary, issue.reason
        ));
        if let Some(original) = issue.original_text.as_deref() {
            context.push_str(&format!("원문: {}\n", original));
        }
        context.push('\n');
    }

    context.push_str("## 계약서 발췌\n");
    if contract_hits.is_empty() {
        context.push_str("(검색된 조항 없음)\n\n");
    } else {
        for hit in contract_hits {
            context.push_str(&format!("- {}\n", hit.chunk.content));
        }
        context.push('\n');
    }

    push_grounding_section(&mut context, "관련 법령/가이드라인", legal_chunks);
    context.push_str(&format!("## 질문\n{}", query));

    let mut messages = vec![ChatMessage::system(CHAT_SYSTEM)];
    // Recent history only; the retrieval context carries the rest
    messages.extend(history.iter().rev().take(6).rev().cloned());
    messages.push(ChatMessage::user(context));
    messages
}

/// Compose the situation analysis prompt over the shared-query search
/// results: category-filtered corpus chunks plus cases-only results.
pub fn build_situation_prompt(
    request: &SituationRequest,
    legal_chunks: &[GroundingChunk],
    related_cases: &[GroundingChunk],
) -> Vec<ChatMessage> {
    let mut prompt = String::new();

    prompt.push_str("다음 상황을 진단해 주세요.\n\n## 상황 설명\n");
    prompt.push_str(&request.text);
    prompt.push('\n');

    let mut profile = Vec::new();
    if let Some(employment_type) = request.employment_type.as_deref() {
        profile.push(format!("고용 형태: {}", employment_type));
    }
    if let Some(months) = request.tenure_months {
        profile.push(format!("재직 기간: {}개월", months));
    }
    if let Some(hours) = request.weekly_hours {
        profile.push(format!("주당 근로시간: {}시간", hours));
    }
    if !profile.is_empty() {
        prompt.push_str(&format!("\n## 근로자 정보\n{}\n", profile.join("\n")));
    }
    prompt.push('\n');

    push_grounding_section(&mut prompt, "관련 법령/가이드라인", legal_chunks);
    push_grounding_section(&mut prompt, "유사 사례", related_cases);

    prompt.push_str("## 응답 형식\n아래 JSON 스키마로만 응답하세요.\n");
    prompt.push_str(SITUATION_SCHEMA);

    vec![ChatMessage::system(SITUATION_SYSTEM), ChatMessage::user(prompt)]
}
