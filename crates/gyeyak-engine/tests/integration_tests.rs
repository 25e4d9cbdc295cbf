//! End-to-end analysis scenarios over the in-process stack: keyword
//! embedder, in-memory vector store, scripted mock LLM.

use gyeyak_domain::{
    Document, EngineConfig, IssueCategory, LegalChunk, RiskLevel, Severity, SituationRequest,
    SourceType,
};
use gyeyak_engine::{ChatRequest, Engine, EngineError};
use gyeyak_llm::MockLlm;
use gyeyak_store::{EmbedError, Embedder, InMemoryVectorStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Embeds by topic-keyword counts so related texts land above the 0.4
/// similarity threshold and unrelated texts at zero. Deterministic.
struct KeywordEmbedder;

const KEYWORD_GROUPS: &[&[&str]] = &[
    &["수당", "임금", "포괄임금", "청구"],
    &["근로시간", "연장", "야간", "52시간", "초과"],
    &["수습", "해고", "해지", "통보"],
    &["스톡옵션", "지식재산", "발명"],
    &["연차", "휴가"],
    &["부동산", "매매", "중개"],
];

impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        KEYWORD_GROUPS.len()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| {
                KEYWORD_GROUPS
                    .iter()
                    .map(|group| {
                        group
                            .iter()
                            .map(|keyword| text.matches(keyword).count() as f32)
                            .sum()
                    })
                    .collect()
            })
            .collect())
    }
}

struct TestStack {
    engine: Engine,
    store: Arc<InMemoryVectorStore>,
    llm: MockLlm,
}

fn stack_with(llm: MockLlm) -> TestStack {
    let store = Arc::new(InMemoryVectorStore::new());
    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(KeywordEmbedder),
        Arc::clone(&store) as Arc<dyn gyeyak_store::VectorStore>,
        Arc::new(llm.clone()),
    );
    TestStack { engine, store, llm }
}

fn legal_chunk(
    external_id: &str,
    source_type: SourceType,
    title: &str,
    content: &str,
    topic: &str,
) -> LegalChunk {
    let mut metadata = HashMap::new();
    metadata.insert("topic_main".to_string(), topic.to_string());
    LegalChunk {
        external_id: external_id.to_string(),
        chunk_index: 0,
        source_type,
        title: title.to_string(),
        content: content.to_string(),
        file_path: None,
        metadata,
    }
}

async fn seed_labor_corpus(engine: &Engine) {
    let chunks = vec![
        legal_chunk(
            "law-wage",
            SourceType::Law,
            "근로기준법 제56조",
            "사용자는 연장근로에 대하여 통상임금의 100분의 50 이상의 수당을 가산하여 지급하여야 한다. 임금 청구권은 포기할 수 없다.",
            "wage",
        ),
        legal_chunk(
            "law-hours",
            SourceType::Law,
            "근로기준법 제53조",
            "당사자 간 합의하면 1주 간에 12시간을 한도로 근로시간을 연장할 수 있다. 연장 근로시간 초과는 허용되지 않는다.",
            "working_hours",
        ),
        legal_chunk(
            "std-wage",
            SourceType::StandardContract,
            "표준근로계약서",
            "임금은 매월 1회 이상 일정한 날짜에 지급하며, 연장근로 수당은 법정 기준에 따라 지급한다.",
            "wage",
        ),
        legal_chunk(
            "manual-hours",
            SourceType::Manual,
            "근로시간 운영 가이드",
            "주 52시간 근로시간 제도의 연장근로 한도와 운영 방법을 안내한다.",
            "working_hours",
        ),
        legal_chunk(
            "case-probation",
            SourceType::Case,
            "수습 해고 사례",
            "수습 기간 중이라도 해고에는 정당한 이유가 필요하며 해고 통보 절차를 지켜야 한다.",
            "probation_termination",
        ),
    ];
    engine.ingest_legal_corpus(chunks).await.unwrap();
}

const RISKY_CONTRACT: &str = "\
근로계약서
제1조 (근로시간) 주 소정근로시간은 50시간으로 하며 필요시 연장 근로를 한다. 이는 주 52시간 한도 초과 여부와 무관하게 적용된다.
제2조 (임금) 월 임금은 3,000,000원으로 하며, 근로자는 연장·야간·휴일 근로에 대하여 추가 수당을 사업주에게 청구하지 않기로 합의한다.
제3조 (수습) 수습기간은 6개월로 하며 이 기간 중 회사는 언제든지 계약을 해지할 수 있다.
제4조 (지식재산) 업무상 발명에 관한 권리는 회사에 귀속된다.
";

const CLEAN_CONTRACT: &str = "\
근로계약서
제1조 (근로시간) 주 소정근로시간은 40시간으로 한다.
제2조 (임금) 월 임금은 3,000,000원으로 하며 연장근로 수당은 근로기준법에 따라 가산하여 지급한다.
제3조 (수습) 수습기간은 3개월로 하며 해고에는 정당한 이유를 요한다.
제4조 (연차) 연차 휴가는 근로기준법에 따른다.
";

fn risky_reply() -> String {
    serde_json::json!({
        "risk_score": 78,
        "risk_level": "high",
        "summary": "법정 한도를 넘는 근로시간과 수당 포기 조항이 있는 고위험 계약입니다.",
        "issues": [
            {
                "issue_id": "i1",
                "clause_id": "article-1",
                "category": "working_hours",
                "severity": "high",
                "summary": "주 52시간 한도 초과",
                "reason": "주 50시간 소정근로에 연장 근로를 더하면 법정 근로시간 한도를 초과합니다.",
                "original_text": "주 소정근로시간은 50시간으로 하며 필요시 연장 근로를 한다",
                "legal_basis": ["근로기준법 제53조"]
            },
            {
                "issue_id": "i2",
                "clause_id": "article-2",
                "category": "wage",
                "severity": "high",
                "summary": "연장근로 수당 청구권 포기 합의",
                "reason": "법정 수당 청구권을 사전에 포기하는 합의는 무효입니다.",
                "original_text": "근로자는 연장·야간·휴일 근로에 대하여 추가 수당을 사업주에게 청구하지 않기로 합의한다",
                "legal_basis": ["근로기준법 제56조"]
            },
            {
                "issue_id": "i3",
                "clause_id": "article-3",
                "category": "probation_termination",
                "severity": "medium",
                "summary": "수습 중 자유 해지 조항",
                "reason": "수습 기간에도 해고에는 정당한 이유와 통보 절차가 필요합니다.",
                "original_text": "수습기간은 6개월로 하며 이 기간 중 회사는 언제든지 계약을 해지할 수 있다",
                "legal_basis": []
            }
        ],
        "recommendations": [
            {"title": "수당 조항 수정 요구", "description": "제2조의 수당 포기 문구 삭제를 요구하세요.", "steps": ["서면으로 수정 요청", "거부 시 노동청 상담"]}
        ]
    })
    .to_string()
}

// ---------------------------------------------------------------- scenarios

#[tokio::test]
async fn typical_risky_contract_produces_grounded_high_risk_report() {
    let stack = stack_with(MockLlm::new(risky_reply()));
    seed_labor_corpus(&stack.engine).await;

    let document = Document::new("근로계약서.txt", None, RISKY_CONTRACT);
    let report = stack
        .engine
        .analyze_document(&document, Some("야근이 많은데 수당 얘기가 없습니다"))
        .await
        .unwrap();

    assert!(report.risk_score >= 60);
    assert_eq!(report.risk_level, RiskLevel::High);

    let categories: Vec<&str> = report.issues.iter().map(|i| i.category.as_str()).collect();
    assert!(categories.contains(&"working_hours"));
    assert!(categories.contains(&"wage"));

    // Every quoted excerpt appears verbatim in the input and is anchored
    for issue in &report.issues {
        let original = issue.original_text.as_deref().unwrap();
        assert!(RISKY_CONTRACT.contains(original));
        assert!(issue.start_index.is_some() && issue.end_index.is_some());
    }

    // Diversity quota: a statute plus a manual or standard contract
    let types: Vec<SourceType> = report
        .retrieved_contexts
        .iter()
        .map(|c| c.source_type)
        .collect();
    assert!(types.contains(&SourceType::Law));
    assert!(
        types.contains(&SourceType::Manual) || types.contains(&SourceType::StandardContract)
    );

    // Contract chunks were ingested before retrieval
    assert!(stack.store.contract_len(document.id) > 0);

    // Sections breakdown is computed, not zeros
    assert!(report.sections.working_hours > 0);
    assert!(report.sections.wage > 0);
    assert!(report.sections.probation_termination > 0);

    assert!(!report.clauses.is_empty());
    assert!(!report.highlighted_texts.is_empty());
}

#[tokio::test]
async fn per_issue_re_retrieval_grounds_each_category() {
    let stack = stack_with(MockLlm::new(risky_reply()));
    seed_labor_corpus(&stack.engine).await;

    let document = Document::new("계약서.txt", None, RISKY_CONTRACT);
    let report = stack.engine.analyze_document(&document, None).await.unwrap();

    let by_category = |category: &str| {
        report
            .issues
            .iter()
            .find(|i| i.category.as_str() == category)
            .unwrap()
    };
    // Re-retrieval with the category filter lands topic-matched chunks
    assert!(by_category("working_hours")
        .legal_basis
        .iter()
        .any(|b| b.chunk.source_id == "law-hours" || b.chunk.source_id == "manual-hours"));
    assert!(by_category("wage")
        .legal_basis
        .iter()
        .any(|b| b.chunk.source_id == "law-wage" || b.chunk.source_id == "std-wage"));
    assert!(by_category("probation_termination")
        .legal_basis
        .iter()
        .any(|b| b.chunk.source_id == "case-probation"));
}

#[tokio::test]
async fn clean_contract_stays_low_risk() {
    let reply = serde_json::json!({
        "risk_score": 15,
        "risk_level": "low",
        "summary": "표준에 가까운 계약입니다.",
        "issues": [],
        "recommendations": []
    })
    .to_string();
    let stack = stack_with(MockLlm::new(reply));
    seed_labor_corpus(&stack.engine).await;

    let report = stack
        .engine
        .analyze_contract(CLEAN_CONTRACT, None, None)
        .await
        .unwrap();

    assert!(report.risk_score < 30);
    assert_eq!(report.risk_level, RiskLevel::Low);
    assert!(report.issues.is_empty());
    assert_eq!(report.sections, Default::default());
}

#[tokio::test]
async fn wage_waiver_only_text_gets_exactly_one_synthetic_issue() {
    let waiver = "근로자는 연장·야간·휴일 근로에 대하여 추가 수당을 사업주에게 청구하지 않기로 합의한다.";
    // The model misses the waiver entirely
    let reply = serde_json::json!({
        "risk_score": 20,
        "risk_level": "low",
        "summary": "특이사항을 찾지 못했습니다.",
        "issues": []
    })
    .to_string();
    let stack = stack_with(MockLlm::new(reply));

    let report = stack.engine.analyze_contract(waiver, None, None).await.unwrap();

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.category, IssueCategory::Wage);
    assert_eq!(issue.severity, Severity::High);
    let original = issue.original_text.as_deref().unwrap();
    assert!(waiver.contains(original));
    assert!(issue.legal_basis.iter().any(|b| b.chunk.title.contains("제15조")));
    assert!(issue.legal_basis.iter().any(|b| b.chunk.title.contains("제56조")));
    // Anchored verbatim
    assert_eq!(&report.contract_text[issue.start_index.unwrap()..issue.end_index.unwrap()], original);
}

#[tokio::test]
async fn covered_waiver_is_not_duplicated_by_the_safety_net() {
    let stack = stack_with(MockLlm::new(risky_reply()));
    seed_labor_corpus(&stack.engine).await;

    let report = stack
        .engine
        .analyze_contract(RISKY_CONTRACT, None, None)
        .await
        .unwrap();

    // The model's own wage issue covers the waiver; no synthetic twin
    let wage_issues = report
        .issues
        .iter()
        .filter(|i| i.category == IssueCategory::Wage)
        .count();
    assert_eq!(wage_issues, 1);
}

#[tokio::test]
async fn unrelated_corpus_is_gated_and_annotated() {
    let reply = serde_json::json!({
        "risk_score": 45,
        "risk_level": "medium",
        "summary": "일부 조항이 모호합니다.",
        "issues": []
    })
    .to_string();
    let stack = stack_with(MockLlm::new(reply));
    // Corpus exists but is about real estate, far under the threshold
    stack
        .engine
        .ingest_legal_corpus(vec![legal_chunk(
            "re-1",
            SourceType::Law,
            "공인중개사법",
            "부동산 매매 중개 보수는 대통령령으로 정한다.",
            "real_estate",
        )])
        .await
        .unwrap();

    let report = stack
        .engine
        .analyze_contract(CLEAN_CONTRACT, None, None)
        .await
        .unwrap();

    assert!(report.retrieved_contexts.is_empty());
    assert!(report.summary.contains("법령 근거 없음"));
    assert_eq!(report.risk_level, RiskLevel::Medium);
}

#[tokio::test]
async fn llm_failure_fails_the_whole_analysis() {
    let llm = MockLlm::default();
    llm.push_error("backend down");
    let stack = stack_with(llm);

    let result = stack.engine.analyze_contract(CLEAN_CONTRACT, None, None).await;
    assert!(matches!(result, Err(EngineError::LlmUnavailable(_))));
}

#[tokio::test]
async fn too_short_text_is_a_chunking_error() {
    let stack = stack_with(MockLlm::default());
    let result = stack.engine.analyze_contract("짧음", None, None).await;
    assert!(matches!(result, Err(EngineError::Chunking(_))));
    // Nothing was called or written
    assert_eq!(stack.llm.call_count(), 0);
    assert_eq!(stack.store.legal_len(), 0);
}

#[tokio::test]
async fn llm_level_override_is_preserved_and_flagged() {
    let reply = serde_json::json!({
        "risk_score": 75,
        "risk_level": "medium",
        "summary": "점수와 등급이 어긋나는 응답",
        "issues": []
    })
    .to_string();
    let stack = stack_with(MockLlm::new(reply));

    let report = stack
        .engine
        .analyze_contract(CLEAN_CONTRACT, None, None)
        .await
        .unwrap();

    assert_eq!(report.risk_score, 75);
    assert_eq!(report.risk_level, RiskLevel::Medium);
    assert!(report.level_overridden);
}

#[tokio::test]
async fn prescan_hint_reaches_the_prompt() {
    let stack = stack_with(MockLlm::new(risky_reply()));
    stack
        .engine
        .analyze_contract(RISKY_CONTRACT, Some("검토 부탁드립니다"), None)
        .await
        .unwrap();

    let prompts = stack.llm.recorded_prompts();
    let user_turn = &prompts[0].last().unwrap().content;
    assert!(user_turn.contains("검토 부탁드립니다"));
    assert!(user_turn.contains("[시스템 참고]"));
    assert!(user_turn.contains("## 계약서 내용"));
    assert!(user_turn.contains("## 관련 법령/가이드라인"));
}

#[tokio::test]
async fn malformed_reply_is_repaired_instead_of_failing() {
    let truncated = r#"{"risk_score": 55, "risk_level": "medium", "summary": "잘린 응답", "issues": [{"issue_id": "i1", "category": "leave", "severity": "low", "summary": "연차 미기재", "reason": "연차 휴가 조항이 없습니다"}"#;
    let stack = stack_with(MockLlm::new(truncated));

    let report = stack
        .engine
        .analyze_contract(CLEAN_CONTRACT, None, None)
        .await
        .unwrap();
    assert_eq!(report.risk_score, 55);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].category, IssueCategory::Leave);
}

#[tokio::test]
async fn chat_returns_markdown_grounded_in_both_sources() {
    let llm = MockLlm::new("## 답변\n해당 조항은 근로기준법상 무효입니다.");
    let stack = stack_with(llm);
    seed_labor_corpus(&stack.engine).await;

    let document = Document::new("계약서.txt", None, RISKY_CONTRACT);
    // Ingest by running a (scripted) analysis first
    stack.llm.push_response(risky_reply());
    stack.engine.analyze_document(&document, None).await.unwrap();

    let mut request = ChatRequest::new("수당 포기 조항이 유효한가요?");
    request.document_ids = vec![document.id];
    let answer = stack.engine.chat(&request).await.unwrap();
    assert!(answer.contains("무효"));

    let prompts = stack.llm.recorded_prompts();
    let chat_turn = &prompts.last().unwrap().last().unwrap().content;
    assert!(chat_turn.contains("수당 포기 조항이 유효한가요?"));
    assert!(chat_turn.contains("관련 법령/가이드라인"));
}

#[tokio::test]
async fn situation_analysis_splits_cases_from_statutes() {
    let reply = serde_json::json!({
        "risk_level": "high",
        "summary": "수습 중 해고에도 정당한 이유가 필요합니다.",
        "advice": ["해고 사유를 서면으로 요구하세요", "노동위원회 구제신청을 검토하세요"]
    })
    .to_string();
    let stack = stack_with(MockLlm::new(reply));
    seed_labor_corpus(&stack.engine).await;

    let request = SituationRequest {
        text: "수습 3개월 차에 갑자기 해고 통보를 받았습니다. 해지 사유는 듣지 못했습니다.".to_string(),
        category_hint: Some(IssueCategory::ProbationTermination),
        employment_type: Some("정규직".to_string()),
        tenure_months: Some(3),
        weekly_hours: Some(40),
    };
    let diagnosis = stack.engine.analyze_situation(&request).await.unwrap();

    assert_eq!(diagnosis.risk_level, RiskLevel::High);
    assert_eq!(diagnosis.advice.len(), 2);
    assert!(diagnosis
        .related_cases
        .iter()
        .all(|c| c.source_type == SourceType::Case));
    assert!(!diagnosis.related_cases.is_empty());
}

#[tokio::test]
async fn duplicate_corpus_ingestion_is_idempotent() {
    let stack = stack_with(MockLlm::default());
    seed_labor_corpus(&stack.engine).await;
    let before = stack.store.legal_len();
    seed_labor_corpus(&stack.engine).await;
    assert_eq!(stack.store.legal_len(), before);
}

#[tokio::test]
async fn report_serializes_to_the_stable_wire_shape() {
    let stack = stack_with(MockLlm::new(risky_reply()));
    seed_labor_corpus(&stack.engine).await;

    let report = stack
        .engine
        .analyze_contract(RISKY_CONTRACT, None, None)
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    for field in [
        "docId",
        "title",
        "riskScore",
        "riskLevel",
        "sections",
        "issues",
        "summary",
        "retrievedContexts",
        "contractText",
        "clauses",
        "highlightedTexts",
        "createdAt",
    ] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(json["sections"]["working_hours"].as_u64().unwrap() > 0, true);
}
