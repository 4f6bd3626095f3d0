//! End-to-end section flows over one SessionContext with the dummy provider.

use std::io::{Cursor, Write};
use std::path::Path;

use aurora::agents::{self, AgentsState};
use aurora::config::Config;
use aurora::error::InteractionError;
use aurora::llm::LlmProvider;
use aurora::llm::providers::dummy::DummyProvider;
use aurora::session::{Role, Section, SessionContext, Tone, CHAT_GREETING};

fn state(work_dir: &Path) -> AgentsState {
    AgentsState::new(&Config::test_default(work_dir), LlmProvider::Dummy(DummyProvider::new()))
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    w.start_file("word/document.xml", zip::write::FileOptions::default()).unwrap();
    w.write_all(xml.as_bytes()).unwrap();
    std::fs::write(path, w.finish().unwrap().into_inner()).unwrap();
}

#[tokio::test]
async fn test_sections_keep_separate_transcripts() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = state(dir.path());
    let mut session = SessionContext::new();

    agents::respond(&state, &mut session, "hi", &mut |_| {}).await.unwrap();

    session.active = Section::Studio;
    session.studio_settings.tone = Tone::Formal;
    agents::respond(&state, &mut session, "draft text", &mut |_| {}).await.unwrap();

    assert_eq!(session.chat.len(), 3);
    assert_eq!(session.studio.len(), 3);
    assert_eq!(session.docs.len(), 1);
    assert_eq!(session.chat.turns()[0].text, CHAT_GREETING);
}

#[tokio::test]
async fn test_document_upload_then_question() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = state(dir.path());
    let mut session = SessionContext::new();

    write_docx(&dir.path().join("brief.docx"), &["Project Aurora", "Budget: 10k"]);
    let (section, msg) = agents::upload(&state, &mut session, Path::new("brief.docx")).await.unwrap();
    assert_eq!(section, Section::Docs);
    assert!(msg.contains("brief.docx"));
    assert_eq!(session.document.as_ref().unwrap().text, "Project Aurora\nBudget: 10k");

    session.active = Section::Docs;
    let mut streamed = String::new();
    let reply = agents::respond(&state, &mut session, "What is the budget?", &mut |f| streamed.push_str(f))
        .await
        .unwrap();
    assert_eq!(reply, streamed);
    assert!(reply.contains("Budget: 10k\n\nQuestion: What is the budget?"));
    assert_eq!(session.docs.turns()[1].text, "What is the budget?");
}

#[tokio::test]
async fn test_dataset_upload_query_and_clean() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = state(dir.path());
    let mut session = SessionContext::new();

    std::fs::write(
        dir.path().join("orders.csv"),
        "City,Customer Name,Sales,Payment Mode\nPune,Asha,100,Card\nPune,Asha,100,Card\nDelhi,Ravi,,Cash\n",
    )
    .unwrap();
    let (section, _) = agents::upload(&state, &mut session, Path::new("orders.csv")).await.unwrap();
    assert_eq!(section, Section::Data);
    assert_eq!(session.data.len(), 2);

    session.active = Section::Data;
    let reply = agents::respond(&state, &mut session, "top 10 city with highest sales", &mut |_| {})
        .await
        .unwrap();
    assert!(reply.contains("| Pune"));
    assert_eq!(session.data.len(), 4);

    assert!(agents::data::dedupe(&mut session).unwrap().contains("**1**"));
    let filled = agents::data::fill(&mut session, "Sales", &aurora::dataset::Fill::Median).unwrap();
    assert!(filled.contains("median (100.00)"));

    let out = agents::data::export(&state, &session, None).unwrap();
    let csv = std::fs::read_to_string(out).unwrap();
    assert_eq!(csv, "City,Customer Name,Sales,Payment Mode\nPune,Asha,100,Card\nDelhi,Ravi,100,Cash\n");
}

#[tokio::test]
async fn test_failed_request_leaves_no_assistant_turn() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = AgentsState::new(
        &Config::test_default(dir.path()),
        LlmProvider::Dummy(DummyProvider::failing("quota exceeded")),
    );
    let mut session = SessionContext::new();

    let err = agents::respond(&state, &mut session, "hello again", &mut |_| {}).await.unwrap_err();
    assert!(matches!(err, InteractionError::ModelRequestFailure(_)));
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(session.chat.last().unwrap().role, Role::User);
}

#[tokio::test]
async fn test_reset_all_clears_uploads() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = state(dir.path());
    let mut session = SessionContext::new();

    std::fs::write(dir.path().join("d.csv"), "a\n1\n").unwrap();
    agents::upload(&state, &mut session, Path::new("d.csv")).await.unwrap();
    agents::respond(&state, &mut session, "hi", &mut |_| {}).await.unwrap();

    session.reset();
    assert!(session.dataset.is_none());
    assert!(session.data.is_empty());
    assert_eq!(session.chat.len(), 1);
}
