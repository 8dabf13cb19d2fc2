//! End-to-end API tests
//!
//! Drives the full router against the in-memory index, the deterministic
//! embedder, and the echoing generator. No network, no database; PDF
//! fixtures are generated in-test.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use veridex_answer::MockGenerator;
use veridex_common::config::AppConfig;
use veridex_common::embeddings::HashingEmbedder;
use veridex_common::errors::Result as AppResult;
use veridex_common::index::{MemoryIndex, VectorIndex};
use veridex_common::notify::Notifier;
use veridex_gateway::{create_router, AppState};

struct TestApp {
    app: Router,
    index: Arc<MemoryIndex>,
    corpus: TempDir,
}

fn test_app(notifier: Option<Arc<dyn Notifier>>) -> TestApp {
    let corpus = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.storage.corpus_dir = corpus.path().to_string_lossy().into_owned();

    let index = Arc::new(MemoryIndex::new());
    let state = AppState::assemble(
        config,
        Arc::new(HashingEmbedder::new(256)),
        index.clone(),
        Arc::new(MockGenerator),
        notifier,
        PrometheusBuilder::new().build_recorder().handle(),
    );

    TestApp {
        app: create_router(state),
        index,
        corpus,
    }
}

struct CountingNotifier {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify_insufficient(&self, _question: &str, _score: Option<f32>) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build a minimal single-font PDF with one text run per page.
fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn form_query(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "veridex-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = test_app(None);

    let response = t.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");

    let response = t.app.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["index"]["status"], "up");
}

#[tokio::test]
async fn test_metrics_endpoint_responds() {
    let t = test_app(None);
    let response = t.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_embed_and_query_round_trip() {
    let t = test_app(None);
    let question = "the refund policy allows returns within thirty days";

    let pdf = pdf_bytes(&[
        "The refund policy allows returns within thirty days.",
        "Shipping takes five business days on average.",
        "Support is reachable around the clock.",
    ]);
    let response = t
        .app
        .clone()
        .oneshot(multipart_upload("handbook.pdf", &pdf))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "handbook.pdf");

    let response = t.app.clone().oneshot(post_empty("/embed_new")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let embedded = body["embedded_chunks"].as_u64().unwrap();
    assert!(embedded > 0);
    assert_eq!(body["new_files"], serde_json::json!(["handbook.pdf"]));
    assert_eq!(
        body["message"],
        format!("Embedded {} new chunks.", embedded)
    );

    let response = t.app.clone().oneshot(get("/list_indexed")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["indexed_files"], serde_json::json!(["handbook.pdf"]));

    let response = t
        .app
        .clone()
        .oneshot(form_query(&format!(
            "question={}",
            question.replace(' ', "+")
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    // The echoing generator returns the prompt, context included
    assert!(body["answer"].as_str().unwrap().contains("refund policy"));
    assert_eq!(body["sources"][0], "handbook.pdf");
}

#[tokio::test]
async fn test_reembedding_unchanged_corpus_is_a_no_op() {
    let t = test_app(None);
    let pdf = pdf_bytes(&["Contract terms include a thirty day notice period."]);

    t.app
        .clone()
        .oneshot(multipart_upload("contract.pdf", &pdf))
        .await
        .unwrap();
    t.app.clone().oneshot(post_empty("/embed_new")).await.unwrap();
    let count_after_first = t.index.count().await.unwrap();

    let response = t.app.clone().oneshot(post_empty("/embed_new")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["message"], "No new documents to embed.");
    assert_eq!(body["embedded_chunks"], 0);
    assert_eq!(body["skipped_files"], serde_json::json!(["contract.pdf"]));
    assert_eq!(t.index.count().await.unwrap(), count_after_first);
}

#[tokio::test]
async fn test_greeting_returns_canned_reply_with_empty_sources() {
    let t = test_app(None);

    let response = t.app.clone().oneshot(form_query("question=hi")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["answer"].as_str().unwrap().contains("Veridex"));
    assert_eq!(body["sources"], serde_json::json!([]));
    assert_eq!(t.index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_dialect_phrase_returns_canned_reply() {
    let t = test_app(None);

    let response = t
        .app
        .clone()
        .oneshot(form_query("question=chnowa+veridex"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["sources"], serde_json::json!([]));
    assert!(body["answer"].as_str().unwrap().contains("Veridex"));
}

#[tokio::test]
async fn test_empty_index_query_is_insufficient_and_notifies_once() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let t = test_app(Some(Arc::new(CountingNotifier {
        attempts: attempts.clone(),
    })));

    let response = t
        .app
        .clone()
        .oneshot(form_query("question=what+is+the+refund+policy"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["answer"],
        "The provided documents do not contain sufficient information to answer this question."
    );
    assert_eq!(body["retrieved"], serde_json::json!([]));

    for _ in 0..100 {
        if attempts.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_debug_returns_projection_without_answer() {
    let t = test_app(None);
    let pdf = pdf_bytes(&["The refund policy allows returns within thirty days."]);

    t.app
        .clone()
        .oneshot(multipart_upload("handbook.pdf", &pdf))
        .await
        .unwrap();
    t.app.clone().oneshot(post_empty("/embed_new")).await.unwrap();

    let response = t
        .app
        .clone()
        .oneshot(form_query(
            "question=the+refund+policy+allows+returns+within+thirty+days&debug=true",
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body.get("answer").is_none());
    let retrieved = body["retrieved"].as_array().unwrap();
    assert_eq!(retrieved.len(), 1);
    assert_eq!(retrieved[0]["source"], "handbook.pdf");
    assert!(retrieved[0]["score"].as_f64().unwrap() > 0.9);
    assert!(retrieved[0]["excerpt"].as_str().unwrap().contains("refund"));
}

#[tokio::test]
async fn test_session_recall_round_trip() {
    let t = test_app(None);

    t.app
        .clone()
        .oneshot(form_query(
            "question=Where+is+the+refund+policy%3F&session_id=s1",
        ))
        .await
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(form_query("question=what+did+i+ask&session_id=s1"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(
        body["answer"],
        "You previously asked:\n- where is the refund policy?"
    );
    assert_eq!(body["sources"], serde_json::json!([]));
}

#[tokio::test]
async fn test_query_validation_rejects_empty_and_oversized_questions() {
    let t = test_app(None);

    let response = t
        .app
        .clone()
        .oneshot(form_query("question=+++"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let oversized = format!("question={}", "a".repeat(5000));
    let response = t.app.clone().oneshot(form_query(&oversized)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_sanitizes_filename() {
    let t = test_app(None);
    let pdf = pdf_bytes(&["Sanitized upload content."]);

    let response = t
        .app
        .clone()
        .oneshot(multipart_upload("../evil.pdf", &pdf))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "evil.pdf");
    assert!(t.corpus.path().join("evil.pdf").is_file());
    assert!(!t.corpus.path().parent().unwrap().join("evil.pdf").exists());
}

#[tokio::test]
async fn test_upload_rejects_empty_file() {
    let t = test_app(None);

    let response = t
        .app
        .clone()
        .oneshot(multipart_upload("empty.pdf", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_requires_a_file_part() {
    let t = test_app(None);

    let boundary = "veridex-test-boundary";
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\njust text\r\n--{}--\r\n",
        boundary, boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_corrupt_pdf_is_reported_and_good_files_embed() {
    let t = test_app(None);
    let pdf = pdf_bytes(&["Good document text for embedding."]);

    t.app
        .clone()
        .oneshot(multipart_upload("good.pdf", &pdf))
        .await
        .unwrap();
    t.app
        .clone()
        .oneshot(multipart_upload("broken.pdf", b"not a pdf at all"))
        .await
        .unwrap();

    let response = t.app.clone().oneshot(post_empty("/embed_new")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["new_files"], serde_json::json!(["good.pdf"]));
    assert_eq!(body["failed_files"], serde_json::json!(["broken.pdf"]));
    assert!(body["embedded_chunks"].as_u64().unwrap() > 0);
}
