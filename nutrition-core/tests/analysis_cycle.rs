//! End-to-end submit cycle against a stub inference client.

use nutrition_core::ai::prompts::DEFAULT_NUTRITION_PROMPT;
use nutrition_core::{
    build_request, AnalysisError, FakeInferenceClient, MealAnalyzer, QueryCounter, SessionStore,
    UploadedImage,
};
use std::sync::Arc;

/// A 10KB buffer that starts with a JPEG SOI/APP0 header.
fn ten_kb_jpeg() -> UploadedImage {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    data.resize(10 * 1024, 0);
    UploadedImage::detect(data).expect("JPEG header should be recognized")
}

#[tokio::test]
async fn upload_jpeg_and_submit() {
    let fake = Arc::new(FakeInferenceClient::with_response("Total Calories: 500"));
    let analyzer = MealAnalyzer::with_default_prompt(fake.clone());
    let store = SessionStore::default();
    let session = store.create();
    let image = ten_kb_jpeg();
    assert_eq!(image.mime_type, "image/jpeg");

    assert_eq!(session.counter.count(), 0);
    let response = analyzer
        .analyze(&session.counter, Some(&image))
        .await
        .unwrap();

    assert_eq!(response.text, "Total Calories: 500");
    assert_eq!(session.counter.count(), 1);
    assert_eq!(fake.calls(), 1);
    assert_eq!(fake.last_request().unwrap().image_len, 10 * 1024);
}

#[tokio::test]
async fn submit_without_file() {
    let fake = Arc::new(FakeInferenceClient::default());
    let analyzer = MealAnalyzer::with_default_prompt(fake.clone());
    let counter = QueryCounter::default();

    let err = analyzer.analyze(&counter, None).await.unwrap_err();

    assert_eq!(err.to_string(), "Please upload an image of a meal.");
    assert!(err.is_warning());
    assert_eq!(counter.count(), 0);
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn sixth_submission_is_refused() {
    let fake = Arc::new(FakeInferenceClient::with_response("ok"));
    let analyzer = MealAnalyzer::with_default_prompt(fake.clone());
    let counter = QueryCounter::new(5);
    let image = ten_kb_jpeg();

    for _ in 0..5 {
        analyzer.analyze(&counter, Some(&image)).await.unwrap();
    }
    assert_eq!(fake.calls(), 5);

    let err = analyzer.analyze(&counter, Some(&image)).await.unwrap_err();
    assert!(matches!(err, AnalysisError::LimitReached { limit: 5 }));
    assert!(err.is_warning());
    assert_eq!(fake.calls(), 5, "sixth request must not be dispatched");
    assert_eq!(counter.count(), 5);
}

#[tokio::test]
async fn concurrent_submissions_respect_limit() {
    let fake = Arc::new(FakeInferenceClient::with_response("ok"));
    let analyzer = Arc::new(MealAnalyzer::with_default_prompt(fake.clone()));
    let store = SessionStore::default();
    let session = store.create();
    let image = Arc::new(ten_kb_jpeg());

    let mut handles = Vec::new();
    for _ in 0..20 {
        let analyzer = Arc::clone(&analyzer);
        let session = Arc::clone(&session);
        let image = Arc::clone(&image);
        handles.push(tokio::spawn(async move {
            analyzer.analyze(&session.counter, Some(&image)).await.is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(fake.calls(), 5);
    assert_eq!(session.counter.count(), 5);
}

#[tokio::test]
async fn response_text_is_not_reformatted() {
    let raw = "\n  * Total Calories: 500 \n\n\tItem 1 - Calories: [Value]  ";
    let fake = Arc::new(FakeInferenceClient::with_response(raw));
    let analyzer = MealAnalyzer::with_default_prompt(fake);

    let response = analyzer
        .analyze(&QueryCounter::default(), Some(&ten_kb_jpeg()))
        .await
        .unwrap();
    assert_eq!(response.text, raw);
}

#[test]
fn builder_pairs_instruction_and_mime_type() {
    for mime in ["image/jpeg", "image/png"] {
        let image = UploadedImage::new(vec![7; 64], mime);
        let request = build_request(DEFAULT_NUTRITION_PROMPT, Some(&image)).unwrap();
        assert_eq!(request.instruction(), DEFAULT_NUTRITION_PROMPT);
        assert_eq!(request.mime_type(), mime);
    }
}
