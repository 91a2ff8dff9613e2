use photo_scope::client::ReqwestTransport;
use photo_scope::session::{RequestOutcome, UploadSession};
use photo_scope_common::{FileHandle, PhotoFieldName, ReportResult, UploadTarget, WorkflowState};
use std::time::Duration;

// 1x1 PNG
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[tokio::test]
async fn backend_upload_integration() {
    let base_url = match std::env::var("PHOTO_SCOPE_TEST_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("PHOTO_SCOPE_TEST_URL not set; skipping integration test");
            return;
        }
    };

    let transport = ReqwestTransport::new(Duration::from_secs(120)).expect("client build failed");
    let session = UploadSession::new(transport, &base_url, PhotoFieldName::Files);
    session.select_files(vec![FileHandle::with_guessed_mime("integration-test.png", TINY_PNG)]);

    let outcome = session.submit(UploadTarget::Upload).await;

    match outcome {
        RequestOutcome::Completed(WorkflowState::Succeeded(ReportResult::Inline(estimate))) => {
            assert!(estimate.total_estimate >= 0.0);
        }
        RequestOutcome::Completed(WorkflowState::Succeeded(ReportResult::Artifact(artifact))) => {
            let report = session.fetch_artifact(&artifact).await.expect("artifact fetch failed");
            assert!(!report.bytes.is_empty());
        }
        RequestOutcome::Completed(WorkflowState::Accepted(job_id)) => {
            let report = session.download_report(Some(job_id)).await.expect("download failed");
            assert!(report.file_name.ends_with("_scope_report.pdf"));
        }
        other => panic!("backend upload failed: {:?}", other),
    }
}
