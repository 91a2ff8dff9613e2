//! 写真アップロード
//!
//! スナップショットをマルチパートに変換して1回だけ送信し、
//! レスポンスを `UploadOutcome` に分類する。

use super::transport::Transport;
use photo_scope_common::{
    classify_upload_response, decode_error_body, Endpoints, Error, Result, SubmissionRequest,
    UploadOutcome,
};
use std::sync::Arc;

pub struct SubmissionController<T: Transport> {
    transport: Arc<T>,
    endpoints: Endpoints,
}

impl<T: Transport> SubmissionController<T> {
    pub fn new(transport: Arc<T>, endpoints: Endpoints) -> Self {
        Self { transport, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// 送信（空の選択はネットワーク呼び出しなしで失敗）
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<UploadOutcome> {
        let payload = request.to_payload()?;
        let url = self.endpoints.upload_url(request.target());

        tracing::info!(
            url = %url,
            files = request.file_count(),
            field = request.photo_field().as_str(),
            job_id = ?request.target().job_id(),
            "写真を送信"
        );

        let reply = self.transport.post_multipart(&url, payload).await?;

        if !reply.is_success() {
            let message = decode_error_body(reply.status, &reply.body);
            tracing::warn!(status = reply.status, message = %message, "アップロード失敗");
            return Err(Error::HttpStatus {
                status: reply.status,
                message,
            });
        }

        let outcome = classify_upload_response(reply.status, &reply.body)?;
        tracing::debug!(job_id = ?outcome.job_id(), "アップロード完了");
        Ok(outcome)
    }
}
