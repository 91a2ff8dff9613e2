//! レポート取得
//!
//! - generate_report: `GET /generate-report/{jobId}` → 成果物参照
//! - download_report: `GET /download/{jobId}` → PDFバイト列
//! - fetch_artifact: 成果物参照（pdf_url等）から直接取得

use super::transport::{HttpReply, Transport};
use photo_scope_common::{
    decode_error_body, parse_generate_response, ArtifactRef, Endpoints, Error, JobId, Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// ダウンロードしたレポート
#[derive(Debug, Clone)]
pub struct DownloadedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DownloadedReport {
    /// 指定ディレクトリに保存
    pub fn save_into(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub struct ReportRetriever<T: Transport> {
    transport: Arc<T>,
    endpoints: Endpoints,
}

fn ensure_success(reply: &HttpReply) -> Result<()> {
    if reply.is_success() {
        return Ok(());
    }
    Err(Error::HttpStatus {
        status: reply.status,
        message: decode_error_body(reply.status, &reply.body),
    })
}

impl<T: Transport> ReportRetriever<T> {
    pub fn new(transport: Arc<T>, endpoints: Endpoints) -> Self {
        Self { transport, endpoints }
    }

    /// レポート生成を依頼して成果物参照を取得
    pub async fn generate_report(&self, job_id: Option<&JobId>) -> Result<ArtifactRef> {
        let job_id = job_id.ok_or(Error::NoJobId)?;
        let url = self.endpoints.generate_report_url(job_id);
        tracing::info!(url = %url, job_id = %job_id, "レポート生成を依頼");

        let reply = self.transport.get(&url).await?;
        ensure_success(&reply)?;
        parse_generate_response(&reply.body)
    }

    /// ジョブIDでPDFをダウンロード（保存名は `{jobId}_scope_report.pdf`）
    pub async fn download_report(&self, job_id: Option<&JobId>) -> Result<DownloadedReport> {
        let job_id = job_id.ok_or(Error::NoJobId)?;
        let url = self.endpoints.download_url(job_id);
        tracing::info!(url = %url, job_id = %job_id, "レポートをダウンロード");

        let bytes = self.fetch_bytes(&url).await?;
        Ok(DownloadedReport {
            file_name: job_id.report_file_name(),
            bytes,
        })
    }

    /// 成果物参照から取得（相対参照はベースURLに結合）
    pub async fn fetch_artifact(&self, artifact: &ArtifactRef) -> Result<DownloadedReport> {
        let url = self.endpoints.resolve_artifact(artifact);
        tracing::info!(url = %url, field = artifact.kind.field_name(), "成果物を取得");

        let bytes = self.fetch_bytes(&url).await?;
        Ok(DownloadedReport {
            file_name: artifact.file_name(),
            bytes,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let reply = self.transport.get(url).await?;
        if let Err(error) = ensure_success(&reply) {
            tracing::warn!(url = %url, status = reply.status, "ダウンロード失敗");
            return Err(error);
        }
        if reply.body.is_empty() {
            return Err(Error::MalformedResponse("レポートが空です".into()));
        }
        Ok(reply.body)
    }
}
