//! アップロードセッション
//!
//! 共通の状態機械（`Workflow`）とHTTPクライアントを結び付ける。
//! 状態のロックはawaitをまたいで保持しない。
//! 送信中の二重送信は `Busy` として拒否し、選択変更・reset後に届いた応答は破棄する。

use crate::client::{DownloadedReport, ReportRetriever, SubmissionController, Transport};
use photo_scope_common::{
    ArtifactRef, AuxiliaryField, Completion, Endpoints, FileHandle, JobId, PhotoFieldName,
    Result, RetrievalRejection, SubmitRejection, UploadTarget, Workflow, WorkflowState,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// 送信・生成リクエストの結末
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 状態機械に反映された最終状態
    Completed(WorkflowState),
    /// 送信中のためリクエストを発行しなかった
    Busy,
    /// 応答到着前に選択変更・resetされたため破棄した
    Superseded,
}

pub struct UploadSession<T: Transport> {
    workflow: Mutex<Workflow>,
    submitter: SubmissionController<T>,
    retriever: ReportRetriever<T>,
    photo_field: PhotoFieldName,
}

impl<T: Transport> UploadSession<T> {
    pub fn new(transport: T, base_url: &str, photo_field: PhotoFieldName) -> Self {
        Self::with_shared(Arc::new(transport), base_url, photo_field)
    }

    pub fn with_shared(transport: Arc<T>, base_url: &str, photo_field: PhotoFieldName) -> Self {
        let endpoints = Endpoints::new(base_url);
        Self {
            workflow: Mutex::new(Workflow::default()),
            submitter: SubmissionController::new(Arc::clone(&transport), endpoints.clone()),
            retriever: ReportRetriever::new(transport, endpoints),
            photo_field,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Workflow> {
        self.workflow.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn base_url(&self) -> &str {
        self.submitter.endpoints().base_url()
    }

    pub fn photo_field(&self) -> PhotoFieldName {
        self.photo_field
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state().clone()
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.lock().job_id().cloned()
    }

    /// 写真を置き換え（結果はリセットされ `Idle` に戻る）
    pub fn select_files(&self, files: Vec<FileHandle>) {
        self.lock().set_files(files);
    }

    pub fn set_auxiliary_field(&self, field: AuxiliaryField) {
        self.lock().set_auxiliary_field(field);
    }

    /// 表示用プレビューラベル（選択順）
    pub fn preview_labels(&self) -> Vec<String> {
        self.lock()
            .selection()
            .previews()
            .iter()
            .map(|p| p.label())
            .collect()
    }

    pub fn live_previews(&self) -> usize {
        self.lock().selection().registry().live_count()
    }

    pub fn adopt_job_id(&self, job_id: JobId) {
        self.lock().adopt_job_id(job_id);
    }

    /// `Idle` に戻す（進行中の応答は破棄される）
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// 破棄: プレビュー解放と進行中リクエストの無効化
    pub fn teardown(&self) {
        self.lock().teardown();
    }

    /// 現在の選択を送信
    pub async fn submit(&self, target: UploadTarget) -> RequestOutcome {
        let begun = self.lock().begin_submission(target, self.photo_field);
        let (ticket, request) = match begun {
            Ok(started) => started,
            Err(SubmitRejection::Busy) => {
                tracing::debug!("送信中のため二重送信を拒否");
                return RequestOutcome::Busy;
            }
            Err(SubmitRejection::Invalid(info)) => {
                tracing::warn!(kind = ?info.kind, "送信前の検証に失敗: {}", info.message);
                return RequestOutcome::Completed(WorkflowState::Failed(info));
            }
        };

        let result = self.submitter.submit(&request).await;

        let mut workflow = self.lock();
        match workflow.complete_submission(ticket, result) {
            Completion::Applied => {
                tracing::info!(state = workflow.state().name(), "送信完了");
                RequestOutcome::Completed(workflow.state().clone())
            }
            Completion::Stale => {
                tracing::debug!("古い送信の応答を破棄");
                RequestOutcome::Superseded
            }
        }
    }

    /// レポート生成（IDを省略するとセッションのジョブIDを使う）
    pub async fn generate_report(&self, job_id: Option<JobId>) -> RequestOutcome {
        let begun = self.lock().begin_generation(job_id);
        let (ticket, job_id) = match begun {
            Ok(started) => started,
            Err(RetrievalRejection::Busy) => return RequestOutcome::Busy,
            Err(RetrievalRejection::NoJobId(info)) => {
                return RequestOutcome::Completed(WorkflowState::Failed(info));
            }
        };

        let result = self.retriever.generate_report(Some(&job_id)).await;

        let mut workflow = self.lock();
        match workflow.complete_generation(ticket, result) {
            Completion::Applied => RequestOutcome::Completed(workflow.state().clone()),
            Completion::Stale => RequestOutcome::Superseded,
        }
    }

    /// PDFをダウンロード（ワークフロー状態は変更しない）
    pub async fn download_report(&self, job_id: Option<JobId>) -> Result<DownloadedReport> {
        let job_id = job_id.or_else(|| self.job_id());
        self.retriever.download_report(job_id.as_ref()).await
    }

    /// 成果物参照から取得（ワークフロー状態は変更しない）
    pub async fn fetch_artifact(&self, artifact: &ArtifactRef) -> Result<DownloadedReport> {
        self.retriever.fetch_artifact(artifact).await
    }
}

impl<T: Transport> Drop for UploadSession<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
