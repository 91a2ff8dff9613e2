//! アップロードワークフローの状態機械
//!
//! 状態遷移はユーザー操作かネットワーク完了でのみ起こる（時間経過では変化しない）。
//!
//! ```text
//! Idle ──submit──▶ Submitting ──完了──▶ Succeeded / Accepted / Failed
//!   ▲                  │
//!   └──写真変更・reset──┘（応答は破棄）
//! ```
//!
//! 送信ごとにエポックを進め、チケットのエポックが一致しない完了は破棄する。

use crate::error::{Error, ErrorInfo};
use crate::parser::UploadOutcome;
use crate::payload::{PhotoFieldName, SubmissionRequest, UploadTarget};
use crate::selection::{AuxiliaryField, FileHandle, SelectionManager};
use crate::types::{ArtifactRef, JobId, ReportResult};

/// ワークフロー状態
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    /// アップロード受付済み、レポートは後続の生成呼び出しで取得
    Accepted(JobId),
    Succeeded(ReportResult),
    Failed(ErrorInfo),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Accepted(_) => "accepted",
            WorkflowState::Succeeded(_) => "succeeded",
            WorkflowState::Failed(_) => "failed",
        }
    }
}

/// 送信・生成リクエストの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

/// 完了通知の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// 新しい送信・選択変更・resetの後に届いた応答
    Stale,
}

/// 送信を開始できなかった理由
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRejection {
    /// 送信中のため二重送信しない
    Busy,
    /// 検証エラー（状態は `Failed` に遷移済み）
    Invalid(ErrorInfo),
}

/// レポート取得を開始できなかった理由
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalRejection {
    Busy,
    /// ジョブIDなし（状態は `Failed` に遷移済み）
    NoJobId(ErrorInfo),
}

#[derive(Debug)]
pub struct Workflow {
    selection: SelectionManager,
    state: WorkflowState,
    job_id: Option<JobId>,
    epoch: u64,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(SelectionManager::new())
    }
}

impl Workflow {
    pub fn new(selection: SelectionManager) -> Self {
        Self {
            selection,
            state: WorkflowState::Idle,
            job_id: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, WorkflowState::Submitting)
    }

    /// 写真の選択を置き換える
    ///
    /// 結果・エラーを破棄して `Idle` に戻り、送信中の応答は無効になる。
    /// ジョブIDと補助入力は保持する。
    pub fn set_files(&mut self, files: Vec<FileHandle>) {
        self.selection.set_files(files);
        self.reset();
    }

    /// 補助入力の変更は状態をリセットしない
    pub fn set_auxiliary_field(&mut self, field: AuxiliaryField) {
        self.selection.set_auxiliary_field(field);
    }

    /// `Idle` に戻し、進行中のリクエストの応答を無効化
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.state = WorkflowState::Idle;
    }

    /// 保存済みのジョブIDを引き継ぐ
    pub fn adopt_job_id(&mut self, job_id: JobId) {
        self.job_id = Some(job_id);
    }

    pub fn teardown(&mut self) {
        self.reset();
        self.selection.teardown();
    }

    /// 送信開始: スナップショットを作り `Submitting` に遷移
    pub fn begin_submission(
        &mut self,
        target: UploadTarget,
        photo_field: PhotoFieldName,
    ) -> Result<(Ticket, SubmissionRequest), SubmitRejection> {
        if self.is_submitting() {
            return Err(SubmitRejection::Busy);
        }

        let request = SubmissionRequest::new(self.selection.snapshot(), target, photo_field);
        if let Err(error) = request.validate() {
            let info = ErrorInfo::from(&error);
            self.state = WorkflowState::Failed(info.clone());
            return Err(SubmitRejection::Invalid(info));
        }

        self.epoch += 1;
        self.state = WorkflowState::Submitting;
        Ok((Ticket { epoch: self.epoch }, request))
    }

    /// 送信完了を反映
    pub fn complete_submission(
        &mut self,
        ticket: Ticket,
        result: Result<UploadOutcome, Error>,
    ) -> Completion {
        if ticket.epoch != self.epoch || !self.is_submitting() {
            return Completion::Stale;
        }

        self.state = match result {
            Ok(outcome) => {
                if let Some(job_id) = outcome.job_id() {
                    self.job_id = Some(job_id.clone());
                }
                match outcome {
                    UploadOutcome::Inline { estimate, .. } => {
                        WorkflowState::Succeeded(ReportResult::Inline(estimate))
                    }
                    UploadOutcome::Artifact { artifact, .. } => {
                        WorkflowState::Succeeded(ReportResult::Artifact(artifact))
                    }
                    UploadOutcome::Deferred(job_id) => WorkflowState::Accepted(job_id),
                }
            }
            Err(error) => WorkflowState::Failed(ErrorInfo::from(&error)),
        };
        Completion::Applied
    }

    /// レポート生成開始（明示IDがなければセッションのジョブIDを使う）
    pub fn begin_generation(
        &mut self,
        explicit: Option<JobId>,
    ) -> Result<(Ticket, JobId), RetrievalRejection> {
        if self.is_submitting() {
            return Err(RetrievalRejection::Busy);
        }

        match explicit.or_else(|| self.job_id.clone()) {
            Some(job_id) => Ok((Ticket { epoch: self.epoch }, job_id)),
            None => {
                let info = ErrorInfo::from(&Error::NoJobId);
                self.state = WorkflowState::Failed(info.clone());
                Err(RetrievalRejection::NoJobId(info))
            }
        }
    }

    /// レポート生成完了を反映
    pub fn complete_generation(
        &mut self,
        ticket: Ticket,
        result: Result<ArtifactRef, Error>,
    ) -> Completion {
        if ticket.epoch != self.epoch || self.is_submitting() {
            return Completion::Stale;
        }

        self.state = match result {
            Ok(artifact) => WorkflowState::Succeeded(ReportResult::Artifact(artifact)),
            Err(error) => WorkflowState::Failed(ErrorInfo::from(&error)),
        };
        Completion::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{ArtifactKind, Estimate};

    fn jpg(name: &str) -> FileHandle {
        FileHandle::with_guessed_mime(name, vec![0u8; 8])
    }

    fn workflow_with_files(names: &[&str]) -> Workflow {
        let mut workflow = Workflow::default();
        workflow.set_files(names.iter().map(|n| jpg(n)).collect());
        workflow
    }

    fn inline(total: f64) -> UploadOutcome {
        UploadOutcome::Inline {
            estimate: Estimate {
                total_estimate: total,
                results: Vec::new(),
            },
            job_id: Some(JobId::new("j-inline").unwrap()),
        }
    }

    #[test]
    fn test_empty_selection_fails_without_ticket() {
        let mut workflow = Workflow::default();
        let rejected = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap_err();
        match rejected {
            SubmitRejection::Invalid(info) => assert_eq!(info.kind, ErrorKind::EmptySelection),
            other => panic!("unexpected rejection: {:?}", other),
        }
        assert!(matches!(workflow.state(), WorkflowState::Failed(_)));
    }

    #[test]
    fn test_submission_success_inline() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, request) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        assert_eq!(request.file_count(), 1);
        assert_eq!(workflow.state(), &WorkflowState::Submitting);

        assert_eq!(workflow.complete_submission(ticket, Ok(inline(150.5))), Completion::Applied);
        match workflow.state() {
            WorkflowState::Succeeded(ReportResult::Inline(estimate)) => {
                assert_eq!(estimate.total_estimate, 150.5)
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert_eq!(workflow.job_id().unwrap().as_str(), "j-inline");
    }

    #[test]
    fn test_artifact_response_keeps_job_id() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        let outcome = UploadOutcome::Artifact {
            artifact: ArtifactRef::new(ArtifactKind::FilePath, "reports/j1_scope_report.pdf"),
            job_id: Some(JobId::new("j1").unwrap()),
        };

        assert_eq!(workflow.complete_submission(ticket, Ok(outcome)), Completion::Applied);
        assert!(matches!(
            workflow.state(),
            WorkflowState::Succeeded(ReportResult::Artifact(_))
        ));
        assert_eq!(workflow.job_id().unwrap().as_str(), "j1");
    }

    #[test]
    fn test_second_submission_is_busy() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        assert_eq!(
            workflow
                .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
                .unwrap_err(),
            SubmitRejection::Busy
        );
        assert_eq!(workflow.complete_submission(ticket, Ok(inline(1.0))), Completion::Applied);
    }

    #[test]
    fn test_file_change_discards_in_flight_response() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();

        workflow.set_files(vec![jpg("b.jpg")]);
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert_eq!(workflow.complete_submission(ticket, Ok(inline(9.0))), Completion::Stale);
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(workflow.job_id().is_none());
    }

    #[test]
    fn test_old_ticket_cannot_overwrite_newer_submission() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (old, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        workflow.reset();
        let (new, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();

        assert_eq!(workflow.complete_submission(old, Ok(inline(1.0))), Completion::Stale);
        assert_eq!(workflow.state(), &WorkflowState::Submitting);
        assert_eq!(workflow.complete_submission(new, Ok(inline(2.0))), Completion::Applied);
    }

    #[test]
    fn test_file_change_resets_result_and_releases_previews() {
        let mut workflow = workflow_with_files(&["a.jpg", "b.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        workflow.complete_submission(ticket, Err(Error::Network("refused".into())));
        assert!(matches!(workflow.state(), WorkflowState::Failed(_)));
        // 失敗してもプレビューは残る
        assert_eq!(workflow.selection().registry().live_count(), 2);

        workflow.set_files(vec![jpg("c.jpg")]);
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert_eq!(workflow.selection().registry().live_count(), 1);
    }

    #[test]
    fn test_auxiliary_field_does_not_reset() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        workflow.complete_submission(ticket, Ok(inline(3.0)));

        workflow.set_auxiliary_field(AuxiliaryField::Notes(Some("追記".into())));
        assert!(matches!(workflow.state(), WorkflowState::Succeeded(_)));
    }

    #[test]
    fn test_deferred_then_generation() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        let (ticket, _) = workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        let job = JobId::new("abc123").unwrap();
        workflow.complete_submission(ticket, Ok(UploadOutcome::Deferred(job.clone())));
        assert_eq!(workflow.state(), &WorkflowState::Accepted(job.clone()));

        // ジョブIDは選択変更後も残る
        workflow.set_files(Vec::new());
        let (ticket, used) = workflow.begin_generation(None).unwrap();
        assert_eq!(used, job);

        let artifact = ArtifactRef::new(ArtifactKind::ReportUrl, "/reports/abc123.pdf");
        assert_eq!(workflow.complete_generation(ticket, Ok(artifact.clone())), Completion::Applied);
        assert_eq!(
            workflow.state(),
            &WorkflowState::Succeeded(ReportResult::Artifact(artifact))
        );
    }

    #[test]
    fn test_generation_without_job_id() {
        let mut workflow = Workflow::default();
        match workflow.begin_generation(None).unwrap_err() {
            RetrievalRejection::NoJobId(info) => assert_eq!(info.kind, ErrorKind::NoJobId),
            other => panic!("unexpected rejection: {:?}", other),
        }
        assert!(matches!(workflow.state(), WorkflowState::Failed(_)));
    }

    #[test]
    fn test_generation_busy_while_submitting() {
        let mut workflow = workflow_with_files(&["a.jpg"]);
        workflow.adopt_job_id(JobId::new("old").unwrap());
        workflow
            .begin_submission(UploadTarget::Upload, PhotoFieldName::Files)
            .unwrap();
        assert_eq!(workflow.begin_generation(None).unwrap_err(), RetrievalRejection::Busy);
    }

    #[test]
    fn test_generation_failure_sets_failed() {
        let mut workflow = Workflow::default();
        let (ticket, _) = workflow
            .begin_generation(Some(JobId::new("x1").unwrap()))
            .unwrap();
        workflow.complete_generation(
            ticket,
            Err(Error::ReportGenerationFailed("no artifact".into())),
        );
        match workflow.state() {
            WorkflowState::Failed(info) => assert_eq!(info.kind, ErrorKind::ReportGenerationFailed),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut workflow = workflow_with_files(&["a.jpg", "b.jpg"]);
        let registry = workflow.selection().registry().clone();
        workflow.teardown();
        assert_eq!(registry.live_count(), 0);
        assert_eq!(workflow.state(), &WorkflowState::Idle);
    }
}
