//! エラー型定義
//!
//! アップロード・レポート取得の各段階で発生するエラーと、
//! ワークフロー状態に保持するための `ErrorInfo`。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("写真が選択されていません")]
    EmptySelection,

    #[error("`file` フィールドでは写真を1枚しか送信できません（{0}枚選択）")]
    SingleFileField(usize),

    #[error("通信エラー: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("不正なレスポンス: {0}")]
    MalformedResponse(String),

    #[error("ジョブIDがありません。先に写真をアップロードしてください")]
    NoJobId,

    #[error("レポート生成に失敗しました: {0}")]
    ReportGenerationFailed(String),

    #[error("不正なジョブID: {0:?}")]
    InvalidJobId(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// エラー分類（UI表示・終了コード判定用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptySelection,
    InvalidInput,
    Network,
    HttpStatus,
    MalformedResponse,
    NoJobId,
    ReportGenerationFailed,
}

/// `Failed` 状態が保持するエラー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// HTTPステータス（HttpStatusのみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// ユーザーに表示するメッセージ
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(error: &Error) -> Self {
        let kind = match error {
            Error::EmptySelection => ErrorKind::EmptySelection,
            Error::SingleFileField(_) | Error::InvalidJobId(_) | Error::Config(_) => {
                ErrorKind::InvalidInput
            }
            Error::Network(_) => ErrorKind::Network,
            Error::HttpStatus { .. } => ErrorKind::HttpStatus,
            Error::MalformedResponse(_) | Error::Json(_) => ErrorKind::MalformedResponse,
            Error::NoJobId => ErrorKind::NoJobId,
            Error::ReportGenerationFailed(_) => ErrorKind::ReportGenerationFailed,
        };

        // サーバーが返したメッセージはそのまま表示する
        let (status, message) = match error {
            Error::HttpStatus { status, message } => (Some(*status), message.clone()),
            other => (None, other.to_string()),
        };

        Self { kind, status, message }
    }
}

impl From<Error> for ErrorInfo {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
