//! バックエンドHTTPクライアント
//!
//! - transport: HTTP送受信の抽象（reqwest実装）
//! - submission: 写真アップロード
//! - retriever: レポート生成・ダウンロード

pub mod transport;
pub mod submission;
pub mod retriever;

pub use transport::{HttpReply, ReqwestTransport, Transport};
pub use submission::SubmissionController;
pub use retriever::{DownloadedReport, ReportRetriever};
