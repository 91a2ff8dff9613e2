//! バックエンドレスポンスパーサー
//!
//! 成功レスポンスはフィールドの有無で3形式に分類する（パスでは判定しない）:
//! 1. インライン見積（`total_estimate` / `results`）
//! 2. 成果物参照（`pdf_url` / `file_path` / `report_url`）
//! 3. ジョブIDのみ（後続の生成呼び出しが必要）

use crate::error::{Error, Result};
use crate::types::{ArtifactKind, ArtifactRef, Estimate, JobId, PhotoEstimate};
use serde::Deserialize;
use serde_json::{Map, Value};

/// 成果物参照として扱うキー（優先順）
const ARTIFACT_FIELDS: &[ArtifactKind] = &[
    ArtifactKind::PdfUrl,
    ArtifactKind::FilePath,
    ArtifactKind::ReportUrl,
];

/// エラーメッセージとして扱うキー（優先順）
const ERROR_FIELDS: &[&str] = &["error", "detail", "message"];

/// アップロード成功レスポンスの分類結果
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Inline {
        estimate: Estimate,
        job_id: Option<JobId>,
    },
    Artifact {
        artifact: ArtifactRef,
        job_id: Option<JobId>,
    },
    Deferred(JobId),
}

impl UploadOutcome {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            UploadOutcome::Inline { job_id, .. } | UploadOutcome::Artifact { job_id, .. } => {
                job_id.as_ref()
            }
            UploadOutcome::Deferred(job_id) => Some(job_id),
        }
    }
}

#[derive(Deserialize)]
struct RawEstimate {
    #[serde(default)]
    total_estimate: Option<f64>,
    #[serde(default)]
    results: Vec<PhotoEstimate>,
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::MalformedResponse(format!("JSONパースエラー: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::MalformedResponse(format!(
            "JSONオブジェクトではありません: {}",
            other
        ))),
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn artifact_from(map: &Map<String, Value>) -> Option<ArtifactRef> {
    ARTIFACT_FIELDS.iter().find_map(|kind| {
        non_empty_str(map, kind.field_name()).map(|location| ArtifactRef::new(*kind, location))
    })
}

fn job_id_from(map: &Map<String, Value>) -> Result<Option<JobId>> {
    match map.get("job_id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => JobId::new(id.as_str())
            .map(Some)
            .map_err(|e| Error::MalformedResponse(e.to_string())),
        Some(other) => Err(Error::MalformedResponse(format!(
            "job_idが文字列ではありません: {}",
            other
        ))),
    }
}

/// JSONからエラーメッセージを取り出す
///
/// FastAPIのバリデーションエラー（`detail` が配列）は `msg` を連結する。
fn error_message_from_json(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    ERROR_FIELDS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    })
}

fn generic_error_message(status: u16) -> String {
    format!("サーバーエラーが発生しました (HTTP {})", status)
}

/// 非2xxレスポンスのメッセージを取得
///
/// 優先順位:
/// 1. 構造化エラー（`error` / `detail` / `message`）
/// 2. 生のレスポンステキスト
/// 3. 汎用メッセージ
pub fn decode_error_body(status: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = error_message_from_json(&value) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    generic_error_message(status)
}

/// アップロード成功（2xx）レスポンスを分類
pub fn classify_upload_response(status: u16, body: &[u8]) -> Result<UploadOutcome> {
    let map = parse_object(body)?;

    // 2xxでもエラー本文ならサーバー拒否として扱う
    if let Some(message) = non_empty_str(&map, "error") {
        return Err(Error::HttpStatus {
            status,
            message: message.to_string(),
        });
    }

    if map.contains_key("total_estimate") || map.contains_key("results") {
        let job_id = job_id_from(&map)?;
        let raw: RawEstimate = serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::MalformedResponse(format!("見積のパースに失敗: {}", e)))?;
        let total_estimate = raw
            .total_estimate
            .unwrap_or_else(|| raw.results.iter().map(|r| r.subtotal).sum());
        return Ok(UploadOutcome::Inline {
            estimate: Estimate {
                total_estimate,
                results: raw.results,
            },
            job_id,
        });
    }

    if let Some(artifact) = artifact_from(&map) {
        let job_id = job_id_from(&map)?;
        return Ok(UploadOutcome::Artifact { artifact, job_id });
    }

    if let Some(job_id) = job_id_from(&map)? {
        return Ok(UploadOutcome::Deferred(job_id));
    }

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    Err(Error::MalformedResponse(format!(
        "想定外のレスポンス形式です (keys: {:?})",
        keys
    )))
}

/// レポート生成（2xx）レスポンスから成果物参照を取り出す
pub fn parse_generate_response(body: &[u8]) -> Result<ArtifactRef> {
    let map = parse_object(body)?;

    if let Some(artifact) = artifact_from(&map) {
        return Ok(artifact);
    }

    let reason = error_message_from_json(&Value::Object(map))
        .unwrap_or_else(|| "レスポンスにレポートURLがありません".to_string());
    Err(Error::ReportGenerationFailed(reason))
}
