//! 見積レポートの型定義
//!
//! - JobId: サーバーが発行するアップロードセッションID
//! - Estimate: インライン見積（写真ごとの明細と合計）
//! - ArtifactRef: ダウンロード可能な成果物（PDF等）への参照
//! - ReportResult: 上記2形式のどちらか

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URLパスとファイル名に埋め込むため使用できない文字
const FORBIDDEN_JOB_ID_CHARS: &[char] = &['/', '\\', '?', '#', '%'];

/// サーバー発行のジョブID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let invalid = id.is_empty()
            || id.chars().any(|c| c.is_whitespace() || FORBIDDEN_JOB_ID_CHARS.contains(&c));
        if invalid {
            return Err(Error::InvalidJobId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ダウンロード時の保存ファイル名 `{jobId}_scope_report.pdf`
    pub fn report_file_name(&self) -> String {
        format!("{}_scope_report.pdf", self.0)
    }
}

impl TryFrom<String> for JobId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.trim())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 明細行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub code: String,

    #[serde(default, rename = "desc")]
    pub description: String,

    #[serde(default, rename = "qty")]
    pub quantity: f64,

    #[serde(default, rename = "price")]
    pub unit_price: f64,

    #[serde(default, rename = "total")]
    pub line_total: f64,
}

/// 写真1枚分の見積
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoEstimate {
    #[serde(default)]
    pub image: String,          // 画像ラベル（ファイル名）

    #[serde(default)]
    pub scope: String,          // 作業範囲の説明

    #[serde(default)]
    pub line_items: Vec<LineItem>,

    #[serde(default)]
    pub subtotal: f64,
}

/// インライン見積
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub total_estimate: f64,
    pub results: Vec<PhotoEstimate>,
}

impl Estimate {
    pub fn line_item_count(&self) -> usize {
        self.results.iter().map(|r| r.line_items.len()).sum()
    }
}

/// 成果物参照のレスポンス上のキー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    PdfUrl,
    FilePath,
    ReportUrl,
}

impl ArtifactKind {
    pub fn field_name(&self) -> &'static str {
        match self {
            ArtifactKind::PdfUrl => "pdf_url",
            ArtifactKind::FilePath => "file_path",
            ArtifactKind::ReportUrl => "report_url",
        }
    }
}

/// ダウンロード可能な成果物への参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub location: String,
}

impl ArtifactRef {
    pub fn new(kind: ArtifactKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    /// 保存用ファイル名（参照の末尾セグメント）
    ///
    /// 空・`.`・`..` は `scope_report.pdf`、拡張子がなければ `.pdf` を付ける。
    pub fn file_name(&self) -> String {
        let path = self
            .location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !matches!(*name, "" | "." | ".."));

        match name {
            None => "scope_report.pdf".to_string(),
            Some(name) if name.contains('.') => name.to_string(),
            Some(name) => format!("{}.pdf", name),
        }
    }
}

/// レポート結果（インライン見積 or 成果物参照）
#[derive(Debug, Clone, PartialEq)]
pub enum ReportResult {
    Inline(Estimate),
    Artifact(ArtifactRef),
}
