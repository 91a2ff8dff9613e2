//! 送信リクエストとマルチパートペイロード
//!
//! 写真のフィールド名はバックエンドと一致しないと全リクエストが4xxになるため、
//! `PhotoFieldName` として設定で受け取る。

use crate::error::{Error, Result};
use crate::selection::{FileHandle, SelectionState};
use crate::types::JobId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 写真フィールド名（`files`: 複数枚用, `file`: 1枚用）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFieldName {
    #[default]
    Files,
    File,
}

impl PhotoFieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoFieldName::Files => "files",
            PhotoFieldName::File => "file",
        }
    }
}

impl FromStr for PhotoFieldName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "files" => Ok(PhotoFieldName::Files),
            "file" => Ok(PhotoFieldName::File),
            _ => Err(format!("Unknown field name: {}. Use files or file", s)),
        }
    }
}

impl std::fmt::Display for PhotoFieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// アップロード先エンドポイント
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadTarget {
    /// `POST /upload`
    Upload,
    /// `POST /upload-inspection`
    Inspection,
    /// `POST /upload-work/{jobId}`
    Work(JobId),
}

impl UploadTarget {
    /// 写真1枚以上が必須か
    pub fn requires_files(&self) -> bool {
        !matches!(self, UploadTarget::Inspection)
    }

    /// ベースURLからの相対パス
    pub fn path(&self) -> String {
        match self {
            UploadTarget::Upload => "upload".to_string(),
            UploadTarget::Inspection => "upload-inspection".to_string(),
            UploadTarget::Work(job_id) => format!("upload-work/{}", job_id),
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            UploadTarget::Work(job_id) => Some(job_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PartBody {
    Text(String),
    File(FileHandle),
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub body: PartBody,
}

/// マルチパートボディ（トランスポート非依存）
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    fn push_text(&mut self, name: &str, text: &str) {
        self.parts.push(Part {
            name: name.to_string(),
            body: PartBody::Text(text.to_string()),
        });
    }

    fn push_file(&mut self, name: &str, file: &FileHandle) {
        self.parts.push(Part {
            name: name.to_string(),
            body: PartBody::File(file.clone()),
        });
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// 指定フィールドのファイル名一覧
    pub fn file_names(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .filter_map(|p| match &p.body {
                PartBody::File(file) => Some(file.file_name()),
                PartBody::Text(_) => None,
            })
            .collect()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match &p.body {
            PartBody::Text(text) if p.name == name => Some(text.as_str()),
            _ => None,
        })
    }
}

/// 送信1回分の不変スナップショット
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    selection: SelectionState,
    target: UploadTarget,
    photo_field: PhotoFieldName,
}

impl SubmissionRequest {
    pub fn new(selection: SelectionState, target: UploadTarget, photo_field: PhotoFieldName) -> Self {
        Self {
            selection,
            target,
            photo_field,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    pub fn photo_field(&self) -> PhotoFieldName {
        self.photo_field
    }

    pub fn file_count(&self) -> usize {
        self.selection.files.len()
    }

    /// ネットワーク呼び出し前の検証
    pub fn validate(&self) -> Result<()> {
        let count = self.file_count();
        if count == 0 && self.target.requires_files() {
            return Err(Error::EmptySelection);
        }
        if count > 1 && self.photo_field == PhotoFieldName::File {
            return Err(Error::SingleFileField(count));
        }
        Ok(())
    }

    /// マルチパートボディを構築（任意項目は値がある時のみ）
    pub fn to_payload(&self) -> Result<MultipartPayload> {
        self.validate()?;

        let mut payload = MultipartPayload::default();
        let field = self.photo_field.as_str();
        for file in &self.selection.files {
            payload.push_file(field, file);
        }
        if let Some(notes) = &self.selection.notes {
            payload.push_text("notes", notes);
        }
        if let Some(scope) = &self.selection.scope {
            payload.push_text("scope", scope);
        }
        if let Some(sketch) = &self.selection.sketch {
            payload.push_file("sketch", sketch);
        }
        Ok(payload)
    }
}
