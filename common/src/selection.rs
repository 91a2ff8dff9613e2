//! 写真選択の管理
//!
//! 写真ファイル群と補助入力（メモ・スコープ・スケッチ）を保持する。
//! 写真の置き換え時は以前のプレビューを全て解放する。

use crate::preview::{derive_previews, PreviewHandle, PreviewRegistry};
use std::fmt;
use std::sync::Arc;

/// バイト列 + ファイル名 + MIMEタイプ（中身は検査しない）
#[derive(Clone)]
pub struct FileHandle {
    file_name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// 拡張子からMIMEタイプを推定して作成
    pub fn with_guessed_mime(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for_file_name(&file_name);
        Self::new(file_name, mime_type, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// ファイル名の拡張子からMIMEタイプを推定
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// 選択状態のスナップショット
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub files: Vec<FileHandle>,
    pub notes: Option<String>,
    pub scope: Option<String>,
    pub sketch: Option<FileHandle>,
}

/// 補助入力
#[derive(Debug, Clone)]
pub enum AuxiliaryField {
    Notes(Option<String>),
    Scope(Option<String>),
    Sketch(Option<FileHandle>),
}

/// 空白のみのテキストは未入力扱い
fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// 選択マネージャ
#[derive(Debug, Default)]
pub struct SelectionManager {
    state: SelectionState,
    previews: Vec<PreviewHandle>,
    registry: PreviewRegistry,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: PreviewRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// 写真を置き換え（旧プレビューは解放）
    pub fn set_files(&mut self, files: Vec<FileHandle>) {
        self.release_previews();
        self.state.files = files;
        self.previews = derive_previews(&self.state.files, &self.registry).collect();
    }

    pub fn set_auxiliary_field(&mut self, field: AuxiliaryField) {
        match field {
            AuxiliaryField::Notes(notes) => self.state.notes = non_blank(notes),
            AuxiliaryField::Scope(scope) => self.state.scope = non_blank(scope),
            AuxiliaryField::Sketch(sketch) => self.state.sketch = sketch,
        }
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.state.files
    }

    pub fn previews(&self) -> &[PreviewHandle] {
        &self.previews
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    /// 送信用スナップショット（バイト列は共有）
    pub fn snapshot(&self) -> SelectionState {
        self.state.clone()
    }

    /// 破棄時: 全プレビューを解放
    pub fn teardown(&mut self) {
        self.release_previews();
    }

    fn release_previews(&mut self) {
        for preview in self.previews.drain(..) {
            preview.revoke();
        }
    }
}
