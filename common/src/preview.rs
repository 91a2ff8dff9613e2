//! プレビューハンドル
//!
//! 選択された写真ごとに取得する解放可能なハンドル。
//! 選択の置き換え・破棄時に必ず解放する（Dropでも解放される）。

use crate::selection::FileHandle;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: BTreeSet<u64>,
}

/// 発行済みプレビューハンドルの台帳
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn acquire(&self) -> u64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.live.insert(id);
        id
    }

    fn release(&self, id: u64) {
        self.lock().live.remove(&id);
    }

    /// 未解放のハンドル数
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.lock().live.contains(&id)
    }
}

/// 解放可能なプレビューハンドル
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    file_name: String,
    mime_type: String,
    size: usize,
    registry: PreviewRegistry,
    released: bool,
}

impl PreviewHandle {
    fn acquire(file: &FileHandle, registry: &PreviewRegistry) -> Self {
        Self {
            id: registry.acquire(),
            file_name: file.file_name().to_string(),
            mime_type: file.mime_type().to_string(),
            size: file.len(),
            registry: registry.clone(),
            released: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 表示用ラベル 例: `photo1.jpg (image/jpeg, 1.2 KB)`
    pub fn label(&self) -> String {
        format!("{} ({}, {})", self.file_name, self.mime_type, human_size(self.size))
    }

    /// 明示的に解放
    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.registry.release(self.id);
            self.released = true;
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// ファイル順にプレビューハンドルを遅延生成
pub fn derive_previews<'a>(
    files: &'a [FileHandle],
    registry: &'a PreviewRegistry,
) -> impl Iterator<Item = PreviewHandle> + 'a {
    files.iter().map(move |file| PreviewHandle::acquire(file, registry))
}

fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
