//! Excel生成（CLI版）
//!
//! 共通ライブラリでバッファを生成してファイルに書き出す

use crate::error::{PhotoScopeError, Result};
use photo_scope_common::export::excel_core::generate_estimate_excel_buffer;
use photo_scope_common::Estimate;
use std::path::Path;

pub fn generate_excel(estimate: &Estimate, output_path: &Path, title: &str) -> Result<()> {
    let buffer = generate_estimate_excel_buffer(estimate, title)
        .map_err(PhotoScopeError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
