pub mod excel;

use crate::error::Result;
use photo_scope_common::Estimate;
use std::path::Path;

/// 見積をJSONで保存（サーバー応答と同じキー）
pub fn write_estimate_json(estimate: &Estimate, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(estimate)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 見積を読み込み
pub fn read_estimate_json(input_path: &Path) -> Result<Estimate> {
    let content = std::fs::read_to_string(input_path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn export_estimate(
    estimate: &Estimate,
    json_path: Option<&Path>,
    excel_path: Option<&Path>,
    title: &str,
) -> Result<()> {
    if let Some(path) = json_path {
        println!("- JSONを保存中...");
        write_estimate_json(estimate, path)?;
        println!("✔ JSON出力: {}", path.display());
    }

    if let Some(path) = excel_path {
        println!("- Excelを生成中...");
        excel::generate_excel(estimate, path, title)?;
        println!("✔ Excel出力: {}", path.display());
    }

    Ok(())
}
