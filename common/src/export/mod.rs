//! 見積の出力（コンソール表示・Excelバッファ）

pub mod text;

#[cfg(feature = "excel")]
pub mod excel_core;
