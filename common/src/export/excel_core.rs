//! Excel生成（共通ライブラリ）
//!
//! インライン見積を明細表形式のExcelバッファに書き出す。

use crate::types::Estimate;
use rust_xlsxwriter::*;

/// 列定義（見出し, 幅）
const COLUMNS: &[(&str, f64)] = &[
    ("画像", 22.0),
    ("コード", 12.0),
    ("内容", 40.0),
    ("数量", 8.0),
    ("単価", 12.0),
    ("金額", 14.0),
];

const COL_IMAGE: u16 = 0;
const COL_CODE: u16 = 1;
const COL_DESC: u16 = 2;
const COL_QTY: u16 = 3;
const COL_PRICE: u16 = 4;
const COL_TOTAL: u16 = 5;
const LAST_COL: u16 = COL_TOTAL;

/// 見積Excelをバッファに生成
///
/// # Arguments
/// * `estimate` - インライン見積
/// * `title` - シート先頭のタイトル
pub fn generate_estimate_excel_buffer(estimate: &Estimate, title: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    // フォーマット定義
    let title_format = Format::new()
        .set_bold()
        .set_font_size(14.0)
        .set_align(FormatAlign::Left);

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let text_format = Format::new()
        .set_font_size(10.0)
        .set_text_wrap()
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let scope_format = Format::new()
        .set_font_size(9.0)
        .set_italic()
        .set_font_color(Color::RGB(0x555555))
        .set_text_wrap();

    let number_format = Format::new()
        .set_font_size(10.0)
        .set_num_format("#,##0.##")
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let money_format = Format::new()
        .set_font_size(10.0)
        .set_num_format("#,##0.00")
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let subtotal_label_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_align(FormatAlign::Right);

    let subtotal_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_num_format("#,##0.00")
        .set_border(FormatBorder::Thin);

    let total_format = Format::new()
        .set_bold()
        .set_font_size(12.0)
        .set_num_format("#,##0.00")
        .set_background_color(Color::RGB(0xFFF4CC))
        .set_border(FormatBorder::Medium);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("見積")
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, (_, width)) in COLUMNS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }

    worksheet.merge_range(0, 0, 0, LAST_COL, title, &title_format)
        .map_err(|e| format!("タイトル書き込みエラー: {}", e))?;

    for (col, (label, _)) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(1, col as u16, *label, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    }
    worksheet.set_freeze_panes(2, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

    let mut row: u32 = 2;

    for photo in &estimate.results {
        worksheet.write_string_with_format(row, COL_IMAGE, photo.image.as_str(), &text_format)
            .map_err(|e| format!("画像名書き込みエラー: {}", e))?;

        if !photo.scope.is_empty() {
            worksheet.merge_range(row, COL_CODE, row, LAST_COL, &photo.scope, &scope_format)
                .map_err(|e| format!("作業範囲書き込みエラー: {}", e))?;
        }
        row += 1;

        for item in &photo.line_items {
            worksheet.write_string_with_format(row, COL_CODE, item.code.as_str(), &text_format)
                .map_err(|e| format!("明細書き込みエラー: {}", e))?;
            worksheet.write_string_with_format(row, COL_DESC, item.description.as_str(), &text_format)
                .map_err(|e| format!("明細書き込みエラー: {}", e))?;
            worksheet.write_number_with_format(row, COL_QTY, item.quantity, &number_format)
                .map_err(|e| format!("明細書き込みエラー: {}", e))?;
            worksheet.write_number_with_format(row, COL_PRICE, item.unit_price, &money_format)
                .map_err(|e| format!("明細書き込みエラー: {}", e))?;
            worksheet.write_number_with_format(row, COL_TOTAL, item.line_total, &money_format)
                .map_err(|e| format!("明細書き込みエラー: {}", e))?;
            row += 1;
        }

        worksheet.write_string_with_format(row, COL_PRICE, "小計", &subtotal_label_format)
            .map_err(|e| format!("小計書き込みエラー: {}", e))?;
        worksheet.write_number_with_format(row, COL_TOTAL, photo.subtotal, &subtotal_format)
            .map_err(|e| format!("小計書き込みエラー: {}", e))?;
        row += 2;
    }

    worksheet.write_string_with_format(row, COL_PRICE, "合計", &subtotal_label_format)
        .map_err(|e| format!("合計書き込みエラー: {}", e))?;
    worksheet.write_number_with_format(row, COL_TOTAL, estimate.total_estimate, &total_format)
        .map_err(|e| format!("合計書き込みエラー: {}", e))?;

    // バッファに書き出し
    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
