//! 見積のテキスト表示

use crate::types::Estimate;
use std::fmt::Write;

fn money(value: f64) -> String {
    format!("${:.2}", value)
}

fn quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// 見積をコンソール表示用のテキストに整形
pub fn render_estimate(estimate: &Estimate) -> String {
    let mut out = String::new();

    for (index, photo) in estimate.results.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", index + 1, photo.image);
        if !photo.scope.is_empty() {
            let _ = writeln!(out, "    範囲: {}", photo.scope);
        }
        for item in &photo.line_items {
            let _ = writeln!(
                out,
                "    {:<10} {:<30} 数量 {:>6} × {:>10} = {:>10}",
                item.code,
                item.description,
                quantity(item.quantity),
                money(item.unit_price),
                money(item.line_total),
            );
        }
        let _ = writeln!(out, "    小計: {}", money(photo.subtotal));
    }

    let _ = write!(out, "合計見積: {}", money(estimate.total_estimate));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineItem, PhotoEstimate};

    #[test]
    fn test_render_estimate_keeps_order() {
        let estimate = Estimate {
            total_estimate: 150.5,
            results: vec![
                PhotoEstimate {
                    image: "first.jpg".into(),
                    scope: "Repaint".into(),
                    line_items: vec![LineItem {
                        code: "PAINT45".into(),
                        description: "Repainting walls".into(),
                        quantity: 1.0,
                        unit_price: 100.5,
                        line_total: 100.5,
                    }],
                    subtotal: 100.5,
                },
                PhotoEstimate {
                    image: "second.jpg".into(),
                    subtotal: 50.0,
                    ..Default::default()
                },
            ],
        };

        let text = render_estimate(&estimate);
        let first = text.find("first.jpg").unwrap();
        let second = text.find("second.jpg").unwrap();
        assert!(first < second);
        assert!(text.contains("PAINT45"));
        assert!(text.contains("小計: $100.50"));
        assert!(text.ends_with("合計見積: $150.50"));
    }

    #[test]
    fn test_quantity_format() {
        assert_eq!(quantity(10.0), "10");
        assert_eq!(quantity(2.5), "2.5");
    }
}
