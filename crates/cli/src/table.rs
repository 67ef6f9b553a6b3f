//! Plain-text result tables.

use crate::output::{format_distance, format_freshness, format_price};
use freshcart_search::{EnrichedProduct, ProductList};
use owo_colors::{OwoColorize, Stream};

struct Row {
    cells: Vec<String>,
    freshness: Option<f64>,
}

fn base_cells(position: String, product: &EnrichedProduct) -> Vec<String> {
    vec![
        position,
        product.id().to_string(),
        product.product.name.clone().unwrap_or_default(),
        format_price(product.product.price),
        format_distance(product.distance_km),
        format_freshness(product.freshness_percent),
    ]
}

/// Render search output as an aligned table.
///
/// Ranking output gets a score column; filter output is numbered by
/// position. With `color` set and a stdout that supports it, freshness is
/// green at 70% and above, yellow from 30%, red below.
pub fn render_results(products: &ProductList, color: bool) -> String {
    let mut headers = vec!["#", "ID", "NAME", "PRICE", "DISTANCE", "FRESH"];
    let rows: Vec<Row> = match products {
        ProductList::Ranked(items) => {
            headers.push("SCORE");
            items
                .iter()
                .map(|item| {
                    let mut cells = base_cells(item.rank.to_string(), &item.product);
                    cells.push(format!("{:.1}", item.combined_score));
                    Row {
                        cells,
                        freshness: item.product.freshness_percent,
                    }
                })
                .collect()
        }
        ProductList::Filtered(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| Row {
                cells: base_cells((index + 1).to_string(), item),
                freshness: item.freshness_percent,
            })
            .collect(),
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_line = join_padded(headers.iter().map(|h| h.to_string()), &widths);
    if color {
        out.push_str(&header_line.if_supports_color(Stream::Stdout, |t| t.bold()).to_string());
    } else {
        out.push_str(&header_line);
    }
    out.push('\n');

    for row in rows {
        let mut padded: Vec<String> = pad_all(row.cells.into_iter(), &widths);
        if color {
            if let Some(cell) = padded.get_mut(FRESHNESS_COLUMN) {
                *cell = colorize_freshness(cell, row.freshness);
            }
        }
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }

    out
}

const FRESHNESS_COLUMN: usize = 5;

fn pad_all(cells: impl Iterator<Item = String>, widths: &[usize]) -> Vec<String> {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect()
}

fn join_padded(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    pad_all(cells, widths).join("  ").trim_end().to_string()
}

fn colorize_freshness(cell: &str, freshness: Option<f64>) -> String {
    match freshness {
        Some(p) if p >= 70.0 => cell.if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        Some(p) if p >= 30.0 => cell.if_supports_color(Stream::Stdout, |t| t.yellow()).to_string(),
        Some(_) => cell.if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
        None => cell.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshcart_search::{ProductRecord, ScoredProduct};

    fn enriched(id: i64, name: &str, price: f64, km: f64, fresh: f64) -> EnrichedProduct {
        let mut p = EnrichedProduct::bare(ProductRecord::new(id).with_name(name).with_price(price));
        p.distance_km = Some(km);
        p.freshness_percent = Some(fresh);
        p
    }

    #[test]
    fn test_ranked_table() {
        let list = ProductList::Ranked(vec![ScoredProduct {
            product: enriched(7, "Mangoes", 120.0, 0.8, 92.9),
            combined_score: 94.25,
            rank: 1,
        }]);
        let table = render_results(&list, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#  ID  NAME"));
        assert!(lines[0].ends_with("SCORE"));
        assert!(lines[1].contains("Mangoes"));
        assert!(lines[1].contains("800 m"));
        assert!(lines[1].contains("93%"));
        assert!(lines[1].ends_with("94.2") || lines[1].ends_with("94.3"));
    }

    #[test]
    fn test_filtered_table_numbers_rows() {
        let list = ProductList::Filtered(vec![
            enriched(3, "Tilapia", 30.0, 2.0, 50.0),
            enriched(1, "Pechay", 50.0, 4.5, 80.0),
        ]);
        let table = render_results(&list, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(!lines[0].contains("SCORE"));
        assert!(lines[1].starts_with("1  3"));
        assert!(lines[2].starts_with("2  1"));
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let table = render_results(&ProductList::Filtered(Vec::new()), false);
        assert_eq!(table.lines().count(), 1);
    }

    #[test]
    fn test_color_follows_terminal_support() {
        let list = ProductList::Filtered(vec![enriched(1, "Milk", 10.0, 1.0, 10.0)]);
        assert!(!render_results(&list, false).contains('\u{1b}'));

        owo_colors::set_override(true);
        let forced = render_results(&list, true);
        owo_colors::set_override(false);
        let disabled = render_results(&list, true);
        owo_colors::unset_override();

        assert!(forced.contains('\u{1b}'));
        assert!(!disabled.contains('\u{1b}'));
    }
}
