//! Shopping-list PDF rendering.
//!
//! Layout is computed in PDF points first (`layout_pages`), then drawn with
//! `printpdf` with an embedded DejaVu Sans so Cyrillic names survive. Lines
//! that would run past the bottom margin continue on a new page.

use anyhow::{anyhow, Result};
use printpdf::{Mm, PdfDocument, Pt};

use crate::models::ShoppingListItem;

pub const TITLE: &str = "Shopping list";

static FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const TITLE_FONT_SIZE: f32 = 24.0;
const TITLE_X: f32 = 150.0;
const TITLE_Y: f32 = 800.0;
const TEXT_FONT_SIZE: f32 = 14.0;
const TEXT_X: f32 = 50.0;
const FIRST_LINE_Y: f32 = 700.0;
const CONTINUATION_Y: f32 = 800.0;
const LINE_STEP: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 50.0;

/// A line of text anchored at (`x`, `y`) points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

pub fn format_item(item: &ShoppingListItem) -> String {
    format!(
        "{} - {} {}",
        item.name, item.amount, item.measurement_unit
    )
}

/// Splits the title and item lines into pages. The first page always
/// exists and carries the title.
pub fn layout_pages(lines: &[String]) -> Vec<Vec<PlacedLine>> {
    let mut pages = vec![vec![PlacedLine {
        text: TITLE.to_string(),
        x: TITLE_X,
        y: TITLE_Y,
        font_size: TITLE_FONT_SIZE,
    }]];
    let mut y = FIRST_LINE_Y;
    for line in lines {
        if y < BOTTOM_MARGIN {
            pages.push(Vec::new());
            y = CONTINUATION_Y;
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                text: line.clone(),
                x: TEXT_X,
                y,
                font_size: TEXT_FONT_SIZE,
            });
        }
        y -= LINE_STEP;
    }
    pages
}

/// Renders the aggregated shopping list to PDF bytes.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> Result<Vec<u8>> {
    let lines: Vec<String> = items.iter().map(format_item).collect();
    let pages = layout_pages(&lines);

    let width = Mm::from(Pt(PAGE_WIDTH));
    let height = Mm::from(Pt(PAGE_HEIGHT));
    let (doc, first_page, first_layer) = PdfDocument::new(TITLE, width, height, "Layer 1");
    let font = doc
        .add_external_font(FONT)
        .map_err(|e| anyhow!("Failed to load font: {e}"))?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, format!("Layer {}", index + 1))
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        for line in page {
            layer.use_text(
                line.text.clone(),
                line.font_size,
                Mm::from(Pt(line.x)),
                Mm::from(Pt(line.y)),
                &font,
            );
        }
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("Failed to write shopping list pdf: {e}"))
}
