use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::{
    constants::SHOPPING_LIST_TITLE,
    error::ApiError,
};

use super::aggregate::ShoppingItem;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;
const FONT_SIZE: f32 = 14.0;
const LAYER_NAME: &str = "Layer 1";

// Builtin PDF fonts only cover WinAnsi, so names in other scripts need an embedded face.
const REGULAR_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BOLD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Title(String),
    Item(String),
}

fn lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2.0 * MARGIN) / LINE_HEIGHT) as usize + 1
}

/// Splits the document into pages of at most `per_page` lines. Always yields at least
/// one page.
fn paginate(lines: Vec<Line>, per_page: usize) -> Vec<Vec<Line>> {
    if lines.is_empty() {
        return vec![vec![]];
    }
    lines
        .chunks(per_page.max(1))
        .map(<[Line]>::to_vec)
        .collect()
}

fn pdf_error(e: printpdf::Error) -> ApiError {
    ApiError::Internal(format!("Could not render shopping list: {e}"))
}

fn draw_page(
    layer: &PdfLayerReference,
    lines: &[Line],
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for (position, line) in lines.iter().enumerate() {
        let y = Mm(PAGE_HEIGHT - MARGIN - position as f32 * LINE_HEIGHT);
        match line {
            Line::Title(text) => layer.use_text(text.as_str(), FONT_SIZE, Mm(MARGIN), y, bold),
            Line::Item(text) => layer.use_text(text.as_str(), FONT_SIZE, Mm(MARGIN), y, regular),
        }
    }
}

/// Renders `items` as an A4 PDF, one `"{name} {amount} {unit}"` line each, under a
/// bold title.
pub fn render_shopping_list(items: &[ShoppingItem]) -> Result<Vec<u8>, ApiError> {
    let mut lines = vec![Line::Title(SHOPPING_LIST_TITLE.to_owned())];
    lines.extend(items.iter().map(|item| Line::Item(item.line())));

    let (doc, first_page, first_layer) = PdfDocument::new(
        SHOPPING_LIST_TITLE,
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        LAYER_NAME,
    );
    let regular = doc.add_external_font(REGULAR_FONT).map_err(pdf_error)?;
    let bold = doc.add_external_font(BOLD_FONT).map_err(pdf_error)?;

    for (index, page_lines) in paginate(lines, lines_per_page()).iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };
        draw_page(&layer, page_lines, &regular, &bold);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: i64) -> ShoppingItem {
        ShoppingItem {
            name: name.to_owned(),
            amount,
            measurement_unit: String::from("g"),
        }
    }

    #[test]
    fn renders_a_pdf() {
        let bytes = render_shopping_list(&[item("Flour", 300), item("Sugar", 50)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn cyrillic_items_use_the_embedded_font() {
        let items = [ShoppingItem {
            name: String::from("Жир"),
            amount: 300,
            measurement_unit: String::from("г"),
        }];
        let bytes = render_shopping_list(&items).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"FontFile2"));
        assert!(!contains(&bytes, b"Helvetica"));
        // ToUnicode entry for U+0416
        assert!(contains(&bytes, b"<0416>"));
    }

    #[test]
    fn empty_list_still_renders() {
        let bytes = render_shopping_list(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_lists_spill_onto_new_pages() {
        let per_page = lines_per_page();
        let lines: Vec<Line> = (0..per_page * 2 + 1)
            .map(|i| Line::Item(format!("Item {i} 1 g")))
            .collect();
        let pages = paginate(lines, per_page);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), per_page);
        assert_eq!(pages[2], vec![Line::Item(format!("Item {} 1 g", per_page * 2))]);

        let many: Vec<ShoppingItem> = (0..per_page * 2).map(|i| item(&format!("I{i}"), 1)).collect();
        assert!(render_shopping_list(&many).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn nothing_to_paginate_is_one_blank_page() {
        assert_eq!(paginate(vec![], 10), vec![Vec::<Line>::new()]);
    }
}
