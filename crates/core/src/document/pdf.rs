//! Branded PDF rendering.
//!
//! Single renderer for every document type: a navy brand header, the title,
//! body lines from the content model, an optional electronic-signature
//! block, and a footer with the generation timestamp. Page coordinates are
//! in millimeters from the bottom-left corner.

#![allow(clippy::float_arithmetic)]

use chrono::Utc;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::document::error::DocumentError;
use crate::document::types::{ContentLine, DocumentContent};

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN: f64 = 20.0;
const LINE_STEP: f64 = 6.0;
const CONTENT_FLOOR: f64 = 50.0;

const BRAND_NAME: &str = "Novafin";
const BRAND_TAGLINE: &str = "Digital Financing Platform";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    bold_oblique: IndirectFontRef,
}

fn navy() -> Color {
    Color::Rgb(Rgb::new(0.05, 0.12, 0.25, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn grey(level: f64) -> Color {
    Color::Rgb(Rgb::new(level, level, level, None))
}

fn horizontal_rule(layer: &PdfLayerReference, y: f64, level: f64) {
    layer.set_outline_color(grey(level));
    layer.add_shape(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
        has_fill: false,
        has_stroke: true,
        is_clipping_path: false,
    });
}

fn filled_bar(layer: &PdfLayerReference, bottom: f64, top: f64, color: Color) {
    layer.set_fill_color(color);
    layer.add_shape(Line {
        points: vec![
            (Point::new(Mm(0.0), Mm(bottom)), false),
            (Point::new(Mm(PAGE_WIDTH), Mm(bottom)), false),
            (Point::new(Mm(PAGE_WIDTH), Mm(top)), false),
            (Point::new(Mm(0.0), Mm(top)), false),
        ],
        is_closed: true,
        has_fill: true,
        has_stroke: false,
        is_clipping_path: false,
    });
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
    doc.get_page(page).get_layer(layer)
}

/// Renders a document to PDF bytes.
///
/// # Errors
///
/// Returns `DocumentError::Render` if the PDF backend fails.
pub fn render_pdf(content: &DocumentContent) -> Result<Vec<u8>, DocumentError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&content.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DocumentError::Render(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DocumentError::Render(e.to_string()))?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| DocumentError::Render(e.to_string()))?,
        bold_oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaBoldOblique)
            .map_err(|e| DocumentError::Render(e.to_string()))?,
    };

    let mut layer = doc.get_page(first_page).get_layer(first_layer);

    // Brand header
    filled_bar(&layer, PAGE_HEIGHT - 30.0, PAGE_HEIGHT, navy());
    layer.set_fill_color(white());
    layer.use_text(BRAND_NAME, 20.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 18.0), &fonts.bold);
    layer.use_text(
        BRAND_TAGLINE,
        10.0,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - 25.0),
        &fonts.regular,
    );

    // Title
    layer.set_fill_color(black());
    layer.use_text(
        &content.title,
        16.0,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - 48.0),
        &fonts.bold,
    );
    horizontal_rule(&layer, PAGE_HEIGHT - 52.0, 0.8);

    let mut y = PAGE_HEIGHT - 62.0;
    for line in &content.lines {
        if y < CONTENT_FLOOR {
            layer = new_page(&doc);
            y = PAGE_HEIGHT - 30.0;
        }
        match line {
            ContentLine::Heading(text) => {
                y -= 3.0;
                layer.set_fill_color(black());
                layer.use_text(text, 12.0, Mm(MARGIN), Mm(y), &fonts.bold);
                y -= LINE_STEP;
            }
            ContentLine::Text(text) => {
                layer.set_fill_color(black());
                layer.use_text(text, 10.0, Mm(MARGIN), Mm(y), &fonts.regular);
                y -= LINE_STEP;
            }
            ContentLine::Divider => {
                horizontal_rule(&layer, y + 1.5, 0.85);
                y -= LINE_STEP;
            }
        }
    }

    if let Some(block) = &content.signature {
        if y < 70.0 {
            layer = new_page(&doc);
            y = PAGE_HEIGHT - 30.0;
        }
        y -= 10.0;
        horizontal_rule(&layer, y + 1.5, 0.85);
        y -= 8.0;

        layer.set_fill_color(black());
        layer.use_text("Electronic Signature", 12.0, Mm(MARGIN), Mm(y), &fonts.bold);
        y -= 10.0;

        layer.set_fill_color(Color::Rgb(Rgb::new(0.1, 0.1, 0.3, None)));
        layer.use_text(
            &block.signature_text,
            18.0,
            Mm(MARGIN),
            Mm(y),
            &fonts.bold_oblique,
        );
        y -= 8.0;

        layer.set_outline_color(grey(0.6));
        layer.add_shape(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(100.0), Mm(y)), false),
            ],
            is_closed: false,
            has_fill: false,
            has_stroke: true,
            is_clipping_path: false,
        });
        y -= 5.0;

        layer.set_fill_color(grey(0.2));
        layer.use_text(
            format!("Signed by: {}", block.signer_name),
            10.0,
            Mm(MARGIN),
            Mm(y),
            &fonts.regular,
        );
        y -= 5.0;
        layer.use_text(
            format!("Date: {}", block.signed_at.format("%Y-%m-%d %H:%M:%S")),
            10.0,
            Mm(MARGIN),
            Mm(y),
            &fonts.regular,
        );
        y -= 5.0;

        layer.set_fill_color(grey(0.5));
        layer.use_text(
            "This electronic signature is legally binding and verifiable.",
            8.0,
            Mm(MARGIN),
            Mm(y),
            &fonts.oblique,
        );
    }

    // Footer
    layer.set_fill_color(grey(0.5));
    layer.use_text(
        format!("{BRAND_NAME} - This document was generated electronically."),
        8.0,
        Mm(MARGIN),
        Mm(15.0),
        &fonts.regular,
    );
    layer.use_text(
        format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M")),
        8.0,
        Mm(130.0),
        Mm(15.0),
        &fonts.regular,
    );

    doc.save_to_bytes()
        .map_err(|e| DocumentError::Render(e.to_string()))
}

/// Renders a document with a minimal plain layout.
///
/// Fallback for when the branded renderer fails: same semantic content,
/// no header bar, no color, single font.
///
/// # Errors
///
/// Returns `DocumentError::Render` if the PDF backend fails.
pub fn render_pdf_minimal(content: &DocumentContent) -> Result<Vec<u8>, DocumentError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&content.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DocumentError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DocumentError::Render(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(BRAND_NAME, 14.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 20.0), &bold);
    layer.use_text(&content.title, 12.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 30.0), &bold);

    let mut y = PAGE_HEIGHT - 40.0;
    for line in &content.lines {
        if y < MARGIN {
            layer = new_page(&doc);
            y = PAGE_HEIGHT - 20.0;
        }
        match line {
            ContentLine::Heading(text) => {
                layer.use_text(text, 11.0, Mm(MARGIN), Mm(y), &bold);
            }
            ContentLine::Text(text) => {
                layer.use_text(text, 10.0, Mm(MARGIN), Mm(y), &font);
            }
            ContentLine::Divider => {
                layer.use_text("----------------------------------------", 10.0, Mm(MARGIN), Mm(y), &font);
            }
        }
        y -= LINE_STEP;
    }

    if let Some(block) = &content.signature {
        if y < MARGIN + 20.0 {
            layer = new_page(&doc);
            y = PAGE_HEIGHT - 20.0;
        }
        y -= LINE_STEP;
        layer.use_text("Electronic Signature", 11.0, Mm(MARGIN), Mm(y), &bold);
        y -= LINE_STEP;
        layer.use_text(&block.signature_text, 12.0, Mm(MARGIN), Mm(y), &font);
        y -= LINE_STEP;
        layer.use_text(
            format!(
                "Signed by {} on {}",
                block.signer_name,
                block.signed_at.format("%Y-%m-%d %H:%M:%S")
            ),
            10.0,
            Mm(MARGIN),
            Mm(y),
            &font,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| DocumentError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::SignatureBlock;

    fn sample_content() -> DocumentContent {
        DocumentContent::new("Financing Certificate")
            .heading("Parties")
            .text("Client: Jane Doe (NDF-000042)")
            .divider()
            .heading("Terms")
            .text("Amount: 6000.00 USD")
            .text("Period: 12 months")
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_pdf(&sample_content()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_with_signature_block() {
        let content = sample_content().signed(SignatureBlock {
            signature_text: "Jane Doe".into(),
            signer_name: "Jane Doe".into(),
            signed_at: Utc::now(),
        });
        let bytes = render_pdf(&content).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_minimal_renderer_differs_from_branded() {
        let content = sample_content();
        let branded = render_pdf(&content).unwrap();
        let minimal = render_pdf_minimal(&content).unwrap();
        assert!(minimal.starts_with(b"%PDF"));
        assert_ne!(branded, minimal);
    }

    #[test]
    fn test_long_content_spills_to_new_pages() {
        let mut content = DocumentContent::new("Account Statement");
        for i in 0..120 {
            content = content.text(format!("Line item {i}"));
        }
        let bytes = render_pdf(&content).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
