use super::layout::{DrawOp, FontWeight, LaidOutDocument};
use super::style::Rgb;
use crate::error::{Result, SalesReportError};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Pt, Rect,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Font faces used to draw text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PdfFonts {
    /// Built-in Helvetica. Characters outside its WinAnsi encoding are dropped.
    #[default]
    Builtin,
    /// TrueType font data embedded into the document, covering whatever the font covers.
    Embedded { regular: Vec<u8>, bold: Vec<u8> },
}

impl PdfFonts {
    /// Reads the configured font files; no regular font means the built-in faces.
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> Result<Self> {
        let Some(regular) = regular else {
            return Ok(PdfFonts::Builtin);
        };
        let regular_bytes = fs::read(regular)?;
        let bold_bytes = match bold {
            Some(path) => fs::read(path)?,
            None => regular_bytes.clone(),
        };
        Ok(PdfFonts::Embedded {
            regular: regular_bytes,
            bold: bold_bytes,
        })
    }

    /// Distinct texts of `document` that these fonts would render lossily, in first-seen order.
    pub fn unencodable_texts(&self, document: &LaidOutDocument) -> Vec<String> {
        if matches!(self, PdfFonts::Embedded { .. }) {
            return Vec::new();
        }
        let mut seen = BTreeSet::new();
        document
            .pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|text| !text.chars().all(builtin_font_covers))
            .filter(|text| seen.insert(text.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Whether the built-in fonts can show `c`. Only the Latin-1 part of their
/// WinAnsi encoding is relied on.
pub fn builtin_font_covers(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}')
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn register(pdf: &PdfDocumentReference, fonts: &PdfFonts) -> Result<Self> {
        let fonts = match fonts {
            PdfFonts::Builtin => Fonts {
                regular: pdf
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(pdf_error)?,
                bold: pdf
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(pdf_error)?,
            },
            PdfFonts::Embedded { regular, bold } => Fonts {
                regular: pdf
                    .add_external_font(regular.as_slice())
                    .map_err(pdf_error)?,
                bold: pdf.add_external_font(bold.as_slice()).map_err(pdf_error)?,
            },
        };
        Ok(fonts)
    }
}

fn pdf_error(e: impl std::fmt::Display) -> SalesReportError {
    SalesReportError::Pdf(e.to_string())
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(rgb.r, rgb.g, rgb.b, None))
}

/// Serializes a laid-out document into PDF bytes.
pub fn render_pdf(document: &LaidOutDocument, fonts: &PdfFonts) -> Result<Vec<u8>> {
    let width = mm(document.width);
    let height = mm(document.height);
    let (pdf, first_page, first_layer) =
        PdfDocument::new(document.title.as_str(), width, height, "Layer 1");

    let fonts = Fonts::register(&pdf, fonts)?;

    for (idx, page) in document.pages.iter().enumerate() {
        let layer = if idx == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = pdf.add_page(width, height, "Layer 1");
            pdf.get_page(page_idx).get_layer(layer_idx)
        };
        for op in &page.ops {
            draw(&layer, op, document.height, &fonts);
        }
    }

    pdf.save_to_bytes().map_err(pdf_error)
}

/// Top-left based layout coordinates become bottom-left based PDF coordinates here.
fn draw(layer: &PdfLayerReference, op: &DrawOp, page_height: f32, fonts: &Fonts) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            weight,
            color: rgb,
            text,
        } => {
            let font = match weight {
                FontWeight::Regular => &fonts.regular,
                FontWeight::Bold => &fonts.bold,
            };
            layer.set_fill_color(color(*rgb));
            layer.use_text(text.as_str(), *size, mm(*x), mm(page_height - *y), font);
        }
        DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color: rgb,
        } => {
            layer.set_fill_color(color(*rgb));
            layer.add_rect(Rect::new(
                mm(*x),
                mm(page_height - *y - *height),
                mm(*x + *width),
                mm(page_height - *y),
            ));
        }
        DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color: rgb,
            thickness,
        } => {
            let top = page_height - *y;
            let bottom = top - *height;
            let corners = [
                (*x, top),
                (*x + *width, top),
                (*x + *width, bottom),
                (*x, bottom),
            ];
            layer.set_outline_color(color(*rgb));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: corners
                    .iter()
                    .map(|&(px, py)| (Point::new(mm(px), mm(py)), false))
                    .collect(),
                is_closed: true,
            });
        }
    }
}
