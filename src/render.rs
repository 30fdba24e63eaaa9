use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use ::image::{imageops, DynamicImage, Rgba, RgbImage, RgbaImage};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::layout::{Align, DrawOp, InvoiceDocument, Rgb8};
use crate::metrics::{text_width_mm, Weight};
use crate::money::CURRENCY_SYMBOL;

/// Builtin Helvetica has no rupee glyph
const CURRENCY_FALLBACK: &str = "Rs.";

/// DPI the logo is first placed at before scaling into its box
const LOGO_BASE_DPI: f32 = 300.0;

const RULE_THICKNESS: f32 = 0.75;

// ============================================================================
// Fonts
// ============================================================================

/// Which fonts to embed. TrueType fonts keep the rupee sign intact.
#[derive(Debug, Clone, Default)]
pub enum FontChoice {
    #[default]
    Builtin,
    TrueType { regular: PathBuf, bold: PathBuf },
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    unicode: bool,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, choice: &FontChoice) -> Result<Self, AppError> {
        match choice {
            FontChoice::Builtin => Ok(Self {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| AppError::PdfError(e.to_string()))?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| AppError::PdfError(e.to_string()))?,
                unicode: false,
            }),
            FontChoice::TrueType { regular, bold } => Ok(Self {
                regular: add_font_file(doc, regular)?,
                bold: add_font_file(doc, bold)?,
                unicode: true,
            }),
        }
    }

    fn get(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Normal => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    fn encodable<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.unicode || !text.contains(CURRENCY_SYMBOL) {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.replace(CURRENCY_SYMBOL, CURRENCY_FALLBACK))
        }
    }

    /// The run as it will be drawn and its left edge. Alignment is measured
    /// on the substituted text, so `Rs.` still ends on a right anchor.
    fn place<'a>(
        &self,
        text: &'a str,
        anchor: f32,
        size: f32,
        weight: Weight,
        align: Align,
    ) -> (Cow<'a, str>, f32) {
        let drawn = self.encodable(text);
        let x = align.left_edge(anchor, text_width_mm(&drawn, size, weight));
        (drawn, x)
    }
}

fn add_font_file(doc: &PdfDocumentReference, path: &Path) -> Result<IndirectFontRef, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::PdfError(format!("font {}: {}", path.display(), e)))?;
    doc.add_external_font(file)
        .map_err(|e| AppError::PdfError(format!("font {}: {}", path.display(), e)))
}

// ============================================================================
// PDF Generation
// ============================================================================

/// Serialize a composed invoice to PDF bytes. A logo that cannot be placed
/// is logged and left out; everything else is an error.
pub fn render(document: &InvoiceDocument, fonts: &FontChoice) -> Result<Vec<u8>, AppError> {
    let (doc, page1, layer1) = PdfDocument::new(
        &document.title,
        Mm(document.page_width),
        Mm(document.page_height),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);
    let fonts = Fonts::load(&doc, fonts)?;

    // Layout uses a top-left origin; PDF is bottom-left
    let flip = |y: f32| document.page_height - y;

    for op in &document.ops {
        match op {
            DrawOp::Text { text, x, y, size, weight, align } => {
                let (drawn, left) = fonts.place(text, *x, *size, *weight, *align);
                layer.set_fill_color(black());
                layer.use_text(drawn, *size, Mm(left), Mm(flip(*y)), fonts.get(*weight));
            }
            DrawOp::Rule { x1, x2, y } => {
                layer.set_outline_color(black());
                layer.set_outline_thickness(RULE_THICKNESS);
                draw_line(&layer, *x1, flip(*y), *x2, flip(*y));
            }
            DrawOp::FillRect { x, y, width, height, color } => {
                layer.set_fill_color(rgb(*color));
                fill_rect(&layer, *x, flip(*y + *height), *width, *height);
            }
            DrawOp::Image { x, y, width, height, source, bytes } => {
                if let Err(e) = embed_logo(&layer, bytes, *x, flip(*y + *height), *width, *height) {
                    warn!(source = source.as_str(), error = %e, "could not place logo; continuing without it");
                }
            }
        }
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| AppError::PdfError(e.to_string()))?;
    debug!(size = bytes.len(), "rendered invoice pdf");
    Ok(bytes)
}

/// Decode the logo and stretch it into the `width` x `height` box whose
/// bottom-left corner is (`x`, `y`). Aspect ratio is not preserved.
fn embed_logo(
    layer: &PdfLayerReference,
    encoded: &[u8],
    x: f32,
    y: f32,
    width_mm: f32,
    height_mm: f32,
) -> Result<(), AppError> {
    let logo = ::image::load_from_memory(encoded)
        .map_err(|e| AppError::LogoError(format!("Failed to decode image: {}", e)))?;
    let (width_px, height_px) = (logo.width(), logo.height());
    if width_px == 0 || height_px == 0 {
        return Err(AppError::LogoError("image has no pixels".to_string()));
    }

    let rgb_image = flatten_on_white(&logo);

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // Natural size at LOGO_BASE_DPI, then scale each axis independently
    let natural_width_mm = width_px as f32 / LOGO_BASE_DPI * 25.4;
    let natural_height_mm = height_px as f32 / LOGO_BASE_DPI * 25.4;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(LOGO_BASE_DPI),
            scale_x: Some(width_mm / natural_width_mm),
            scale_y: Some(height_mm / natural_height_mm),
            ..Default::default()
        },
    );

    Ok(())
}

/// The XObject is written without a soft mask, so any transparency in the
/// logo is blended onto white, the colour of the page behind it.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

// ============================================================================
// Drawing Utilities
// ============================================================================

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn rgb(color: Rgb8) -> Color {
    let Rgb8(r, g, b) = color;
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

/// Filled rectangle with its bottom-left corner at (`x`, `y`).
fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, width: f32, height: f32) {
    let ring = vec![
        (Point::new(Mm(x), Mm(y)), false),
        (Point::new(Mm(x + width), Mm(y)), false),
        (Point::new(Mm(x + width), Mm(y + height)), false),
        (Point::new(Mm(x), Mm(y + height)), false),
    ];
    layer.add_polygon(Polygon {
        rings: vec![ring],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compose;
    use crate::model::{InvoiceInput, LogoAttachment};
    use crate::plan::PlanKey;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn sample_input(logo: Option<LogoAttachment>) -> InvoiceInput {
        InvoiceInput {
            business_name: "SUPER POWER".to_string(),
            contact_person: "Siva".to_string(),
            phone_number: "+918089786704".to_string(),
            invoice_number: "#84-SUP-2025".to_string(),
            customer_name: "Adharsh.A".to_string(),
            customer_phone: "+91 - 7736123615".to_string(),
            plan: PlanKey::Twelve,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            logo,
        }
    }

    fn png_logo(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 30, 30, 128]),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn render_input(input: &InvoiceInput) -> Vec<u8> {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let document = compose(input, today).unwrap();
        render(&document, &FontChoice::Builtin).unwrap()
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = render_input(&sample_input(None));
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_renders_with_logo() {
        let logo = LogoAttachment { source: "logo.png".to_string(), bytes: png_logo(30, 15) };
        let without = render_input(&sample_input(None));
        let with = render_input(&sample_input(Some(logo)));
        assert!(with.starts_with(b"%PDF"));
        assert!(with.len() > without.len());
    }

    #[test]
    fn test_corrupt_logo_is_skipped() {
        let logo = LogoAttachment { source: "broken.png".to_string(), bytes: b"not an image".to_vec() };
        let bytes = render_input(&sample_input(Some(logo)));
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_builtin_fonts_replace_rupee_sign() {
        let fonts = Fonts {
            regular: dummy_font(),
            bold: dummy_font(),
            unicode: false,
        };
        assert_eq!(fonts.encodable("₹15,000"), "Rs.15,000");
        assert!(matches!(fonts.encodable("Plan"), Cow::Borrowed("Plan")));
    }

    fn amount_op(document: &InvoiceDocument) -> (&str, f32, f32, Weight, Align) {
        document
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, x, size, weight, align, .. } if text.starts_with('₹') => {
                    Some((text.as_str(), *x, *size, *weight, *align))
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_builtin_amount_ends_on_column_edge() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let document = compose(&sample_input(None), today).unwrap();
        let (text, anchor, size, weight, align) = amount_op(&document);
        let fonts = Fonts { regular: dummy_font(), bold: dummy_font(), unicode: false };

        let (drawn, left) = fonts.place(text, anchor, size, weight, align);
        assert_eq!(drawn, "Rs.15,000");
        let right_edge = left + text_width_mm(&drawn, size, weight);
        assert!((right_edge - 170.0).abs() < 0.001, "right edge at {}", right_edge);
    }

    #[test]
    fn test_unicode_amount_keeps_rupee_sign_on_column_edge() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let document = compose(&sample_input(None), today).unwrap();
        let (text, anchor, size, weight, align) = amount_op(&document);
        let fonts = Fonts { regular: dummy_font(), bold: dummy_font(), unicode: true };

        let (drawn, left) = fonts.place(text, anchor, size, weight, align);
        assert_eq!(drawn, "₹15,000");
        let right_edge = left + text_width_mm(&drawn, size, weight);
        assert!((right_edge - 170.0).abs() < 0.001, "right edge at {}", right_edge);
    }

    #[test]
    fn test_transparent_logo_pixels_blend_toward_white() {
        let mut logo = RgbaImage::new(2, 1);
        logo.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        logo.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let flat = flatten_on_white(&DynamicImage::ImageRgba8(logo));
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(flat.get_pixel(1, 0).0, [255, 255, 255]);

        let half = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_on_white(&DynamicImage::ImageRgba8(half));
        let [r, g, b] = flat.get_pixel(0, 0).0;
        assert!((120..=135).contains(&r), "half-transparent black gave {}", r);
        assert_eq!((r, g, b), (r, r, r));
    }

    #[test]
    fn test_missing_truetype_font_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let document = compose(&sample_input(None), today).unwrap();
        let fonts = FontChoice::TrueType {
            regular: PathBuf::from("no/such/font.ttf"),
            bold: PathBuf::from("no/such/font-bold.ttf"),
        };
        assert!(matches!(render(&document, &fonts), Err(AppError::PdfError(_))));
    }

    fn dummy_font() -> IndirectFontRef {
        let (doc, _, _) = PdfDocument::new("t", Mm(10.0), Mm(10.0), "Layer 1");
        doc.add_builtin_font(BuiltinFont::Helvetica).unwrap()
    }
}
