use serde::{Deserialize, Serialize};

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const GREY: Rgb = Rgb::new(0.5, 0.5, 0.5);
    pub const DARK_GREY: Rgb = Rgb::new(0.25, 0.25, 0.25);
    pub const WHITESMOKE: Rgb = Rgb::new(0.96, 0.96, 0.96);
    pub const BEIGE: Rgb = Rgb::new(0.96, 0.96, 0.86);
    pub const IVORY: Rgb = Rgb::new(1.0, 1.0, 0.94);
    pub const ORANGE: Rgb = Rgb::new(1.0, 0.647, 0.0);
}

/// Two-tone table look: a header band and alternating body bands over a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub body_fills: [Rgb; 2],
    pub body_text: Rgb,
    pub grid: Rgb,
    pub grid_width: f32,
    pub font_size: f32,
    pub header_font_size: f32,
    pub padding: f32,
    /// Extra space under the header text.
    pub header_bottom_padding: f32,
}

impl TableStyle {
    pub fn summary() -> Self {
        Self {
            header_fill: Rgb::GREY,
            header_text: Rgb::WHITESMOKE,
            body_fills: [Rgb::BEIGE, Rgb::IVORY],
            body_text: Rgb::BLACK,
            grid: Rgb::BLACK,
            grid_width: 1.0,
            font_size: 9.0,
            header_font_size: 9.0,
            padding: 3.0,
            header_bottom_padding: 6.0,
        }
    }

    pub fn detail() -> Self {
        Self {
            header_fill: Rgb::ORANGE,
            font_size: 8.0,
            header_font_size: 8.0,
            ..Self::summary()
        }
    }

    pub fn row_height(&self) -> f32 {
        self.font_size + 2.0 * self.padding
    }

    pub fn header_height(&self) -> f32 {
        self.header_font_size + 2.0 * self.padding + self.header_bottom_padding
    }
}

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    pub fn a4_portrait() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_top: 48.0,
            margin_bottom: 48.0,
            margin_left: 36.0,
            margin_right: 36.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

/// Immutable presentation settings handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportStyle {
    pub page: PageGeometry,
    pub summary_table: TableStyle,
    pub detail_table: TableStyle,
    pub title_size: f32,
    pub heading_size: f32,
    pub block_heading_size: f32,
    pub body_size: f32,
    pub footer_size: f32,
    pub text_color: Rgb,
    pub footer_color: Rgb,
    /// Share of the content width given to the summary page's text column.
    pub summary_left_share: f32,
    pub column_gap: f32,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            page: PageGeometry::a4_portrait(),
            summary_table: TableStyle::summary(),
            detail_table: TableStyle::detail(),
            title_size: 20.0,
            heading_size: 16.0,
            block_heading_size: 11.0,
            body_size: 9.0,
            footer_size: 7.0,
            text_color: Rgb::BLACK,
            footer_color: Rgb::DARK_GREY,
            summary_left_share: 0.42,
            column_gap: 12.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_style_differs_only_in_header_and_size() {
        let summary = TableStyle::summary();
        let detail = TableStyle::detail();
        assert_eq!(detail.header_fill, Rgb::ORANGE);
        assert_eq!(detail.body_fills, summary.body_fills);
        assert!(detail.row_height() < summary.row_height());
    }

    #[test]
    fn test_a4_content_area() {
        let page = PageGeometry::a4_portrait();
        assert!((page.content_width() - 523.28).abs() < 0.01);
        assert!(page.content_bottom() < page.height);
    }
}
