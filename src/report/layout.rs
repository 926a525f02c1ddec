//! Pagination of a composed [`Report`] into positioned drawing operations.
//!
//! Coordinates are PDF points measured from the top-left corner of the page;
//! the PDF backend flips them. Text widths are estimated from an average
//! Helvetica glyph width, which is enough for centring and wrapping.

use super::compose::{Report, Section, Table, TableRole, TextBlock};
use super::style::{ReportStyle, Rgb, TableStyle};
use crate::utils::wrap_text;

const AVG_GLYPH_WIDTH: f32 = 0.52;
const LINE_SPACING: f32 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        text: String,
    },
    /// `y` is the top edge.
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
        thickness: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cursor {
    page: usize,
    y: f32,
}

impl Cursor {
    fn later(self, other: Cursor) -> Cursor {
        if (other.page, other.y) > (self.page, self.y) {
            other
        } else {
            self
        }
    }

    fn down(self, dy: f32) -> Cursor {
        Cursor {
            page: self.page,
            y: self.y + dy,
        }
    }
}

pub fn estimate_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

fn chars_per_width(width: f32, size: f32) -> usize {
    ((width / (size * AVG_GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Scales relative column widths to fill `available` points.
pub fn fit_widths(widths: &[f32], available: f32) -> Vec<f32> {
    let total: f32 = widths.iter().sum();
    if total <= 0.0 {
        let even = available / widths.len().max(1) as f32;
        return vec![even; widths.len()];
    }
    widths.iter().map(|w| w / total * available).collect()
}

pub struct LayoutEngine<'a> {
    style: &'a ReportStyle,
    pages: Vec<Page>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(style: &'a ReportStyle) -> Self {
        Self {
            style,
            pages: Vec::new(),
        }
    }

    pub fn layout(mut self, report: &Report) -> LaidOutDocument {
        let mut cursor = self.new_page();
        let mut first_detail = true;

        for (idx, section) in report.sections.iter().enumerate() {
            match section {
                Section::Summary {
                    title,
                    period,
                    blocks,
                    table,
                } => {
                    if idx > 0 {
                        cursor = self.new_page();
                    }
                    cursor = self.summary_page(cursor, title, period, blocks, table);
                }
                Section::DealerSummary { heading, table } => {
                    if idx > 0 {
                        cursor = self.new_page();
                    }
                    cursor = self.heading(cursor, heading, self.style.heading_size);
                    cursor = self.table(cursor.down(12.0), self.left(), self.content_width(), table);
                }
                Section::DealerDetail { dealer, table } => {
                    if first_detail {
                        if idx > 0 {
                            cursor = self.new_page();
                        }
                        first_detail = false;
                    } else {
                        cursor = cursor.down(24.0);
                    }
                    // Keep the heading together with the header row and first line.
                    let table_style = self.table_style(table.role);
                    let keep = self.style.heading_size * LINE_SPACING
                        + 12.0
                        + table_style.header_height()
                        + table_style.row_height();
                    cursor = self.ensure_room(cursor, keep);
                    cursor = self.heading(cursor, dealer, self.style.heading_size);
                    cursor = self.table(cursor.down(12.0), self.left(), self.content_width(), table);
                }
            }
        }

        self.add_footers(&report.title);

        LaidOutDocument {
            title: report.title.clone(),
            width: self.style.page.width,
            height: self.style.page.height,
            pages: self.pages,
        }
    }

    fn summary_page(
        &mut self,
        cursor: Cursor,
        title: &str,
        period: &str,
        blocks: &[TextBlock],
        table: &Table,
    ) -> Cursor {
        let cursor = self.centered_line(cursor, title, self.style.title_size, FontWeight::Bold);
        let cursor = self.centered_line(cursor, period, self.style.body_size, FontWeight::Regular);
        let start = cursor.down(12.0);

        let gap = self.style.column_gap;
        let left_width = self.content_width() * self.style.summary_left_share;
        let right_x = self.left() + left_width + gap;
        let right_width = self.content_width() - left_width - gap;

        let mut left = start;
        for block in blocks {
            left = self.text_block(left, self.left(), left_width - gap, block);
        }
        let right = self.table(start, right_x, right_width, table);

        left.later(right)
    }

    fn text_block(&mut self, cursor: Cursor, x: f32, width: f32, block: &TextBlock) -> Cursor {
        let heading_size = self.style.block_heading_size;
        let body_size = self.style.body_size;

        let mut cursor = self.ensure_room(cursor, heading_size * LINE_SPACING * 2.0);
        cursor = cursor.down(heading_size);
        self.push_text(cursor, x, heading_size, FontWeight::Bold, self.style.text_color, &block.heading);
        cursor = cursor.down(heading_size * (LINE_SPACING - 1.0) + 4.0);

        let max_chars = chars_per_width(width, body_size);
        for line in &block.lines {
            for wrapped in wrap_text(line, max_chars) {
                cursor = self.ensure_room(cursor, body_size * LINE_SPACING);
                cursor = cursor.down(body_size * LINE_SPACING);
                self.push_text(cursor, x, body_size, FontWeight::Regular, self.style.text_color, &wrapped);
            }
        }
        cursor.down(10.0)
    }

    fn heading(&mut self, cursor: Cursor, text: &str, size: f32) -> Cursor {
        let cursor = self.ensure_room(cursor, size * LINE_SPACING);
        let baseline = cursor.down(size);
        self.push_text(baseline, self.left(), size, FontWeight::Bold, self.style.text_color, text);
        cursor.down(size * LINE_SPACING)
    }

    fn centered_line(&mut self, cursor: Cursor, text: &str, size: f32, weight: FontWeight) -> Cursor {
        let cursor = self.ensure_room(cursor, size * LINE_SPACING);
        let width = estimate_text_width(text, size);
        let x = self.left() + ((self.content_width() - width) / 2.0).max(0.0);
        self.push_text(cursor.down(size), x, size, weight, self.style.text_color, text);
        cursor.down(size * LINE_SPACING)
    }

    /// Lays out a table from `cursor`, breaking onto following pages as needed.
    fn table(&mut self, cursor: Cursor, x: f32, width: f32, table: &Table) -> Cursor {
        let style = *self.table_style(table.role);
        let widths = fit_widths(&table.widths, width);
        let first_row = if table.rows.is_empty() { 0.0 } else { style.row_height() };

        let mut cursor = self.ensure_room(cursor, style.header_height() + first_row);
        cursor = self.table_header(cursor, x, &widths, table, &style);

        for (idx, row) in table.rows.iter().enumerate() {
            if cursor.y + style.row_height() > self.bottom() {
                cursor = self.next_page(cursor);
                if table.repeat_header {
                    cursor = self.table_header(cursor, x, &widths, table, &style);
                }
            }

            let height = style.row_height();
            let fill = style.body_fills[idx % 2];
            let mut cell_x = x;
            for (cell, &cell_width) in row.iter().zip(widths.iter()) {
                self.push(cursor.page, DrawOp::FillRect {
                    x: cell_x,
                    y: cursor.y,
                    width: cell_width,
                    height,
                    color: fill,
                });
                self.push(cursor.page, grid(cell_x, cursor.y, cell_width, height, &style));
                let text_x = centered_x(cell.as_str(), cell_x, cell_width, style.font_size, style.padding);
                let baseline = cursor.down(style.padding + style.font_size * 0.8);
                self.push_text(baseline, text_x, style.font_size, FontWeight::Regular, style.body_text, cell.as_str());
                cell_x += cell_width;
            }
            cursor = cursor.down(height);
        }

        cursor
    }

    fn table_header(&mut self, cursor: Cursor, x: f32, widths: &[f32], table: &Table, style: &TableStyle) -> Cursor {
        let height = style.header_height();
        let mut cell_x = x;
        for (header, &cell_width) in table.headers.iter().zip(widths.iter()) {
            self.push(cursor.page, DrawOp::FillRect {
                x: cell_x,
                y: cursor.y,
                width: cell_width,
                height,
                color: style.header_fill,
            });
            self.push(cursor.page, grid(cell_x, cursor.y, cell_width, height, style));
            let text_x = centered_x(header, cell_x, cell_width, style.header_font_size, style.padding);
            let baseline = cursor.down(style.padding + style.header_font_size * 0.8);
            self.push_text(baseline, text_x, style.header_font_size, FontWeight::Bold, style.header_text, header);
            cell_x += cell_width;
        }
        cursor.down(height)
    }

    fn add_footers(&mut self, title: &str) {
        let total = self.pages.len();
        let size = self.style.footer_size;
        let y = self.style.page.height - self.style.page.margin_bottom / 2.0;
        let color = self.style.footer_color;
        for (idx, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Text {
                x: self.style.page.margin_left,
                y,
                size,
                weight: FontWeight::Regular,
                color,
                text: format!("{} - page {} of {}", title, idx + 1, total),
            });
        }
    }

    fn table_style(&self, role: TableRole) -> &TableStyle {
        match role {
            TableRole::Summary => &self.style.summary_table,
            TableRole::Detail => &self.style.detail_table,
        }
    }

    fn left(&self) -> f32 {
        self.style.page.margin_left
    }

    fn content_width(&self) -> f32 {
        self.style.page.content_width()
    }

    fn top(&self) -> f32 {
        self.style.page.margin_top
    }

    fn bottom(&self) -> f32 {
        self.style.page.content_bottom()
    }

    fn new_page(&mut self) -> Cursor {
        self.pages.push(Page::default());
        Cursor {
            page: self.pages.len() - 1,
            y: self.top(),
        }
    }

    /// Top of the page after `cursor`'s, reusing a page another column already opened.
    fn next_page(&mut self, cursor: Cursor) -> Cursor {
        if cursor.page + 1 < self.pages.len() {
            Cursor {
                page: cursor.page + 1,
                y: self.top(),
            }
        } else {
            self.new_page()
        }
    }

    /// Moves to the next page unless `needed` points fit below `cursor`.
    /// A cursor already at the top of a page stays put.
    fn ensure_room(&mut self, cursor: Cursor, needed: f32) -> Cursor {
        if cursor.y + needed > self.bottom() && cursor.y > self.top() {
            self.next_page(cursor)
        } else {
            cursor
        }
    }

    fn push(&mut self, page: usize, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(page) {
            page.ops.push(op);
        }
    }

    fn push_text(&mut self, baseline: Cursor, x: f32, size: f32, weight: FontWeight, color: Rgb, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(baseline.page, DrawOp::Text {
            x,
            y: baseline.y,
            size,
            weight,
            color,
            text: text.to_string(),
        });
    }
}

fn grid(x: f32, y: f32, width: f32, height: f32, style: &TableStyle) -> DrawOp {
    DrawOp::StrokeRect {
        x,
        y,
        width,
        height,
        color: style.grid,
        thickness: style.grid_width,
    }
}

fn centered_x(text: &str, cell_x: f32, cell_width: f32, size: f32, padding: f32) -> f32 {
    let text_width = estimate_text_width(text, size);
    cell_x + ((cell_width - text_width) / 2.0).max(padding)
}

pub fn layout_report(report: &Report, style: &ReportStyle) -> LaidOutDocument {
    LayoutEngine::new(style).layout(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::compose::{Cell, DETAIL_HEADERS};
    use crate::window::ReportWindow;

    fn detail_table(rows: usize) -> Table {
        Table {
            headers: DETAIL_HEADERS.iter().map(|h| h.to_string()).collect(),
            widths: vec![100.0, 100.0, 100.0, 65.0, 65.0, 85.0, 80.0],
            rows: (0..rows)
                .map(|i| {
                    vec![
                        Cell::Text(format!("Item {}", i)),
                        Cell::Text("Brand".to_string()),
                        Cell::Number("1.5".to_string()),
                        Cell::Number("2.00".to_string()),
                        Cell::Number("10".to_string()),
                        Cell::Number("1000".to_string()),
                        Cell::Number("200".to_string()),
                    ]
                })
                .collect(),
            role: TableRole::Detail,
            repeat_header: true,
        }
    }

    fn summary_table() -> Table {
        Table {
            headers: vec!["Group".to_string(), "Turnover".to_string()],
            widths: vec![2.0, 1.0],
            rows: vec![vec![Cell::Text("Pumps".to_string()), Cell::Number("1500".to_string())]],
            role: TableRole::Summary,
            repeat_header: true,
        }
    }

    fn report(details: Vec<(&str, usize)>) -> Report {
        let mut sections = vec![
            Section::Summary {
                title: "MTD Sales Summary".to_string(),
                period: "01/03/2024 - 10/03/2024".to_string(),
                blocks: vec![TextBlock {
                    heading: "Totals:".to_string(),
                    lines: vec!["Turnover: 1,500 CZK".to_string()],
                }],
                table: summary_table(),
            },
            Section::DealerSummary {
                heading: "Dealer Sales Summary".to_string(),
                table: summary_table(),
            },
        ];
        for (dealer, rows) in details {
            sections.push(Section::DealerDetail {
                dealer: dealer.to_string(),
                table: detail_table(rows),
            });
        }
        Report {
            window: ReportWindow::MonthToDate,
            title: "MTD Sales Report".to_string(),
            sections,
        }
    }

    #[test]
    fn test_fixed_page_order() {
        let style = ReportStyle::default();
        let doc = layout_report(&report(vec![("Acme", 3), ("Bolt", 2)]), &style);

        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages[0].contains_text("MTD Sales Summary"));
        assert!(doc.pages[0].contains_text("Totals:"));
        assert!(doc.pages[0].contains_text("Pumps"));
        assert!(doc.pages[1].contains_text("Dealer Sales Summary"));
        assert!(doc.pages[2].contains_text("Acme"));
        assert!(doc.pages[2].contains_text("Bolt"));
        assert!(doc.pages[2].contains_text("MTD Sales Report - page 3 of 3"));
    }

    #[test]
    fn test_long_detail_table_repeats_header_on_each_page() {
        let style = ReportStyle::default();
        let doc = layout_report(&report(vec![("Acme", 200)]), &style);

        let detail_pages = &doc.pages[2..];
        assert!(detail_pages.len() > 1);
        for page in detail_pages {
            let headers = page.texts().filter(|t| *t == "Nomenclature").count();
            assert_eq!(headers, 1);
        }

        let rows: usize = detail_pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with("Item ")).count())
            .sum();
        assert_eq!(rows, 200);
    }

    #[test]
    fn test_nothing_drawn_below_bottom_margin() {
        let style = ReportStyle::default();
        let doc = layout_report(&report(vec![("Acme", 150), ("Bolt", 90)]), &style);
        let bottom = style.page.content_bottom();

        for page in &doc.pages {
            for op in &page.ops {
                match op {
                    DrawOp::FillRect { y, height, .. } | DrawOp::StrokeRect { y, height, .. } => {
                        assert!(y + height <= bottom + 0.01);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_dealer_heading_is_not_orphaned() {
        let style = ReportStyle::default();
        // 45 rows leave room for Bolt's heading but not for its header and first row.
        let doc = layout_report(&report(vec![("Acme", 45), ("Bolt", 3)]), &style);

        assert!(doc.pages[2].contains_text("Acme"));
        assert!(doc.pages[2].contains_text("Item 44"));
        assert!(!doc.pages[2].contains_text("Bolt"));

        let bolt = &doc.pages[3];
        assert!(bolt.contains_text("Bolt"));
        assert!(bolt.contains_text("Nomenclature"));
        assert!(bolt.contains_text("Item 2"));
    }

    #[test]
    fn test_fit_widths_scales_to_available_space() {
        let widths = fit_widths(&[100.0, 60.0, 80.0, 60.0, 60.0], 180.0);
        assert!((widths.iter().sum::<f32>() - 180.0).abs() < 0.01);
        assert!((widths[0] - 50.0).abs() < 0.01);
    }
}
