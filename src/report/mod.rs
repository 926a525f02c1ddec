//! Report composition: logical sections, pagination, and PDF output.

pub mod compose;
pub mod layout;
pub mod pdf;
pub mod style;

pub use compose::{Cell, Report, ReportComposer, Section, Table, TableRole, TextBlock};
pub use layout::{layout_report, DrawOp, FontWeight, LaidOutDocument, LayoutEngine, Page};
pub use pdf::{builtin_font_covers, render_pdf, PdfFonts};
pub use style::{PageGeometry, ReportStyle, Rgb, TableStyle};
