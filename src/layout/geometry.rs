//! Page and column geometry derived from a page master.

use crate::content::ColumnFrame;
use crate::model::{Orientation, PageMaster};

/// Height of the header band and of the footer band, when present.
pub const BAND_HEIGHT: f64 = 0.5;

pub const MAX_COLUMNS: u32 = 3;

/// Resolved geometry for one page master, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub content_width: f64,
    /// Content height after margins and header/footer bands.
    pub content_height: f64,
    pub columns: usize,
    pub column_gap: f64,
    pub column_width: f64,
    pub column_height: f64,
}

impl PageGeometry {
    pub fn from_master(master: &PageMaster) -> Result<Self, String> {
        if master.columns == 0 || master.columns > MAX_COLUMNS {
            return Err(format!(
                "columns must be between 1 and {}, got {}",
                MAX_COLUMNS, master.columns
            ));
        }
        let m = &master.margins;
        if [m.top, m.right, m.bottom, m.left, master.column_gap]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("margins and column gap must be non-negative lengths".to_string());
        }

        let (w, h) = master.page_size.dimensions();
        let (page_width, page_height) = match master.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };

        let content_width = page_width - m.horizontal();
        let mut content_height = page_height - m.vertical();
        if master.has_header {
            content_height -= BAND_HEIGHT;
        }
        if master.has_footer {
            content_height -= BAND_HEIGHT;
        }

        let columns = master.columns as usize;
        let gaps = (columns - 1) as f64 * master.column_gap;
        let column_width = (content_width - gaps) / columns as f64;

        if column_width <= 0.0 {
            return Err(format!(
                "column width is {:.3}in after margins and gaps",
                column_width
            ));
        }
        if content_height <= 0.0 {
            return Err(format!(
                "column height is {:.3}in after margins and bands",
                content_height
            ));
        }

        Ok(Self {
            page_width,
            page_height,
            content_width,
            content_height,
            columns,
            column_gap: master.column_gap,
            column_width,
            column_height: content_height,
        })
    }

    pub fn frame(&self) -> ColumnFrame {
        ColumnFrame {
            width: self.column_width,
            height: self.column_height,
        }
    }
}
