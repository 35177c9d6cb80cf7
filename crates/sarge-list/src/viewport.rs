//! Viewport windowing math.
//!
//! Given a row count, a fixed row height, an overscan margin and the current
//! scroll offset, [`Scroller::window`] yields the index range of rows to
//! materialize plus the layout offsets that place that subset where the full
//! list would have drawn it. Everything here is a pure function of its inputs.

use std::ops::Range;

use crate::error::ListError;

// =============================================================================
// Scroller
// =============================================================================

/// Fixed geometry of one windowing session.
///
/// Row height is uniform and cannot change for the lifetime of a session;
/// build a new one for a different density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scroller {
    row_height: u32,
    overscan: u32,
}

impl Scroller {
    pub const DEFAULT_ROW_HEIGHT: u32 = 24;
    pub const DEFAULT_OVERSCAN: u32 = 10;

    /// Create a scroller. `row_height` must be positive; `overscan` may be 0.
    pub fn new(row_height: u32, overscan: u32) -> Result<Self, ListError> {
        if row_height == 0 {
            return Err(ListError::ZeroRowHeight);
        }
        Ok(Self {
            row_height,
            overscan,
        })
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn overscan(&self) -> u32 {
        self.overscan
    }

    /// Total scrollable height. One extra row is reserved as bottom padding.
    pub fn virtual_height(&self, total_items: usize) -> u64 {
        u64::from(self.row_height).saturating_mul(total_items as u64 + 1)
    }

    /// Snap a raw scroll position down to a row boundary, clamped to
    /// `virtual_height`.
    pub fn quantize(&self, raw_scroll_top: u64, virtual_height: u64) -> u64 {
        let rh = u64::from(self.row_height);
        (rh * (raw_scroll_top / rh)).min(virtual_height)
    }

    /// Scroll offset that puts logical row `index` at the top of the viewport.
    ///
    /// Pinned rows sit above the virtualized rows and count towards it.
    pub fn offset_of(&self, index: usize, pinned_count: usize) -> u64 {
        u64::from(self.row_height).saturating_mul(index as u64 + pinned_count as u64)
    }

    /// Compute the materialized window for the given inputs.
    pub fn window(&self, inputs: &ViewportInputs) -> ViewportWindow {
        let rh = u64::from(self.row_height);
        let overscan = u64::from(self.overscan);
        let lead_rows = overscan + inputs.pinned_count as u64;
        let total = inputs.total_items as u64;

        let first_visible = inputs.scroll_offset / rh;
        let last_visible = inputs.scroll_offset.saturating_add(inputs.viewport_height) / rh;

        let end = last_visible.saturating_add(overscan).min(total);
        // Clamped to `end` for when the collection shrank under a deep offset.
        let start = first_visible.saturating_sub(lead_rows).min(end);

        let lead_px = lead_rows.saturating_mul(rh);
        let top_margin = if inputs.scroll_offset > lead_px {
            negate(lead_px)
        } else {
            negate(inputs.scroll_offset)
        };

        ViewportWindow {
            start: start as usize,
            end: end as usize,
            top_margin,
            virtual_height: self.virtual_height(inputs.total_items),
        }
    }
}

impl Default for Scroller {
    fn default() -> Self {
        Self {
            row_height: Self::DEFAULT_ROW_HEIGHT,
            overscan: Self::DEFAULT_OVERSCAN,
        }
    }
}

fn negate(px: u64) -> i64 {
    i64::try_from(px).map(|v| -v).unwrap_or(i64::MIN)
}

// =============================================================================
// Inputs / Output
// =============================================================================

/// The live inputs of the windowing computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportInputs {
    /// Length of the current row collection.
    pub total_items: usize,
    /// Rows rendered above the virtualized region (e.g. pinned servers).
    pub pinned_count: usize,
    /// Quantized scroll position in pixels.
    pub scroll_offset: u64,
    /// Visible height of the scroll container in pixels.
    pub viewport_height: u64,
}

/// Rows to render and where to put them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportWindow {
    /// First materialized row (inclusive).
    pub start: usize,
    /// Last materialized row (exclusive).
    pub end: usize,
    /// Offset applied to the rendered subset; never positive.
    pub top_margin: i64,
    /// Height of the spacer that makes the container scroll as if every
    /// row existed.
    pub virtual_height: u64,
}

impl ViewportWindow {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    /// The slice of `rows` to render. Tolerates a collection that is shorter
    /// than the one the window was computed for.
    pub fn slice<'a, R>(&self, rows: &'a [R]) -> &'a [R] {
        let end = self.end.min(rows.len());
        let start = self.start.min(end);
        &rows[start..end]
    }
}
