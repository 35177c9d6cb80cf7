//! Trace replay over a headless list session.
//!
//! A trace is a JSON document of rows plus timed scroll, resize and pointer
//! events. [`replay`] drives a [`VirtualScroll`] over a [`HeadlessViewport`]
//! and a [`ClickRow`] over a [`ManualScheduler`], logging the window and the
//! selection after every event.
//!
//! ```json
//! {
//!   "viewport_height": 480,
//!   "synthetic_servers": 1000,
//!   "pinned": 2,
//!   "events": [
//!     { "at_ms": 0,   "event": "scroll", "px": 2410 },
//!     { "at_ms": 500, "event": "click", "index": 95 },
//!     { "at_ms": 600, "event": "click", "index": 95 },
//!     { "at_ms": 900, "event": "right_click", "index": 96 }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sarge_core::{Quake3Server, Row};
use serde::Deserialize;

use crate::click::{ClickOutcome, ClickRow, ClickTarget};
use crate::error::ListError;
use crate::measure::HeadlessViewport;
use crate::scroll::VirtualScroll;
use crate::settings::ListSettings;
use crate::timer::ManualScheduler;
use crate::viewport::ViewportWindow;

// =============================================================================
// Trace Format
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Trace {
    viewport_height: u64,
    #[serde(default)]
    rows: Vec<Row>,
    /// Placeholder servers appended after `rows`.
    #[serde(default)]
    synthetic_servers: usize,
    #[serde(default)]
    pinned: usize,
    /// Overrides the user's list.toml.
    settings: Option<ListSettings>,
    #[serde(default)]
    details_panel: bool,
    events: Vec<TraceEvent>,
}

#[derive(Debug, Deserialize)]
struct TraceEvent {
    #[serde(default)]
    at_ms: u64,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Action {
    Scroll {
        px: u64,
    },
    Resize {
        height: u64,
    },
    Click {
        index: usize,
        #[serde(default)]
        target: ClickTarget,
    },
    RightClick {
        index: usize,
    },
    /// Keyboard selection; `null` clears it.
    Select {
        index: Option<usize>,
    },
    Reset,
}

impl Trace {
    pub fn from_json(text: &str) -> Result<Self, ListError> {
        serde_json::from_str(text).map_err(|e| ListError::Trace(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ListError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ListError::Trace(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
            .map_err(|e| ListError::Trace(format!("{}: {}", path.display(), e)))
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn build_rows(&self) -> Vec<Arc<Row>> {
        let synthetic = (0..self.synthetic_servers).map(|i| {
            let ip = format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff);
            Row::from(Quake3Server::new(ip, "27960"))
        });
        self.rows
            .iter()
            .cloned()
            .chain(synthetic)
            .map(Arc::new)
            .collect()
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Where a replay ended up. Rows are reported by index into the trace's
/// row collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub rows: usize,
    pub window: ViewportWindow,
    pub selected: Option<usize>,
    pub last_selected: Option<usize>,
    pub display_details: Option<bool>,
    /// Rows activated by a double click, in order.
    pub activations: Vec<usize>,
}

fn row_at(rows: &[Arc<Row>], index: usize) -> Result<Arc<Row>, ListError> {
    rows.get(index).cloned().ok_or_else(|| {
        ListError::Trace(format!("row {} out of range ({} rows)", index, rows.len()))
    })
}

fn index_of(rows: &[Arc<Row>], row: Option<&Arc<Row>>) -> Option<usize> {
    let row = row?;
    rows.iter().position(|r| Arc::ptr_eq(r, row))
}

/// Run every event of `trace`, then let the last click window run out.
///
/// Settings embedded in the trace win over the user's list.toml.
pub fn replay(trace: &Trace) -> Result<ReplayReport, ListError> {
    let settings = trace.settings.unwrap_or_else(ListSettings::load);
    let rows = trace.build_rows();

    let viewport = HeadlessViewport::new(trace.viewport_height);
    let mut scroll = VirtualScroll::new(settings.scroller()?);
    scroll.set_total_items(rows.len());
    scroll.set_pinned_count(trace.pinned);
    scroll.activate(Arc::new(viewport.clone()));

    let clock = ManualScheduler::new();
    let mut clicks: ClickRow<Row> =
        ClickRow::new(Arc::new(clock.clone())).with_window(settings.double_click_window());
    if trace.details_panel {
        clicks = clicks.with_details_panel(false);
    }

    tracing::info!(
        "Replaying {} events over {} rows (row height {}, overscan {})",
        trace.events.len(),
        rows.len(),
        settings.row_height,
        settings.overscan
    );

    let mut activations = Vec::new();
    for event in &trace.events {
        let fired = clock.advance_to(Duration::from_millis(event.at_ms));
        if fired > 0 {
            tracing::info!("[{:>6}ms] {} click window(s) expired", event.at_ms, fired);
            log_selection(&clicks);
        }

        match &event.action {
            Action::Scroll { px } => viewport.scroll_to(*px),
            Action::Resize { height } => viewport.resize(*height),
            Action::Click { index, target } => {
                let outcome = clicks.handle_click(row_at(&rows, *index)?, *target);
                if outcome == ClickOutcome::Activate && clicks.take_activation() {
                    tracing::info!("[{:>6}ms] activate row {}", event.at_ms, index);
                    activations.push(*index);
                }
            }
            Action::RightClick { index } => {
                clicks.right_click_to_select(row_at(&rows, *index)?);
            }
            Action::Select { index } => {
                let row = index.map(|i| row_at(&rows, i)).transpose()?;
                clicks.select(row);
                if let Some(i) = index {
                    scroll.ensure_visible(*i);
                }
            }
            Action::Reset => clicks.reset_double_click_timeout(),
        }

        let window = scroll.window();
        tracing::info!(
            "[{:>6}ms] {:?} -> rows {}..{} margin {} height {}",
            event.at_ms,
            event.action,
            window.start,
            window.end,
            window.top_margin,
            window.virtual_height
        );
        log_selection(&clicks);
    }

    if clock.advance(settings.double_click_window()) > 0 {
        log_selection(&clicks);
    }

    let selection = clicks.snapshot();
    let report = ReplayReport {
        rows: rows.len(),
        window: scroll.window(),
        selected: index_of(&rows, selection.selected.as_ref()),
        last_selected: index_of(&rows, selection.last_selected.as_ref()),
        display_details: selection.display_details,
        activations,
    };
    scroll.deactivate();
    Ok(report)
}

fn log_selection(clicks: &ClickRow<Row>) {
    let selection = clicks.snapshot();
    tracing::info!(
        "         selected={} last={} clicks={} double={} details={:?}",
        selection.selected.as_deref().map_or("-", Row::label),
        selection.last_selected.as_deref().map_or("-", Row::label),
        selection.click_count,
        selection.same_object_double_click,
        selection.display_details
    );
}
