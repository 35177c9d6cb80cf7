//! Per-view scroll session.
//!
//! A [`VirtualScroll`] is created by each list-bearing view and owns that
//! view's windowing state. While active it listens to the view's
//! [`ViewportMeasure`], quantizes scroll positions, and broadcasts every
//! recomputed [`ViewportWindow`] through a `watch` channel.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

use crate::measure::{Subscription, ViewportCallback, ViewportMeasure};
use crate::viewport::{Scroller, ViewportInputs, ViewportWindow};

// =============================================================================
// Shared State
// =============================================================================

/// State reachable from measurement callbacks.
struct ScrollShared {
    scroller: Scroller,
    inputs: Mutex<ViewportInputs>,
    tx: watch::Sender<ViewportWindow>,
}

impl ScrollShared {
    /// Mutate the inputs, recompute and broadcast. Mutation = notification.
    fn update(&self, f: impl FnOnce(&mut ViewportInputs)) -> ViewportWindow {
        let window = {
            let mut inputs = self.inputs.lock();
            f(&mut inputs);
            self.scroller.window(&inputs)
        };
        self.tx.send_replace(window);
        window
    }

    fn sample_scroll(&self, raw_scroll_top: u64) {
        let scroller = self.scroller;
        let window = self.update(|inputs| {
            let virtual_height = scroller.virtual_height(inputs.total_items);
            inputs.scroll_offset = scroller.quantize(raw_scroll_top, virtual_height);
        });
        tracing::debug!(
            "Scroll {} -> rows {}..{}",
            raw_scroll_top,
            window.start,
            window.end
        );
    }

    fn sample_resize(&self, height: u64) {
        self.update(|inputs| inputs.viewport_height = height);
        tracing::debug!("Viewport resized to {}", height);
    }
}

// =============================================================================
// VirtualScroll
// =============================================================================

/// Windowing session for one scroll container.
///
/// ```ignore
/// let mut scroll = VirtualScroll::new(Scroller::default());
/// scroll.set_total_items(servers.len());
/// scroll.activate(measure);
///
/// let window = scroll.window();
/// render(window.slice(&servers), window.top_margin, window.virtual_height);
/// ```
pub struct VirtualScroll {
    shared: Arc<ScrollShared>,
    rx: watch::Receiver<ViewportWindow>,
    measure: Option<Arc<dyn ViewportMeasure>>,
    subscriptions: Vec<Subscription>,
}

impl VirtualScroll {
    pub fn new(scroller: Scroller) -> Self {
        let inputs = ViewportInputs::default();
        let (tx, rx) = watch::channel(scroller.window(&inputs));
        Self {
            shared: Arc::new(ScrollShared {
                scroller,
                inputs: Mutex::new(inputs),
                tx,
            }),
            rx,
            measure: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn scroller(&self) -> Scroller {
        self.shared.scroller
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Attach to a scroll container.
    ///
    /// Subscribes to scroll and resize, then calibrates from the container's
    /// current height and scroll position, since it may already be laid out.
    /// Re-activating first releases the previous container.
    pub fn activate(&mut self, measure: Arc<dyn ViewportMeasure>) {
        self.deactivate();

        let on_scroll = self.callback(&measure, |shared, measure| {
            shared.sample_scroll(measure.scroll_position());
        });
        let on_resize = self.callback(&measure, |shared, measure| {
            shared.sample_resize(measure.current_height());
        });
        self.subscriptions.push(measure.on_scroll(on_scroll));
        self.subscriptions.push(measure.on_resize(on_resize));
        self.measure = Some(measure);

        self.handle_resize();
        self.handle_scroll();
        tracing::info!("Virtual scroll activated");
    }

    /// Release all listeners. Safe to call when already inactive.
    pub fn deactivate(&mut self) {
        if self.measure.take().is_some() {
            self.subscriptions.clear();
            tracing::info!("Virtual scroll deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.measure.is_some()
    }

    fn callback(
        &self,
        measure: &Arc<dyn ViewportMeasure>,
        f: fn(&ScrollShared, &dyn ViewportMeasure),
    ) -> ViewportCallback {
        let shared: Weak<ScrollShared> = Arc::downgrade(&self.shared);
        let measure: Weak<dyn ViewportMeasure> = Arc::downgrade(measure);
        Arc::new(move || {
            if let (Some(shared), Some(measure)) = (shared.upgrade(), measure.upgrade()) {
                f(&shared, measure.as_ref());
            }
        })
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    /// Sample the container's scroll position.
    pub fn handle_scroll(&self) {
        if let Some(measure) = &self.measure {
            self.shared.sample_scroll(measure.scroll_position());
        }
    }

    /// Sample the container's height. Scroll state is left untouched.
    pub fn handle_resize(&self) {
        if let Some(measure) = &self.measure {
            self.shared.sample_resize(measure.current_height());
        }
    }

    // =========================================================================
    // External Inputs
    // =========================================================================

    /// Set the length of the row collection (after a reload or filter).
    pub fn set_total_items(&self, total_items: usize) -> ViewportWindow {
        self.shared.update(|inputs| inputs.total_items = total_items)
    }

    /// Set the number of rows pinned above the virtualized region.
    pub fn set_pinned_count(&self, pinned_count: usize) -> ViewportWindow {
        self.shared.update(|inputs| inputs.pinned_count = pinned_count)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Scroll so row `index` is at the top of the viewport.
    ///
    /// Returns `false` when the session is not attached to a container.
    pub fn scroll_to_index(&self, index: usize) -> bool {
        let Some(measure) = &self.measure else {
            return false;
        };
        let pinned = self.shared.inputs.lock().pinned_count;
        measure.set_scroll_position(self.shared.scroller.offset_of(index, pinned));
        true
    }

    /// Scroll the minimum amount that makes row `index` fully visible.
    ///
    /// Returns `true` if the container was moved.
    pub fn ensure_visible(&self, index: usize) -> bool {
        let Some(measure) = &self.measure else {
            return false;
        };
        let scroller = self.shared.scroller;
        let inputs = *self.shared.inputs.lock();
        let row_height = u64::from(scroller.row_height());

        // Indices past the end resolve to the last row
        let index = index.min(inputs.total_items.saturating_sub(1));
        let top = scroller.offset_of(index, inputs.pinned_count);
        let bottom = top.saturating_add(row_height);
        let target = if top < inputs.scroll_offset {
            top
        } else if bottom > inputs.scroll_offset.saturating_add(inputs.viewport_height) {
            // Round up, scroll sampling snaps down to a row boundary
            (bottom - inputs.viewport_height.min(bottom)).div_ceil(row_height) * row_height
        } else {
            return false;
        };

        measure.set_scroll_position(target);
        true
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    pub fn inputs(&self) -> ViewportInputs {
        *self.shared.inputs.lock()
    }

    /// The most recently computed window.
    pub fn window(&self) -> ViewportWindow {
        *self.rx.borrow()
    }

    /// Subscribe to window changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewportWindow> {
        self.rx.clone()
    }
}

impl Drop for VirtualScroll {
    fn drop(&mut self) {
        self.deactivate();
    }
}

// =============================================================================
// Tests
// =============================================================================
