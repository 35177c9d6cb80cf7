//! Click disambiguation for list rows.
//!
//! Turns raw pointer-down events on rows into select, toggle-deselect,
//! activate (double click) and context-select. A single short timer per
//! machine resolves whether a left click was a single or a double click.
//!
//! ## Transitions (left click on row `r`)
//!
//! ```text
//! every click      click_count += 1, last_selected = selected, selected = r
//! click_count == 1 arm the timer (window D)
//! click_count == 2 same row as before?  -> same_object_double_click = true
//! timer expiry     click_count = 0
//!                  selected == last_selected and not exempt -> deselect
//! ```
//!
//! Right click only moves the selection; it never arms, cancels or
//! activates. Rows are compared by identity (`Arc::ptr_eq`), not by value.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;

use crate::timer::{Scheduler, TimerHandle};

/// Default single/double click disambiguation window.
pub const DEFAULT_CLICK_WINDOW: Duration = Duration::from_millis(250);

// =============================================================================
// Public Types
// =============================================================================

/// Which part of a row received the click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTarget {
    /// The row body.
    #[default]
    Row,
    /// An inline control (e.g. "expand details") that must never cause the
    /// row to be deselected.
    DeselectExempt,
}

/// Immediate result of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The row became the selection. A deselect may still follow on expiry.
    Select,
    /// Second click on the same row within the window.
    Activate,
    /// Right click: selected without opening or activating.
    ContextSelect,
}

/// Selection sink read by the owning view.
#[derive(Debug)]
pub struct Selection<T> {
    pub selected: Option<Arc<T>>,
    pub last_selected: Option<Arc<T>>,
    /// Set on a confirmed double click. The caller clears it once consumed.
    pub same_object_double_click: bool,
    /// Details panel visibility, when the view has one.
    pub display_details: Option<bool>,
    /// Clicks seen in the current disambiguation window.
    pub click_count: u32,
}

impl<T> Selection<T> {
    /// Whether `row` is the current selection (by identity).
    pub fn is_selected(&self, row: &Arc<T>) -> bool {
        self.selected.as_ref().is_some_and(|s| Arc::ptr_eq(s, row))
    }
}

impl<T> Clone for Selection<T> {
    fn clone(&self) -> Self {
        Self {
            selected: self.selected.clone(),
            last_selected: self.last_selected.clone(),
            same_object_double_click: self.same_object_double_click,
            display_details: self.display_details,
            click_count: self.click_count,
        }
    }
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            selected: None,
            last_selected: None,
            same_object_double_click: false,
            display_details: None,
            click_count: 0,
        }
    }
}

fn same_row<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

// =============================================================================
// Internal State
// =============================================================================

/// The one outstanding disambiguation timer.
struct Pending {
    generation: u64,
    /// Taken from the click that armed the timer.
    exempt: bool,
    /// A double click was signalled in this window.
    activated: bool,
    handle: TimerHandle,
}

struct ClickState<T> {
    selection: Selection<T>,
    pending: Option<Pending>,
    generation: u64,
}

impl<T> ClickState<T> {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(mut pending) => {
                pending.handle.cancel();
                true
            }
            None => false,
        }
    }
}

struct ClickShared<T> {
    state: Mutex<ClickState<T>>,
    tx: watch::Sender<Selection<T>>,
}

impl<T> ClickShared<T> {
    /// Run `f` under the lock and broadcast the resulting selection.
    fn mutate<R>(&self, f: impl FnOnce(&mut ClickState<T>) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, state.selection.clone())
        };
        self.tx.send_replace(snapshot);
        result
    }

    /// Timer expiry for the window armed with `generation`.
    fn expire(&self, generation: u64) {
        let mut state = self.state.lock();
        let pending = match state.pending.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                // Superseded by a reset or a newer window
                state.pending = other;
                return;
            }
        };
        pending.handle.detach();

        let selection = &mut state.selection;
        selection.click_count = 0;
        if !pending.activated {
            selection.same_object_double_click = false;
        }
        if !pending.exempt && same_row(&selection.selected, &selection.last_selected) {
            selection.selected = None;
            if let Some(visible) = selection.display_details.as_mut() {
                *visible = false;
            }
            tracing::debug!("Click window expired: toggled selection off");
        } else {
            tracing::debug!("Click window expired");
        }

        let snapshot = selection.clone();
        drop(state);
        self.tx.send_replace(snapshot);
    }
}

// =============================================================================
// ClickRow
// =============================================================================

/// Click disambiguation machine for one list-bearing view.
///
/// Owns at most one pending timer, which is cancelled before a new one is
/// armed, on [`ClickRow::reset_double_click_timeout`], and on drop.
pub struct ClickRow<T> {
    shared: Arc<ClickShared<T>>,
    rx: watch::Receiver<Selection<T>>,
    scheduler: Arc<dyn Scheduler>,
    window: Duration,
}

impl<T> ClickRow<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        let (tx, rx) = watch::channel(Selection::default());
        Self {
            shared: Arc::new(ClickShared {
                state: Mutex::new(ClickState {
                    selection: Selection::default(),
                    pending: None,
                    generation: 0,
                }),
                tx,
            }),
            rx,
            scheduler,
            window: DEFAULT_CLICK_WINDOW,
        }
    }

    /// Use a different disambiguation window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Track a details panel, initially shown or hidden. Toggle-deselect
    /// hides it.
    pub fn with_details_panel(self, visible: bool) -> Self {
        self.shared
            .mutate(|state| state.selection.display_details = Some(visible));
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // =========================================================================
    // Pointer Events
    // =========================================================================

    /// Left click on `row`.
    pub fn handle_click(&self, row: Arc<T>, target: ClickTarget) -> ClickOutcome {
        self.shared.mutate(|state| {
            let selection = &mut state.selection;
            selection.click_count += 1;
            selection.last_selected = selection.selected.replace(row);

            match selection.click_count {
                1 => {
                    self.arm(state, target);
                    ClickOutcome::Select
                }
                2 if same_row(&selection.selected, &selection.last_selected) => {
                    selection.same_object_double_click = true;
                    if let Some(pending) = state.pending.as_mut() {
                        pending.activated = true;
                    }
                    tracing::debug!("Double click on selected row");
                    ClickOutcome::Activate
                }
                _ => ClickOutcome::Select,
            }
        })
    }

    /// Right click on `row`: select without arming or activating.
    pub fn right_click_to_select(&self, row: Arc<T>) -> ClickOutcome {
        self.shared.mutate(|state| {
            let selection = &mut state.selection;
            selection.last_selected = selection.selected.replace(row);
        });
        ClickOutcome::ContextSelect
    }

    fn arm(&self, state: &mut ClickState<T>, target: ClickTarget) {
        state.cancel_pending();
        state.generation += 1;
        let generation = state.generation;

        let shared: Weak<ClickShared<T>> = Arc::downgrade(&self.shared);
        let handle = self.scheduler.schedule(
            self.window,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.expire(generation);
                }
            }),
        );
        state.pending = Some(Pending {
            generation,
            exempt: target == ClickTarget::DeselectExempt,
            activated: false,
            handle,
        });
    }

    // =========================================================================
    // Non-click Paths
    // =========================================================================

    /// Cancel any pending disambiguation and zero the click count and
    /// activation flag. Does nothing when there is nothing to reset.
    ///
    /// Call whenever the selection changes without a click (keyboard
    /// navigation, list reload).
    pub fn reset_double_click_timeout(&self) {
        let needs_reset = {
            let state = self.shared.state.lock();
            state.pending.is_some()
                || state.selection.click_count != 0
                || state.selection.same_object_double_click
        };
        if !needs_reset {
            return;
        }

        self.shared.mutate(|state| {
            state.cancel_pending();
            state.selection.click_count = 0;
            state.selection.same_object_double_click = false;
        });
        tracing::debug!("Click disambiguation reset");
    }

    /// Select `row` without a click, e.g. from keyboard navigation.
    /// Any pending disambiguation is discarded first.
    pub fn select(&self, row: Option<Arc<T>>) {
        self.reset_double_click_timeout();
        self.shared.mutate(|state| {
            let selection = &mut state.selection;
            selection.last_selected = std::mem::replace(&mut selection.selected, row);
        });
    }

    /// Consume the activation signal. Returns whether it was set.
    pub fn take_activation(&self) -> bool {
        let activated = self.shared.state.lock().selection.same_object_double_click;
        if activated {
            self.shared
                .mutate(|state| state.selection.same_object_double_click = false);
        }
        activated
    }

    /// Show or hide the details panel. Ignored if the machine was built
    /// without one.
    pub fn set_display_details(&self, visible: bool) {
        self.shared.mutate(|state| {
            if let Some(current) = state.selection.display_details.as_mut() {
                *current = visible;
            }
        });
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    pub fn snapshot(&self) -> Selection<T> {
        self.shared.state.lock().selection.clone()
    }

    pub fn selected(&self) -> Option<Arc<T>> {
        self.shared.state.lock().selection.selected.clone()
    }

    /// Whether a disambiguation timer is outstanding.
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().pending.is_some()
    }

    /// Subscribe to selection changes, including those made on expiry.
    pub fn subscribe(&self) -> watch::Receiver<Selection<T>> {
        self.rx.clone()
    }
}

impl<T> Drop for ClickRow<T> {
    fn drop(&mut self) {
        self.shared.state.lock().cancel_pending();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ManualScheduler, TokioScheduler};
    use sarge_core::{Quake3Server, Row};

    const D: Duration = DEFAULT_CLICK_WINDOW;

    fn row(ip: &str) -> Arc<Row> {
        Arc::new(Row::Server(Quake3Server::new(ip, "27960")))
    }

    fn machine() -> (ManualScheduler, ClickRow<Row>) {
        let scheduler = ManualScheduler::new();
        let clicks = ClickRow::new(Arc::new(scheduler.clone()));
        (scheduler, clicks)
    }

    #[test]
    fn test_first_click_selects_and_stays_selected() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        assert_eq!(clicks.handle_click(a.clone(), ClickTarget::Row), ClickOutcome::Select);
        assert!(clicks.snapshot().is_selected(&a));
        assert!(clicks.is_pending());

        scheduler.advance(D);
        let selection = clicks.snapshot();
        assert!(selection.is_selected(&a));
        assert!(selection.last_selected.is_none());
        assert_eq!(selection.click_count, 0);
        assert!(!clicks.is_pending());
    }

    #[test]
    fn test_double_click_activates() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(
            clicks.handle_click(a.clone(), ClickTarget::Row),
            ClickOutcome::Activate
        );
        assert!(clicks.snapshot().same_object_double_click);

        // The timer still fires and resets the count but keeps the signal
        scheduler.advance(D);
        let selection = clicks.snapshot();
        assert_eq!(selection.click_count, 0);
        assert!(selection.same_object_double_click);

        assert!(clicks.take_activation());
        assert!(!clicks.take_activation());
    }

    #[test]
    fn test_double_click_on_equal_but_distinct_rows_does_not_activate() {
        let (_scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let a_copy = row("10.0.0.1");

        clicks.handle_click(a, ClickTarget::Row);
        assert_eq!(clicks.handle_click(a_copy, ClickTarget::Row), ClickOutcome::Select);
        assert!(!clicks.snapshot().same_object_double_click);
    }

    #[test]
    fn test_two_rows_within_window() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let b = row("10.0.0.2");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        assert_eq!(clicks.handle_click(b.clone(), ClickTarget::Row), ClickOutcome::Select);

        scheduler.advance(D);
        let selection = clicks.snapshot();
        assert!(selection.is_selected(&b));
        assert!(!selection.same_object_double_click);
    }

    #[test]
    fn test_single_click_on_selected_row_deselects() {
        let (scheduler, clicks) = machine();
        let clicks = clicks.with_details_panel(true);
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(D);
        assert!(clicks.snapshot().is_selected(&a));

        // Clicked again after the window: toggles off on expiry
        clicks.handle_click(a.clone(), ClickTarget::Row);
        assert!(clicks.snapshot().is_selected(&a));
        scheduler.advance(D);

        let selection = clicks.snapshot();
        assert!(selection.selected.is_none());
        assert_eq!(selection.display_details, Some(false));
    }

    #[test]
    fn test_exempt_target_does_not_deselect() {
        let (scheduler, clicks) = machine();
        let clicks = clicks.with_details_panel(true);
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(D);
        clicks.handle_click(a.clone(), ClickTarget::DeselectExempt);
        scheduler.advance(D);

        let selection = clicks.snapshot();
        assert!(selection.is_selected(&a));
        assert_eq!(selection.display_details, Some(true));
    }

    #[test]
    fn test_deselect_without_details_panel() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(D);
        clicks.handle_click(a, ClickTarget::Row);
        scheduler.advance(D);

        let selection = clicks.snapshot();
        assert!(selection.selected.is_none());
        assert_eq!(selection.display_details, None);
    }

    #[test]
    fn test_click_after_window_starts_fresh() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(D);
        assert!(clicks.take_activation());

        assert_eq!(clicks.handle_click(a.clone(), ClickTarget::Row), ClickOutcome::Select);
        let selection = clicks.snapshot();
        assert_eq!(selection.click_count, 1);
        assert!(!selection.same_object_double_click);
        assert!(clicks.is_pending());
    }

    #[test]
    fn test_third_click_in_window_is_plain_select() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.handle_click(a.clone(), ClickTarget::Row);
        assert_eq!(clicks.handle_click(a, ClickTarget::Row), ClickOutcome::Select);
        assert_eq!(clicks.snapshot().click_count, 3);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_unconsumed_activation_cleared_by_next_window() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let b = row("10.0.0.2");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.handle_click(a, ClickTarget::Row);
        scheduler.advance(D);
        assert!(clicks.snapshot().same_object_double_click);

        clicks.handle_click(b.clone(), ClickTarget::Row);
        scheduler.advance(D);
        let selection = clicks.snapshot();
        assert!(!selection.same_object_double_click);
        assert!(selection.is_selected(&b));
    }

    #[test]
    fn test_right_click_selects_without_timer() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let b = row("10.0.0.2");

        assert_eq!(clicks.right_click_to_select(a.clone()), ClickOutcome::ContextSelect);
        assert_eq!(clicks.right_click_to_select(a.clone()), ClickOutcome::ContextSelect);
        assert_eq!(scheduler.pending(), 0);

        let selection = clicks.snapshot();
        assert!(selection.is_selected(&a));
        assert!(!selection.same_object_double_click);
        assert_eq!(selection.click_count, 0);

        clicks.right_click_to_select(b.clone());
        let selection = clicks.snapshot();
        assert!(selection.is_selected(&b));
        assert!(selection.last_selected.is_some_and(|last| Arc::ptr_eq(&last, &a)));
    }

    #[test]
    fn test_right_click_leaves_pending_timer_alone() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let b = row("10.0.0.2");

        clicks.handle_click(a, ClickTarget::Row);
        clicks.right_click_to_select(b.clone());
        assert!(clicks.is_pending());
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(D);
        assert!(clicks.snapshot().is_selected(&b));
    }

    #[test]
    fn test_reset_without_pending_is_noop() {
        let (_scheduler, clicks) = machine();
        let rx = clicks.subscribe();

        clicks.reset_double_click_timeout();
        clicks.reset_double_click_timeout();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reset_cancels_pending_timer() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.reset_double_click_timeout();

        assert!(!clicks.is_pending());
        assert_eq!(scheduler.pending(), 0);
        let selection = clicks.snapshot();
        assert_eq!(selection.click_count, 0);
        assert!(!selection.same_object_double_click);

        // Nothing fires later to deselect the row
        scheduler.advance(D * 4);
        assert!(clicks.snapshot().is_selected(&a));
    }

    #[test]
    fn test_programmatic_select_discards_pending() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let b = row("10.0.0.2");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        clicks.select(Some(b.clone()));
        assert_eq!(scheduler.pending(), 0);

        let selection = clicks.snapshot();
        assert!(selection.is_selected(&b));
        assert!(selection.last_selected.is_some_and(|last| Arc::ptr_eq(&last, &a)));

        clicks.select(None);
        assert!(clicks.selected().is_none());
    }

    #[test]
    fn test_drop_cancels_pending_timer() {
        let (scheduler, clicks) = machine();
        clicks.handle_click(row("10.0.0.1"), ClickTarget::Row);
        assert_eq!(scheduler.pending(), 1);

        drop(clicks);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_expiry_broadcasts() {
        let (scheduler, clicks) = machine();
        let a = row("10.0.0.1");
        let rx = clicks.subscribe();

        clicks.handle_click(a.clone(), ClickTarget::Row);
        scheduler.advance(D);
        clicks.handle_click(a, ClickTarget::Row);
        assert!(rx.borrow().selected.is_some());

        scheduler.advance(D);
        assert!(rx.borrow().selected.is_none());
    }

    #[test]
    fn test_set_display_details() {
        let (_scheduler, clicks) = machine();
        clicks.set_display_details(true);
        assert_eq!(clicks.snapshot().display_details, None);

        let clicks = clicks.with_details_panel(false);
        clicks.set_display_details(true);
        assert_eq!(clicks.snapshot().display_details, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_double_click_then_deselect() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let clicks: ClickRow<Row> = ClickRow::new(Arc::new(scheduler));
        let a = row("10.0.0.1");

        clicks.handle_click(a.clone(), ClickTarget::Row);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(clicks.snapshot().is_selected(&a));

        clicks.handle_click(a.clone(), ClickTarget::Row);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(clicks.snapshot().is_selected(&a));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(clicks.snapshot().selected.is_none());
    }
}
