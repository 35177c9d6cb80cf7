//! Viewport measurement capability.
//!
//! The windowing session never touches a rendering surface directly. It is
//! handed a [`ViewportMeasure`] that reports the container's height and
//! scroll position and notifies on scroll and resize.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Callback invoked when the container scrolls or resizes.
pub type ViewportCallback = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// ViewportMeasure
// =============================================================================

/// A rectangular scrollable region.
#[cfg_attr(test, mockall::automock)]
pub trait ViewportMeasure: Send + Sync {
    /// Rendered height of the container in pixels.
    fn current_height(&self) -> u64;

    /// Raw (unquantized) scroll position in pixels.
    fn scroll_position(&self) -> u64;

    /// Move the container. Implementations deliver a scroll notification.
    fn set_scroll_position(&self, px: u64);

    fn on_scroll(&self, callback: ViewportCallback) -> Subscription;

    fn on_resize(&self, callback: ViewportCallback) -> Subscription;
}

// =============================================================================
// Subscription
// =============================================================================

/// A registered listener. Dropping it unsubscribes.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release.
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    /// Detach the listener. Calling this more than once does nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// HeadlessViewport
// =============================================================================

#[derive(Default)]
struct HeadlessState {
    height: u64,
    scroll_top: u64,
    next_id: u64,
    scroll_listeners: Vec<(u64, ViewportCallback)>,
    resize_listeners: Vec<(u64, ViewportCallback)>,
}

#[derive(Clone, Copy)]
enum ListenerKind {
    Scroll,
    Resize,
}

impl HeadlessState {
    fn listeners_mut(&mut self, kind: ListenerKind) -> &mut Vec<(u64, ViewportCallback)> {
        match kind {
            ListenerKind::Scroll => &mut self.scroll_listeners,
            ListenerKind::Resize => &mut self.resize_listeners,
        }
    }
}

/// An in-memory scroll container.
///
/// Used by tests and the replay tool in place of a real rendering surface.
/// Callbacks run on the caller's thread, outside the internal lock.
#[derive(Clone, Default)]
pub struct HeadlessViewport {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessViewport {
    pub fn new(height: u64) -> Self {
        let viewport = Self::default();
        viewport.inner.lock().height = height;
        viewport
    }

    /// Change the container height and notify resize listeners.
    pub fn resize(&self, height: u64) {
        self.inner.lock().height = height;
        self.fire(ListenerKind::Resize);
    }

    /// Scroll as the user would and notify scroll listeners.
    pub fn scroll_to(&self, px: u64) {
        self.inner.lock().scroll_top = px;
        self.fire(ListenerKind::Scroll);
    }

    /// Number of live scroll and resize listeners.
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.scroll_listeners.len() + inner.resize_listeners.len()
    }

    fn fire(&self, kind: ListenerKind) {
        let callbacks: Vec<ViewportCallback> = {
            let mut inner = self.inner.lock();
            inner
                .listeners_mut(kind)
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    fn listen(&self, kind: ListenerKind, callback: ViewportCallback) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners_mut(kind).push((id, callback));
            id
        };

        let weak: Weak<Mutex<HeadlessState>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners_mut(kind).retain(|(i, _)| *i != id);
            }
        })
    }
}

impl ViewportMeasure for HeadlessViewport {
    fn current_height(&self) -> u64 {
        self.inner.lock().height
    }

    fn scroll_position(&self) -> u64 {
        self.inner.lock().scroll_top
    }

    fn set_scroll_position(&self, px: u64) {
        self.scroll_to(px);
    }

    fn on_scroll(&self, callback: ViewportCallback) -> Subscription {
        self.listen(ListenerKind::Scroll, callback)
    }

    fn on_resize(&self, callback: ViewportCallback) -> Subscription {
        self.listen(ListenerKind::Resize, callback)
    }
}
