//! List interaction core for the Sarge launcher.
//!
//! Two independent pieces shared by every list-bearing view (server
//! browser, demo browser, level browser):
//! - Viewport windowing: which slice of a long uniform-height list to
//!   materialize, and where to place it
//! - Click disambiguation: single click, toggle-deselect, double-click
//!   activation and right-click selection over a short timer
//!
//! Both broadcast their state through `tokio::sync::watch` channels and are
//! driven through injected capabilities ([`ViewportMeasure`], [`Scheduler`])
//! so they run headless under test. [`replay`] drives both from a recorded
//! trace.

mod click;
mod error;
mod measure;
mod replay;
mod scroll;
mod settings;
mod timer;
mod viewport;

pub use click::{ClickOutcome, ClickRow, ClickTarget, Selection, DEFAULT_CLICK_WINDOW};
pub use error::ListError;
pub use measure::{HeadlessViewport, Subscription, ViewportCallback, ViewportMeasure};
pub use replay::{replay, ReplayReport, Trace};
pub use scroll::VirtualScroll;
pub use settings::{settings_path, ListSettings};
pub use timer::{ManualScheduler, Scheduler, TimerCallback, TimerHandle, TokioScheduler};
pub use viewport::{Scroller, ViewportInputs, ViewportWindow};
