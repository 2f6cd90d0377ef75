//! Movement tracking and workout metrics core.
//!
//! Raw location fixes flow through [`filters::location::LocationFilter`], accepted
//! movement is plotted on a [`route::Route`], and [`session::TrackingSession`]
//! derives duration, calories and pace from it. [`tracker::TrackerService`] wraps a
//! session in a single-writer async task with a periodic tick.

pub mod active_time;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod filters;
pub mod geodesy;
pub mod live_status;
pub mod metrics;
pub mod route;
pub mod sensors;
pub mod session;
pub mod tracker;
pub mod types;
pub mod workout;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use live_status::{SessionSnapshot, Subscription};
pub use session::{LocationPermission, SessionState, TrackingSession};
pub use tracker::{TrackerHandle, TrackerService};
pub use types::{Fix, GeoPoint, UserProfile};
pub use workout::WorkoutSummary;
