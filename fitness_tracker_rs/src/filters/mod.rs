pub mod location;

pub use location::{classify, LocationFilter, TrackState, Verdict};
