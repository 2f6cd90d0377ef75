// Fitness Tracker Android JNI Library
// Exposes the Rust workout tracking core to Kotlin via JNI

pub mod android_jni;
pub mod bridge;
pub mod error;

pub use bridge::TrackerBridge;
pub use error::{JResult, JniBridgeError};
