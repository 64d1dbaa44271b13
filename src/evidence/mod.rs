//! Evidence Capturer
//!
//! Geotagged photo proof of in-person capture. The camera shutter is gated
//! on a location fix: no fix, no capture, and confirming a photo without a
//! fix is rejected rather than defaulted. Capability refusals are terminal
//! for the stage and surface with an actionable message.

mod capture;
mod providers;

pub use capture::{CaptureState, EvidenceCapturer};
#[cfg(feature = "device-camera")]
pub use providers::DeviceCamera;
pub use providers::{CameraProvider, FixedLocationProvider, LocationProvider};
