//! Device capability seams
//!
//! Narrow injected interfaces over the platform's geolocation and camera.
//! The embedding shell supplies real implementations; tests supply fakes.

use async_trait::async_trait;

use crate::error::SurveyResult;
use crate::record::{GeoPoint, PhotoReference};

/// One foreground geolocation fix.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Errors with `CapabilityDenied` when permission is refused.
    async fn current_location(&self) -> SurveyResult<GeoPoint>;
}

/// One camera shot.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Take a photo and return an opaque reference to it.
    async fn take_photo(&self) -> SurveyResult<PhotoReference>;
}

/// Fixed coordinates for bench and kiosk setups where the survey location
/// is known ahead of time.
pub struct FixedLocationProvider {
    point: GeoPoint,
}

impl FixedLocationProvider {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            point: GeoPoint { lat, lng },
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> SurveyResult<GeoPoint> {
        Ok(self.point)
    }
}

#[cfg(feature = "device-camera")]
pub use device::DeviceCamera;

#[cfg(feature = "device-camera")]
mod device {
    use super::*;
    use crate::error::SurveyError;
    use std::path::PathBuf;
    use tokio::task;
    use uuid::Uuid;

    /// Default camera, captured through nokhwa. Frames land as PNG files
    /// under `photo_dir`; the returned reference is the file path.
    pub struct DeviceCamera {
        photo_dir: PathBuf,
    }

    impl DeviceCamera {
        pub fn new(photo_dir: impl Into<PathBuf>) -> Self {
            Self {
                photo_dir: photo_dir.into(),
            }
        }
    }

    #[async_trait]
    impl CameraProvider for DeviceCamera {
        async fn take_photo(&self) -> SurveyResult<PhotoReference> {
            let dir = self.photo_dir.clone();
            let path = task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
                use nokhwa::pixel_format::RgbFormat;
                use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
                use nokhwa::Camera;

                let index = CameraIndex::Index(0);
                let format =
                    RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
                let mut camera = Camera::new(index, format)?;
                camera.open_stream()?;
                let frame = camera.frame()?;
                let decoded = frame.decode_image::<RgbFormat>()?;

                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("evidence-{}.png", Uuid::new_v4()));
                decoded.save(&path)?;
                Ok(path)
            })
            .await?
            .map_err(|e| SurveyError::CapabilityDenied {
                capability: "camera".to_string(),
                message: e.to_string(),
            })?;

            Ok(PhotoReference::new(path.to_string_lossy()))
        }
    }
}
