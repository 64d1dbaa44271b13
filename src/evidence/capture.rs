//! Capture state machine
//!
//! `AcquiringLocation -> LocationReady | LocationDenied`; once ready the
//! shutter is enabled, `Captured` can be confirmed or retaken. The gating
//! lives here, not in any UI: a capture or confirm outside the enabling
//! state is a typed error.

use std::sync::Arc;
use tracing::debug;

use super::{CameraProvider, LocationProvider};
use crate::error::{SurveyError, SurveyResult};
use crate::record::{Evidence, GeoPoint, PhotoReference};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    AcquiringLocation,
    LocationReady(GeoPoint),
    LocationDenied,
    Captured {
        photo: PhotoReference,
        location: GeoPoint,
    },
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::AcquiringLocation => "acquiring-location",
            CaptureState::LocationReady(_) => "location-ready",
            CaptureState::LocationDenied => "location-denied",
            CaptureState::Captured { .. } => "captured",
        }
    }
}

pub struct EvidenceCapturer {
    location: Arc<dyn LocationProvider>,
    camera: Arc<dyn CameraProvider>,
    state: CaptureState,
}

impl EvidenceCapturer {
    pub fn new(location: Arc<dyn LocationProvider>, camera: Arc<dyn CameraProvider>) -> Self {
        Self {
            location,
            camera,
            state: CaptureState::AcquiringLocation,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Acquire the location fix. A refusal is terminal for this stage.
    pub async fn acquire_location(&mut self) -> SurveyResult<GeoPoint> {
        match self.location.current_location().await {
            Ok(point) => {
                debug!(lat = point.lat, lng = point.lng, "location fix acquired");
                self.state = CaptureState::LocationReady(point);
                Ok(point)
            }
            Err(err) => {
                self.state = CaptureState::LocationDenied;
                Err(err)
            }
        }
    }

    /// Take the photo. Rejected while no location fix exists.
    pub async fn capture(&mut self) -> SurveyResult<()> {
        let location = match &self.state {
            CaptureState::LocationReady(point) => *point,
            other => {
                return Err(SurveyError::CaptureBlocked { state: other.name() });
            }
        };

        let photo = self.camera.take_photo().await?;
        self.state = CaptureState::Captured { photo, location };
        Ok(())
    }

    /// Discard the captured photo and re-enable the shutter. The location
    /// fix is kept.
    pub fn retake(&mut self) -> SurveyResult<()> {
        if let CaptureState::Captured { location, .. } = self.state.clone() {
            self.state = CaptureState::LocationReady(location);
            Ok(())
        } else {
            Err(SurveyError::CaptureBlocked {
                state: self.state.name(),
            })
        }
    }

    /// Confirm the captured photo, yielding the evidence payload.
    /// Confirming without a captured photo (and therefore without a ready
    /// location) is a programming error and is rejected, never defaulted.
    pub fn confirm(self) -> SurveyResult<Evidence> {
        match self.state {
            CaptureState::Captured { photo, location } => Ok(Evidence {
                photo_reference: photo,
                location,
            }),
            other => Err(SurveyError::CaptureBlocked { state: other.name() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::FixedLocationProvider;
    use async_trait::async_trait;

    struct FakeCamera;

    #[async_trait]
    impl CameraProvider for FakeCamera {
        async fn take_photo(&self) -> SurveyResult<PhotoReference> {
            Ok(PhotoReference::new("photos/fake.png"))
        }
    }

    struct DeniedLocation;

    #[async_trait]
    impl LocationProvider for DeniedLocation {
        async fn current_location(&self) -> SurveyResult<GeoPoint> {
            Err(SurveyError::CapabilityDenied {
                capability: "location".to_string(),
                message: "GPS permission refused".to_string(),
            })
        }
    }

    fn capturer() -> EvidenceCapturer {
        EvidenceCapturer::new(
            Arc::new(FixedLocationProvider::new(25.59, 85.13)),
            Arc::new(FakeCamera),
        )
    }

    #[tokio::test]
    async fn capture_is_blocked_before_location_fix() {
        let mut c = capturer();
        let err = c.capture().await.unwrap_err();
        assert!(matches!(err, SurveyError::CaptureBlocked { .. }));
    }

    #[tokio::test]
    async fn confirm_is_blocked_without_capture() {
        let mut c = capturer();
        c.acquire_location().await.unwrap();
        let err = c.confirm().unwrap_err();
        assert!(matches!(err, SurveyError::CaptureBlocked { .. }));
    }

    #[tokio::test]
    async fn happy_path_yields_geotagged_evidence() {
        let mut c = capturer();
        c.acquire_location().await.unwrap();
        c.capture().await.unwrap();

        let evidence = c.confirm().unwrap();
        assert_eq!(evidence.location.lat, 25.59);
        assert_eq!(evidence.photo_reference.as_str(), "photos/fake.png");
    }

    #[tokio::test]
    async fn retake_keeps_the_location_fix() {
        let mut c = capturer();
        c.acquire_location().await.unwrap();
        c.capture().await.unwrap();
        c.retake().unwrap();

        assert!(matches!(c.state(), CaptureState::LocationReady(_)));
        c.capture().await.unwrap();
        assert!(c.confirm().is_ok());
    }

    #[tokio::test]
    async fn denied_location_is_terminal() {
        let mut c = EvidenceCapturer::new(Arc::new(DeniedLocation), Arc::new(FakeCamera));
        let err = c.acquire_location().await.unwrap_err();
        assert!(matches!(err, SurveyError::CapabilityDenied { .. }));
        assert_eq!(c.state(), &CaptureState::LocationDenied);

        let err = c.capture().await.unwrap_err();
        assert!(matches!(err, SurveyError::CaptureBlocked { .. }));
    }
}
