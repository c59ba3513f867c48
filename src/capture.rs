use crate::buckets::{ArtifactRef, ImageBucketStore, ImageCategory};
use crate::error::{CaptureError, Result};
use crate::events::{EventBus, MealcamEvent};
use crate::ledger::EntryId;
use crate::prefs::CameraFacing;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A single pending capture: which category is being photographed for which
/// tracked entry.
///
/// Transient; created when capture is invoked from an entry's detail view
/// and discarded once the camera surface returns. At most one exists at a
/// time because the capture surface is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub entry_id: EntryId,
    pub category: ImageCategory,
    pub requested_at: SystemTime,
}

/// What the camera surface came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// The user took a picture; the reference is opaque to the core
    Captured(ArtifactRef),
    /// The user backed out without taking a picture
    Cancelled,
    /// The device or its permissions failed
    Failed { details: String },
}

/// External camera surface invoked for each capture request.
///
/// Implementations suspend until the user acts; the call resolves exactly
/// once per request. Device errors are reported as an outcome, not a panic,
/// so the session can return to idle and let the user retry.
#[async_trait]
pub trait CaptureSurface: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> CaptureOutcome;
}

/// Capture session state.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// No capture in progress
    Idle,
    /// The camera surface is open for this request
    InFlight(CaptureRequest),
}

/// Proof that a capture was started; consumed exactly once on completion.
///
/// Not cloneable and only constructed by `CaptureController::begin`, so a
/// request can never be resolved twice.
#[derive(Debug)]
pub struct CaptureTicket {
    request: CaptureRequest,
}

impl CaptureTicket {
    pub fn request(&self) -> &CaptureRequest {
        &self.request
    }
}

/// Drives the capture state machine for the detail view.
///
/// Idle until a capture is requested for the active entry; in flight while
/// the camera surface is open; back to idle on completion, cancellation, or
/// failure. While a capture is in flight the detail view is replaced by the
/// camera surface, so a second `begin` is structurally unreachable; the
/// controller still refuses it defensively.
pub struct CaptureController {
    state: CaptureState,
    event_bus: Arc<EventBus>,
}

impl CaptureController {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            state: CaptureState::Idle,
            event_bus,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, CaptureState::InFlight(_))
    }

    /// Start a capture for the active entry.
    ///
    /// Requires exactly one active entry; requesting a capture with none
    /// bound is a user error that refuses to open the camera and leaves the
    /// session idle.
    pub fn begin(
        &mut self,
        active: Option<&EntryId>,
        category: ImageCategory,
    ) -> std::result::Result<CaptureTicket, CaptureError> {
        let Some(entry_id) = active else {
            warn!("Capture requested with no active entry (category: {})", category);
            return Err(CaptureError::NoActiveItem);
        };

        if let CaptureState::InFlight(request) = &self.state {
            warn!(
                "Capture requested while one is in flight for {}",
                request.entry_id
            );
            return Err(CaptureError::CaptureBusy {
                entry_id: request.entry_id.to_string(),
            });
        }

        let request = CaptureRequest {
            entry_id: entry_id.clone(),
            category,
            requested_at: SystemTime::now(),
        };
        self.state = CaptureState::InFlight(request.clone());

        info!("Capture started for {} ({})", request.entry_id, category);
        self.event_bus.publish(MealcamEvent::CaptureStarted {
            entry_id: request.entry_id.clone(),
            category,
            timestamp: request.requested_at,
        });

        Ok(CaptureTicket { request })
    }

    /// Resolve an in-flight capture with the surface's outcome.
    ///
    /// Consumes the ticket, so each request resolves exactly once. A
    /// captured artifact is appended to the entry's bucket; cancellation
    /// appends nothing. Either way the session returns to idle.
    pub fn complete(
        &mut self,
        ticket: CaptureTicket,
        outcome: CaptureOutcome,
        buckets: &mut ImageBucketStore,
    ) -> Result<Option<ArtifactRef>> {
        let CaptureTicket { request } = ticket;
        self.state = CaptureState::Idle;

        match outcome {
            CaptureOutcome::Captured(artifact) => {
                buckets.append(&request.entry_id, request.category, artifact.clone())?;
                info!(
                    "Capture completed for {} ({}): {}",
                    request.entry_id, request.category, artifact
                );
                self.event_bus.publish(MealcamEvent::CaptureCompleted {
                    entry_id: request.entry_id,
                    category: request.category,
                    artifact: artifact.to_string(),
                });
                Ok(Some(artifact))
            }
            CaptureOutcome::Cancelled => {
                debug!(
                    "Capture cancelled for {} ({})",
                    request.entry_id, request.category
                );
                self.event_bus.publish(MealcamEvent::CaptureCancelled {
                    entry_id: request.entry_id,
                    category: request.category,
                });
                Ok(None)
            }
            CaptureOutcome::Failed { details } => {
                self.event_bus.publish(MealcamEvent::CaptureFailed {
                    entry_id: request.entry_id,
                    category: request.category,
                    details: details.clone(),
                });
                Err(CaptureError::Surface { details }.into())
            }
        }
    }
}

/// Mock camera surface for development and tests.
///
/// Fabricates a unique artifact path per capture, or plays back scripted
/// outcomes (cancel, failure) queued via `push_outcome`. The facing follows
/// the persisted preference and can be flipped at runtime like the real
/// camera toggle.
pub struct MockCaptureSurface {
    facing: Mutex<CameraFacing>,
    artifact_dir: String,
    script: Mutex<VecDeque<CaptureOutcome>>,
}

impl MockCaptureSurface {
    pub fn new(facing: CameraFacing, artifact_dir: impl Into<String>) -> Self {
        Self {
            facing: Mutex::new(facing),
            artifact_dir: artifact_dir.into(),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue the outcome for the next capture call.
    pub fn push_outcome(&self, outcome: CaptureOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn facing(&self) -> CameraFacing {
        *self.facing.lock().unwrap()
    }

    pub fn set_facing(&self, facing: CameraFacing) {
        *self.facing.lock().unwrap() = facing;
    }

    /// Take a photo outside any tracking entry, for the analyze-meal flow.
    pub async fn snapshot(&self) -> CaptureOutcome {
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            debug!("Mock capture surface returning scripted outcome");
            return scripted;
        }
        let artifact = self.fabricate("meal");
        info!(
            "Mock capture surface ({} camera) produced {}",
            self.facing(),
            artifact
        );
        CaptureOutcome::Captured(artifact)
    }

    fn fabricate(&self, label: &str) -> ArtifactRef {
        ArtifactRef::new(format!(
            "{}/{}-{}-{}.jpg",
            self.artifact_dir,
            label,
            self.facing(),
            Uuid::new_v4()
        ))
    }
}

#[async_trait]
impl CaptureSurface for MockCaptureSurface {
    async fn capture(&self, request: &CaptureRequest) -> CaptureOutcome {
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            debug!("Mock capture surface returning scripted outcome");
            return scripted;
        }

        let artifact = self.fabricate(request.category.as_str());
        info!(
            "Mock capture surface ({} camera) produced {}",
            self.facing(),
            artifact
        );
        CaptureOutcome::Captured(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BucketError, MealcamError};

    fn setup() -> (CaptureController, ImageBucketStore, EntryId) {
        let bus = Arc::new(EventBus::new(16));
        let controller = CaptureController::new(bus);
        let mut buckets = ImageBucketStore::new();
        let entry_id = EntryId::new("item-apple", 1000);
        buckets.ensure_bucket(&entry_id);
        (controller, buckets, entry_id)
    }

    #[test]
    fn test_begin_without_active_entry() {
        let (mut controller, _, _) = setup();

        let result = controller.begin(None, ImageCategory::Plate);
        assert!(matches!(result, Err(CaptureError::NoActiveItem)));
        // The camera is never opened; the session stays idle
        assert_eq!(*controller.state(), CaptureState::Idle);
    }

    #[test]
    fn test_begin_transitions_to_in_flight() {
        let (mut controller, _, entry_id) = setup();

        let ticket = controller.begin(Some(&entry_id), ImageCategory::Buffet).unwrap();
        assert!(controller.in_flight());
        assert_eq!(ticket.request().entry_id, entry_id);
        assert_eq!(ticket.request().category, ImageCategory::Buffet);
    }

    #[test]
    fn test_begin_while_in_flight_is_refused() {
        let (mut controller, _, entry_id) = setup();

        let _ticket = controller.begin(Some(&entry_id), ImageCategory::Plate).unwrap();
        let second = controller.begin(Some(&entry_id), ImageCategory::Buffet);
        assert!(matches!(second, Err(CaptureError::CaptureBusy { .. })));
    }

    #[test]
    fn test_complete_with_artifact_appends_once() {
        let (mut controller, mut buckets, entry_id) = setup();

        let ticket = controller.begin(Some(&entry_id), ImageCategory::Plate).unwrap();
        let appended = controller
            .complete(
                ticket,
                CaptureOutcome::Captured(ArtifactRef::new("img1")),
                &mut buckets,
            )
            .unwrap();

        assert_eq!(appended, Some(ArtifactRef::new("img1")));
        assert_eq!(*controller.state(), CaptureState::Idle);

        let bucket = buckets.get(&entry_id);
        assert_eq!(bucket.images(ImageCategory::Plate).len(), 1);
        assert_eq!(bucket.images(ImageCategory::Buffet).len(), 0);
    }

    #[test]
    fn test_complete_cancelled_appends_nothing() {
        let (mut controller, mut buckets, entry_id) = setup();

        let ticket = controller.begin(Some(&entry_id), ImageCategory::Buffet).unwrap();
        let appended = controller
            .complete(ticket, CaptureOutcome::Cancelled, &mut buckets)
            .unwrap();

        assert_eq!(appended, None);
        assert_eq!(*controller.state(), CaptureState::Idle);
        assert!(buckets.get(&entry_id).is_empty());
    }

    #[test]
    fn test_complete_failed_returns_to_idle() {
        let (mut controller, mut buckets, entry_id) = setup();

        let ticket = controller.begin(Some(&entry_id), ImageCategory::Container).unwrap();
        let result = controller.complete(
            ticket,
            CaptureOutcome::Failed {
                details: "permission denied".to_string(),
            },
            &mut buckets,
        );

        assert!(matches!(
            result,
            Err(MealcamError::Capture(CaptureError::Surface { .. }))
        ));
        // Non-fatal: back to idle with nothing appended, user may retry
        assert_eq!(*controller.state(), CaptureState::Idle);
        assert!(buckets.get(&entry_id).is_empty());
    }

    #[test]
    fn test_complete_against_unknown_bucket_is_refused() {
        let bus = Arc::new(EventBus::new(16));
        let mut controller = CaptureController::new(bus);
        let mut buckets = ImageBucketStore::new();
        let orphan = EntryId::new("never-added", 1);

        let ticket = controller.begin(Some(&orphan), ImageCategory::Plate).unwrap();
        let result = controller.complete(
            ticket,
            CaptureOutcome::Captured(ArtifactRef::new("img")),
            &mut buckets,
        );

        assert!(matches!(
            result,
            Err(MealcamError::Bucket(BucketError::UnknownEntry { .. }))
        ));
        assert_eq!(*controller.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_mock_surface_fabricates_artifacts() {
        let surface = MockCaptureSurface::new(CameraFacing::Back, "./artifacts");
        let request = CaptureRequest {
            entry_id: EntryId::new("item-1", 1),
            category: ImageCategory::Plate,
            requested_at: SystemTime::now(),
        };

        let first = surface.capture(&request).await;
        let second = surface.capture(&request).await;

        match (first, second) {
            (CaptureOutcome::Captured(a), CaptureOutcome::Captured(b)) => {
                assert_ne!(a, b);
                assert!(a.as_str().starts_with("./artifacts/plate-back-"));
            }
            other => panic!("Expected two captured artifacts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_surface_scripted_outcomes() {
        let surface = MockCaptureSurface::new(CameraFacing::Front, "./artifacts");
        surface.push_outcome(CaptureOutcome::Cancelled);
        surface.push_outcome(CaptureOutcome::Failed {
            details: "device busy".to_string(),
        });

        let request = CaptureRequest {
            entry_id: EntryId::new("item-1", 1),
            category: ImageCategory::Buffet,
            requested_at: SystemTime::now(),
        };

        assert_eq!(surface.capture(&request).await, CaptureOutcome::Cancelled);
        assert!(matches!(
            surface.capture(&request).await,
            CaptureOutcome::Failed { .. }
        ));
        // Script exhausted: back to fabricating artifacts
        assert!(matches!(
            surface.capture(&request).await,
            CaptureOutcome::Captured(_)
        ));
    }
}
