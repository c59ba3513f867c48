use crate::buckets::{ArtifactRef, ImageBucket, ImageBucketStore, ImageCategory};
use crate::capture::{CaptureController, CaptureSurface};
use crate::catalog::CatalogItem;
use crate::error::{MealcamError, MeasurementError, Result};
use crate::events::{EventBus, MealcamEvent};
use crate::ledger::{EntryId, FoodEntry, FoodTrackingLedger, MealCategory};
use crate::measurement::{MeasurementInput, MeasurementOutcome};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// The staff tracking station: today's ledger, the image buckets, the
/// capture session, and the measurement input for the open entry.
///
/// All mutation funnels through here on the single control thread. The
/// only suspension point is the camera surface call inside `capture`.
pub struct TrackingStation {
    ledger: FoodTrackingLedger,
    buckets: ImageBucketStore,
    controller: CaptureController,
    measurement: MeasurementInput,
    active: Option<EntryId>,
    surface: Arc<dyn CaptureSurface>,
    event_bus: Arc<EventBus>,
}

impl TrackingStation {
    pub fn new(surface: Arc<dyn CaptureSurface>, event_bus: Arc<EventBus>) -> Self {
        Self {
            ledger: FoodTrackingLedger::for_today(),
            buckets: ImageBucketStore::new(),
            controller: CaptureController::new(Arc::clone(&event_bus)),
            measurement: MeasurementInput::new(),
            active: None,
            surface,
            event_bus,
        }
    }

    pub fn day(&self) -> chrono::NaiveDate {
        self.ledger.day()
    }

    /// Place a catalog item into a meal category on today's ledger.
    ///
    /// The new entry gets its empty image bucket in the same call and is
    /// immediately capturable once opened.
    pub fn add_entry(&mut self, item: &CatalogItem, category: MealCategory) -> FoodEntry {
        let entry = self.ledger.add(item, category, &mut self.buckets);
        self.event_bus.publish(MealcamEvent::EntryAdded {
            entry_id: entry.id.clone(),
            category,
            timestamp: SystemTime::now(),
        });
        entry
    }

    /// Entries tracked under one meal category, in insertion order.
    pub fn list_by_category(&self, category: MealCategory) -> Vec<FoodEntry> {
        self.ledger.list_by_category(category)
    }

    /// All entries tracked today.
    pub fn entries(&self) -> &[FoodEntry] {
        self.ledger.entries()
    }

    /// Snapshot of the images captured for an entry.
    pub fn entry_images(&self, entry_id: &EntryId) -> ImageBucket {
        self.buckets.get(entry_id)
    }

    /// Open an entry's detail view, making it the capture/measurement target.
    ///
    /// Switching to a different entry discards any measurement input typed
    /// for the previous one.
    pub fn open_entry(&mut self, entry_id: &EntryId) -> Result<FoodEntry> {
        let entry = self
            .ledger
            .entry(entry_id)
            .cloned()
            .ok_or_else(|| {
                MealcamError::component(
                    "tracking".to_string(),
                    format!("no tracked entry {}", entry_id),
                )
            })?;

        if self.active.as_ref() != Some(entry_id) {
            debug!("Opening entry {}, resetting measurement input", entry_id);
            self.measurement.reset();
        }
        self.active = Some(entry.id.clone());
        Ok(entry)
    }

    /// Close the detail view; capture and measurement lose their target.
    pub fn close_entry(&mut self) {
        if let Some(entry_id) = self.active.take() {
            debug!("Closing entry {}", entry_id);
            self.measurement.reset();
        }
    }

    /// The entry currently open in detail view, if any.
    pub fn active_entry(&self) -> Option<&FoodEntry> {
        self.active.as_ref().and_then(|id| self.ledger.entry(id))
    }

    /// Run one capture cycle for the open entry.
    ///
    /// Suspends on the camera surface; on return the artifact (if any) has
    /// been appended to the entry's bucket and the session is idle again.
    /// Returns the appended artifact, `None` on user cancel, and an error
    /// for the no-active-entry and device-failure cases.
    pub async fn capture(&mut self, category: ImageCategory) -> Result<Option<ArtifactRef>> {
        let ticket = self.controller.begin(self.active.as_ref(), category)?;

        let surface = Arc::clone(&self.surface);
        let outcome = surface.capture(ticket.request()).await;

        self.controller.complete(ticket, outcome, &mut self.buckets)
    }

    /// Record weight/volume text for the open entry and compute density.
    pub fn measure(
        &mut self,
        weight_text: &str,
        volume_text: &str,
    ) -> std::result::Result<MeasurementOutcome, MeasurementError> {
        self.measurement.weight_text = weight_text.to_string();
        self.measurement.volume_text = volume_text.to_string();
        let outcome = self.measurement.compute()?;
        if let Some(entry_id) = &self.active {
            info!("Measurement recorded for {}: {:?}", entry_id, outcome);
        }
        Ok(outcome)
    }

    /// The measurement input scoped to the open entry.
    pub fn measurement(&self) -> &MeasurementInput {
        &self.measurement
    }
}
