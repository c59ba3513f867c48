use crate::buckets::ImageCategory;
use crate::ledger::{EntryId, MealCategory};
use crate::prefs::Theme;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events that can occur in the mealcam system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MealcamEvent {
    /// A catalog item was placed into a meal category on the day's ledger
    EntryAdded {
        entry_id: EntryId,
        category: MealCategory,
        timestamp: SystemTime,
    },
    /// The camera surface was opened for a capture request
    CaptureStarted {
        entry_id: EntryId,
        category: ImageCategory,
        timestamp: SystemTime,
    },
    /// A capture returned an artifact that was appended to the bucket
    CaptureCompleted {
        entry_id: EntryId,
        category: ImageCategory,
        artifact: String,
    },
    /// A capture was cancelled by the user; nothing was appended
    CaptureCancelled {
        entry_id: EntryId,
        category: ImageCategory,
    },
    /// The camera surface reported a device or permission failure
    CaptureFailed {
        entry_id: EntryId,
        category: ImageCategory,
        details: String,
    },
    /// The mock analyzer finished fabricating a result
    AnalysisCompleted {
        analysis_id: String,
        confidence: f64,
    },
    /// The user rated an analysis result
    AnalysisRated { analysis_id: String, stars: u8 },
    /// The theme preference changed
    ThemeChanged { theme: Theme },
    /// A user logged in or out
    SessionChanged {
        username: String,
        active: bool,
        timestamp: SystemTime,
    },
}

impl MealcamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            MealcamEvent::EntryAdded {
                entry_id, category, ..
            } => {
                format!("Entry {} added to {}", entry_id, category)
            }
            MealcamEvent::CaptureStarted {
                entry_id, category, ..
            } => {
                format!("Capture started for {} ({})", entry_id, category)
            }
            MealcamEvent::CaptureCompleted {
                entry_id,
                category,
                artifact,
            } => {
                format!(
                    "Capture completed for {} ({}): {}",
                    entry_id, category, artifact
                )
            }
            MealcamEvent::CaptureCancelled { entry_id, category } => {
                format!("Capture cancelled for {} ({})", entry_id, category)
            }
            MealcamEvent::CaptureFailed {
                entry_id,
                category,
                details,
            } => {
                format!("Capture failed for {} ({}): {}", entry_id, category, details)
            }
            MealcamEvent::AnalysisCompleted {
                analysis_id,
                confidence,
            } => {
                format!(
                    "Analysis {} completed (confidence {:.0}%)",
                    analysis_id,
                    confidence * 100.0
                )
            }
            MealcamEvent::AnalysisRated { analysis_id, stars } => {
                format!("Analysis {} rated {} stars", analysis_id, stars)
            }
            MealcamEvent::ThemeChanged { theme } => {
                format!("Theme changed to {}", theme)
            }
            MealcamEvent::SessionChanged {
                username, active, ..
            } => {
                format!(
                    "{} {}",
                    username,
                    if *active { "logged in" } else { "logged out" }
                )
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            MealcamEvent::EntryAdded { .. } => "entry_added",
            MealcamEvent::CaptureStarted { .. } => "capture_started",
            MealcamEvent::CaptureCompleted { .. } => "capture_completed",
            MealcamEvent::CaptureCancelled { .. } => "capture_cancelled",
            MealcamEvent::CaptureFailed { .. } => "capture_failed",
            MealcamEvent::AnalysisCompleted { .. } => "analysis_completed",
            MealcamEvent::AnalysisRated { .. } => "analysis_rated",
            MealcamEvent::ThemeChanged { .. } => "theme_changed",
            MealcamEvent::SessionChanged { .. } => "session_changed",
        }
    }
}

/// Async event bus for component coordination using broadcast channels.
pub struct EventBus {
    sender: broadcast::Sender<MealcamEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<MealcamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers the event reached. Publishing with
    /// no subscribers is not an error; the event is simply dropped.
    pub fn publish(&self, event: MealcamEvent) -> usize {
        match &event {
            MealcamEvent::CaptureFailed { details, .. } => {
                warn!("Capture failed: {}", details);
            }
            MealcamEvent::SessionChanged { .. } => {
                info!("{}", event.description());
            }
            _ => {
                debug!("Publishing event: {}", event.description());
            }
        }

        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Event published with no subscribers");
                0
            }
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
