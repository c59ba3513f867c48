pub mod analyzer;
pub mod app;
pub mod auth;
pub mod buckets;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod measurement;
pub mod prefs;
pub mod tracking;

pub use analyzer::{AnalysisResult, AnalysisSession, MealAnalyzer};
pub use app::MealcamApp;
pub use auth::{Role, Session, UserDirectory};
pub use buckets::{ArtifactRef, ImageBucket, ImageBucketStore, ImageCategory};
pub use capture::{
    CaptureController, CaptureOutcome, CaptureRequest, CaptureState, CaptureSurface,
    CaptureTicket, MockCaptureSurface,
};
pub use catalog::{CatalogItem, FoodCatalog, NutritionFacts};
pub use config::MealcamConfig;
pub use error::{MealcamError, Result};
pub use events::{EventBus, MealcamEvent};
pub use ledger::{EntryId, FoodEntry, FoodTrackingLedger, MealCategory};
pub use measurement::{compute, MeasurementInput, MeasurementOutcome};
pub use prefs::{CameraFacing, PreferenceStore, Preferences, Theme};
pub use tracking::TrackingStation;
