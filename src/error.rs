use thiserror::Error;

#[derive(Error, Debug)]
pub enum MealcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl MealcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the capture state machine.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture requested with no active entry")]
    NoActiveItem,

    #[error("capture already in flight for entry {entry_id}")]
    CaptureBusy { entry_id: String },

    #[error("camera surface failed: {details}")]
    Surface { details: String },
}

impl CaptureError {
    /// User-facing notice text for the front-end loop.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::NoActiveItem => {
                "Open a tracked item before taking a photo".to_string()
            }
            CaptureError::CaptureBusy { .. } => {
                "A capture is already in progress".to_string()
            }
            CaptureError::Surface { details } => {
                format!("Camera unavailable: {}", details)
            }
        }
    }
}

/// Errors raised by the image bucket store.
#[derive(Error, Debug)]
pub enum BucketError {
    #[error("no image bucket exists for entry {entry_id}")]
    UnknownEntry { entry_id: String },
}

/// Errors raised by weight/volume measurement parsing.
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("invalid measurement input: {details}")]
    InvalidInput { details: String },
}

impl MeasurementError {
    pub fn invalid<S: Into<String>>(details: S) -> Self {
        Self::InvalidInput {
            details: details.into(),
        }
    }
}

/// Errors raised by food catalog maintenance.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("food item name cannot be empty")]
    EmptyName,

    #[error("no catalog item with id {item_id}")]
    UnknownItem { item_id: String },

    #[error("invalid nutrition value for {field}: {value:?}")]
    InvalidNutrition { field: &'static str, value: String },
}

/// Errors raised by the mock analysis flow.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no analysis available to rate")]
    NothingToRate,

    #[error("rating {stars} is out of range (1-5)")]
    RatingOutOfRange { stars: u8 },
}

/// Errors raised by the mock credential check.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Errors raised by the event bus.
#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("failed to publish event: {details}")]
    PublishFailed { details: String },
}

pub type Result<T> = std::result::Result<T, MealcamError>;
