use crate::buckets::ArtifactRef;
use crate::catalog::NutritionFacts;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::events::{EventBus, MealcamEvent};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

/// A fabricated analysis result.
///
/// There is no inference behind this: the numbers come straight from
/// configuration after a simulated processing delay. The artifact reference
/// is carried along untouched for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub id: String,
    pub artifact: ArtifactRef,
    pub facts: NutritionFacts,
    pub confidence: f64,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// The nutrition summary line shown to the user.
    pub fn summary(&self) -> String {
        format!(
            "Calories: {}, Protein: {}g, Carbs: {}g, Fat: {}g",
            self.facts.calories, self.facts.protein_g, self.facts.carbs_g, self.facts.fat_g
        )
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

/// Mock meal analyzer.
///
/// Stands in for the future analysis backend: takes an artifact reference,
/// waits the configured delay, and returns the configured numbers.
pub struct MealAnalyzer {
    config: AnalyzerConfig,
    event_bus: Arc<EventBus>,
}

impl MealAnalyzer {
    pub fn new(config: AnalyzerConfig, event_bus: Arc<EventBus>) -> Self {
        Self { config, event_bus }
    }

    /// Analyze a captured meal photo.
    ///
    /// Suspends for the configured delay to simulate processing, then
    /// fabricates the result. Never fails; a real backend would return
    /// errors here.
    pub async fn analyze(&self, artifact: &ArtifactRef) -> AnalysisResult {
        debug!("Analyzing artifact {}", artifact);
        sleep(Duration::from_millis(self.config.delay_ms)).await;

        let result = AnalysisResult {
            id: Uuid::new_v4().to_string(),
            artifact: artifact.clone(),
            facts: NutritionFacts {
                calories: self.config.calories,
                protein_g: self.config.protein_g,
                carbs_g: self.config.carbs_g,
                fat_g: self.config.fat_g,
            },
            confidence: self.config.confidence,
            completed_at: Utc::now(),
        };

        info!(
            "Analysis {} completed for {} (confidence {:.0}%)",
            result.id,
            artifact,
            result.confidence_percent()
        );
        self.event_bus.publish(MealcamEvent::AnalysisCompleted {
            analysis_id: result.id.clone(),
            confidence: result.confidence,
        });

        result
    }
}

/// One user's analyze-and-rate flow.
///
/// Holds the latest photo, its analysis, and the user's star rating.
/// Opening the camera for a new photo clears all three.
pub struct AnalysisSession {
    analyzer: MealAnalyzer,
    event_bus: Arc<EventBus>,
    photo: Option<ArtifactRef>,
    result: Option<AnalysisResult>,
    rating: Option<u8>,
}

impl AnalysisSession {
    pub fn new(analyzer: MealAnalyzer, event_bus: Arc<EventBus>) -> Self {
        Self {
            analyzer,
            event_bus,
            photo: None,
            result: None,
            rating: None,
        }
    }

    /// Begin a fresh cycle: previous photo, result, and rating are gone.
    pub fn new_photo(&mut self, artifact: ArtifactRef) {
        debug!("New photo {}, clearing previous analysis", artifact);
        self.photo = Some(artifact);
        self.result = None;
        self.rating = None;
    }

    /// Analyze the current photo, if one was taken.
    pub async fn analyze(&mut self) -> Option<AnalysisResult> {
        let artifact = self.photo.clone()?;
        let result = self.analyzer.analyze(&artifact).await;
        self.result = Some(result.clone());
        Some(result)
    }

    /// Rate the current analysis, 1 to 5 stars.
    pub fn rate(&mut self, stars: u8) -> std::result::Result<(), AnalysisError> {
        let Some(result) = &self.result else {
            return Err(AnalysisError::NothingToRate);
        };
        if !(1..=5).contains(&stars) {
            return Err(AnalysisError::RatingOutOfRange { stars });
        }

        self.rating = Some(stars);
        info!("Analysis {} rated {} stars", result.id, stars);
        self.event_bus.publish(MealcamEvent::AnalysisRated {
            analysis_id: result.id.clone(),
            stars,
        });
        Ok(())
    }

    pub fn photo(&self) -> Option<&ArtifactRef> {
        self.photo.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AnalyzerConfig {
        AnalyzerConfig {
            delay_ms: 5,
            confidence: 0.85,
            calories: 410.0,
            protein_g: 18.0,
            carbs_g: 55.0,
            fat_g: 12.0,
        }
    }

    fn session() -> AnalysisSession {
        let bus = Arc::new(EventBus::new(16));
        let analyzer = MealAnalyzer::new(test_config(), Arc::clone(&bus));
        AnalysisSession::new(analyzer, bus)
    }

    #[tokio::test]
    async fn test_analyze_returns_configured_numbers() {
        let bus = Arc::new(EventBus::new(16));
        let analyzer = MealAnalyzer::new(test_config(), bus);

        let result = analyzer.analyze(&ArtifactRef::new("photo.jpg")).await;

        assert_eq!(result.confidence, 0.85);
        assert_eq!(
            result.summary(),
            "Calories: 410, Protein: 18g, Carbs: 55g, Fat: 12g"
        );
        assert_eq!(result.artifact, ArtifactRef::new("photo.jpg"));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let mut session = session();

        // Nothing to analyze or rate before a photo exists
        assert!(session.analyze().await.is_none());
        assert!(matches!(session.rate(5), Err(AnalysisError::NothingToRate)));

        session.new_photo(ArtifactRef::new("photo.jpg"));
        let result = session.analyze().await.unwrap();
        assert_eq!(result.confidence, 0.85);

        session.rate(4).unwrap();
        assert_eq!(session.rating(), Some(4));
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let mut session = session();
        session.new_photo(ArtifactRef::new("photo.jpg"));
        session.analyze().await.unwrap();

        assert!(matches!(
            session.rate(0),
            Err(AnalysisError::RatingOutOfRange { stars: 0 })
        ));
        assert!(matches!(
            session.rate(6),
            Err(AnalysisError::RatingOutOfRange { stars: 6 })
        ));
        assert!(session.rate(1).is_ok());
        assert!(session.rate(5).is_ok());
    }

    #[tokio::test]
    async fn test_new_photo_clears_previous_cycle() {
        let mut session = session();

        session.new_photo(ArtifactRef::new("first.jpg"));
        session.analyze().await.unwrap();
        session.rate(3).unwrap();

        session.new_photo(ArtifactRef::new("second.jpg"));
        assert!(session.result().is_none());
        assert!(session.rating().is_none());
        assert_eq!(session.photo(), Some(&ArtifactRef::new("second.jpg")));
    }
}
