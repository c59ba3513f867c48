use crate::buckets::ImageBucketStore;
use crate::catalog::CatalogItem;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Meal categories a food entry can be tracked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => "breakfast",
            MealCategory::Lunch => "lunch",
            MealCategory::Dinner => "dinner",
            MealCategory::Snacks => "snacks",
        }
    }
}

impl std::fmt::Display for MealCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealCategory::Breakfast),
            "lunch" => Ok(MealCategory::Lunch),
            "dinner" => Ok(MealCategory::Dinner),
            "snacks" | "snack" => Ok(MealCategory::Snacks),
            other => Err(format!("unknown meal category: {}", other)),
        }
    }
}

/// Identity of a tracked food entry.
///
/// Composite of the base catalog id and a generation timestamp, so adding
/// the same catalog item twice yields two distinct entries. The ledger
/// guarantees the stamp is strictly increasing per ledger, covering rapid
/// repeated adds within the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId {
    base: String,
    stamp: i64,
}

impl EntryId {
    pub fn new<S: Into<String>>(base: S, stamp: i64) -> Self {
        Self {
            base: base.into(),
            stamp,
        }
    }

    /// The catalog item id this entry was created from.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Generation timestamp in milliseconds since the epoch.
    pub fn stamp(&self) -> i64 {
        self.stamp
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.base, self.stamp)
    }
}

/// One food item placed into a meal category on the ledger's day.
///
/// Entries are immutable once created and are only removed by dropping the
/// whole ledger; the daily log is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: EntryId,
    pub name: String,
    pub category: MealCategory,
    pub added_at: DateTime<Utc>,
}

/// Per-day, per-meal-category log of tracked food entries.
///
/// Every entry added here synchronously gets an (empty) image bucket in the
/// store passed to `add`, so capture code can rely on the bucket existing.
pub struct FoodTrackingLedger {
    day: NaiveDate,
    entries: Vec<FoodEntry>,
    last_stamp: i64,
}

impl FoodTrackingLedger {
    /// Create a ledger for the given day.
    pub fn new(day: NaiveDate) -> Self {
        debug!("Created food tracking ledger for {}", day);
        Self {
            day,
            entries: Vec::new(),
            last_stamp: 0,
        }
    }

    /// Create a ledger for today (UTC).
    pub fn for_today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Track a catalog item under a meal category.
    ///
    /// Generates a fresh unique id, appends the entry, and registers an
    /// empty image bucket for it in the same call. Never fails.
    pub fn add(
        &mut self,
        item: &CatalogItem,
        category: MealCategory,
        buckets: &mut ImageBucketStore,
    ) -> FoodEntry {
        let now = Utc::now();
        let stamp = now.timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;

        let entry = FoodEntry {
            id: EntryId::new(item.id.clone(), stamp),
            name: item.name.clone(),
            category,
            added_at: now,
        };

        info!(
            "Tracking {} ({}) under {}",
            entry.name, entry.id, entry.category
        );

        buckets.ensure_bucket(&entry.id);
        self.entries.push(entry.clone());
        entry
    }

    /// Entries for one meal category, in the order they were added.
    ///
    /// A fresh O(n) scan over current state; list sizes are tens of items.
    pub fn list_by_category(&self, category: MealCategory) -> Vec<FoodEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .cloned()
            .collect()
    }

    /// Look up a tracked entry by id.
    pub fn entry(&self, id: &EntryId) -> Option<&FoodEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[FoodEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;

    fn item(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            facts: None,
        }
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut ledger = FoodTrackingLedger::for_today();
        let mut buckets = ImageBucketStore::new();
        let apple = item("item-apple", "Apple");

        // Same catalog item added twice in quick succession must produce
        // two distinct entries
        let first = ledger.add(&apple, MealCategory::Breakfast, &mut buckets);
        let second = ledger.add(&apple, MealCategory::Breakfast, &mut buckets);

        assert_ne!(first.id, second.id);
        assert_eq!(first.id.base(), "item-apple");
        assert!(second.id.stamp() > first.id.stamp());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_add_registers_bucket() {
        let mut ledger = FoodTrackingLedger::for_today();
        let mut buckets = ImageBucketStore::new();

        let entry = ledger.add(&item("item-1", "Roti"), MealCategory::Lunch, &mut buckets);

        assert!(buckets.contains(&entry.id));
        assert!(buckets.get(&entry.id).is_empty());
    }

    #[test]
    fn test_list_by_category_filters_in_order() {
        let mut ledger = FoodTrackingLedger::for_today();
        let mut buckets = ImageBucketStore::new();

        let a = ledger.add(&item("item-1", "Idli"), MealCategory::Breakfast, &mut buckets);
        let _ = ledger.add(&item("item-2", "Rice"), MealCategory::Lunch, &mut buckets);
        let c = ledger.add(&item("item-3", "Dosa"), MealCategory::Breakfast, &mut buckets);

        let breakfast = ledger.list_by_category(MealCategory::Breakfast);
        let ids: Vec<&EntryId> = breakfast.iter().map(|e| &e.id).collect();
        assert_eq!(ids, vec![&a.id, &c.id]);

        assert_eq!(ledger.list_by_category(MealCategory::Snacks).len(), 0);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut ledger = FoodTrackingLedger::for_today();
        let mut buckets = ImageBucketStore::new();

        ledger.add(&item("item-1", "Upma"), MealCategory::Snacks, &mut buckets);
        let before = ledger.list_by_category(MealCategory::Snacks);

        ledger.add(&item("item-2", "Samosa"), MealCategory::Snacks, &mut buckets);
        let after = ledger.list_by_category(MealCategory::Snacks);

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_entry_lookup() {
        let mut ledger = FoodTrackingLedger::for_today();
        let mut buckets = ImageBucketStore::new();

        let added = ledger.add(&item("item-1", "Salad"), MealCategory::Dinner, &mut buckets);

        assert_eq!(ledger.entry(&added.id).map(|e| e.name.as_str()), Some("Salad"));
        assert!(ledger.entry(&EntryId::new("missing", 1)).is_none());
    }
}
