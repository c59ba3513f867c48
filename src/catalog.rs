use crate::error::CatalogError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Per-item nutrition facts maintained by the nutritionist role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl std::fmt::Display for NutritionFacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cal: {} | P: {}g | C: {}g | F: {}g",
            self.calories, self.protein_g, self.carbs_g, self.fat_g
        )
    }
}

impl NutritionFacts {
    /// Parse facts from raw text fields, as entered in the edit form.
    ///
    /// Every field must parse as a finite number or the whole edit is
    /// rejected; partial updates are not applied.
    pub fn parse(
        calories: &str,
        protein: &str,
        carbs: &str,
        fat: &str,
    ) -> std::result::Result<Self, CatalogError> {
        Ok(Self {
            calories: parse_field("calories", calories)?,
            protein_g: parse_field("protein", protein)?,
            carbs_g: parse_field("carbs", carbs)?,
            fat_g: parse_field("fat", fat)?,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> std::result::Result<f64, CatalogError> {
    let parsed: f64 = value.trim().parse().map_err(|_| CatalogError::InvalidNutrition {
        field,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(CatalogError::InvalidNutrition {
            field,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

/// One food item in the service catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub facts: Option<NutritionFacts>,
}

/// The food catalog: the list staff pick from and admins maintain.
///
/// Kept entirely in memory; the seed data stands in for a real menu source.
pub struct FoodCatalog {
    items: Vec<CatalogItem>,
    last_stamp: i64,
}

const SAMPLE_MENU: [&str; 15] = [
    "Dal Makhani",
    "Paneer Butter Masala",
    "Chicken Curry",
    "Vegetable Biryani",
    "Roti",
    "Rice",
    "Gulab Jamun",
    "Salad",
    "Samosa",
    "Idli",
    "Dosa",
    "Upma",
    "Chole Bhature",
    "Aloo Gobi",
    "Mixed Veg",
];

impl FoodCatalog {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            last_stamp: 0,
        }
    }

    /// Catalog pre-populated with the sample menu.
    ///
    /// A handful of items carry nutrition facts out of the box so the
    /// nutritionist view has something to show before any editing.
    pub fn with_sample_data() -> Self {
        let mut catalog = Self::new();
        for name in SAMPLE_MENU {
            let item = catalog
                .add(name, Some(&format!("Description for {}", name)))
                .expect("sample menu names are non-empty");
            debug!("Seeded catalog item {} ({})", item.name, item.id);
        }

        let known_facts: [(&str, NutritionFacts); 2] = [
            (
                "Rice",
                NutritionFacts {
                    calories: 215.0,
                    protein_g: 5.0,
                    carbs_g: 45.0,
                    fat_g: 1.8,
                },
            ),
            (
                "Salad",
                NutritionFacts {
                    calories: 55.0,
                    protein_g: 3.7,
                    carbs_g: 11.0,
                    fat_g: 0.6,
                },
            ),
        ];
        for (name, facts) in known_facts {
            if let Some(item) = catalog.items.iter_mut().find(|i| i.name == name) {
                item.facts = Some(facts);
            }
        }

        info!("Seeded food catalog with {} items", catalog.items.len());
        catalog
    }

    /// All items, newest first.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, item_id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Case-insensitive substring search on item names.
    pub fn search(&self, query: &str) -> Vec<&CatalogItem> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Add a new item to the front of the catalog.
    pub fn add(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> std::result::Result<CatalogItem, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;

        let item = CatalogItem {
            id: format!("item-{}", stamp),
            name: name.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            facts: None,
        };

        info!("Added catalog item {} ({})", item.name, item.id);
        self.items.insert(0, item.clone());
        Ok(item)
    }

    /// Update an existing item's name and description.
    pub fn update(
        &mut self,
        item_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> std::result::Result<(), CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let item = self.item_mut(item_id)?;
        item.name = name.to_string();
        item.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        debug!("Updated catalog item {}", item_id);
        Ok(())
    }

    /// Remove an item from the catalog.
    pub fn remove(&mut self, item_id: &str) -> std::result::Result<CatalogItem, CatalogError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| CatalogError::UnknownItem {
                item_id: item_id.to_string(),
            })?;
        let removed = self.items.remove(index);
        info!("Removed catalog item {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Nutritionist edit: rename an item and replace its nutrition facts.
    ///
    /// All four fact fields arrive as raw text; the edit applies only if
    /// every field parses, otherwise nothing changes.
    pub fn update_facts(
        &mut self,
        item_id: &str,
        name: &str,
        calories: &str,
        protein: &str,
        carbs: &str,
        fat: &str,
    ) -> std::result::Result<(), CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let facts = NutritionFacts::parse(calories, protein, carbs, fat)?;

        let item = self.item_mut(item_id)?;
        item.name = name.to_string();
        item.facts = Some(facts);
        info!("Updated nutrition facts for {} ({})", item.name, item_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn item_mut(&mut self, item_id: &str) -> std::result::Result<&mut CatalogItem, CatalogError> {
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| {
                warn!("Lookup of unknown catalog item {}", item_id);
                CatalogError::UnknownItem {
                    item_id: item_id.to_string(),
                }
            })
    }
}

impl Default for FoodCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut catalog = FoodCatalog::new();
        let item = catalog.add("Poha", Some("Flattened rice")).unwrap();

        assert_eq!(catalog.get(&item.id).map(|i| i.name.as_str()), Some("Poha"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let mut catalog = FoodCatalog::new();
        assert!(matches!(catalog.add("   ", None), Err(CatalogError::EmptyName)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_new_items_go_to_front() {
        let mut catalog = FoodCatalog::new();
        catalog.add("First", None).unwrap();
        catalog.add("Second", None).unwrap();

        assert_eq!(catalog.items()[0].name, "Second");
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let catalog = FoodCatalog::with_sample_data();

        let hits = catalog.search("DAL");
        assert!(hits.iter().any(|item| item.name == "Dal Makhani"));

        let hits = catalog.search("bhature");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Chole Bhature");

        assert!(catalog.search("pizza").is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut catalog = FoodCatalog::new();
        let item = catalog.add("Old Name", None).unwrap();

        catalog.update(&item.id, "New Name", Some("desc")).unwrap();
        assert_eq!(catalog.get(&item.id).unwrap().name, "New Name");

        let removed = catalog.remove(&item.id).unwrap();
        assert_eq!(removed.name, "New Name");
        assert!(catalog.get(&item.id).is_none());

        assert!(matches!(
            catalog.remove(&item.id),
            Err(CatalogError::UnknownItem { .. })
        ));
    }

    #[test]
    fn test_update_facts_parses_text_fields() {
        let mut catalog = FoodCatalog::new();
        let item = catalog.add("Apple", None).unwrap();

        catalog
            .update_facts(&item.id, "Apple", "95", "0.5", "25", "0.3")
            .unwrap();

        let facts = catalog.get(&item.id).unwrap().facts.unwrap();
        assert_eq!(facts.calories, 95.0);
        assert_eq!(facts.protein_g, 0.5);
    }

    #[test]
    fn test_update_facts_rejects_non_numeric() {
        let mut catalog = FoodCatalog::new();
        let item = catalog.add("Apple", None).unwrap();

        let result = catalog.update_facts(&item.id, "Apple", "many", "0.5", "25", "0.3");
        assert!(matches!(
            result,
            Err(CatalogError::InvalidNutrition { field: "calories", .. })
        ));
        // Rejected edit leaves the item untouched
        assert!(catalog.get(&item.id).unwrap().facts.is_none());
    }

    #[test]
    fn test_sample_data_has_facts_for_known_items() {
        let catalog = FoodCatalog::with_sample_data();
        let rice = catalog.search("Rice");
        assert!(rice
            .iter()
            .any(|item| item.name == "Rice" && item.facts.is_some()));
    }
}
