// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use receipt_format::TaxRate;
use serde::{Deserialize, Serialize};

/// What the register knows about a sales category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub tax_rate: TaxRate,
    /// Price used when the cashier does not enter one.
    pub preset_price: f64,
}

/// Catalog entry as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u16,
    #[serde(flatten)]
    pub category: Category,
}

/// Sales categories by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CatalogEntry>", into = "Vec<CatalogEntry>")]
pub struct Catalog(BTreeMap<u16, Category>);

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a category, returning the one it replaced.
    pub fn insert(&mut self, id: u16, category: Category) -> Option<Category> {
        self.0.insert(id, category)
    }

    pub fn get(&self, id: u16) -> Option<&Category> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Category)> {
        self.0.iter().map(|(id, category)| (*id, category))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u16, Category)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (u16, Category)>>(iter: T) -> Self {
        Catalog(iter.into_iter().collect())
    }
}

impl From<Vec<CatalogEntry>> for Catalog {
    fn from(entries: Vec<CatalogEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.id, entry.category))
            .collect()
    }
}

impl From<Catalog> for Vec<CatalogEntry> {
    fn from(catalog: Catalog) -> Self {
        catalog
            .0
            .into_iter()
            .map(|(id, category)| CatalogEntry { id, category })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_from_config_entries() {
        let catalog: Catalog = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Bakery", "tax_rate": 10, "preset_price": 12.5},
                {"id": 2, "name": "Electronics", "tax_rate": 20, "preset_price": 0.0}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let bakery = catalog.get(1).unwrap();
        assert_eq!(bakery.name, "Bakery");
        assert_eq!(bakery.tax_rate, TaxRate::Reduced);
        assert_eq!(catalog.get(2).unwrap().tax_rate, TaxRate::Standard);
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn unsupported_tax_rate_is_rejected() {
        let parsed: Result<Catalog, _> = serde_json::from_str(
            r#"[{"id": 1, "name": "Bakery", "tax_rate": 8, "preset_price": 1.0}]"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn later_entries_replace_earlier_ones() {
        let mut catalog = Catalog::new();
        let category = |name: &str| Category {
            name: name.into(),
            tax_rate: TaxRate::Standard,
            preset_price: 1.0,
        };
        assert!(catalog.insert(1, category("old")).is_none());
        assert_eq!(catalog.insert(1, category("new")).unwrap().name, "old");
        assert_eq!(catalog.iter().count(), 1);
    }
}
