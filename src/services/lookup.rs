use std::collections::HashMap;

use crate::clients::cat_api::{Breed, Category};

/// Identifier to display-name map, built per request from a lookup list.
#[derive(Debug, Default)]
pub struct Lookup {
    names: HashMap<String, String>,
}

impl Lookup {
    #[must_use]
    pub fn from_breeds(breeds: &[Breed]) -> Self {
        breeds
            .iter()
            .map(|b| (b.id.clone(), b.name.clone()))
            .collect()
    }

    #[must_use]
    pub fn from_categories(categories: &[Category]) -> Self {
        categories
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect()
    }

    /// Exact match only. Missing, empty or unknown ids resolve to `None`.
    #[must_use]
    pub fn resolve(&self, id: Option<&str>) -> Option<String> {
        id.filter(|id| !id.is_empty())
            .and_then(|id| self.names.get(id))
            .cloned()
    }
}

impl FromIterator<(String, String)> for Lookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
