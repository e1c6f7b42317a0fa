use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::search_history;

/// Filter values of one processed search, stored exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSearchRecord {
    pub breed_ids: Option<String>,
    pub category_ids: Option<String>,
    pub random_cats: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRecord {
    pub id: i64,
    pub breed_ids: Option<String>,
    pub category_ids: Option<String>,
    pub random_cats: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SearchRecord {
    #[must_use]
    pub fn random_requested(&self) -> bool {
        self.random_cats.as_deref() == Some("true")
    }
}

impl TryFrom<search_history::Model> for SearchRecord {
    type Error = chrono::ParseError;

    fn try_from(model: search_history::Model) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&model.timestamp)?.with_timezone(&Utc);

        Ok(Self {
            id: model.id,
            breed_ids: model.breed_ids,
            category_ids: model.category_ids,
            random_cats: model.random_cats,
            timestamp,
        })
    }
}

/// Storage form of a record timestamp.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
