use crate::entities::{prelude::*, search_history};
use crate::models::search::{NewSearchRecord, SearchRecord, format_timestamp};
use anyhow::Result;
use chrono::{SubsecRound, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

pub struct SearchHistoryRepository {
    conn: DatabaseConnection,
    collection: String,
}

impl SearchHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, collection: String) -> Self {
        Self { conn, collection }
    }

    /// Appends a record stamped with the current time. The stamp never goes
    /// below the newest stored one, even if the clock steps back.
    pub async fn add(&self, record: &NewSearchRecord) -> Result<SearchRecord> {
        let mut timestamp = Utc::now().trunc_subsecs(6);

        if let Some(latest) = self.latest().await? {
            let latest = SearchRecord::try_from(latest)?.timestamp;
            if timestamp < latest {
                timestamp = latest;
            }
        }

        let active_model = search_history::ActiveModel {
            collection: Set(self.collection.clone()),
            breed_ids: Set(record.breed_ids.clone()),
            category_ids: Set(record.category_ids.clone()),
            random_cats: Set(record.random_cats.clone()),
            timestamp: Set(format_timestamp(&timestamp)),
            ..Default::default()
        };

        let result = SearchHistory::insert(active_model).exec(&self.conn).await?;

        Ok(SearchRecord {
            id: result.last_insert_id,
            breed_ids: record.breed_ids.clone(),
            category_ids: record.category_ids.clone(),
            random_cats: record.random_cats.clone(),
            timestamp,
        })
    }

    /// Newest first; records sharing a timestamp come back in reverse
    /// insertion order.
    pub async fn recent(&self, limit: u64) -> Result<Vec<SearchRecord>> {
        let rows = SearchHistory::find()
            .filter(search_history::Column::Collection.eq(self.collection.as_str()))
            .order_by_desc(search_history::Column::Timestamp)
            .order_by_desc(search_history::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        rows.into_iter()
            .map(|row| SearchRecord::try_from(row).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn count(&self) -> Result<u64> {
        let count = SearchHistory::find()
            .filter(search_history::Column::Collection.eq(self.collection.as_str()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    async fn latest(&self) -> Result<Option<search_history::Model>> {
        let row = SearchHistory::find()
            .filter(search_history::Column::Collection.eq(self.collection.as_str()))
            .order_by_desc(search_history::Column::Timestamp)
            .one(&self.conn)
            .await?;
        Ok(row)
    }
}
