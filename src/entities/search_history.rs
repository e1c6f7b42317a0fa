use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub collection: String,
    pub breed_ids: Option<String>,
    pub category_ids: Option<String>,
    pub random_cats: Option<String>,
    /// RFC 3339, UTC, fixed microsecond precision so text order is time order.
    pub timestamp: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
