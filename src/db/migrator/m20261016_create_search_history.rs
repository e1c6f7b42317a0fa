use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchHistory::Collection).string().not_null())
                    .col(ColumnDef::new(SearchHistory::BreedIds).string().null())
                    .col(ColumnDef::new(SearchHistory::CategoryIds).string().null())
                    .col(ColumnDef::new(SearchHistory::RandomCats).string().null())
                    .col(ColumnDef::new(SearchHistory::Timestamp).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Newest-first reads within one collection
        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_collection_timestamp")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::Collection)
                    .col(SearchHistory::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SearchHistory {
    Table,
    Id,
    Collection,
    BreedIds,
    CategoryIds,
    RandomCats,
    Timestamp,
}
