use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Stored generated column: the search representation is rebuilt by
        // the database on every write to name/description and is never
        // writable by the application. Name terms carry weight A,
        // description terms weight B.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE products
                    ADD COLUMN tsv tsvector
                    GENERATED ALWAYS AS (
                        setweight(to_tsvector('english', coalesce(name, '')), 'A')
                        ||
                        setweight(to_tsvector('english', coalesce(description, '')), 'B')
                    ) STORED
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("CREATE INDEX idx_products_tsv ON products USING gin (tsv)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_products_tsv")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TABLE products DROP COLUMN IF EXISTS tsv")
            .await?;

        Ok(())
    }
}
