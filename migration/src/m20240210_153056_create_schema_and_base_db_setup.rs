use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS fifo_platform;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO fifo_platform, public;")
            .await?;

        // The application role is optional in local setups where the owner runs the server
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    IF EXISTS (SELECT FROM pg_roles WHERE rolname = 'fifo') THEN
                        GRANT ALL ON SCHEMA fifo_platform TO fifo;

                        ALTER DEFAULT PRIVILEGES IN SCHEMA fifo_platform GRANT ALL ON TABLES TO fifo;
                        ALTER DEFAULT PRIVILEGES IN SCHEMA fifo_platform GRANT ALL ON SEQUENCES TO fifo;
                    END IF;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    IF EXISTS (SELECT FROM pg_roles WHERE rolname = 'fifo') THEN
                        ALTER DEFAULT PRIVILEGES IN SCHEMA fifo_platform REVOKE ALL ON SEQUENCES FROM fifo;
                        ALTER DEFAULT PRIVILEGES IN SCHEMA fifo_platform REVOKE ALL ON TABLES FROM fifo;
                        REVOKE ALL ON SCHEMA fifo_platform FROM fifo;
                    END IF;
                END $$;
            "#,
            )
            .await?;

        // CASCADE removes every table created by later migrations too
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS fifo_platform CASCADE;")
            .await?;

        Ok(())
    }
}
