use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS fifo_platform.permissions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(64) NOT NULL,
        description VARCHAR NOT NULL DEFAULT '',
        CONSTRAINT permissions_name_unique UNIQUE (name)
    )",
    "CREATE TABLE IF NOT EXISTS fifo_platform.roles (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(64) NOT NULL,
        description VARCHAR NOT NULL DEFAULT '',
        CONSTRAINT roles_name_unique UNIQUE (name)
    )",
    "CREATE TABLE IF NOT EXISTS fifo_platform.role_permissions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        role_id UUID NOT NULL,
        permission_id UUID NOT NULL,
        CONSTRAINT role_permissions_pair_unique UNIQUE (role_id, permission_id),
        CONSTRAINT fk_role_permissions_role
            FOREIGN KEY (role_id)
            REFERENCES fifo_platform.roles(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE,
        CONSTRAINT fk_role_permissions_permission
            FOREIGN KEY (permission_id)
            REFERENCES fifo_platform.permissions(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS fifo_platform.users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username VARCHAR(64) NOT NULL,
        full_name VARCHAR NOT NULL,
        password_hash VARCHAR NOT NULL,
        department VARCHAR NOT NULL,
        role_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_username_unique UNIQUE (username),
        CONSTRAINT fk_users_role
            FOREIGN KEY (role_id)
            REFERENCES fifo_platform.roles(id)
            ON DELETE RESTRICT
            ON UPDATE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS fifo_platform.packages (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        tracking_id VARCHAR(64) NOT NULL,
        buffer VARCHAR(16) NOT NULL,
        location VARCHAR NOT NULL DEFAULT '',
        entry_timestamp TIMESTAMPTZ,
        profile VARCHAR(8) NOT NULL,
        profile_value INTEGER NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT packages_tracking_id_unique UNIQUE (tracking_id)
    )",
    "CREATE TABLE IF NOT EXISTS fifo_platform.audit_logs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        actor_username VARCHAR NOT NULL,
        actor_full_name VARCHAR NOT NULL,
        action VARCHAR(16) NOT NULL,
        details TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for sql in CREATE_TABLES {
            manager.get_connection().execute_unprepared(sql).await?;
        }

        // Every queue read filters on active and buffer, then orders by entry time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("packages_active_buffer_entry")
                    .table((Alias::new("fifo_platform"), Alias::new("packages")))
                    .col(Alias::new("active"))
                    .col(Alias::new("buffer"))
                    .col(Alias::new("entry_timestamp"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("audit_logs_created_at")
                    .table((Alias::new("fifo_platform"), Alias::new("audit_logs")))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "audit_logs",
            "packages",
            "users",
            "role_permissions",
            "roles",
            "permissions",
        ] {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP TABLE IF EXISTS fifo_platform.{table}"))
                .await?;
        }

        Ok(())
    }
}
