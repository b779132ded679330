use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Board positions the club has always used; more can be added at runtime.
const DEFAULT_ROLES: &[(&str, i32)] = &[
    ("President", 1),
    ("Vice President", 2),
    ("Secretary", 3),
    ("Treasurer", 4),
    ("Technical Lead", 5),
    ("Member", 10),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(RoleRanks::Table)
            .columns([RoleRanks::RoleName, RoleRanks::Rank])
            .on_conflict(
                OnConflict::column(RoleRanks::RoleName)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        for (name, rank) in DEFAULT_ROLES {
            insert.values_panic([(*name).into(), (*rank).into()]);
        }

        manager.exec_stmt(insert).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_ranks_rank")
                    .table(RoleRanks::Table)
                    .col(RoleRanks::Rank)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_role_ranks_rank")
                    .table(RoleRanks::Table)
                    .to_owned(),
            )
            .await?;

        let delete = Query::delete()
            .from_table(RoleRanks::Table)
            .and_where(
                Expr::col(RoleRanks::RoleName)
                    .is_in(DEFAULT_ROLES.iter().map(|(name, _)| *name)),
            )
            .to_owned();

        manager.exec_stmt(delete).await
    }
}

#[derive(DeriveIden)]
enum RoleRanks {
    Table,
    RoleName,
    Rank,
}
