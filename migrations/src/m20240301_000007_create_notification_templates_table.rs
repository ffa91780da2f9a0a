use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationTemplates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::TemplateCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::TemplateName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::TemplateSubject)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::TemplateContent)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::Channel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-templates-code-channel")
                    .table(NotificationTemplates::Table)
                    .col(NotificationTemplates::TemplateCode)
                    .col(NotificationTemplates::Channel)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(NotificationTemplates::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub enum NotificationTemplates {
    Table,
    Id,
    TemplateCode,
    TemplateName,
    TemplateSubject,
    TemplateContent,
    Channel,
    Status,
    CreatedAt,
    UpdatedAt,
}
