use sea_orm::entity::prelude::*;

use crate::types::ApplicationKind;

/// Public lookup key for an application. There is no foreign key
/// to the application tables: `application_type` selects the table that
/// `application_id` points into. Status is read through from that row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reference_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub reference_no: String,
    pub application_type: ApplicationKind,
    pub application_id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
