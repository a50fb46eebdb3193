use sea_orm::entity::prelude::*;

use crate::types::ApplicationStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "planting_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    #[sea_orm(unique)]
    pub file_no: String,
    pub owner_name: String,
    pub estate_name: String,
    pub ti_range: Option<String>,
    pub division: Option<String>,
    pub field_no: Option<String>,
    pub plan_no: Option<String>,
    #[sea_orm(column_name = "planting_type")]
    pub subsidy_type: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub approved_extent: Decimal,
    pub x1_coordinate: Option<String>,
    pub x2_coordinate: Option<String>,
    pub plants_per_ha: i32,
    pub approved_plants: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount_per_plant: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_approved_amount: Decimal,
    pub status: ApplicationStatus,
    #[sea_orm(unique)]
    pub reference_no: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
