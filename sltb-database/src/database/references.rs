use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

use super::contains_pattern;
use crate::models::reference_entries::{Column, Entity as ReferenceEntry, Model as ReferenceModel};

pub async fn reference_exists<C: ConnectionTrait>(db: &C, reference_no: &str) -> Result<bool, DbErr> {
    Ok(get_reference(db, reference_no).await?.is_some())
}

/**
 * Get a reference entry by its exact reference number
 *
 * # Returns
 * @return Result<Option<ReferenceModel>, sea_orm::DbErr> - The entry, if the number was ever issued
 */
pub async fn get_reference<C: ConnectionTrait>(
    db: &C,
    reference_no: &str,
) -> Result<Option<ReferenceModel>, DbErr> {
    ReferenceEntry::find()
        .filter(Column::ReferenceNo.eq(reference_no))
        .one(db)
        .await
}

/**
 * Case-insensitive partial match on reference numbers
 *
 * # Arguments
 * @param value: &str - Any fragment of a reference number
 *
 * # Returns
 * @return Result<Vec<ReferenceModel>, sea_orm::DbErr> - Matching entries, newest first
 */
pub async fn search_references<C: ConnectionTrait>(
    db: &C,
    value: &str,
) -> Result<Vec<ReferenceModel>, DbErr> {
    let pattern = LikeExpr::new(contains_pattern(value)).escape('\\');
    ReferenceEntry::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::ReferenceNo))).like(pattern))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await
}

/// Replace the free-text comments of a reference entry. Returns rows written.
pub async fn update_reference_comments<C: ConnectionTrait>(
    db: &C,
    reference_no: &str,
    comments: &str,
) -> Result<u64, DbErr> {
    let result = ReferenceEntry::update_many()
        .col_expr(Column::Comments, Expr::value(comments))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::ReferenceNo.eq(reference_no))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
