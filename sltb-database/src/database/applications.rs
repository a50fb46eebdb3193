use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait,
    TransactionTrait,
};

use super::{contains_pattern, owned_by};
use crate::models::applications::{ApplicationPatch, ApplicationRecord, NewApplication, SearchField};
use crate::models::reference_entries;
use crate::types::{ApplicationKind, ApplicationStatus};

macro_rules! assign_present {
    ($update:ident, $patch:ident, $table:ident; $($field:ident => $column:ident),* $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $update = $update.col_expr($table::Column::$column, Expr::value(value.clone()));
            }
        )*
    };
}

/**
 * Check whether a file number is already taken for the given kind
 *
 * # Arguments
 * @param db: &C - The connection or transaction to use
 * @param kind: ApplicationKind - Which application table to look in
 * @param file_no: &str - The caller supplied file number
 *
 * # Returns
 * @return Result<bool, sea_orm::DbErr> - Whether a row with that file number exists
 */
pub async fn file_no_exists<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    file_no: &str,
) -> Result<bool, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::FileNo.eq(file_no))
            .one(db)
            .await?
            .is_some()
    });
    Ok(found)
}

/**
 * Insert an application together with its reference entry
 *
 * Both rows are written in one transaction: either the application is
 * resolvable through its reference number or nothing is stored.
 *
 * # Arguments
 * @param db: &DatabaseConnection - The database connection
 * @param kind: ApplicationKind - Which application table to insert into
 * @param owner: i32 - The submitting user
 * @param application: &NewApplication - Validated submission fields
 * @param reference_no: &str - Freshly generated reference number
 *
 * # Returns
 * @return Result<ApplicationRecord, sea_orm::DbErr> - The stored application
 */
pub async fn create_application(
    db: &DatabaseConnection,
    kind: ApplicationKind,
    owner: i32,
    application: &NewApplication,
    reference_no: &str,
) -> Result<ApplicationRecord, DbErr> {
    let total = application
        .total_approved_amount()
        .ok_or_else(|| DbErr::Custom("approved total does not fit a decimal".to_string()))?;
    let txn = db.begin().await?;
    let now = Utc::now();

    let record: ApplicationRecord = with_application_table!(kind, table => {
        table::ActiveModel {
            user_id: Set(Some(owner)),
            file_no: Set(application.file_no.clone()),
            owner_name: Set(application.owner_name.clone()),
            estate_name: Set(application.estate_name.clone()),
            ti_range: Set(application.ti_range.clone()),
            division: Set(application.division.clone()),
            field_no: Set(application.field_no.clone()),
            plan_no: Set(application.plan_no.clone()),
            subsidy_type: Set(application.subsidy_type.clone()),
            approved_extent: Set(application.approved_extent),
            x1_coordinate: Set(application.x1_coordinate.clone()),
            x2_coordinate: Set(application.x2_coordinate.clone()),
            plants_per_ha: Set(application.plants_per_ha),
            approved_plants: Set(application.approved_plants),
            amount_per_plant: Set(application.amount_per_plant),
            total_approved_amount: Set(total),
            status: Set(ApplicationStatus::Pending),
            reference_no: Set(reference_no.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
        .into()
    });

    reference_entries::ActiveModel {
        reference_no: Set(reference_no.to_string()),
        application_type: Set(kind),
        application_id: Set(record.id),
        comments: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(record)
}

pub async fn find_application<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    id: i32,
) -> Result<Option<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(ApplicationRecord::from)
    });
    Ok(found)
}

/**
 * Get an application only if it belongs to the given owner
 *
 * # Returns
 * @return Result<Option<ApplicationRecord>, sea_orm::DbErr> - None when absent or owned by someone else
 */
pub async fn find_owned_application<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
) -> Result<Option<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::Id.eq(id))
            .filter(table::Column::UserId.eq(owner))
            .one(db)
            .await?
            .map(ApplicationRecord::from)
    });
    Ok(found)
}

pub async fn find_applications_by_ids<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    ids: Vec<i32>,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::Id.is_in(ids))
            .order_by_desc(table::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/// Every application of `kind` owned by `owner`, newest first.
pub async fn list_owned_applications<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: i32,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::UserId.eq(owner))
            .order_by_desc(table::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/// Newest applications of `kind`, optionally restricted to one owner.
pub async fn recent_applications<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: Option<i32>,
    limit: u64,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(owned_by(table::Column::UserId, owner))
            .order_by_desc(table::Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/**
 * Fetch one bounded page of an owner's applications
 *
 * # Arguments
 * @param status: Option<ApplicationStatus> - Only rows in this status when set
 * @param limit: u64 - Page size
 * @param offset: u64 - Rows to skip
 *
 * # Returns
 * @return Result<Vec<ApplicationRecord>, sea_orm::DbErr> - The page, newest first
 */
pub async fn page_owned_applications<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: i32,
    status: Option<ApplicationStatus>,
    limit: u64,
    offset: u64,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        let mut query = table::Entity::find().filter(table::Column::UserId.eq(owner));
        if let Some(status) = status {
            query = query.filter(table::Column::Status.eq(status));
        }
        query
            .order_by_desc(table::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

pub async fn count_owned_applications<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: i32,
    status: Option<ApplicationStatus>,
) -> Result<u64, DbErr> {
    with_application_table!(kind, table => {
        let mut query = table::Entity::find().filter(table::Column::UserId.eq(owner));
        if let Some(status) = status {
            query = query.filter(table::Column::Status.eq(status));
        }
        query.count(db).await
    })
}

/// Owner's applications touched after `since`, most recently updated first.
pub async fn applications_updated_since<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: i32,
    since: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::UserId.eq(owner))
            .filter(table::Column::UpdatedAt.gt(since))
            .order_by_desc(table::Column::UpdatedAt)
            .limit(limit)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/// Owner's applications still pending that were created before `before`, oldest first.
pub async fn pending_applications_created_before<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: i32,
    before: DateTime<Utc>,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let found = with_application_table!(kind, table => {
        table::Entity::find()
            .filter(table::Column::UserId.eq(owner))
            .filter(table::Column::Status.eq(ApplicationStatus::Pending))
            .filter(table::Column::CreatedAt.lt(before))
            .order_by_asc(table::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/**
 * Case-insensitive substring search on one descriptive column
 *
 * # Arguments
 * @param field: SearchField - The column to match against
 * @param value: &str - Raw user input; LIKE wildcards in it are matched literally
 *
 * # Returns
 * @return Result<Vec<ApplicationRecord>, sea_orm::DbErr> - Matches, newest first
 */
pub async fn search_applications<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    field: SearchField,
    value: &str,
) -> Result<Vec<ApplicationRecord>, DbErr> {
    let pattern = LikeExpr::new(contains_pattern(value)).escape('\\');
    let found = with_application_table!(kind, table => {
        let column = match field {
            SearchField::FileNo => table::Column::FileNo,
            SearchField::OwnerName => table::Column::OwnerName,
            SearchField::EstateName => table::Column::EstateName,
        };
        table::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(column))).like(pattern))
            .order_by_desc(table::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(ApplicationRecord::from)
            .collect()
    });
    Ok(found)
}

/**
 * Apply a partial update to an owner's application while it is still pending
 *
 * The status check and the write are a single UPDATE, so a concurrent
 * transition cannot slip in between them. When only one amount factor is
 * present the total is recomputed from the stored value of the other one
 * inside the same statement.
 *
 * # Returns
 * @return Result<u64, sea_orm::DbErr> - Rows written: 0 when the row is absent, not owned or no longer pending
 */
pub async fn update_pending_application<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
    patch: &ApplicationPatch,
) -> Result<u64, DbErr> {
    let now = Utc::now();
    let result = with_application_table!(kind, table => {
        let mut update = table::Entity::update_many()
            .col_expr(table::Column::UpdatedAt, Expr::value(now));
        assign_present!(update, patch, table;
            owner_name => OwnerName,
            estate_name => EstateName,
            ti_range => TiRange,
            division => Division,
            field_no => FieldNo,
            plan_no => PlanNo,
            subsidy_type => SubsidyType,
            approved_extent => ApprovedExtent,
            x1_coordinate => X1Coordinate,
            x2_coordinate => X2Coordinate,
            plants_per_ha => PlantsPerHa,
            approved_plants => ApprovedPlants,
            amount_per_plant => AmountPerPlant,
        );
        if let Some(total) = patch.total_assignment() {
            update = update.col_expr(
                table::Column::TotalApprovedAmount,
                total.into_expr(table::Column::ApprovedPlants, table::Column::AmountPerPlant),
            );
        }
        update
            .filter(table::Column::Id.eq(id))
            .filter(table::Column::UserId.eq(owner))
            .filter(table::Column::Status.eq(ApplicationStatus::Pending))
            .exec(db)
            .await?
    });
    Ok(result.rows_affected)
}

/// Delete an owner's pending application and its reference entry in one
/// transaction. Returns the number of application rows removed.
pub async fn delete_pending_application(
    db: &DatabaseConnection,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
) -> Result<u64, DbErr> {
    let txn = db.begin().await?;
    let deleted = with_application_table!(kind, table => {
        table::Entity::delete_many()
            .filter(table::Column::Id.eq(id))
            .filter(table::Column::UserId.eq(owner))
            .filter(table::Column::Status.eq(ApplicationStatus::Pending))
            .exec(&txn)
            .await?
            .rows_affected
    });
    if deleted > 0 {
        reference_entries::Entity::delete_many()
            .filter(reference_entries::Column::ApplicationType.eq(kind))
            .filter(reference_entries::Column::ApplicationId.eq(id))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;
    Ok(deleted)
}

/**
 * Move an application from `from` to `to`
 *
 * Conditional on the row still being in `from` at write time. When
 * `comments` is given the reference entry is annotated in the same
 * transaction.
 *
 * # Returns
 * @return Result<u64, sea_orm::DbErr> - Rows written: 0 when another writer changed the status first
 */
pub async fn transition_application_status(
    db: &DatabaseConnection,
    kind: ApplicationKind,
    id: i32,
    from: ApplicationStatus,
    to: ApplicationStatus,
    comments: Option<&str>,
) -> Result<u64, DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let moved = with_application_table!(kind, table => {
        table::Entity::update_many()
            .col_expr(table::Column::Status, Expr::value(to))
            .col_expr(table::Column::UpdatedAt, Expr::value(now))
            .filter(table::Column::Id.eq(id))
            .filter(table::Column::Status.eq(from))
            .exec(&txn)
            .await?
            .rows_affected
    });
    if moved > 0 {
        if let Some(comments) = comments {
            reference_entries::Entity::update_many()
                .col_expr(reference_entries::Column::Comments, Expr::value(comments))
                .col_expr(reference_entries::Column::UpdatedAt, Expr::value(now))
                .filter(reference_entries::Column::ApplicationType.eq(kind))
                .filter(reference_entries::Column::ApplicationId.eq(id))
                .exec(&txn)
                .await?;
        }
    }
    txn.commit().await?;
    Ok(moved)
}
