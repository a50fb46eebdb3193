use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};

use super::owned_by;
use crate::types::{ApplicationKind, ApplicationStatus};

#[derive(Debug, FromQueryResult)]
struct StatusRow {
    status: String,
    count: i64,
    amount: Option<Decimal>,
}

/// Number of applications and their summed approved amount in one status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBucket {
    pub status: ApplicationStatus,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct EstateBucket {
    pub estate_name: String,
    pub count: i64,
    pub amount: Option<Decimal>,
}

/**
 * Count and sum applications of one kind grouped by status
 *
 * # Arguments
 * @param owner: Option<i32> - Restrict to one owner, or None for every application
 *
 * # Returns
 * @return Result<Vec<StatusBucket>, sea_orm::DbErr> - One bucket per status that has rows
 */
pub async fn status_breakdown<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: Option<i32>,
) -> Result<Vec<StatusBucket>, DbErr> {
    let rows: Vec<StatusRow> = with_application_table!(kind, table => {
        table::Entity::find()
            .select_only()
            .column(table::Column::Status)
            .column_as(Expr::col(table::Column::Id).count(), "count")
            .column_as(Expr::col(table::Column::TotalApprovedAmount).sum(), "amount")
            .filter(owned_by(table::Column::UserId, owner))
            .group_by(table::Column::Status)
            .into_model::<StatusRow>()
            .all(db)
            .await?
    });

    Ok(rows
        .into_iter()
        .filter_map(|row| match row.status.parse::<ApplicationStatus>() {
            Ok(status) => Some(StatusBucket {
                status,
                count: row.count,
                amount: row.amount.unwrap_or_default(),
            }),
            Err(e) => {
                warn!("Skipping {} rows of {} applications: {}", row.count, kind, e);
                None
            }
        })
        .collect())
}

/// Count and sum applications of one kind grouped by estate name.
pub async fn estate_breakdown<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: Option<i32>,
) -> Result<Vec<EstateBucket>, DbErr> {
    with_application_table!(kind, table => {
        table::Entity::find()
            .select_only()
            .column(table::Column::EstateName)
            .column_as(Expr::col(table::Column::Id).count(), "count")
            .column_as(Expr::col(table::Column::TotalApprovedAmount).sum(), "amount")
            .filter(owned_by(table::Column::UserId, owner))
            .group_by(table::Column::EstateName)
            .into_model::<EstateBucket>()
            .all(db)
            .await
    })
}

/// Creation time and approved amount of every application created in `[from, to)`.
pub async fn amounts_created_between<C: ConnectionTrait>(
    db: &C,
    kind: ApplicationKind,
    owner: Option<i32>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<(DateTime<Utc>, Decimal)>, DbErr> {
    with_application_table!(kind, table => {
        table::Entity::find()
            .select_only()
            .column(table::Column::CreatedAt)
            .column(table::Column::TotalApprovedAmount)
            .filter(owned_by(table::Column::UserId, owner))
            .filter(table::Column::CreatedAt.gte(from))
            .filter(table::Column::CreatedAt.lt(to))
            .into_tuple::<(DateTime<Utc>, Decimal)>()
            .all(db)
            .await
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    use super::*;

    fn status_row(status: &str, count: i64, amount: Option<Decimal>) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("status", Value::from(status.to_string())),
            ("count", Value::from(count)),
            ("amount", Value::from(amount)),
        ])
    }

    #[tokio::test]
    async fn status_rows_become_typed_buckets() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                status_row("pending", 2, Some(Decimal::new(50000, 2))),
                status_row("approved", 1, None),
            ]])
            .into_connection();

        let buckets = status_breakdown(&db, ApplicationKind::Planting, Some(7))
            .await
            .unwrap();
        assert_eq!(
            buckets,
            vec![
                StatusBucket {
                    status: ApplicationStatus::Pending,
                    count: 2,
                    amount: Decimal::new(50000, 2),
                },
                StatusBucket {
                    status: ApplicationStatus::Approved,
                    count: 1,
                    amount: Decimal::ZERO,
                },
            ]
        );

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("GROUP BY"));
        assert!(log.contains("user_id"));
    }

    #[tokio::test]
    async fn unknown_status_rows_are_skipped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![status_row("archived", 4, None)]])
            .into_connection();

        let buckets = status_breakdown(&db, ApplicationKind::Replanting, None)
            .await
            .unwrap();
        assert!(buckets.is_empty());
    }
}
