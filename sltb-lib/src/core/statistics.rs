use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use futures::try_join;
use rust_decimal::Decimal;
use serde::Serialize;
use sltb_database::database::{applications, statistics};
use sltb_database::database::statistics::{EstateBucket, StatusBucket};
use sltb_database::models::applications::ApplicationRecord;
use sltb_database::types::{ApplicationKind, ApplicationStatus};
use sltb_database::Store;

use crate::core::ApplicationsQuery;
use crate::error::{ApplicationError, FieldError};

const RECENT_LIMIT: u64 = 5;
const TOP_ESTATES: usize = 5;
const RECENT_UPDATE_DAYS: i64 = 30;
const RECENT_UPDATE_LIMIT: u64 = 20;
const PENDING_ATTENTION_DAYS: i64 = 7;
const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Per-status counts and the summed approved amount of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total_amount: Decimal,
}

impl StatusSummary {
    pub fn from_buckets(buckets: &[StatusBucket]) -> Self {
        let mut summary = StatusSummary::default();
        for bucket in buckets {
            summary.total += bucket.count;
            summary.total_amount += bucket.amount;
            match bucket.status {
                ApplicationStatus::Pending => summary.pending += bucket.count,
                ApplicationStatus::Processing => summary.processing += bucket.count,
                ApplicationStatus::Approved => summary.approved += bucket.count,
                ApplicationStatus::Rejected => summary.rejected += bucket.count,
            }
        }
        summary
    }
}

/// Both kinds added together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverallSummary {
    pub total_applications: i64,
    pub total_pending: i64,
    pub total_processing: i64,
    pub total_approved: i64,
    pub total_rejected: i64,
    pub total_amount: Decimal,
}

impl OverallSummary {
    pub fn merge(planting: &StatusSummary, replanting: &StatusSummary) -> Self {
        OverallSummary {
            total_applications: planting.total + replanting.total,
            total_pending: planting.pending + replanting.pending,
            total_processing: planting.processing + replanting.processing,
            total_approved: planting.approved + replanting.approved,
            total_rejected: planting.rejected + replanting.rejected,
            total_amount: planting.total_amount + replanting.total_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicRecentApplication {
    pub reference_no: String,
    pub owner_name: String,
    pub estate_name: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for PublicRecentApplication {
    fn from(record: ApplicationRecord) -> Self {
        PublicRecentApplication {
            reference_no: record.reference_no,
            owner_name: record.owner_name,
            estate_name: record.estate_name,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerKind<T> {
    pub planting: T,
    pub replanting: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicStatistics {
    pub planting: StatusSummary,
    pub replanting: StatusSummary,
    pub total: OverallSummary,
    pub recent_applications: PerKind<Vec<PublicRecentApplication>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KindOverview {
    pub summary: StatusSummary,
    pub recent: Vec<ApplicationRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub summary: OverallSummary,
    pub planting: KindOverview,
    pub replanting: KindOverview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationsPage {
    pub applications: Vec<ApplicationRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub month: u32,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    pub status: ApplicationStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstateRanking {
    pub estate_name: String,
    pub application_count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatistics {
    pub year: i32,
    pub monthly: PerKind<Vec<MonthBucket>>,
    pub status_distribution: Vec<StatusCount>,
    pub top_estates: Vec<EstateRanking>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentUpdate {
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    pub id: i32,
    pub file_no: String,
    pub estate_name: String,
    pub status: ApplicationStatus,
    pub updated_at: DateTime<Utc>,
    pub reference_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingAttention {
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    pub id: i32,
    pub file_no: String,
    pub estate_name: String,
    pub created_at: DateTime<Utc>,
    pub reference_no: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notifications {
    pub recent_updates: Vec<RecentUpdate>,
    pub pending_attention: Vec<PendingAttention>,
}

async fn kind_summary(
    store: &Store,
    kind: ApplicationKind,
    owner: Option<i32>,
) -> Result<StatusSummary, ApplicationError> {
    let buckets = statistics::status_breakdown(store.conn(), kind, owner).await?;
    Ok(StatusSummary::from_buckets(&buckets))
}

/**
 * Public figures across every application
 *
 * # Returns
 * @return Result<PublicStatistics, ApplicationError> - Summaries per kind, their sum and the latest submissions
 */
pub async fn public_statistics(store: &Store) -> Result<PublicStatistics, ApplicationError> {
    let db = store.conn();
    let (planting, replanting, recent_planting, recent_replanting) = try_join!(
        kind_summary(store, ApplicationKind::Planting, None),
        kind_summary(store, ApplicationKind::Replanting, None),
        async {
            applications::recent_applications(db, ApplicationKind::Planting, None, RECENT_LIMIT)
                .await
                .map_err(ApplicationError::from)
        },
        async {
            applications::recent_applications(db, ApplicationKind::Replanting, None, RECENT_LIMIT)
                .await
                .map_err(ApplicationError::from)
        },
    )?;

    Ok(PublicStatistics {
        total: OverallSummary::merge(&planting, &replanting),
        planting,
        replanting,
        recent_applications: PerKind {
            planting: recent_planting.into_iter().map(Into::into).collect(),
            replanting: recent_replanting.into_iter().map(Into::into).collect(),
        },
    })
}

/// Summaries and latest submissions of one owner.
pub async fn overview(store: &Store, owner: i32) -> Result<DashboardOverview, ApplicationError> {
    let db = store.conn();
    let (planting, replanting, recent_planting, recent_replanting) = try_join!(
        kind_summary(store, ApplicationKind::Planting, Some(owner)),
        kind_summary(store, ApplicationKind::Replanting, Some(owner)),
        async {
            applications::recent_applications(db, ApplicationKind::Planting, Some(owner), RECENT_LIMIT)
                .await
                .map_err(ApplicationError::from)
        },
        async {
            applications::recent_applications(db, ApplicationKind::Replanting, Some(owner), RECENT_LIMIT)
                .await
                .map_err(ApplicationError::from)
        },
    )?;

    Ok(DashboardOverview {
        summary: OverallSummary::merge(&planting, &replanting),
        planting: KindOverview {
            summary: planting,
            recent: recent_planting,
        },
        replanting: KindOverview {
            summary: replanting,
            recent: recent_replanting,
        },
    })
}

struct PageRequest {
    page: u64,
    limit: u64,
    offset: u64,
    status: Option<ApplicationStatus>,
    kinds: Vec<ApplicationKind>,
}

fn parse_page_request(query: ApplicationsQuery) -> Result<PageRequest, ApplicationError> {
    let mut errors = Vec::new();

    let page = query.page.unwrap_or(1);
    if page < 1 {
        errors.push(FieldError::new("page", "Page must be 1 or greater"));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        errors.push(FieldError::new("limit", "Limit must be between 1 and 100"));
    }
    // OFFSET is bound as a signed 64-bit integer.
    let offset = page
        .checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(limit))
        .filter(|offset| i64::try_from(*offset).is_ok());
    if page >= 1 && offset.is_none() {
        errors.push(FieldError::new("page", "Page is out of range"));
    }
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<ApplicationStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                errors.push(FieldError::new("status", &e));
                None
            }
        },
        None => None,
    };
    let kinds = match query.kind.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<ApplicationKind>() {
            Ok(kind) => vec![kind],
            Err(e) => {
                errors.push(FieldError::new("type", &e));
                Vec::new()
            }
        },
        None => ApplicationKind::ALL.to_vec(),
    };

    if errors.is_empty() {
        Ok(PageRequest {
            page,
            limit,
            offset: offset.unwrap_or_default(),
            status,
            kinds,
        })
    } else {
        Err(ApplicationError::Validation(errors))
    }
}

/**
 * One page of an owner's applications across the selected kinds
 *
 * Each kind contributes its own page of `limit` rows at the same offset; the
 * concatenation is re-sorted newest first. `total` counts every matching
 * row of the selected kinds.
 *
 * # Returns
 * @return Result<ApplicationsPage, ApplicationError> - Rows and pagination numbers
 */
pub async fn applications_page(
    store: &Store,
    owner: i32,
    query: ApplicationsQuery,
) -> Result<ApplicationsPage, ApplicationError> {
    let request = parse_page_request(query)?;
    let offset = request.offset;
    let db = store.conn();

    let mut rows = Vec::new();
    let mut total = 0;
    for kind in &request.kinds {
        let (page, count) = try_join!(
            applications::page_owned_applications(db, *kind, owner, request.status, request.limit, offset),
            applications::count_owned_applications(db, *kind, owner, request.status),
        )?;
        rows.extend(page);
        total += count;
    }
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(ApplicationsPage {
        applications: rows,
        pagination: Pagination {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        },
    })
}

/// Buckets creation times into the twelve months of one year.
pub fn bucket_by_month(rows: &[(DateTime<Utc>, Decimal)]) -> Vec<MonthBucket> {
    let mut months: Vec<MonthBucket> = (1..=12)
        .map(|month| MonthBucket {
            month,
            ..Default::default()
        })
        .collect();
    for (created_at, amount) in rows {
        let bucket = &mut months[created_at.month0() as usize];
        bucket.count += 1;
        bucket.amount += *amount;
    }
    months
}

/// Merges per-kind estate buckets and keeps the busiest estates.
pub fn top_estates(buckets: impl IntoIterator<Item = EstateBucket>, limit: usize) -> Vec<EstateRanking> {
    let mut merged: HashMap<String, EstateRanking> = HashMap::new();
    for bucket in buckets {
        let entry = merged
            .entry(bucket.estate_name.clone())
            .or_insert_with(|| EstateRanking {
                estate_name: bucket.estate_name,
                application_count: 0,
                total_amount: Decimal::ZERO,
            });
        entry.application_count += bucket.count;
        entry.total_amount += bucket.amount.unwrap_or_default();
    }

    let mut ranking: Vec<EstateRanking> = merged.into_values().collect();
    ranking.sort_by(|a, b| {
        b.application_count
            .cmp(&a.application_count)
            .then_with(|| b.total_amount.cmp(&a.total_amount))
            .then_with(|| a.estate_name.cmp(&b.estate_name))
    });
    ranking.truncate(limit);
    ranking
}

fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), ApplicationError> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single();
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ApplicationError::Internal(format!("no calendar bounds for year {}", year))),
    }
}

/**
 * Owner statistics for the dashboard charts
 *
 * # Returns
 * @return Result<DashboardStatistics, ApplicationError> - Monthly figures of the current UTC year, status distribution and top estates
 */
pub async fn dashboard_statistics(store: &Store, owner: i32) -> Result<DashboardStatistics, ApplicationError> {
    let db = store.conn();
    let year = Utc::now().year();
    let (from, to) = year_bounds(year)?;

    let (monthly_planting, monthly_replanting, status_planting, status_replanting, estates_planting, estates_replanting) = try_join!(
        statistics::amounts_created_between(db, ApplicationKind::Planting, Some(owner), from, to),
        statistics::amounts_created_between(db, ApplicationKind::Replanting, Some(owner), from, to),
        statistics::status_breakdown(db, ApplicationKind::Planting, Some(owner)),
        statistics::status_breakdown(db, ApplicationKind::Replanting, Some(owner)),
        statistics::estate_breakdown(db, ApplicationKind::Planting, Some(owner)),
        statistics::estate_breakdown(db, ApplicationKind::Replanting, Some(owner)),
    )?;

    let status_distribution = [
        (ApplicationKind::Planting, status_planting),
        (ApplicationKind::Replanting, status_replanting),
    ]
    .into_iter()
    .flat_map(|(kind, buckets)| {
        buckets.into_iter().map(move |bucket| StatusCount {
            kind,
            status: bucket.status,
            count: bucket.count,
        })
    })
    .collect();

    Ok(DashboardStatistics {
        year,
        monthly: PerKind {
            planting: bucket_by_month(&monthly_planting),
            replanting: bucket_by_month(&monthly_replanting),
        },
        status_distribution,
        top_estates: top_estates(estates_planting.into_iter().chain(estates_replanting), TOP_ESTATES),
    })
}

/// Recent changes and stale pending applications of one owner.
pub async fn notifications(store: &Store, owner: i32) -> Result<Notifications, ApplicationError> {
    let db = store.conn();
    let now = Utc::now();
    let since = now - Duration::days(RECENT_UPDATE_DAYS);
    let before = now - Duration::days(PENDING_ATTENTION_DAYS);

    let (updated_planting, updated_replanting, stale_planting, stale_replanting) = try_join!(
        applications::applications_updated_since(db, ApplicationKind::Planting, owner, since, RECENT_UPDATE_LIMIT),
        applications::applications_updated_since(db, ApplicationKind::Replanting, owner, since, RECENT_UPDATE_LIMIT),
        applications::pending_applications_created_before(db, ApplicationKind::Planting, owner, before),
        applications::pending_applications_created_before(db, ApplicationKind::Replanting, owner, before),
    )?;

    let mut recent_updates: Vec<RecentUpdate> = updated_planting
        .into_iter()
        .chain(updated_replanting)
        .map(|record| RecentUpdate {
            kind: record.application_type,
            id: record.id,
            file_no: record.file_no,
            estate_name: record.estate_name,
            status: record.status,
            updated_at: record.updated_at,
            reference_no: record.reference_no,
        })
        .collect();
    recent_updates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent_updates.truncate(RECENT_UPDATE_LIMIT as usize);

    let mut pending_attention: Vec<PendingAttention> = stale_planting
        .into_iter()
        .chain(stale_replanting)
        .map(|record| PendingAttention {
            kind: record.application_type,
            id: record.id,
            file_no: record.file_no,
            estate_name: record.estate_name,
            created_at: record.created_at,
            reference_no: record.reference_no,
        })
        .collect();
    pending_attention.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(Notifications {
        recent_updates,
        pending_attention,
    })
}
