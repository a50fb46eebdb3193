use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;
use sltb_database::database::{applications, references, users};
use sltb_database::models::applications::{ApplicationRecord, SearchField};
use sltb_database::models::reference_entries;
use sltb_database::types::{ApplicationKind, ApplicationStatus};
use sltb_database::Store;

use crate::core::lifecycle::{status_timeline, TimelineStage};
use crate::core::{CommentsInfo, SearchInfo};
use crate::error::{ApplicationError, FieldError};

/// What a reference number points at. `status` is read from the application
/// row; the reference entry holds no status of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceResolution {
    pub reference_no: String,
    pub application_type: ApplicationKind,
    pub application_id: i32,
    pub status: ApplicationStatus,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetails {
    #[serde(rename = "type")]
    pub label: &'static str,
    pub file_no: String,
    pub owner_name: String,
    pub estate_name: String,
    pub ti_range: Option<String>,
    pub division: Option<String>,
    pub field_no: Option<String>,
    pub plan_no: Option<String>,
    pub subsidy_type: String,
    pub approved_extent: Decimal,
    pub x1_coordinate: Option<String>,
    pub x2_coordinate: Option<String>,
    pub plants_per_ha: i32,
    pub approved_plants: i32,
    pub amount_per_plant: Decimal,
    pub total_approved_amount: Decimal,
    pub applicant_name: String,
    pub applicant_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingReport {
    pub reference_no: String,
    pub application_type: ApplicationKind,
    pub status: ApplicationStatus,
    pub comments: Option<String>,
    pub submitted_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub application_details: ApplicationDetails,
    pub status_timeline: Vec<TimelineStage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub reference_no: String,
    pub application_type: ApplicationKind,
    pub id: i32,
    pub file_no: String,
    pub owner_name: String,
    pub estate_name: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for SearchResult {
    fn from(record: ApplicationRecord) -> Self {
        SearchResult {
            reference_no: record.reference_no,
            application_type: record.application_type,
            id: record.id,
            file_no: record.file_no,
            owner_name: record.owner_name,
            estate_name: record.estate_name,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub count: usize,
}

async fn load_referenced(
    store: &Store,
    reference_no: &str,
) -> Result<(reference_entries::Model, ApplicationRecord), ApplicationError> {
    let db = store.conn();
    let entry = references::get_reference(db, reference_no)
        .await?
        .ok_or_else(|| ApplicationError::NotFound("Reference number not found".to_string()))?;
    let application = applications::find_application(db, entry.application_type, entry.application_id)
        .await?
        .ok_or_else(|| ApplicationError::NotFound("Application details not found".to_string()))?;
    Ok((entry, application))
}

/**
 * Resolve a reference number to the application it was issued for
 *
 * # Returns
 * @return Result<ReferenceResolution, ApplicationError> - NotFound when the number was never issued
 */
pub async fn resolve(store: &Store, reference_no: &str) -> Result<ReferenceResolution, ApplicationError> {
    let (entry, application) = load_referenced(store, reference_no).await?;
    Ok(ReferenceResolution {
        reference_no: entry.reference_no,
        application_type: entry.application_type,
        application_id: entry.application_id,
        status: application.status,
        comments: entry.comments,
    })
}

/// Public tracking view of one reference number.
pub async fn track(store: &Store, reference_no: &str) -> Result<TrackingReport, ApplicationError> {
    let reference_no = reference_no.trim();
    if reference_no.is_empty() {
        return Err(ApplicationError::invalid_field(
            "referenceNo",
            "Reference number is required",
        ));
    }

    let (entry, application) = load_referenced(store, reference_no).await?;
    let applicant = match application.user_id {
        Some(user_id) => users::get_user(store.conn(), user_id).await?,
        None => None,
    };

    Ok(TrackingReport {
        reference_no: entry.reference_no,
        application_type: entry.application_type,
        status: application.status,
        comments: entry.comments,
        submitted_date: application.created_at,
        last_updated: application.updated_at,
        status_timeline: status_timeline(
            application.status,
            application.created_at,
            application.updated_at,
        ),
        application_details: ApplicationDetails {
            label: entry.application_type.label(),
            applicant_name: applicant.as_ref().map(|u| u.full_name()).unwrap_or_default(),
            applicant_email: applicant.map(|u| u.email),
            file_no: application.file_no,
            owner_name: application.owner_name,
            estate_name: application.estate_name,
            ti_range: application.ti_range,
            division: application.division,
            field_no: application.field_no,
            plan_no: application.plan_no,
            subsidy_type: application.subsidy_type,
            approved_extent: application.approved_extent,
            x1_coordinate: application.x1_coordinate,
            x2_coordinate: application.x2_coordinate,
            plants_per_ha: application.plants_per_ha,
            approved_plants: application.approved_plants,
            amount_per_plant: application.amount_per_plant,
            total_approved_amount: application.total_approved_amount,
        },
    })
}

enum SearchTarget {
    Reference,
    Field(SearchField),
}

fn parse_search(info: &SearchInfo) -> Result<(SearchTarget, &str), ApplicationError> {
    let target = match info.search_type.as_str() {
        "reference_no" => Some(SearchTarget::Reference),
        "file_no" => Some(SearchTarget::Field(SearchField::FileNo)),
        "owner_name" => Some(SearchTarget::Field(SearchField::OwnerName)),
        "estate_name" => Some(SearchTarget::Field(SearchField::EstateName)),
        _ => None,
    };
    let value = info.search_value.trim();

    let mut errors = Vec::new();
    if target.is_none() {
        errors.push(FieldError::new("searchType", "Invalid search type"));
    }
    if value.is_empty() {
        errors.push(FieldError::new("searchValue", "Search value is required"));
    }
    match target {
        Some(target) if errors.is_empty() => Ok((target, value)),
        _ => Err(ApplicationError::Validation(errors)),
    }
}

/**
 * Search both kinds by reference number fragment or by a descriptive column
 *
 * Matching is a case-insensitive substring match. Reference searches resolve
 * the matched entries with one query per kind.
 *
 * # Returns
 * @return Result<SearchResponse, ApplicationError> - Matches from both kinds, planting first
 */
pub async fn search(store: &Store, info: SearchInfo) -> Result<SearchResponse, ApplicationError> {
    let (target, value) = parse_search(&info)?;
    let db = store.conn();
    let mut results = Vec::new();

    match target {
        SearchTarget::Reference => {
            let entries = references::search_references(db, value).await?;
            for kind in ApplicationKind::ALL {
                let ids: Vec<i32> = entries
                    .iter()
                    .filter(|entry| entry.application_type == kind)
                    .map(|entry| entry.application_id)
                    .collect();
                let mut by_id: HashMap<i32, ApplicationRecord> =
                    applications::find_applications_by_ids(db, kind, ids.clone())
                        .await?
                        .into_iter()
                        .map(|record| (record.id, record))
                        .collect();
                results.extend(
                    ids.iter()
                        .filter_map(|id| by_id.remove(id))
                        .map(SearchResult::from),
                );
            }
        }
        SearchTarget::Field(field) => {
            for kind in ApplicationKind::ALL {
                let matches = applications::search_applications(db, kind, field, value).await?;
                results.extend(matches.into_iter().map(SearchResult::from));
            }
        }
    }

    Ok(SearchResponse {
        count: results.len(),
        results,
    })
}

/// Replaces the free-text comments of a reference entry.
pub async fn annotate(store: &Store, reference_no: &str, info: CommentsInfo) -> Result<(), ApplicationError> {
    let written = references::update_reference_comments(store.conn(), reference_no, info.comments.trim()).await?;
    if written == 0 {
        return Err(ApplicationError::NotFound("Reference number not found".to_string()));
    }
    info!("Updated comments of {}", reference_no);
    Ok(())
}
