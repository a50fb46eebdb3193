pub mod validation;

use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use sltb_database::database::{applications, references};
use sltb_database::models::applications::{ApplicationPatch, ApplicationRecord};
use sltb_database::types::{ApplicationKind, ApplicationStatus};
use sltb_database::Store;

use self::validation::{check_total, validate_patch};
use crate::core::lifecycle::ApplicationLifecycle;
use crate::core::reference::{generate_reference_no, MAX_REFERENCE_ATTEMPTS};
use crate::core::{SubmitApplicationInfo, TransitionInfo};
use crate::error::ApplicationError;

const DUPLICATE_FILE_NO: &str = "Application with this file number already exists";
const NOT_FOUND: &str = "Application not found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedApplication {
    pub id: i32,
    pub reference_no: String,
    pub total_approved_amount: Decimal,
}

/**
 * Validate and store a new application, issuing its reference number
 *
 * # Arguments
 * @param store: &Store - The database handle
 * @param kind: ApplicationKind - Planting or replanting
 * @param owner: i32 - The submitting user
 * @param info: SubmitApplicationInfo - The request body
 *
 * # Returns
 * @return Result<SubmittedApplication, ApplicationError> - The new id, reference number and total
 */
pub async fn submit(
    store: &Store,
    kind: ApplicationKind,
    owner: i32,
    info: SubmitApplicationInfo,
) -> Result<SubmittedApplication, ApplicationError> {
    let application = info.validate(kind)?;
    let db = store.conn();

    if applications::file_no_exists(db, kind, &application.file_no).await? {
        return Err(ApplicationError::DuplicateKey(DUPLICATE_FILE_NO.to_string()));
    }

    for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
        let reference_no = generate_reference_no(kind);
        if references::reference_exists(db, &reference_no).await? {
            warn!("Reference number {} already issued (attempt {})", reference_no, attempt);
            continue;
        }

        match applications::create_application(db, kind, owner, &application, &reference_no).await {
            Ok(record) => {
                info!(
                    "Stored {} application {} as {}",
                    kind, record.id, record.reference_no
                );
                return Ok(SubmittedApplication {
                    id: record.id,
                    reference_no: record.reference_no,
                    total_approved_amount: record.total_approved_amount,
                });
            }
            Err(err) => match ApplicationError::from(err) {
                ApplicationError::DuplicateKey(detail) if detail.contains("file_no") => {
                    return Err(ApplicationError::DuplicateKey(DUPLICATE_FILE_NO.to_string()));
                }
                ApplicationError::DuplicateKey(detail) => {
                    warn!(
                        "Reference number {} collided on insert (attempt {}): {}",
                        reference_no, attempt, detail
                    );
                }
                other => return Err(other),
            },
        }
    }

    Err(ApplicationError::Internal(format!(
        "no unique reference number after {} attempts",
        MAX_REFERENCE_ATTEMPTS
    )))
}

/// The application, if it exists and belongs to `owner`.
pub async fn get(
    store: &Store,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
) -> Result<ApplicationRecord, ApplicationError> {
    applications::find_owned_application(store.conn(), kind, id, owner)
        .await?
        .ok_or_else(|| ApplicationError::NotFound(NOT_FOUND.to_string()))
}

pub async fn list(
    store: &Store,
    kind: ApplicationKind,
    owner: i32,
) -> Result<Vec<ApplicationRecord>, ApplicationError> {
    Ok(applications::list_owned_applications(store.conn(), kind, owner).await?)
}

/// Explains why a pending-gated write touched no row.
async fn rejected_write(
    store: &Store,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
    message: &str,
) -> ApplicationError {
    match get(store, kind, id, owner).await {
        Ok(_) => ApplicationError::InvalidState(message.to_string()),
        Err(err) => err,
    }
}

/**
 * Apply a partial update to a pending application
 *
 * The pending check happens inside the UPDATE itself. A write that touches
 * no row is then classified by reading the row back: absent or foreign rows
 * are NotFound, anything else is no longer pending.
 *
 * # Returns
 * @return Result<(), ApplicationError> - InvalidState when not pending, NoOp when the patch is empty
 */
pub async fn update(
    store: &Store,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
    patch: ApplicationPatch,
) -> Result<(), ApplicationError> {
    const NOT_PENDING: &str = "Cannot update application that is not pending";

    validate_patch(kind, &patch)?;

    if patch.is_empty() {
        let current = get(store, kind, id, owner).await?;
        if !current.status.is_editable() {
            return Err(ApplicationError::InvalidState(NOT_PENDING.to_string()));
        }
        return Err(ApplicationError::NoOp("No valid fields to update".to_string()));
    }

    if patch.approved_plants.is_some() != patch.amount_per_plant.is_some() {
        // The other factor comes from the stored row; bound the product first.
        let current = get(store, kind, id, owner).await?;
        if !current.status.is_editable() {
            return Err(ApplicationError::InvalidState(NOT_PENDING.to_string()));
        }
        let mut errors = Vec::new();
        check_total(
            &mut errors,
            patch.approved_plants.unwrap_or(current.approved_plants),
            patch.amount_per_plant.unwrap_or(current.amount_per_plant),
        );
        if !errors.is_empty() {
            return Err(ApplicationError::Validation(errors));
        }
    }

    let written = applications::update_pending_application(store.conn(), kind, id, owner, &patch).await?;
    if written == 0 {
        return Err(rejected_write(store, kind, id, owner, NOT_PENDING).await);
    }
    info!("Updated {} application {}", kind, id);
    Ok(())
}

pub async fn delete(
    store: &Store,
    kind: ApplicationKind,
    id: i32,
    owner: i32,
) -> Result<(), ApplicationError> {
    let deleted = applications::delete_pending_application(store.conn(), kind, id, owner).await?;
    if deleted == 0 {
        return Err(rejected_write(
            store,
            kind,
            id,
            owner,
            "Cannot delete application that is not pending",
        )
        .await);
    }
    info!("Deleted {} application {}", kind, id);
    Ok(())
}

/**
 * Officer-side status change
 *
 * # Arguments
 * @param info: TransitionInfo - Target status and optional reference comments
 *
 * # Returns
 * @return Result<ApplicationRecord, ApplicationError> - The application after the change
 */
pub async fn transition(
    store: &Store,
    kind: ApplicationKind,
    id: i32,
    info: TransitionInfo,
) -> Result<ApplicationRecord, ApplicationError> {
    let next = info
        .status
        .parse::<ApplicationStatus>()
        .map_err(|e| ApplicationError::invalid_field("status", &e))?;

    let db = store.conn();
    let current = applications::find_application(db, kind, id)
        .await?
        .ok_or_else(|| ApplicationError::NotFound(NOT_FOUND.to_string()))?;

    if !current.status.can_transition_to(next) {
        let message = if current.status.is_terminal() {
            format!("Application is already {}", current.status)
        } else {
            format!("Cannot move application from {} to {}", current.status, next)
        };
        return Err(ApplicationError::InvalidState(message));
    }

    let comments = info.comments.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let moved =
        applications::transition_application_status(db, kind, id, current.status, next, comments)
            .await?;
    if moved == 0 {
        return Err(ApplicationError::InvalidState(
            "Application status changed concurrently".to_string(),
        ));
    }
    info!("{} application {} moved from {} to {}", kind, id, current.status, next);

    applications::find_application(db, kind, id)
        .await?
        .ok_or_else(|| ApplicationError::NotFound(NOT_FOUND.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use sltb_database::models::{planting_applications, reference_entries, replanting_applications};

    use super::*;

    fn info() -> SubmitApplicationInfo {
        SubmitApplicationInfo {
            file_no: Some("PL/2024/001".to_string()),
            owner_name: Some("K. Perera".to_string()),
            estate_name: Some("Hill Crest".to_string()),
            subsidy_type: Some("New Planting".to_string()),
            approved_extent: Some(Decimal::new(150, 2)),
            plants_per_ha: Some(4400),
            approved_plants: Some(6600),
            amount_per_plant: Some(Decimal::new(2550, 2)),
            ..Default::default()
        }
    }

    fn planting_row(id: i32, status: ApplicationStatus) -> planting_applications::Model {
        let now = Utc::now();
        planting_applications::Model {
            id,
            user_id: Some(7),
            file_no: "PL/2024/001".to_string(),
            owner_name: "K. Perera".to_string(),
            estate_name: "Hill Crest".to_string(),
            ti_range: None,
            division: None,
            field_no: None,
            plan_no: None,
            subsidy_type: "New Planting".to_string(),
            approved_extent: Decimal::new(150, 2),
            x1_coordinate: None,
            x2_coordinate: None,
            plants_per_ha: 4400,
            approved_plants: 6600,
            amount_per_plant: Decimal::new(2550, 2),
            total_approved_amount: Decimal::new(16830000, 2),
            status,
            reference_no: "SLTB-PLANT-12345678ABCDEFGH".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn reference_row(id: i32) -> reference_entries::Model {
        let now = Utc::now();
        reference_entries::Model {
            id: 1,
            reference_no: "SLTB-PLANT-12345678ABCDEFGH".to_string(),
            application_type: ApplicationKind::Planting,
            application_id: id,
            comments: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn no_rows() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }
    }

    #[tokio::test]
    async fn submission_computes_total_and_tags_reference() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<planting_applications::Model>::new()])
            .append_query_results([Vec::<reference_entries::Model>::new()])
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .append_query_results([vec![reference_row(1)]])
            .into_connection();
        let store = Store::from_connection(db);

        let submitted = submit(&store, ApplicationKind::Planting, 7, info()).await.unwrap();
        assert_eq!(submitted.id, 1);
        assert_eq!(submitted.total_approved_amount.to_string(), "168300.00");
        assert!(submitted.reference_no.starts_with("SLTB-PLANT-"));
    }

    #[tokio::test]
    async fn duplicate_file_no_is_rejected_before_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .into_connection();
        let store = Store::from_connection(db);

        let err = submit(&store, ApplicationKind::Planting, 7, info()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::DuplicateKey(ref m) if m == DUPLICATE_FILE_NO));
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_the_database() {
        let store = Store::from_connection(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let body = SubmitApplicationInfo {
            file_no: None,
            ..info()
        };
        let err = submit(&store, ApplicationKind::Planting, 7, body).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn update_of_approved_application_is_invalid_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([no_rows()])
            .append_query_results([vec![planting_row(1, ApplicationStatus::Approved)]])
            .into_connection();
        let store = Store::from_connection(db);
        let patch = ApplicationPatch {
            owner_name: Some("New Owner".to_string()),
            ..Default::default()
        };

        let err = update(&store, ApplicationKind::Planting, 1, 7, patch).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }

    #[tokio::test]
    async fn update_of_foreign_application_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([no_rows()])
            .append_query_results([Vec::<replanting_applications::Model>::new()])
            .into_connection();
        let store = Store::from_connection(db);
        let patch = ApplicationPatch {
            division: Some("Upper".to_string()),
            ..Default::default()
        };

        let err = update(&store, ApplicationKind::Replanting, 1, 99, patch).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn single_factor_patch_is_bounded_by_the_stored_factor() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .into_connection();
        let store = Store::from_connection(db);
        let patch = ApplicationPatch {
            amount_per_plant: Some(Decimal::new(9_999_999_999, 2)),
            ..Default::default()
        };

        let err = update(&store, ApplicationKind::Planting, 1, 7, patch).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(ref e) if e[0].field == "total_approved_amount"));
    }

    #[tokio::test]
    async fn single_factor_patch_within_bounds_is_written() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = Store::from_connection(db);
        let patch = ApplicationPatch {
            amount_per_plant: Some(Decimal::new(3000, 2)),
            ..Default::default()
        };

        assert!(update(&store, ApplicationKind::Planting, 1, 7, patch).await.is_ok());
    }

    #[tokio::test]
    async fn empty_patch_on_pending_application_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .into_connection();
        let store = Store::from_connection(db);

        let err = update(&store, ApplicationKind::Planting, 1, 7, ApplicationPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NoOp(_)));
    }

    #[tokio::test]
    async fn delete_of_processing_application_is_invalid_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([no_rows()])
            .append_query_results([vec![planting_row(1, ApplicationStatus::Processing)]])
            .into_connection();
        let store = Store::from_connection(db);

        let err = delete(&store, ApplicationKind::Planting, 1, 7).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(ref m) if m.contains("delete")));
    }

    #[tokio::test]
    async fn terminal_application_cannot_transition() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Rejected)]])
            .into_connection();
        let store = Store::from_connection(db);
        let request = TransitionInfo {
            status: "processing".to_string(),
            comments: None,
        };

        let err = transition(&store, ApplicationKind::Planting, 1, request).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }

    #[tokio::test]
    async fn unknown_target_status_is_a_validation_error() {
        let store = Store::from_connection(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let request = TransitionInfo {
            status: "archived".to_string(),
            comments: None,
        };

        let err = transition(&store, ApplicationKind::Planting, 1, request).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn pending_application_moves_to_processing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![planting_row(1, ApplicationStatus::Pending)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![planting_row(1, ApplicationStatus::Processing)]])
            .into_connection();
        let store = Store::from_connection(db);
        let request = TransitionInfo {
            status: "processing".to_string(),
            comments: None,
        };

        let record = transition(&store, ApplicationKind::Planting, 1, request).await.unwrap();
        assert_eq!(record.status, ApplicationStatus::Processing);
    }
}
