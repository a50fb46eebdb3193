use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, IntoColumnRef, SimpleExpr};
use serde::{Deserialize, Serialize};

use super::{planting_applications, replanting_applications};
use crate::types::{ApplicationKind, ApplicationStatus};

/// Decimal places kept by every money column.
pub const MONEY_SCALE: u32 = 2;

/// Largest value of a `NUMERIC(10,2)` column (extent, amount per plant).
pub fn max_factor_amount() -> Decimal {
    Decimal::new(9_999_999_999, MONEY_SCALE)
}

/// Largest value of the `NUMERIC(12,2)` total column.
pub fn max_total_amount() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

/// Product of the two amount factors, at the precision of the amount columns.
/// `None` when the product does not fit a `Decimal`.
pub fn approved_total(approved_plants: i32, amount_per_plant: Decimal) -> Option<Decimal> {
    let mut total = Decimal::from(approved_plants)
        .checked_mul(amount_per_plant)?
        .round_dp(MONEY_SCALE);
    total.rescale(MONEY_SCALE);
    Some(total)
}

/// Kind-independent view of a row from either application table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApplicationRecord {
    pub application_type: ApplicationKind,
    pub id: i32,
    pub user_id: Option<i32>,
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
    pub status: ApplicationStatus,
    pub reference_no: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

macro_rules! record_from_model {
    ($module:ident, $kind:expr) => {
        impl From<$module::Model> for ApplicationRecord {
            fn from(model: $module::Model) -> Self {
                ApplicationRecord {
                    application_type: $kind,
                    id: model.id,
                    user_id: model.user_id,
                    file_no: model.file_no,
                    owner_name: model.owner_name,
                    estate_name: model.estate_name,
                    ti_range: model.ti_range,
                    division: model.division,
                    field_no: model.field_no,
                    plan_no: model.plan_no,
                    subsidy_type: model.subsidy_type,
                    approved_extent: model.approved_extent,
                    x1_coordinate: model.x1_coordinate,
                    x2_coordinate: model.x2_coordinate,
                    plants_per_ha: model.plants_per_ha,
                    approved_plants: model.approved_plants,
                    amount_per_plant: model.amount_per_plant,
                    total_approved_amount: model.total_approved_amount,
                    status: model.status,
                    reference_no: model.reference_no,
                    created_at: model.created_at,
                    updated_at: model.updated_at,
                }
            }
        }
    };
}

record_from_model!(planting_applications, ApplicationKind::Planting);
record_from_model!(replanting_applications, ApplicationKind::Replanting);

/// Validated submission payload. The total is not part of it: the store
/// always derives it from the two factors, which validation keeps within
/// the column bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewApplication {
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
}

impl NewApplication {
    pub fn total_approved_amount(&self) -> Option<Decimal> {
        approved_total(self.approved_plants, self.amount_per_plant)
    }
}

/// Owner-editable fields. Anything not listed here (id, owner, file number,
/// reference number, status, total) cannot be reached through an update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationPatch {
    pub owner_name: Option<String>,
    pub estate_name: Option<String>,
    pub ti_range: Option<String>,
    pub division: Option<String>,
    pub field_no: Option<String>,
    pub plan_no: Option<String>,
    #[serde(alias = "planting_type", alias = "replanting_type")]
    pub subsidy_type: Option<String>,
    pub approved_extent: Option<Decimal>,
    pub x1_coordinate: Option<String>,
    pub x2_coordinate: Option<String>,
    pub plants_per_ha: Option<i32>,
    pub approved_plants: Option<i32>,
    pub amount_per_plant: Option<Decimal>,
}

/// How `total_approved_amount` is rewritten by a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TotalAssignment {
    /// Both factors supplied.
    Factors(i32, Decimal),
    /// Only `amount_per_plant` supplied; the stored plant count is kept.
    StoredPlantsTimes(Decimal),
    /// Only `approved_plants` supplied; the stored amount per plant is kept.
    PlantsTimesStoredAmount(i32),
}

impl TotalAssignment {
    /// Right-hand side of `total_approved_amount = ...`, evaluated against the
    /// row being updated so the product is taken from the same snapshot the
    /// write applies to.
    pub fn into_expr<C: IntoColumnRef>(self, plants_column: C, amount_column: C) -> SimpleExpr {
        match self {
            TotalAssignment::Factors(plants, amount) => Expr::val(plants).mul(amount),
            TotalAssignment::StoredPlantsTimes(amount) => Expr::col(plants_column).mul(amount),
            TotalAssignment::PlantsTimesStoredAmount(plants) => {
                Expr::val(plants).mul(Expr::col(amount_column))
            }
        }
    }
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        *self == ApplicationPatch::default()
    }

    pub fn total_assignment(&self) -> Option<TotalAssignment> {
        match (self.approved_plants, self.amount_per_plant) {
            (Some(plants), Some(amount)) => Some(TotalAssignment::Factors(plants, amount)),
            (None, Some(amount)) => Some(TotalAssignment::StoredPlantsTimes(amount)),
            (Some(plants), None) => Some(TotalAssignment::PlantsTimesStoredAmount(plants)),
            (None, None) => None,
        }
    }
}

/// Columns that can be searched across both application tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchField {
    FileNo,
    OwnerName,
    EstateName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_product_of_factors() {
        let total = approved_total(6600, Decimal::new(2550, 2)).unwrap();
        assert_eq!(total, Decimal::new(16830000, 2));
        assert_eq!(total.to_string(), "168300.00");
        assert_eq!(approved_total(10, Decimal::new(255, 1)).unwrap().to_string(), "255.00");
    }

    #[test]
    fn overflowing_product_is_none() {
        assert_eq!(approved_total(i32::MAX, Decimal::MAX), None);
        let largest = approved_total(i32::MAX, max_factor_amount()).unwrap();
        assert!(largest > max_total_amount());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ApplicationPatch::default().is_empty());
        let patch = ApplicationPatch {
            division: Some("Division 3".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn amount_only_patch_keeps_stored_plant_count() {
        let patch = ApplicationPatch {
            amount_per_plant: Some(Decimal::new(3000, 2)),
            ..Default::default()
        };
        assert_eq!(
            patch.total_assignment(),
            Some(TotalAssignment::StoredPlantsTimes(Decimal::new(3000, 2)))
        );
    }

    #[test]
    fn both_factors_fix_the_total() {
        let patch = ApplicationPatch {
            approved_plants: Some(100),
            amount_per_plant: Some(Decimal::new(1250, 2)),
            ..Default::default()
        };
        assert_eq!(
            patch.total_assignment(),
            Some(TotalAssignment::Factors(100, Decimal::new(1250, 2)))
        );
    }

    #[test]
    fn unrelated_patch_leaves_total_alone() {
        let patch = ApplicationPatch {
            owner_name: Some("New Owner".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.total_assignment(), None);
    }

    #[test]
    fn immutable_keys_are_dropped_on_deserialize() {
        let patch: ApplicationPatch = serde_json::from_str(
            r#"{"id": 9, "file_no": "X", "reference_no": "Y", "status": "approved", "planting_type": "Infill"}"#,
        )
        .unwrap();
        assert_eq!(
            patch,
            ApplicationPatch {
                subsidy_type: Some("Infill".to_string()),
                ..Default::default()
            }
        );
    }
}
