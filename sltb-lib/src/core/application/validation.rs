use rust_decimal::Decimal;
use sltb_database::models::applications::{
    approved_total, max_factor_amount, max_total_amount, ApplicationPatch, NewApplication, MONEY_SCALE,
};
use sltb_database::types::ApplicationKind;

use crate::core::SubmitApplicationInfo;
use crate::error::{ApplicationError, FieldError};

fn subsidy_type_field(kind: ApplicationKind) -> (&'static str, &'static str) {
    match kind {
        ApplicationKind::Planting => ("planting_type", "Planting type is required"),
        ApplicationKind::Replanting => ("replanting_type", "Replanting type is required"),
    }
}

fn required_text(
    errors: &mut Vec<FieldError>,
    field: &str,
    message: &str,
    value: Option<String>,
) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(FieldError::new(field, message));
            String::new()
        }
    }
}

/// Sign, precision and column-range rules shared by every money factor.
fn money_error(label: &str, value: Decimal) -> Option<String> {
    if value.is_sign_negative() {
        Some(format!("{} must be a positive number", label))
    } else if value.normalize().scale() > MONEY_SCALE {
        Some(format!("{} must have at most 2 decimal places", label))
    } else if value > max_factor_amount() {
        Some(format!("{} must not exceed {}", label, max_factor_amount()))
    } else {
        None
    }
}

fn money(errors: &mut Vec<FieldError>, field: &str, label: &str, value: Option<Decimal>) -> Decimal {
    match value {
        Some(v) => match money_error(label, v) {
            None => v,
            Some(message) => {
                errors.push(FieldError::new(field, &message));
                Decimal::ZERO
            }
        },
        None => {
            errors.push(FieldError::new(field, &format!("{} must be a positive number", label)));
            Decimal::ZERO
        }
    }
}

/// The total column bound, checked once both factors are known.
pub fn check_total(errors: &mut Vec<FieldError>, approved_plants: i32, amount_per_plant: Decimal) {
    let fits = approved_total(approved_plants, amount_per_plant)
        .map_or(false, |total| total <= max_total_amount());
    if !fits {
        errors.push(FieldError::new(
            "total_approved_amount",
            &format!("Total approved amount must not exceed {}", max_total_amount()),
        ));
    }
}

fn at_least(errors: &mut Vec<FieldError>, field: &str, message: &str, value: Option<i32>, min: i32) -> i32 {
    match value {
        Some(v) if v >= min => v,
        _ => {
            errors.push(FieldError::new(field, message));
            0
        }
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SubmitApplicationInfo {
    /// Checks every field and reports all failures at once.
    pub fn validate(self, kind: ApplicationKind) -> Result<NewApplication, ApplicationError> {
        let mut errors = Vec::new();
        let (type_field, type_message) = subsidy_type_field(kind);

        let application = NewApplication {
            file_no: required_text(&mut errors, "file_no", "File number is required", self.file_no),
            owner_name: required_text(&mut errors, "owner_name", "Owner name is required", self.owner_name),
            estate_name: required_text(&mut errors, "estate_name", "Estate name is required", self.estate_name),
            ti_range: optional_text(self.ti_range),
            division: optional_text(self.division),
            field_no: optional_text(self.field_no),
            plan_no: optional_text(self.plan_no),
            subsidy_type: required_text(&mut errors, type_field, type_message, self.subsidy_type),
            approved_extent: money(&mut errors, "approved_extent", "Approved extent", self.approved_extent),
            x1_coordinate: optional_text(self.x1_coordinate),
            x2_coordinate: optional_text(self.x2_coordinate),
            plants_per_ha: at_least(
                &mut errors,
                "plants_per_ha",
                "Plants per hectare must be a positive integer",
                self.plants_per_ha,
                1,
            ),
            approved_plants: at_least(
                &mut errors,
                "approved_plants",
                "Approved plants must be zero or more",
                self.approved_plants,
                0,
            ),
            amount_per_plant: money(&mut errors, "amount_per_plant", "Amount per plant", self.amount_per_plant),
        };

        if errors.is_empty() {
            check_total(&mut errors, application.approved_plants, application.amount_per_plant);
        }
        if errors.is_empty() {
            Ok(application)
        } else {
            Err(ApplicationError::Validation(errors))
        }
    }
}

/// Applies the submission rules to the fields a patch actually carries.
pub fn validate_patch(kind: ApplicationKind, patch: &ApplicationPatch) -> Result<(), ApplicationError> {
    let mut errors = Vec::new();
    let (type_field, _) = subsidy_type_field(kind);

    let text_fields = [
        ("owner_name", "Owner name cannot be empty", &patch.owner_name),
        ("estate_name", "Estate name cannot be empty", &patch.estate_name),
        (type_field, "Subsidy type cannot be empty", &patch.subsidy_type),
    ];
    for (field, message, value) in text_fields {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            errors.push(FieldError::new(field, message));
        }
    }
    let factors = [
        ("approved_extent", "Approved extent", patch.approved_extent),
        ("amount_per_plant", "Amount per plant", patch.amount_per_plant),
    ];
    for (field, label, value) in factors {
        if let Some(message) = value.and_then(|v| money_error(label, v)) {
            errors.push(FieldError::new(field, &message));
        }
    }
    if matches!(patch.plants_per_ha, Some(v) if v < 1) {
        errors.push(FieldError::new("plants_per_ha", "Plants per hectare must be a positive integer"));
    }
    if matches!(patch.approved_plants, Some(v) if v < 0) {
        errors.push(FieldError::new("approved_plants", "Approved plants must be zero or more"));
    }
    if errors.is_empty() {
        if let (Some(plants), Some(amount)) = (patch.approved_plants, patch.amount_per_plant) {
            check_total(&mut errors, plants, amount);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApplicationError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> SubmitApplicationInfo {
        serde_json::from_value(serde_json::json!({
            "file_no": "PL/2024/001",
            "owner_name": "K. Perera",
            "estate_name": "Hill Crest",
            "planting_type": "New Planting",
            "approved_extent": 1.5,
            "plants_per_ha": 4400,
            "approved_plants": 6600,
            "amount_per_plant": 25.50
        }))
        .unwrap()
    }

    #[test]
    fn complete_submission_passes() {
        let application = complete().validate(ApplicationKind::Planting).unwrap();
        assert_eq!(application.subsidy_type, "New Planting");
        assert_eq!(application.total_approved_amount().unwrap().to_string(), "168300.00");
        assert_eq!(application.division, None);
    }

    #[test]
    fn every_missing_field_is_reported() {
        let err = SubmitApplicationInfo::default()
            .validate(ApplicationKind::Replanting)
            .unwrap_err();
        let ApplicationError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "file_no",
                "owner_name",
                "estate_name",
                "replanting_type",
                "approved_extent",
                "plants_per_ha",
                "approved_plants",
                "amount_per_plant"
            ]
        );
    }

    #[test]
    fn blank_text_is_rejected() {
        let info = SubmitApplicationInfo {
            owner_name: Some("   ".to_string()),
            ..complete()
        };
        assert!(matches!(
            info.validate(ApplicationKind::Planting),
            Err(ApplicationError::Validation(errors)) if errors[0].field == "owner_name"
        ));
    }

    #[test]
    fn zero_plants_per_hectare_is_rejected() {
        let info = SubmitApplicationInfo {
            plants_per_ha: Some(0),
            ..complete()
        };
        assert!(info.validate(ApplicationKind::Planting).is_err());
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert!(validate_patch(ApplicationKind::Planting, &ApplicationPatch::default()).is_ok());

        let patch = ApplicationPatch {
            amount_per_plant: Some(Decimal::new(-1, 0)),
            estate_name: Some(String::new()),
            ..Default::default()
        };
        let Err(ApplicationError::Validation(errors)) = validate_patch(ApplicationKind::Planting, &patch) else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 2);
    }

    fn field_errors(result: Result<NewApplication, ApplicationError>) -> Vec<String> {
        match result {
            Err(ApplicationError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn amounts_beyond_two_decimals_are_rejected() {
        let info = SubmitApplicationInfo {
            amount_per_plant: Some("25.555".parse().unwrap()),
            ..complete()
        };
        assert_eq!(field_errors(info.validate(ApplicationKind::Planting)), vec!["amount_per_plant"]);

        let trailing_zero = SubmitApplicationInfo {
            amount_per_plant: Some("25.500".parse().unwrap()),
            ..complete()
        };
        let application = trailing_zero.validate(ApplicationKind::Planting).unwrap();
        assert_eq!(
            application.total_approved_amount(),
            approved_total(6600, Decimal::new(2550, 2))
        );
    }

    #[test]
    fn amounts_beyond_the_column_range_are_rejected() {
        let info = SubmitApplicationInfo {
            approved_plants: Some(i32::MAX),
            amount_per_plant: Some("79228162514264337593543950".parse().unwrap()),
            approved_extent: Some(Decimal::new(10_000_000_000, 2)),
            ..complete()
        };
        assert_eq!(
            field_errors(info.validate(ApplicationKind::Planting)),
            vec!["approved_extent", "amount_per_plant"]
        );
    }

    #[test]
    fn total_beyond_the_column_range_is_rejected() {
        let info = SubmitApplicationInfo {
            approved_plants: Some(200_000_000),
            amount_per_plant: Some(Decimal::new(5000, 2)),
            ..complete()
        };
        assert_eq!(
            field_errors(info.validate(ApplicationKind::Planting)),
            vec!["total_approved_amount"]
        );

        let largest = SubmitApplicationInfo {
            approved_plants: Some(100),
            amount_per_plant: Some(Decimal::new(9_999_999_999, 2)),
            ..complete()
        };
        assert!(largest.validate(ApplicationKind::Planting).is_ok());
    }

    #[test]
    fn patch_amounts_follow_the_same_bounds() {
        let precise = ApplicationPatch {
            amount_per_plant: Some("25.555".parse().unwrap()),
            ..Default::default()
        };
        assert!(validate_patch(ApplicationKind::Planting, &precise).is_err());

        let too_large = ApplicationPatch {
            approved_plants: Some(i32::MAX),
            amount_per_plant: Some(Decimal::new(9_999_999_999, 2)),
            ..Default::default()
        };
        let Err(ApplicationError::Validation(errors)) = validate_patch(ApplicationKind::Planting, &too_large) else {
            panic!("expected validation errors");
        };
        assert_eq!(errors[0].field, "total_approved_amount");
    }
}
