pub mod application;
pub mod auth;
pub mod lifecycle;
pub mod reference;
pub mod statistics;
pub mod tracking;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Submission body. Everything is optional at this stage so that missing
/// fields are reported per field instead of as a body parse failure.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SubmitApplicationInfo {
    pub file_no: Option<String>,
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

#[derive(Deserialize, Debug, Default)]
pub struct SearchInfo {
    #[serde(rename = "searchType", default)]
    pub search_type: String,
    #[serde(rename = "searchValue", default)]
    pub search_value: String,
}

#[derive(Deserialize, Debug)]
pub struct TransitionInfo {
    pub status: String,
    pub comments: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommentsInfo {
    pub comments: String,
}

/// Query string of the paged dashboard listing.
#[derive(Deserialize, Debug, Default)]
pub struct ApplicationsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SignUpInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct SignInInfo {
    pub email: String,
    pub password: String,
}
