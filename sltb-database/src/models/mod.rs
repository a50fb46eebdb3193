pub mod applications;
pub mod planting_applications;
pub mod reference_entries;
pub mod replanting_applications;
pub mod users;

pub use crate::types::{ApplicationKind, ApplicationStatus, UserRole, UserStatus};
