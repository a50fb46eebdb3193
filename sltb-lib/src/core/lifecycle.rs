use chrono::{DateTime, Utc};
use serde::Serialize;
use sltb_database::types::ApplicationStatus;

/// Transition rules of the application status.
///
/// ```text
/// pending -> processing | approved | rejected
/// processing -> approved | rejected
/// approved, rejected: terminal
/// ```
pub trait ApplicationLifecycle {
    /// Owners may edit or delete only while this holds.
    fn is_editable(&self) -> bool;
    fn is_terminal(&self) -> bool;
    fn can_transition_to(&self, next: ApplicationStatus) -> bool;
}

impl ApplicationLifecycle for ApplicationStatus {
    fn is_editable(&self) -> bool {
        *self == ApplicationStatus::Pending
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (*self, next),
            (Pending, Processing) | (Pending, Approved) | (Pending, Rejected)
                | (Processing, Approved) | (Processing, Rejected)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineStage {
    pub status: ApplicationStatus,
    pub description: &'static str,
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
}

fn stage_description(stage: ApplicationStatus) -> &'static str {
    match stage {
        ApplicationStatus::Pending => "Application submitted and under review",
        ApplicationStatus::Processing => "Application is being processed by SLTB officers",
        ApplicationStatus::Approved => "Application has been approved",
        ApplicationStatus::Rejected => "Application has been rejected",
    }
}

/// Derives the four display stages from the current status alone.
///
/// There is no transition log: only the submission date and the date of the
/// latest change (`updated_at`) are known, so earlier intermediate stages
/// carry no date.
pub fn status_timeline(
    status: ApplicationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Vec<TimelineStage> {
    ApplicationStatus::ALL
        .into_iter()
        .map(|stage| {
            let completed = match stage {
                ApplicationStatus::Pending => true,
                ApplicationStatus::Processing => status != ApplicationStatus::Pending,
                ApplicationStatus::Approved | ApplicationStatus::Rejected => status == stage,
            };
            let date = match stage {
                ApplicationStatus::Pending => Some(created_at),
                _ if stage == status => Some(updated_at),
                _ => None,
            };
            TimelineStage {
                status: stage,
                description: stage_description(stage),
                date,
                completed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn only_pending_is_editable() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.is_editable(), status == ApplicationStatus::Pending);
        }
    }

    #[test]
    fn terminal_states_have_no_way_out() {
        for from in [ApplicationStatus::Approved, ApplicationStatus::Rejected] {
            assert!(from.is_terminal());
            for to in ApplicationStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn processing_cannot_go_back_to_pending() {
        assert!(!ApplicationStatus::Processing.can_transition_to(ApplicationStatus::Pending));
        assert!(ApplicationStatus::Processing.can_transition_to(ApplicationStatus::Approved));
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Pending));
    }

    #[test]
    fn fresh_application_completes_only_pending_stage() {
        let now = Utc::now();
        let timeline = status_timeline(ApplicationStatus::Pending, now, now);
        let completed: Vec<bool> = timeline.iter().map(|stage| stage.completed).collect();
        assert_eq!(completed, vec![true, false, false, false]);
        assert_eq!(timeline[0].date, Some(now));
        assert!(timeline[1..].iter().all(|stage| stage.date.is_none()));
    }

    #[test]
    fn approved_application_dates_last_change() {
        let created = Utc::now() - Duration::days(10);
        let updated = Utc::now();
        let timeline = status_timeline(ApplicationStatus::Approved, created, updated);

        assert!(timeline[0].completed && timeline[1].completed && timeline[2].completed);
        assert!(!timeline[3].completed);
        assert_eq!(timeline[1].date, None);
        assert_eq!(timeline[2].date, Some(updated));
        assert_eq!(timeline[2].description, "Application has been approved");
    }

    #[test]
    fn rejected_application_skips_approved_stage() {
        let now = Utc::now();
        let timeline = status_timeline(ApplicationStatus::Rejected, now, now);
        assert!(timeline[1].completed);
        assert!(!timeline[2].completed);
        assert!(timeline[3].completed);
    }
}
