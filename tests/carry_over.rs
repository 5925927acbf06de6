//! The cross-month flow through the library entry point.

use action_primitives::ActionTimeouts;
use club_sim::{ClubSim, ClubSpec};
use rosterbot_cli::cli::run::execute;
use rosterbot_core_types::SiteLayout;
use rosterbot_scheduler::RunPolicy;
use std::sync::Arc;
use tool_enroll::{RegistrationOutcome, ScriptedConfirmer, SpecialEnrollmentSet};
use tree_navigator::AttendanceRetry;

fn policy() -> RunPolicy {
    RunPolicy {
        attendance: AttendanceRetry {
            attempts: 3,
            backoff_ms: 1,
        },
        ..RunPolicy::default()
    }
}

#[tokio::test]
async fn low_attendance_student_is_enrolled_exactly_once() {
    let sim = ClubSim::new(ClubSpec::tennis());
    let confirmer = Arc::new(ScriptedConfirmer::always(true));

    let summary = execute(
        sim.driver(),
        SiteLayout::default(),
        ActionTimeouts::instant(),
        policy(),
        SpecialEnrollmentSet::default(),
        confirmer.clone(),
    )
    .await
    .unwrap();

    let jane = summary.outcomes_for("Jane Doe");
    assert_eq!(jane.len(), 1);
    assert_eq!(jane[0].outcome, RegistrationOutcome::Enrolled);
    assert!(summary.outcomes_for("Sam Lee").is_empty());
    assert_eq!(sim.submit_clicks(), 1);
    assert_eq!(confirmer.asked().len(), 1);
}

#[tokio::test]
async fn second_run_finds_everyone_enrolled() {
    let sim = ClubSim::new(ClubSpec::tennis());
    for _ in 0..2 {
        execute(
            sim.driver(),
            SiteLayout::default(),
            ActionTimeouts::instant(),
            policy(),
            SpecialEnrollmentSet::default(),
            Arc::new(ScriptedConfirmer::always(true)),
        )
        .await
        .unwrap();
    }

    assert_eq!(sim.submit_clicks(), 1);
    assert_eq!(sim.roster("121"), ["Doe, Jane"]);
}
