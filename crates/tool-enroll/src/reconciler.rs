//! Enrollment of one student into the currently opened day.

use action_primitives::{ActionError, Locator, NodeHandle, RetryableAction};
use perceiver_roster::{canonicalize, AttendanceTableReader, RosterSnapshot};
use rosterbot_core_types::{FlowError, SiteLayout};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::model::{RegistrationOutcome, SpecialEnrollmentSet};
use crate::ports::Confirmer;

/// Registers students against the attendance view that is currently open.
///
/// Idempotence comes from reading the roster before and after every
/// submission, never from what the registration form appears to report.
pub struct EnrollmentReconciler {
    action: RetryableAction,
    roster: AttendanceTableReader,
    layout: SiteLayout,
    special: SpecialEnrollmentSet,
    confirmer: Arc<dyn Confirmer>,
}

impl EnrollmentReconciler {
    pub fn new(
        action: RetryableAction,
        roster: AttendanceTableReader,
        layout: SiteLayout,
        special: SpecialEnrollmentSet,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            action,
            roster,
            layout,
            special,
            confirmer,
        }
    }

    pub fn special(&self) -> &SpecialEnrollmentSet {
        &self.special
    }

    pub async fn register(&self, name: &str, program: &str, day: &str) -> RegistrationOutcome {
        let student = canonicalize(name);

        // 1. Already there?
        match self.current_roster().await {
            Ok(roster) if roster.contains(&student) => {
                info!(student = %student, program, day, "already enrolled");
                return RegistrationOutcome::AlreadyEnrolled;
            }
            Ok(_) => {}
            Err(err) => return RegistrationOutcome::Failed(err.to_string()),
        }

        // 2. Operator override for special names, before anything mutates.
        if self.special.contains(&student) {
            let prompt = format!(
                "{student} is on the special enrollment list. Enroll in {program} - {day}?"
            );
            if !self.confirmer.confirm(&prompt).await {
                info!(student = %student, program, day, "skipped by operator");
                return RegistrationOutcome::SkippedByOverride;
            }
        }

        // 3. Search, disambiguate and submit.
        info!(student = %student, program, day, "attempting to register");
        let candidate = match self.search(name, &student).await {
            Ok(candidates) => match candidates.as_slice() {
                [] => {
                    info!(student = %student, "no matching accounts found");
                    return RegistrationOutcome::NotFound;
                }
                [only] => only.clone(),
                many => {
                    warn!(
                        student = %student,
                        program,
                        day,
                        candidates = many.len(),
                        "multiple accounts found, select the correct one manually"
                    );
                    return RegistrationOutcome::AmbiguousMatch {
                        candidates: many.len(),
                    };
                }
            },
            Err(SearchError::NoResults) => return RegistrationOutcome::NotFound,
            Err(SearchError::Flow(err)) => return RegistrationOutcome::Failed(err.to_string()),
        };

        if let Err(err) = self.submit(&candidate).await {
            return RegistrationOutcome::Failed(err.to_string());
        }

        // 4. Verify by re-reading.
        match self.current_roster().await {
            Ok(roster) if roster.contains(&student) => {
                info!(student = %student, program, day, "successfully registered");
                RegistrationOutcome::Enrolled
            }
            Ok(_) => {
                warn!(student = %student, program, day, "student missing after submit");
                RegistrationOutcome::Failed("post-submit verification failed".to_string())
            }
            Err(err) => RegistrationOutcome::Failed(err.to_string()),
        }
    }

    /// Roster of the open day; a missing table reads as an empty roster.
    async fn current_roster(&self) -> Result<RosterSnapshot, FlowError> {
        match self.roster.read(self.action.timeouts().wait()).await {
            Ok((snapshot, _)) => Ok(snapshot),
            Err(FlowError::StructuralMismatch(what)) => {
                debug!(reason = %what, "no roster rendered, treating as empty");
                Ok(RosterSnapshot::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Type `typed` into the search field and keep the suggestions naming
    /// `student`.
    async fn search(&self, typed: &str, student: &str) -> Result<Vec<NodeHandle>, SearchError> {
        let timeouts = self.action.timeouts();
        let link = Locator::id(self.layout.register_link_id.clone());
        if !self.action.force_perform(&link, timeouts.wait()).await {
            return Err(SearchError::Flow(FlowError::action_exhausted(
                "registration link",
            )));
        }
        sleep(timeouts.after_action()).await;

        let input = Locator::id(self.layout.search_input_id.clone());
        self.action
            .enter_text(&input, typed, timeouts.wait())
            .await
            .map_err(|err| SearchError::Flow(err.into()))?;
        sleep(timeouts.after_action()).await;

        let list_locator = Locator::id(self.layout.candidate_list_id.clone());
        let list = match self
            .action
            .reader()
            .wait_present(&list_locator, timeouts.wait())
            .await
        {
            Ok(list) => list,
            Err(ActionError::WaitTimeout(_)) => return Err(SearchError::NoResults),
            Err(err) => return Err(SearchError::Flow(err.into())),
        };

        let driver = self.action.driver();
        let entries = driver
            .locate_all(&Locator::within(&list, self.layout.candidate_selector.clone()))
            .await
            .map_err(|err| SearchError::Flow(ActionError::from(err).into()))?;

        let wanted = student.to_lowercase();
        let mut matching = Vec::new();
        for entry in entries {
            match driver.read_text(&entry).await {
                Ok(text) if text.to_lowercase().contains(&wanted) => matching.push(entry),
                Ok(_) => {}
                Err(err) if err.is_transient() => {}
                Err(err) => return Err(SearchError::Flow(ActionError::from(err).into())),
            }
        }
        debug!(student, candidates = matching.len(), "search results");
        Ok(matching)
    }

    async fn submit(&self, candidate: &NodeHandle) -> Result<(), FlowError> {
        let timeouts = self.action.timeouts();
        if !self.action.force_perform_node(candidate).await {
            return Err(FlowError::action_exhausted("search result"));
        }
        sleep(timeouts.after_action()).await;

        let submit = Locator::css(self.layout.submit_selector.clone());
        if !self.action.force_perform(&submit, timeouts.wait()).await {
            return Err(FlowError::action_exhausted("add button"));
        }
        sleep(timeouts.after_submit()).await;
        Ok(())
    }
}

enum SearchError {
    NoResults,
    Flow(FlowError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ScriptedConfirmer;
    use action_primitives::{ActionTimeouts, DocumentReader};
    use club_sim::{AccountSpec, ClubSim, ClubSpec, Faults};
    use perceiver_roster::RosterRules;
    use std::time::Duration;

    /// Open `program/session/day` the way a user would.
    async fn open_day(action: &RetryableAction, ids: &[&str]) {
        for id in ids {
            assert!(
                action
                    .perform(&Locator::id(*id), Duration::from_millis(100))
                    .await,
                "click {id}"
            );
        }
    }

    fn reconciler(
        sim: &ClubSim,
        special: &[&str],
        confirmer: Arc<ScriptedConfirmer>,
    ) -> (EnrollmentReconciler, RetryableAction) {
        let action = RetryableAction::new(sim.driver(), ActionTimeouts::instant());
        let roster = AttendanceTableReader::new(
            DocumentReader::new(sim.driver(), Duration::from_millis(5)),
            SiteLayout::default(),
            RosterRules::default(),
        );
        let special = SpecialEnrollmentSet::new(special.iter().map(|s| s.to_string()));
        (
            EnrollmentReconciler::new(
                action.clone(),
                roster,
                SiteLayout::default(),
                special,
                confirmer,
            ),
            action,
        )
    }

    const MARCH_MONDAY: [&str; 4] = [
        "row_program_1",
        "row_session_12",
        "row_day_121",
        "attendance",
    ];

    #[tokio::test]
    async fn second_registration_is_a_no_op() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let (reconciler, action) = reconciler(&sim, &[], Arc::new(ScriptedConfirmer::always(true)));
        open_day(&action, &MARCH_MONDAY).await;

        assert_eq!(
            reconciler.register("Jane Doe", "Tennis", "Monday").await,
            RegistrationOutcome::Enrolled
        );
        assert_eq!(
            reconciler.register("Doe, Jane", "Tennis", "Monday").await,
            RegistrationOutcome::AlreadyEnrolled
        );
        assert_eq!(sim.submit_clicks(), 1);
        assert_eq!(sim.roster("121"), ["Doe, Jane"]);
    }

    #[tokio::test]
    async fn declined_override_mutates_nothing() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let confirmer = Arc::new(ScriptedConfirmer::new([false], true));
        let (reconciler, action) = reconciler(&sim, &["Jane Doe"], confirmer.clone());
        open_day(&action, &MARCH_MONDAY).await;
        sim.driver().clear_invocations();

        assert_eq!(
            reconciler.register("Jane Doe", "Tennis", "Monday").await,
            RegistrationOutcome::SkippedByOverride
        );
        assert!(sim.driver().invocations().is_empty());
        assert_eq!(confirmer.asked().len(), 1);
        assert!(confirmer.asked()[0].contains("Tennis - Monday"));
    }

    #[tokio::test]
    async fn accepted_override_enrolls() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let confirmer = Arc::new(ScriptedConfirmer::new([true], false));
        let (reconciler, action) = reconciler(&sim, &["Doe, Jane"], confirmer);
        open_day(&action, &MARCH_MONDAY).await;

        assert_eq!(
            reconciler.register("Jane Doe", "Tennis", "Monday").await,
            RegistrationOutcome::Enrolled
        );
    }

    #[tokio::test]
    async fn ambiguous_accounts_are_never_clicked() {
        let spec = ClubSpec::tennis().account(AccountSpec::new("Doe, Jane").note("Member #2"));
        let sim = ClubSim::new(spec);
        let (reconciler, action) = reconciler(&sim, &[], Arc::new(ScriptedConfirmer::always(true)));
        open_day(&action, &MARCH_MONDAY).await;
        sim.driver().clear_invocations();

        assert_eq!(
            reconciler.register("Jane Doe", "Tennis", "Monday").await,
            RegistrationOutcome::AmbiguousMatch { candidates: 2 }
        );
        let clicks = sim.driver().invocations();
        assert!(clicks
            .iter()
            .all(|click| click.element_id.as_deref() == Some("registerUserLink")));
        assert_eq!(sim.submit_clicks(), 0);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let (reconciler, action) = reconciler(&sim, &[], Arc::new(ScriptedConfirmer::always(true)));
        open_day(&action, &MARCH_MONDAY).await;

        assert_eq!(
            reconciler.register("Nobody Here", "Tennis", "Monday").await,
            RegistrationOutcome::NotFound
        );
        assert_eq!(sim.submit_clicks(), 0);
    }

    #[tokio::test]
    async fn search_field_receives_the_name_as_given() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let (reconciler, action) = reconciler(&sim, &[], Arc::new(ScriptedConfirmer::always(true)));
        open_day(&action, &MARCH_MONDAY).await;

        assert_eq!(
            reconciler.register("Jane  Doe", "Tennis", "Monday").await,
            RegistrationOutcome::NotFound
        );
        let typed = sim
            .driver()
            .edit(|doc| doc.by_id("userInput").map(|input| doc.value(input).to_string()));
        assert_eq!(typed.as_deref(), Some("Jane  Doe"));
    }

    #[tokio::test]
    async fn dropped_submission_fails_verification() {
        let sim = ClubSim::new(ClubSpec::tennis().faults(Faults {
            drop_submissions: true,
            ..Faults::default()
        }));
        let (reconciler, action) = reconciler(&sim, &[], Arc::new(ScriptedConfirmer::always(true)));
        open_day(&action, &MARCH_MONDAY).await;

        assert_eq!(
            reconciler.register("Jane Doe", "Tennis", "Monday").await,
            RegistrationOutcome::Failed("post-submit verification failed".to_string())
        );
        assert_eq!(sim.submit_clicks(), 1);
    }
}
