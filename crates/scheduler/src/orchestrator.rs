//! The cross-month run: learn from the previous period, act on the current.

use action_primitives::{ActionTimeouts, DocumentReader, Driver, RetryableAction};
use perceiver_roster::{AttendanceTableReader, RosterAlert, RosterSnapshot};
use rosterbot_core_types::{FlowError, Node, SiteLayout, SkipReason, Step};
use std::sync::Arc;
use tool_enroll::{Confirmer, EnrollmentReconciler, RegistrationOutcome, SpecialEnrollmentSet};
use tracing::{debug, info, warn};
use tree_navigator::NavigationController;

use crate::model::{Alert, OutcomeRecord, ProgramSummary, RunSummary};
use crate::policy::{CarryOver, RunPolicy};

/// Drives one complete run over every program of the tree.
pub struct CrossMonthScheduler {
    navigator: NavigationController,
    roster: AttendanceTableReader,
    reconciler: EnrollmentReconciler,
    confirmer: Arc<dyn Confirmer>,
    policy: RunPolicy,
    timeouts: ActionTimeouts,
}

impl CrossMonthScheduler {
    pub fn new(
        driver: Arc<dyn Driver>,
        layout: SiteLayout,
        timeouts: ActionTimeouts,
        policy: RunPolicy,
        special: SpecialEnrollmentSet,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let action = RetryableAction::new(driver.clone(), timeouts.clone());
        let roster = AttendanceTableReader::new(
            DocumentReader::new(driver, timeouts.poll()),
            layout.clone(),
            policy.roster_rules(&layout),
        );
        let navigator =
            NavigationController::new(action.clone(), layout.clone(), policy.attendance.clone());
        let reconciler = EnrollmentReconciler::new(
            action,
            roster.clone(),
            layout,
            special,
            confirmer.clone(),
        );
        Self {
            navigator,
            roster,
            reconciler,
            confirmer,
            policy,
            timeouts,
        }
    }

    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    /// Process every program. Only an unreachable starting document is
    /// returned as an error; everything else lands in the summary.
    pub async fn run(&self) -> Result<RunSummary, FlowError> {
        let programs = self.navigator.list_programs().await?;
        info!(
            programs = programs.len(),
            special = self.reconciler.special().len(),
            carry_over = ?self.policy.carry_over,
            "run started"
        );

        let mut summary = RunSummary::default();
        for program in &programs {
            summary = self.run_program(program, summary).await;
        }

        info!(
            enrolled = summary.enrolled_count(),
            failed = summary.failed_count(),
            alerts = summary.alerts.len(),
            "run finished"
        );
        Ok(summary)
    }

    async fn run_program(&self, program: &Node, mut summary: RunSummary) -> RunSummary {
        info!(program = %program.label, "processing program");
        let index = summary.programs.len();
        summary.programs.push(ProgramSummary::new(&program.label));

        let periods = match self.navigator.enter_program(program).await {
            Step::Ok(periods) => periods,
            Step::Skip(reason) => {
                info!(program = %program.label, reason = %reason, "program skipped");
                summary.programs[index].skipped = Some(reason.to_string());
                return summary;
            }
            Step::Fail(err) => {
                warn!(program = %program.label, error = %err, "program could not be entered");
                summary.programs[index].skipped = Some(err.to_string());
                summary.alerts.push(step_failed(program, None, &err));
                return summary;
            }
        };
        info!(
            program = %program.label,
            previous = %periods.previous.label,
            current = %periods.current.label,
            "periods resolved"
        );

        // Previous period: collect worklists.
        let previous_days = match self
            .enter_period(program, &periods.previous, &mut summary)
            .await
        {
            Some(days) => days,
            None => return summary,
        };
        for day in &previous_days {
            summary = self.collect_day(program, day, index, summary).await;
            if !self.return_to(program, &mut summary).await {
                return summary;
            }
        }

        // Current period: enroll by matching day label.
        let current_days = match self
            .enter_period(program, &periods.current, &mut summary)
            .await
        {
            Some(days) => days,
            None => return summary,
        };
        let current_labels: Vec<String> = current_days.iter().map(|d| d.label.clone()).collect();
        let unmatched: Vec<String> = summary.programs[index]
            .worklists
            .iter()
            .filter(|w| !w.names.is_empty() && !current_labels.contains(&w.day))
            .map(|w| w.day.clone())
            .collect();
        if !unmatched.is_empty() {
            warn!(
                program = %program.label,
                previous = ?summary.programs[index].day_labels(),
                current = ?current_labels,
                "day labels differ between periods, unmatched worklists are not carried over"
            );
            summary.alerts.push(Alert::DayLabelMismatch {
                program: program.label.clone(),
                unmatched,
                current: current_labels,
            });
        }

        for day in &current_days {
            summary = self.enroll_day(program, day, index, summary).await;
            if !self.return_to(program, &mut summary).await {
                return summary;
            }
        }
        summary
    }

    async fn enter_period(
        &self,
        program: &Node,
        session: &Node,
        summary: &mut RunSummary,
    ) -> Option<Vec<Node>> {
        match self.navigator.enter_session(session).await {
            Step::Ok(days) => {
                debug!(session = %session.label, days = days.len(), "session entered");
                Some(days)
            }
            Step::Skip(reason) => {
                info!(session = %session.label, reason = %reason, "session skipped");
                None
            }
            Step::Fail(err) => {
                warn!(session = %session.label, error = %err, "session could not be entered");
                summary.alerts.push(step_failed(program, None, &err));
                None
            }
        }
    }

    /// Re-select the program so the tree is in a known state for the next day.
    async fn return_to(&self, program: &Node, summary: &mut RunSummary) -> bool {
        match self.navigator.select(program).await {
            Step::Ok(()) => true,
            Step::Skip(_) => true,
            Step::Fail(err) => {
                warn!(program = %program.label, error = %err, "lost the program selection");
                summary.alerts.push(step_failed(program, None, &err));
                false
            }
        }
    }

    /// Select a day and open its attendance view.
    async fn open_day(&self, day: &Node) -> Step<()> {
        match self.navigator.select(day).await {
            Step::Ok(()) => self.navigator.open_attendance(day).await,
            other => other,
        }
    }

    async fn collect_day(
        &self,
        program: &Node,
        day: &Node,
        index: usize,
        mut summary: RunSummary,
    ) -> RunSummary {
        info!(program = %program.label, day = %day.label, "reading previous roster");
        if let Step::Fail(err) = self.open_day(day).await {
            summary.alerts.push(step_failed(program, Some(day), &err));
            return summary;
        }

        let (snapshot, alert) = match self.roster.read(self.timeouts.wait()).await {
            Ok(read) => read,
            Err(FlowError::StructuralMismatch(what)) => {
                info!(day = %day.label, reason = %what, "no attendance data found");
                (RosterSnapshot::default(), RosterAlert::default())
            }
            Err(err) => {
                warn!(day = %day.label, error = %err, "roster could not be read");
                summary.alerts.push(step_failed(program, Some(day), &err));
                return summary;
            }
        };
        debug!(
            day = %day.label,
            students = snapshot.student_count(),
            truncated = snapshot.truncated,
            "roster read"
        );

        if !alert.waitlist.is_empty() {
            warn!(
                program = %program.label,
                day = %day.label,
                count = alert.waitlist.len(),
                students = ?alert.waitlist,
                "students on the waitlist, consider enrolling them if there is space available"
            );
            summary.alerts.push(Alert::Waitlist {
                program: program.label.clone(),
                day: day.label.clone(),
                names: alert.waitlist.clone(),
            });
        }

        let mut queued = Vec::new();
        // Full roster: every regular student in table order, whatever the
        // low-attendance answer.
        if self.policy.carry_over == CarryOver::FullRoster {
            queued.extend(snapshot.regular().map(|s| s.canonical_name.clone()));
        }

        for low in &alert.low_attendance {
            let phone = low.phone_or_unavailable();
            let prompt = format!(
                "Low attendance in {program} - {day}\nStudent: {name}\nPhone: {phone}\nPresent: {present} out of {slots} sessions\nRe-enroll this student for the next period?",
                program = program.label,
                day = day.label,
                name = low.name,
                present = low.present_count,
                slots = low.tracked_slots,
            );
            let re_enroll = self.confirmer.confirm(&prompt).await;
            info!(student = %low.name, re_enroll, "low attendance reviewed");
            summary.alerts.push(Alert::LowAttendance {
                program: program.label.clone(),
                day: day.label.clone(),
                student: low.name.clone(),
                phone: phone.to_string(),
                present: low.present_count,
                slots: low.tracked_slots,
                re_enroll,
            });
            if re_enroll {
                queued.push(low.name.clone());
            }
        }

        if !queued.is_empty() {
            let worklist = summary.programs[index].worklist_mut(&day.label);
            for name in &queued {
                worklist.push_unique(name);
            }
            info!(day = %day.label, students = ?worklist.names, "queued for the current period");
        }
        summary
    }

    async fn enroll_day(
        &self,
        program: &Node,
        day: &Node,
        index: usize,
        mut summary: RunSummary,
    ) -> RunSummary {
        let names = match summary.programs[index].worklist(&day.label) {
            Some(worklist) if !worklist.names.is_empty() => worklist.names.clone(),
            _ => {
                let reason = SkipReason::NoWorklist {
                    day: day.label.clone(),
                };
                debug!(reason = %reason, "day skipped");
                return summary;
            }
        };

        info!(program = %program.label, day = %day.label, students = names.len(), "enrolling");
        if let Step::Fail(err) = self.open_day(day).await {
            summary.alerts.push(step_failed(program, Some(day), &err));
            for name in names {
                summary.outcomes.push(OutcomeRecord {
                    program: program.label.clone(),
                    day: day.label.clone(),
                    student: name,
                    outcome: RegistrationOutcome::Failed(err.to_string()),
                });
            }
            return summary;
        }

        for name in names {
            let outcome = self
                .reconciler
                .register(&name, &program.label, &day.label)
                .await;
            info!(
                "{} {} - {} - {}: {}",
                outcome.marker(),
                program.label,
                day.label,
                name,
                outcome
            );
            if let RegistrationOutcome::AmbiguousMatch { candidates } = outcome {
                summary.alerts.push(Alert::AmbiguousMatch {
                    program: program.label.clone(),
                    day: day.label.clone(),
                    student: name.clone(),
                    candidates,
                });
            }
            summary.outcomes.push(OutcomeRecord {
                program: program.label.clone(),
                day: day.label.clone(),
                student: name,
                outcome,
            });
        }
        summary
    }
}

fn step_failed(program: &Node, day: Option<&Node>, err: &FlowError) -> Alert {
    Alert::StepFailed {
        program: program.label.clone(),
        day: day.map(|d| d.label.clone()),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_sim::{ClubSim, ClubSpec, Faults};
    use tool_enroll::ScriptedConfirmer;
    use tree_navigator::AttendanceRetry;

    fn fast_policy() -> RunPolicy {
        RunPolicy {
            attendance: AttendanceRetry {
                attempts: 3,
                backoff_ms: 1,
            },
            ..RunPolicy::default()
        }
    }

    fn scheduler(
        sim: &ClubSim,
        policy: RunPolicy,
        special: &[&str],
        confirmer: Arc<ScriptedConfirmer>,
    ) -> CrossMonthScheduler {
        CrossMonthScheduler::new(
            sim.driver(),
            SiteLayout::default(),
            ActionTimeouts::instant(),
            policy,
            SpecialEnrollmentSet::new(special.iter().map(|s| s.to_string())),
            confirmer,
        )
    }

    #[tokio::test]
    async fn confirmed_low_attendance_is_carried_over_once() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let confirmer = Arc::new(ScriptedConfirmer::always(true));
        let scheduler = scheduler(&sim, fast_policy(), &[], confirmer.clone());

        let summary = scheduler.run().await.unwrap();

        assert_eq!(summary.worklist("Tennis", "Monday"), Some(&["Jane Doe".to_string()][..]));
        let jane = summary.outcomes_for("Jane Doe");
        assert_eq!(jane.len(), 1);
        assert_eq!(jane[0].outcome, RegistrationOutcome::Enrolled);
        assert!(summary.outcomes_for("Sam Lee").is_empty());
        assert_eq!(sim.roster("121"), ["Doe, Jane"]);
        assert_eq!(sim.submit_clicks(), 1);

        let asked = confirmer.asked();
        assert_eq!(asked.len(), 1);
        assert!(asked[0].contains("Phone: No phone number available"));
        assert!(asked[0].contains("Present: 1 out of 4 sessions"));
    }

    #[tokio::test]
    async fn declined_low_attendance_queues_nothing() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let scheduler = scheduler(
            &sim,
            fast_policy(),
            &[],
            Arc::new(ScriptedConfirmer::always(false)),
        );

        let summary = scheduler.run().await.unwrap();

        assert_eq!(summary.worklist("Tennis", "Monday"), None);
        assert!(summary.outcomes.is_empty());
        assert_eq!(sim.submit_clicks(), 0);
        assert!(summary.alerts.iter().any(|a| matches!(
            a,
            Alert::LowAttendance { re_enroll: false, .. }
        )));
    }

    #[tokio::test]
    async fn full_roster_carries_everyone_over() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let policy = RunPolicy {
            carry_over: CarryOver::FullRoster,
            ..fast_policy()
        };
        let scheduler = scheduler(&sim, policy, &[], Arc::new(ScriptedConfirmer::always(true)));

        let summary = scheduler.run().await.unwrap();

        assert_eq!(
            summary.worklist("Tennis", "Monday"),
            Some(&["Jane Doe".to_string(), "Sam Lee".to_string()][..])
        );
        assert_eq!(summary.enrolled_count(), 2);
    }

    #[tokio::test]
    async fn full_roster_keeps_declined_low_attendance() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let policy = RunPolicy {
            carry_over: CarryOver::FullRoster,
            ..fast_policy()
        };
        let scheduler = scheduler(&sim, policy, &[], Arc::new(ScriptedConfirmer::always(false)));

        let summary = scheduler.run().await.unwrap();

        assert_eq!(
            summary.worklist("Tennis", "Monday"),
            Some(&["Jane Doe".to_string(), "Sam Lee".to_string()][..])
        );
        assert!(summary.alerts.iter().any(|a| matches!(
            a,
            Alert::LowAttendance { re_enroll: false, .. }
        )));
        assert_eq!(sim.roster("121"), ["Doe, Jane", "Lee, Sam"]);
    }

    #[tokio::test]
    async fn hidden_session_list_fails_only_that_program() {
        let sim = ClubSim::new(ClubSpec::sample().faults(Faults {
            hidden_programs: vec!["1".to_string()],
            ..Faults::default()
        }));
        let scheduler = scheduler(
            &sim,
            fast_policy(),
            &[],
            Arc::new(ScriptedConfirmer::always(true)),
        );

        let summary = scheduler.run().await.unwrap();

        let tennis = summary.program("Tennis").unwrap();
        assert!(tennis.skipped.is_some());
        assert!(tennis.worklists.is_empty());
        assert!(summary.alerts.iter().any(|a| matches!(
            a,
            Alert::StepFailed { program, day: None, .. } if program == "Tennis"
        )));
        assert!(summary.outcomes_for("Jane Doe").is_empty());

        assert_eq!(summary.programs.len(), 3);
        assert_eq!(
            summary.worklist("Pickleball", "Tuesday"),
            Some(&["Lou Stone".to_string()][..])
        );
        assert!(summary.alerts.iter().any(|a| matches!(
            a,
            Alert::DayLabelMismatch { program, .. } if program == "Pickleball"
        )));
    }

    #[tokio::test]
    async fn sample_club_reports_every_outcome() {
        let sim = ClubSim::new(ClubSpec::sample());
        let scheduler = scheduler(
            &sim,
            fast_policy(),
            &[],
            Arc::new(ScriptedConfirmer::always(true)),
        );

        let summary = scheduler.run().await.unwrap();

        assert_eq!(summary.programs.len(), 3);
        let swim = summary.program("Swim").unwrap();
        assert!(swim.skipped.as_deref().unwrap().contains("no previous period"));

        assert_eq!(
            summary.worklist("Tennis", "Monday"),
            Some(&["Jane Doe".to_string(), "Min Park".to_string()][..])
        );
        assert_eq!(summary.outcomes_for("Jane Doe")[0].outcome, RegistrationOutcome::Enrolled);
        assert_eq!(
            summary.outcomes_for("Min Park")[0].outcome,
            RegistrationOutcome::AlreadyEnrolled
        );
        assert_eq!(
            summary.outcomes_for("Chris Smith")[0].outcome,
            RegistrationOutcome::AmbiguousMatch { candidates: 2 }
        );
        assert!(summary
            .alerts
            .iter()
            .any(|a| matches!(a, Alert::Waitlist { day, .. } if day == "Monday")));
        assert!(summary.alerts.iter().any(|a| matches!(
            a,
            Alert::DayLabelMismatch { program, .. } if program == "Pickleball"
        )));
        assert!(summary.outcomes_for("Lou Stone").is_empty());
    }

    #[tokio::test]
    async fn special_name_declined_is_reported() {
        let sim = ClubSim::new(ClubSpec::tennis());
        // First answer re-enrolls Jane, second declines the special override.
        let confirmer = Arc::new(ScriptedConfirmer::new([true, false], true));
        let scheduler = scheduler(&sim, fast_policy(), &["Jane Doe"], confirmer);

        let summary = scheduler.run().await.unwrap();

        assert_eq!(
            summary.outcomes_for("Jane Doe")[0].outcome,
            RegistrationOutcome::SkippedByOverride
        );
        assert_eq!(sim.submit_clicks(), 0);
    }

    #[tokio::test]
    async fn attendance_outage_fails_the_day_not_the_run() {
        let sim = ClubSim::new(ClubSpec::tennis().faults(Faults {
            attendance_outages: 10,
            ..Faults::default()
        }));
        let scheduler = scheduler(
            &sim,
            fast_policy(),
            &[],
            Arc::new(ScriptedConfirmer::always(true)),
        );

        let summary = scheduler.run().await.unwrap();

        assert!(summary
            .alerts
            .iter()
            .any(|a| matches!(a, Alert::StepFailed { day: Some(day), .. } if day == "Monday")));
        assert!(summary.outcomes.is_empty());
    }

    #[tokio::test]
    async fn unreachable_document_ends_the_run() {
        let sim = ClubSim::new(ClubSpec::tennis().faults(Faults {
            unreachable: true,
            ..Faults::default()
        }));
        let scheduler = scheduler(
            &sim,
            fast_policy(),
            &[],
            Arc::new(ScriptedConfirmer::always(true)),
        );

        let err = scheduler.run().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
