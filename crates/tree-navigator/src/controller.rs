//! Selection of Program, Session and Day nodes.

use action_primitives::{ActionError, DocumentReader, Locator, NodeHandle, RetryableAction};
use rosterbot_core_types::{FlowError, Node, NodeKind, SiteLayout, Step};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::periods::{resolve_periods, Periods};

/// Retry budget for opening the attendance view of a day.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceRetry {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl AttendanceRetry {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for AttendanceRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 1_000,
        }
    }
}

/// Walks the Program → Session → Day tree.
///
/// Selection state is always re-read from the document; nothing about the
/// tree is remembered between calls.
#[derive(Clone)]
pub struct NavigationController {
    action: RetryableAction,
    layout: SiteLayout,
    attendance: AttendanceRetry,
}

impl NavigationController {
    pub fn new(action: RetryableAction, layout: SiteLayout, attendance: AttendanceRetry) -> Self {
        Self {
            action,
            layout,
            attendance,
        }
    }

    fn reader(&self) -> &DocumentReader {
        self.action.reader()
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Wait for the events container and block. Their absence means the
    /// starting document is unreachable.
    pub async fn wait_ready(&self) -> Result<(), FlowError> {
        let wait = self.action.timeouts().wait();
        for id in [&self.layout.events_container_id, &self.layout.events_block_id] {
            match self.reader().wait_present(&Locator::id(id.clone()), wait).await {
                Ok(_) => {}
                Err(ActionError::WaitTimeout(what)) => return Err(FlowError::Unreachable(what)),
                Err(err) => return Err(FlowError::Unreachable(err.to_string())),
            }
        }
        Ok(())
    }

    /// Every program of the tree, in listed order.
    pub async fn list_programs(&self) -> Result<Vec<Node>, FlowError> {
        self.wait_ready().await?;
        let links = self
            .reader()
            .driver()
            .locate_all(&Locator::css(self.layout.program_link_selector.clone()))
            .await
            .map_err(ActionError::from)?;

        let prefix = self.layout.row_prefix(&self.layout.program_prefix);
        let mut programs = Vec::with_capacity(links.len());
        for link in &links {
            if let Some(node) = self.node_from(NodeKind::Program, link, &prefix).await? {
                programs.push(node);
            }
        }
        info!(count = programs.len(), "programs listed");
        Ok(programs)
    }

    /// Re-query whether `node` currently carries the selected marker.
    pub async fn is_selected(&self, node: &Node) -> Result<bool, FlowError> {
        let handle = self
            .reader()
            .wait_present(&node.locator(), self.action.timeouts().probe())
            .await?;
        Ok(self
            .reader()
            .has_class(&handle, &self.layout.selected_class)
            .await?)
    }

    /// Select `node` unless it already is selected.
    pub async fn select(&self, node: &Node) -> Step<()> {
        match self.is_selected(node).await {
            Ok(true) => {
                debug!(node = %node, "already selected");
                return Step::Ok(());
            }
            Ok(false) => {}
            Err(err) => {
                warn!(node = %node, error = %err, "selection state unreadable");
                return Step::Fail(err);
            }
        }

        if !self
            .action
            .perform(&node.locator(), self.action.timeouts().wait())
            .await
        {
            return Step::Fail(FlowError::action_exhausted(format!("select {node}")));
        }
        sleep(self.action.timeouts().after_action()).await;
        debug!(node = %node, "selected");
        Step::Ok(())
    }

    /// Sessions under a selected program.
    pub async fn sessions(&self, program: &Node) -> Result<Vec<Node>, FlowError> {
        let container = self.layout.program_list_id(&program.id);
        self.children(&container, NodeKind::Session, &self.layout.session_prefix)
            .await
    }

    /// Visible days under a selected session, in document order.
    pub async fn days(&self, session: &Node) -> Result<Vec<Node>, FlowError> {
        let container = self.layout.session_list_id(&session.id);
        self.children(&container, NodeKind::Day, &self.layout.day_prefix)
            .await
    }

    /// Select `program` and pick its previous and current sessions.
    pub async fn enter_program(&self, program: &Node) -> Step<Periods> {
        match self.select(program).await {
            Step::Ok(()) => {}
            Step::Skip(reason) => return Step::Skip(reason),
            Step::Fail(err) => return Step::Fail(err),
        }
        match self.sessions(program).await {
            Ok(sessions) => resolve_periods(&sessions),
            Err(err) => Step::Fail(err),
        }
    }

    /// Select `session` and list its days.
    pub async fn enter_session(&self, session: &Node) -> Step<Vec<Node>> {
        match self.select(session).await {
            Step::Ok(()) => self.days(session).await.into(),
            other => other.map(|_| Vec::new()),
        }
    }

    /// Press the attendance button of the selected day, retrying with a
    /// fixed backoff.
    pub async fn open_attendance(&self, day: &Node) -> Step<()> {
        let button = Locator::id(self.layout.attendance_button_id.clone());
        let attempts = self.attendance.attempts.max(1);
        for attempt in 1..=attempts {
            if self
                .action
                .perform(&button, self.action.timeouts().wait())
                .await
            {
                sleep(self.action.timeouts().after_action()).await;
                return Step::Ok(());
            }
            if attempt < attempts {
                debug!(day = %day, attempt, "attendance view not opened, retrying");
                sleep(self.attendance.backoff()).await;
            }
        }
        warn!(day = %day, attempts, "failed to access attendance");
        Step::Fail(FlowError::action_exhausted(format!(
            "attendance view for {day}"
        )))
    }

    async fn children(
        &self,
        container_id: &str,
        kind: NodeKind,
        prefix: &str,
    ) -> Result<Vec<Node>, FlowError> {
        let container = self
            .reader()
            .wait_visible(&Locator::id(container_id), self.action.timeouts().wait())
            .await?;
        let row_prefix = self.layout.row_prefix(prefix);
        let links = self
            .reader()
            .list_children(&container, &format!("a[id^='{row_prefix}']"))
            .await?;

        let mut nodes = Vec::with_capacity(links.len());
        for link in &links {
            if let Some(node) = self.node_from(kind, link, &row_prefix).await? {
                nodes.push(node);
            }
        }
        debug!(container = container_id, kind = %kind, count = nodes.len(), "children listed");
        Ok(nodes)
    }

    async fn node_from(
        &self,
        kind: NodeKind,
        link: &NodeHandle,
        row_prefix: &str,
    ) -> Result<Option<Node>, FlowError> {
        let driver = self.reader().driver();
        let element_id = match driver.read_attribute(link, "id").await {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(err) if err.is_transient() => return Ok(None),
            Err(err) => return Err(ActionError::from(err).into()),
        };
        let Some(id) = element_id.strip_prefix(row_prefix) else {
            return Ok(None);
        };
        let label = match driver.read_text(link).await {
            Ok(text) => text.trim().to_string(),
            Err(err) if err.is_transient() => return Ok(None),
            Err(err) => return Err(ActionError::from(err).into()),
        };
        Ok(Some(Node::new(kind, id, label, element_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::ActionTimeouts;
    use club_sim::{ClubSim, ClubSpec, DaySpec, Faults, ProgramSpec, SessionSpec};
    use rosterbot_core_types::{ErrorKind, SkipReason};

    fn controller(sim: &ClubSim) -> NavigationController {
        let action = RetryableAction::new(sim.driver(), ActionTimeouts::instant());
        NavigationController::new(
            action,
            SiteLayout::default(),
            AttendanceRetry {
                attempts: 3,
                backoff_ms: 0,
            },
        )
    }

    #[tokio::test]
    async fn lists_programs_in_order() {
        let sim = ClubSim::new(ClubSpec::sample());
        let programs = controller(&sim).list_programs().await.unwrap();
        let labels: Vec<_> = programs.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Tennis", "Swim", "Pickleball"]);
        assert_eq!(programs[0].id, "1");
        assert_eq!(programs[0].element_id, "row_program_1");
    }

    #[tokio::test]
    async fn missing_events_container_is_fatal() {
        let sim = ClubSim::new(ClubSpec::tennis().faults(Faults {
            unreachable: true,
            ..Faults::default()
        }));
        let err = controller(&sim).list_programs().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn select_is_idempotent() {
        let sim = ClubSim::new(ClubSpec::tennis());
        let nav = controller(&sim);
        let program = nav.list_programs().await.unwrap().remove(0);

        assert!(!nav.is_selected(&program).await.unwrap());
        assert_eq!(nav.select(&program).await, Step::Ok(()));
        assert!(nav.is_selected(&program).await.unwrap());
        assert_eq!(nav.select(&program).await, Step::Ok(()));

        let clicks = sim.driver().invocations();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].element_id.as_deref(), Some("row_program_1"));
    }

    #[tokio::test]
    async fn walks_down_to_days() {
        let sim = ClubSim::new(ClubSpec::sample());
        let nav = controller(&sim);
        let tennis = nav.list_programs().await.unwrap().remove(0);

        let Step::Ok(periods) = nav.enter_program(&tennis).await else {
            panic!("tennis has three sessions");
        };
        assert_eq!(periods.previous.label, "February 2025");
        assert_eq!(periods.current.label, "March 2025");

        let Step::Ok(days) = nav.enter_session(&periods.previous).await else {
            panic!("february should open");
        };
        let labels: Vec<_> = days.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["Monday", "Wednesday"]);

        // Switching sessions hides the previous day list.
        let Step::Ok(days) = nav.enter_session(&periods.current).await else {
            panic!("march should open");
        };
        assert_eq!(days[0].id, "121");
    }

    #[tokio::test]
    async fn single_session_program_is_skipped() {
        let sim = ClubSim::new(ClubSpec::sample());
        let nav = controller(&sim);
        let swim = nav.list_programs().await.unwrap().remove(1);
        assert_eq!(
            nav.enter_program(&swim).await,
            Step::Skip(SkipReason::NoPreviousPeriod { sessions: 1 })
        );
    }

    #[tokio::test]
    async fn hidden_session_list_fails_the_program() {
        let sim = ClubSim::new(ClubSpec::sample().faults(Faults {
            hidden_programs: vec!["1".to_string()],
            ..Faults::default()
        }));
        let nav = controller(&sim);
        let tennis = nav.list_programs().await.unwrap().remove(0);

        let Step::Fail(err) = nav.enter_program(&tennis).await else {
            panic!("tennis sessions never render");
        };
        assert_eq!(err.kind(), ErrorKind::NavigationTimeout);
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn attendance_retries_through_outages() {
        let spec = ClubSpec::new()
            .program(
                ProgramSpec::new("1", "Tennis")
                    .session(SessionSpec::new("11", "Feb").day(DaySpec::new("111", "Monday")))
                    .session(SessionSpec::new("12", "Mar")),
            )
            .faults(Faults {
                attendance_outages: 2,
                ..Faults::default()
            });
        let sim = ClubSim::new(spec);
        let nav = controller(&sim);
        let program = nav.list_programs().await.unwrap().remove(0);
        let Step::Ok(periods) = nav.enter_program(&program).await else {
            panic!("two sessions listed");
        };
        let Step::Ok(days) = nav.enter_session(&periods.previous).await else {
            panic!("days listed");
        };
        assert_eq!(nav.select(&days[0]).await, Step::Ok(()));
        assert_eq!(nav.open_attendance(&days[0]).await, Step::Ok(()));
        assert!(sim
            .driver()
            .invocations()
            .iter()
            .any(|click| click.element_id.as_deref() == Some("attendance")));
    }

    #[tokio::test]
    async fn attendance_gives_up_after_budget() {
        let spec = ClubSpec::new()
            .program(
                ProgramSpec::new("1", "Tennis")
                    .session(SessionSpec::new("11", "Feb").day(DaySpec::new("111", "Monday")))
                    .session(SessionSpec::new("12", "Mar")),
            )
            .faults(Faults {
                attendance_outages: 5,
                ..Faults::default()
            });
        let sim = ClubSim::new(spec);
        let nav = controller(&sim);
        let program = nav.list_programs().await.unwrap().remove(0);
        let Step::Ok(periods) = nav.enter_program(&program).await else {
            panic!("two sessions listed");
        };
        let Step::Ok(days) = nav.enter_session(&periods.previous).await else {
            panic!("days listed");
        };
        nav.select(&days[0]).await;
        assert!(matches!(
            nav.open_attendance(&days[0]).await,
            Step::Fail(FlowError::ActionExhausted(_))
        ));
    }
}
