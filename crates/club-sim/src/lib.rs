//! Simulated club scheduling site.
//!
//! Renders a [`ClubSpec`] into a [`MemoryDriver`] document and reacts to
//! clicks and typing the way the live application does: selecting a tree
//! row reveals its child list, the attendance button renders the roster of
//! the selected day, and the registration form searches member accounts
//! and appends the picked one to the roster.

mod markup;
pub mod scenario;

use action_primitives::stub::{Document, ElementKey, MemoryDriver};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

pub use scenario::{AccountSpec, ClubSpec, DaySpec, Faults, ProgramSpec, SessionSpec, StudentSpec};

use markup::ACCOUNT_ATTR;

#[derive(Debug)]
struct SimState {
    spec: ClubSpec,
    /// (program, session, day) indices of the selected day.
    selected_day: Option<(usize, usize, usize)>,
    attendance_open: bool,
    picked_account: Option<usize>,
    submit_clicks: usize,
    enrollments: Vec<(String, String)>,
}

impl SimState {
    fn day_mut(&mut self) -> Option<&mut DaySpec> {
        let (p, s, d) = self.selected_day?;
        self.spec
            .programs
            .get_mut(p)?
            .sessions
            .get_mut(s)?
            .days
            .get_mut(d)
    }

    fn find_day(&self, day_id: &str) -> Option<(usize, usize, usize)> {
        for (p, program) in self.spec.programs.iter().enumerate() {
            for (s, session) in program.sessions.iter().enumerate() {
                if let Some(d) = session.days.iter().position(|day| day.id == day_id) {
                    return Some((p, s, d));
                }
            }
        }
        None
    }

    fn on_click(&mut self, doc: &mut Document, key: ElementKey) {
        let id = doc.id_of(key).map(str::to_string);
        match id.as_deref() {
            Some(id) if id.starts_with("row_program_") => {
                let program = &id["row_program_".len()..];
                markup::select_row(doc, key);
                if self.spec.faults.hidden_programs.iter().any(|p| p == program) {
                    return;
                }
                if let Some(list) = doc.by_id(&markup::program_list(program)) {
                    markup::reveal_list(doc, list);
                }
            }
            Some(id) if id.starts_with("row_session_") => {
                let session = &id["row_session_".len()..];
                markup::select_row(doc, key);
                if let Some(list) = doc.by_id(&markup::session_list(session)) {
                    markup::reveal_list(doc, list);
                }
            }
            Some(id) if id.starts_with("row_day_") => {
                let day = &id["row_day_".len()..];
                markup::select_row(doc, key);
                self.selected_day = self.find_day(day);
                self.attendance_open = false;
                self.picked_account = None;
                markup::clear_work_area(doc);
                if let Some(button) = doc.by_id("attendance") {
                    doc.set_hidden(button, false);
                    let outages = self.spec.faults.attendance_outages;
                    // Each failed perform burns one native and two script clicks.
                    doc.fail_invokes(button, outages, outages * 2);
                }
            }
            Some("attendance") => {
                let day = self.day_mut().cloned();
                if let Some(day) = day {
                    markup::render_attendance(doc, &day);
                    self.attendance_open = true;
                }
            }
            Some("registerUserLink") if self.attendance_open => {
                self.picked_account = None;
                markup::open_register_form(doc);
            }
            _ => self.on_form_click(doc, key),
        }
    }

    fn on_form_click(&mut self, doc: &mut Document, key: ElementKey) {
        if doc.attr(key, "value").as_deref() == Some("Add") && doc.has_class(key, "button") {
            self.submit();
            markup::close_register_form(doc);
            if let Some(day) = self.day_mut().cloned() {
                markup::rerender_rows(doc, &day);
            }
            return;
        }

        let mut current = Some(key);
        while let Some(candidate) = current {
            if let Some(index) = doc.attr(candidate, ACCOUNT_ATTR) {
                self.picked_account = index.parse().ok();
                if let (Some(input), Some(account)) = (
                    doc.by_id("userInput"),
                    self.picked_account
                        .and_then(|i| self.spec.accounts.get(i)),
                ) {
                    doc.set_value(input, account.search_label());
                }
                if let Some(list) = doc.by_id("ac_ul") {
                    doc.remove(list);
                }
                return;
            }
            current = doc.parent(candidate);
        }
    }

    fn submit(&mut self) {
        self.submit_clicks += 1;
        let Some(index) = self.picked_account.take() else {
            debug!("add clicked without a picked account");
            return;
        };
        if self.spec.faults.drop_submissions {
            debug!("submission dropped");
            return;
        }
        let Some(account) = self.spec.accounts.get(index).cloned() else {
            return;
        };
        let Some(day) = self.day_mut() else {
            return;
        };
        let slots = day.roster.first().map(|s| s.marks.len()).unwrap_or(4);
        let mut student = StudentSpec::new(account.name.clone()).attended(0, slots);
        student.phone = account.phone.clone();
        day.roster.push(student);
        let day_id = day.id.clone();
        self.enrollments.push((day_id, account.name));
    }
}

/// The simulated site bound to its in-memory driver.
#[derive(Clone)]
pub struct ClubSim {
    driver: Arc<MemoryDriver>,
    state: Arc<Mutex<SimState>>,
}

impl ClubSim {
    pub fn new(spec: ClubSpec) -> Self {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| markup::build_page(doc, &spec));

        let state = Arc::new(Mutex::new(SimState {
            spec,
            selected_day: None,
            attendance_open: false,
            picked_account: None,
            submit_clicks: 0,
            enrollments: Vec::new(),
        }));

        let click_state = state.clone();
        driver.on_invoke(Arc::new(move |doc: &mut Document, key: ElementKey| {
            click_state.lock().on_click(doc, key);
        }));

        let type_state = state.clone();
        driver.on_type(Arc::new(
            move |doc: &mut Document, key: ElementKey, value: &str| {
                if doc.id_of(key) == Some("userInput") {
                    let state = type_state.lock();
                    markup::render_suggestions(doc, &state.spec.accounts, value);
                }
            },
        ));

        Self { driver, state }
    }

    pub fn driver(&self) -> Arc<MemoryDriver> {
        self.driver.clone()
    }

    /// Clicks on the Add button, successful or not.
    pub fn submit_clicks(&self) -> usize {
        self.state.lock().submit_clicks
    }

    /// (day id, roster name) of every account added to a roster.
    pub fn enrollments(&self) -> Vec<(String, String)> {
        self.state.lock().enrollments.clone()
    }

    /// Current roster names of `day_id`, regular block only.
    pub fn roster(&self, day_id: &str) -> Vec<String> {
        let state = self.state.lock();
        state
            .find_day(day_id)
            .map(|(p, s, d)| {
                state.spec.programs[p].sessions[s].days[d]
                    .roster
                    .iter()
                    .map(|student| student.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::{Driver, Locator};

    async fn click(sim: &ClubSim, locator: Locator) {
        let driver = sim.driver();
        let node = driver.locate(&locator).await.unwrap().expect("element present");
        driver.invoke(&node).await.unwrap();
    }

    async fn visible(sim: &ClubSim, id: &str) -> bool {
        let driver = sim.driver();
        match driver.locate(&Locator::id(id)).await.unwrap() {
            Some(node) => driver.is_visible(&node).await.unwrap(),
            None => false,
        }
    }

    #[tokio::test]
    async fn tree_rows_reveal_their_lists() {
        let sim = ClubSim::new(ClubSpec::tennis());
        assert!(!visible(&sim, "program_1_list").await);

        click(&sim, Locator::id("row_program_1")).await;
        assert!(visible(&sim, "program_1_list").await);
        assert!(!visible(&sim, "session_11_list").await);

        click(&sim, Locator::id("row_session_11")).await;
        click(&sim, Locator::id("row_day_111")).await;
        assert!(visible(&sim, "attendance").await);

        click(&sim, Locator::id("attendance")).await;
        let rows = sim
            .driver()
            .locate_all(&Locator::css("#table-body tr.student"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn registration_appends_picked_account() {
        let sim = ClubSim::new(ClubSpec::tennis());
        click(&sim, Locator::id("row_program_1")).await;
        click(&sim, Locator::id("row_session_12")).await;
        click(&sim, Locator::id("row_day_121")).await;
        click(&sim, Locator::id("attendance")).await;
        click(&sim, Locator::id("registerUserLink")).await;

        let driver = sim.driver();
        let input = driver.locate(&Locator::id("userInput")).await.unwrap().unwrap();
        driver.type_text(&input, "Jane Doe").await.unwrap();
        let items = driver.locate_all(&Locator::css("#ac_ul li")).await.unwrap();
        assert_eq!(items.len(), 1);
        driver.force_invoke(&items[0]).await.unwrap();
        click(&sim, Locator::css("input.button.bold[value='Add']")).await;

        assert_eq!(sim.roster("121"), ["Doe, Jane"]);
        assert_eq!(sim.submit_clicks(), 1);
        let names = driver
            .locate_all(&Locator::css("#table-body .second-col a"))
            .await
            .unwrap();
        assert_eq!(driver.read_text(&names[0]).await.unwrap(), "Doe, Jane");
    }

    #[tokio::test]
    async fn dropped_submissions_leave_roster_alone() {
        let spec = ClubSpec::tennis().faults(Faults {
            drop_submissions: true,
            ..Faults::default()
        });
        let sim = ClubSim::new(spec);
        click(&sim, Locator::id("row_program_1")).await;
        click(&sim, Locator::id("row_session_12")).await;
        click(&sim, Locator::id("row_day_121")).await;
        click(&sim, Locator::id("attendance")).await;
        click(&sim, Locator::id("registerUserLink")).await;
        let driver = sim.driver();
        let input = driver.locate(&Locator::id("userInput")).await.unwrap().unwrap();
        driver.type_text(&input, "Jane").await.unwrap();
        let item = driver.locate(&Locator::css("#ac_ul li")).await.unwrap().unwrap();
        driver.force_invoke(&item).await.unwrap();
        click(&sim, Locator::css("input.button.bold[value='Add']")).await;

        assert!(sim.roster("121").is_empty());
        assert_eq!(sim.submit_clicks(), 1);
        assert!(sim.enrollments().is_empty());
    }

    #[tokio::test]
    async fn hidden_program_keeps_its_sessions_hidden() {
        let sim = ClubSim::new(ClubSpec::tennis().faults(Faults {
            hidden_programs: vec!["1".to_string()],
            ..Faults::default()
        }));
        click(&sim, Locator::id("row_program_1")).await;
        assert!(!visible(&sim, "program_1_list").await);
    }

    #[tokio::test]
    async fn unreachable_site_has_no_events_container() {
        let spec = ClubSpec::tennis().faults(Faults {
            unreachable: true,
            ..Faults::default()
        });
        let sim = ClubSim::new(spec);
        assert!(sim
            .driver()
            .locate(&Locator::id("all-events-container"))
            .await
            .unwrap()
            .is_none());
    }
}
