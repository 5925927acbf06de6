/// Element ids, prefixes and selectors of the remote scheduling document.
///
/// Defaults describe the live application; every field can be overridden
/// from configuration when the markup changes.
#[cfg_attr(
    feature = "serde-full",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SiteLayout {
    pub events_container_id: String,
    pub events_block_id: String,
    pub program_link_selector: String,
    pub program_prefix: String,
    pub session_prefix: String,
    pub day_prefix: String,
    /// Class present on the currently selected tree row.
    pub selected_class: String,
    pub attendance_button_id: String,
    pub roster_body_id: String,
    pub separator_class: String,
    pub separator_row_class: String,
    pub separator_text_selector: String,
    pub name_selector: String,
    pub phone_selector: String,
    pub slot_selector: String,
    pub mark_selector: String,
    pub present_class: String,
    pub waitlist_marker: String,
    pub makeup_marker: String,
    pub register_link_id: String,
    pub search_input_id: String,
    pub candidate_list_id: String,
    pub candidate_selector: String,
    pub submit_selector: String,
}

impl SiteLayout {
    /// Child list container revealed under a selected program.
    pub fn program_list_id(&self, program_id: &str) -> String {
        format!("{}_{}_list", self.program_prefix, program_id)
    }

    /// Child list container revealed under a selected session.
    pub fn session_list_id(&self, session_id: &str) -> String {
        format!("{}_{}_list", self.session_prefix, session_id)
    }

    pub fn row_prefix(&self, prefix: &str) -> String {
        format!("row_{prefix}_")
    }

    pub fn session_link_selector(&self) -> String {
        format!("a[id^='{}']", self.row_prefix(&self.session_prefix))
    }

    pub fn day_link_selector(&self) -> String {
        format!("a[id^='{}']", self.row_prefix(&self.day_prefix))
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            events_container_id: "all-events-container".to_string(),
            events_block_id: "eventsBlock".to_string(),
            program_link_selector: "#programBlock a[id^='row_program_']".to_string(),
            program_prefix: "program".to_string(),
            session_prefix: "session".to_string(),
            day_prefix: "day".to_string(),
            selected_class: "selected_row".to_string(),
            attendance_button_id: "attendance".to_string(),
            roster_body_id: "table-body".to_string(),
            separator_class: "separator".to_string(),
            separator_row_class: "attendance-separator".to_string(),
            separator_text_selector: "td.separator".to_string(),
            name_selector: ".second-col a".to_string(),
            phone_selector: ".staff-phone".to_string(),
            slot_selector: "td.date".to_string(),
            mark_selector: "a.checkbox".to_string(),
            present_class: "active".to_string(),
            waitlist_marker: "Waitlisted".to_string(),
            makeup_marker: "Make-up".to_string(),
            register_link_id: "registerUserLink".to_string(),
            search_input_id: "userInput".to_string(),
            candidate_list_id: "ac_ul".to_string(),
            candidate_selector: "li".to_string(),
            submit_selector: "input.button.bold[value='Add']".to_string(),
        }
    }
}
