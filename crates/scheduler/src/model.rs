use perceiver_roster::name_key;
use serde::{Deserialize, Serialize};
use tool_enroll::RegistrationOutcome;

/// Names queued under one day label of the previous period.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DayWorklist {
    pub day: String,
    pub names: Vec<String>,
}

impl DayWorklist {
    /// Append unless the same person is already queued.
    pub fn push_unique(&mut self, name: &str) -> bool {
        let key = name_key(name);
        if self.names.iter().any(|queued| name_key(queued) == key) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub program: String,
    /// Previous-period day labels in listed order.
    pub worklists: Vec<DayWorklist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl ProgramSummary {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn worklist(&self, day: &str) -> Option<&DayWorklist> {
        self.worklists.iter().find(|w| w.day == day)
    }

    pub fn worklist_mut(&mut self, day: &str) -> &mut DayWorklist {
        let index = match self.worklists.iter().position(|w| w.day == day) {
            Some(index) => index,
            None => {
                self.worklists.push(DayWorklist {
                    day: day.to_string(),
                    names: Vec::new(),
                });
                self.worklists.len() - 1
            }
        };
        &mut self.worklists[index]
    }

    pub fn day_labels(&self) -> Vec<String> {
        self.worklists.iter().map(|w| w.day.clone()).collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub program: String,
    pub day: String,
    pub student: String,
    pub outcome: RegistrationOutcome,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "alert", rename_all = "kebab-case")]
pub enum Alert {
    Waitlist {
        program: String,
        day: String,
        names: Vec<String>,
    },
    LowAttendance {
        program: String,
        day: String,
        student: String,
        phone: String,
        present: u32,
        slots: u32,
        re_enroll: bool,
    },
    AmbiguousMatch {
        program: String,
        day: String,
        student: String,
        candidates: usize,
    },
    DayLabelMismatch {
        program: String,
        unmatched: Vec<String>,
        current: Vec<String>,
    },
    StepFailed {
        program: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day: Option<String>,
        reason: String,
    },
}

/// Everything a run produced. Owned by the scheduler and threaded through
/// each program and day step by value.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub programs: Vec<ProgramSummary>,
    pub outcomes: Vec<OutcomeRecord>,
    pub alerts: Vec<Alert>,
}

impl RunSummary {
    pub fn program(&self, program: &str) -> Option<&ProgramSummary> {
        self.programs.iter().find(|p| p.program == program)
    }

    pub fn worklist(&self, program: &str, day: &str) -> Option<&[String]> {
        self.program(program)
            .and_then(|p| p.worklist(day))
            .map(|w| w.names.as_slice())
    }

    pub fn outcomes_for(&self, student: &str) -> Vec<&OutcomeRecord> {
        let key = name_key(student);
        self.outcomes
            .iter()
            .filter(|record| name_key(&record.student) == key)
            .collect()
    }

    pub fn enrolled_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome == RegistrationOutcome::Enrolled)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.marker() == "✗")
            .count()
    }
}
