//! Declarative description of a simulated club.

use serde::{Deserialize, Serialize};

/// One roster line as the site renders it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StudentSpec {
    /// "Last, First", exactly as displayed.
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// One entry per tracked session slot, `true` when marked present.
    #[serde(default)]
    pub marks: Vec<bool>,
}

impl StudentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            marks: Vec::new(),
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// `present` marks out of `slots`, present ones first.
    pub fn attended(mut self, present: usize, slots: usize) -> Self {
        self.marks = (0..slots).map(|slot| slot < present).collect();
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DaySpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub roster: Vec<StudentSpec>,
    #[serde(default)]
    pub waitlist: Vec<StudentSpec>,
    #[serde(default)]
    pub makeup: Vec<StudentSpec>,
}

impl DaySpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roster: Vec::new(),
            waitlist: Vec::new(),
            makeup: Vec::new(),
        }
    }

    pub fn student(mut self, student: StudentSpec) -> Self {
        self.roster.push(student);
        self
    }

    pub fn waitlisted(mut self, student: StudentSpec) -> Self {
        self.waitlist.push(student);
        self
    }

    pub fn makeup(mut self, student: StudentSpec) -> Self {
        self.makeup.push(student);
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub days: Vec<DaySpec>,
}

impl SessionSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            days: Vec::new(),
        }
    }

    pub fn day(mut self, day: DaySpec) -> Self {
        self.days.push(day);
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProgramSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sessions: Vec<SessionSpec>,
}

impl ProgramSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sessions: Vec::new(),
        }
    }

    pub fn session(mut self, session: SessionSpec) -> Self {
        self.sessions.push(session);
        self
    }
}

/// A member account the registration search can find.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountSpec {
    /// "Last, First", the form added to rosters.
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Extra text shown next to the name in search results.
    #[serde(default)]
    pub note: Option<String>,
}

impl AccountSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            note: None,
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// "First Last" as shown in search results.
    pub fn search_label(&self) -> String {
        match self.name.split_once(',') {
            Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
            None => self.name.trim().to_string(),
        }
    }
}

/// Misbehaviour injected into the simulated site.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faults {
    /// The events container never renders.
    pub unreachable: bool,
    /// The Add button is accepted but the roster never changes.
    pub drop_submissions: bool,
    /// Number of attendance-button clicks that fail outright after each
    /// day selection.
    pub attendance_outages: u32,
    /// Programs whose session list stays hidden when the program is
    /// selected.
    pub hidden_programs: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClubSpec {
    #[serde(default)]
    pub programs: Vec<ProgramSpec>,
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    #[serde(default)]
    pub faults: Faults,
}

impl ClubSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, program: ProgramSpec) -> Self {
        self.programs.push(program);
        self
    }

    pub fn account(mut self, account: AccountSpec) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    /// Tennis with a February Monday roster carried into an empty March.
    pub fn tennis() -> Self {
        ClubSpec::new()
            .program(
                ProgramSpec::new("1", "Tennis")
                    .session(SessionSpec::new("11", "February 2025").day(
                        DaySpec::new("111", "Monday")
                            .student(StudentSpec::new("Doe, Jane").attended(1, 4))
                            .student(StudentSpec::new("Lee, Sam").attended(4, 4)),
                    ))
                    .session(
                        SessionSpec::new("12", "March 2025").day(DaySpec::new("121", "Monday")),
                    ),
            )
            .account(AccountSpec::new("Doe, Jane"))
            .account(AccountSpec::new("Lee, Sam"))
    }

    /// Several programs exercising every branch of a run.
    pub fn sample() -> Self {
        let tennis = ProgramSpec::new("1", "Tennis")
            .session(SessionSpec::new("10", "January 2025").day(DaySpec::new("101", "Monday")))
            .session(
                SessionSpec::new("11", "February 2025")
                    .day(
                        DaySpec::new("111", "Monday")
                            .student(StudentSpec::new("Doe, Jane").phone("555-0100").attended(1, 4))
                            .student(StudentSpec::new("Lee, Sam").phone("555-0101").attended(4, 4))
                            .student(StudentSpec::new("Park, Min").attended(2, 4))
                            .waitlisted(StudentSpec::new("Kim, Ana").phone("555-0102"))
                            .makeup(StudentSpec::new("Fox, Al").attended(0, 4)),
                    )
                    .day(
                        DaySpec::new("112", "Wednesday")
                            .student(StudentSpec::new("Smith, Chris").attended(0, 4))
                            .student(StudentSpec::new("Ray, Bo").attended(3, 4)),
                    ),
            )
            .session(
                SessionSpec::new("12", "March 2025")
                    .day(
                        DaySpec::new("121", "Monday")
                            .student(StudentSpec::new("Park, Min").attended(0, 4)),
                    )
                    .day(DaySpec::new("122", "Wednesday")),
            );

        let swim = ProgramSpec::new("2", "Swim")
            .session(SessionSpec::new("20", "March 2025").day(DaySpec::new("201", "Saturday")));

        let pickleball = ProgramSpec::new("3", "Pickleball")
            .session(SessionSpec::new("30", "February 2025").day(
                DaySpec::new("301", "Tuesday")
                    .student(StudentSpec::new("Stone, Lou").attended(1, 4)),
            ))
            .session(SessionSpec::new("31", "March 2025").day(DaySpec::new("311", "Thursday")));

        ClubSpec::new()
            .program(tennis)
            .program(swim)
            .program(pickleball)
            .account(AccountSpec::new("Doe, Jane").note("Member #1001"))
            .account(AccountSpec::new("Lee, Sam"))
            .account(AccountSpec::new("Park, Min"))
            .account(AccountSpec::new("Smith, Chris").note("Member #1201"))
            .account(AccountSpec::new("Smith, Chris").note("Member #1388"))
            .account(AccountSpec::new("Stone, Lou"))
    }
}
