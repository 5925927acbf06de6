//! Enrollment of carried-over students, with an operator override for
//! special names and verification by re-reading the roster.

mod model;
pub mod ports;
mod reconciler;

pub use model::{RegistrationOutcome, SpecialEnrollmentSet};
pub use ports::{
    Confirmer, FileNameList, NameListError, NameListSource, ScriptedConfirmer, StaticNameList,
};
pub use reconciler::EnrollmentReconciler;
