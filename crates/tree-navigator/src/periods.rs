use rosterbot_core_types::{Node, SkipReason, Step};

/// The two sessions a run works on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Periods {
    pub previous: Node,
    pub current: Node,
}

/// Last listed session is the current period, the one before it the
/// previous period.
pub fn resolve_periods(sessions: &[Node]) -> Step<Periods> {
    match sessions {
        [] => Step::Skip(SkipReason::NoSessions),
        [_] => Step::Skip(SkipReason::NoPreviousPeriod { sessions: 1 }),
        [.., previous, current] => Step::Ok(Periods {
            previous: previous.clone(),
            current: current.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterbot_core_types::NodeKind;

    fn sessions(labels: &[&str]) -> Vec<Node> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                Node::new(
                    NodeKind::Session,
                    i.to_string(),
                    *label,
                    format!("row_session_{i}"),
                )
            })
            .collect()
    }

    #[test]
    fn last_two_sessions_are_used() {
        let Step::Ok(periods) = resolve_periods(&sessions(&["Jan", "Feb", "Mar"])) else {
            panic!("expected periods");
        };
        assert_eq!(periods.previous.label, "Feb");
        assert_eq!(periods.current.label, "Mar");
    }

    #[test]
    fn single_session_skips_previous_period() {
        assert_eq!(
            resolve_periods(&sessions(&["Mar"])),
            Step::Skip(SkipReason::NoPreviousPeriod { sessions: 1 })
        );
        assert_eq!(resolve_periods(&[]), Step::Skip(SkipReason::NoSessions));
    }
}
