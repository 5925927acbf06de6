use action_primitives::{ActionError, DocumentReader, Locator, NodeHandle};
use rosterbot_core_types::{FlowError, SiteLayout};
use std::time::Duration;
use tracing::{debug, info};

use crate::classify::{Classifier, Flow, RosterRules};
use crate::model::{RawRow, RosterAlert, RosterSnapshot};

/// Reads the attendance table of the currently opened day.
#[derive(Clone)]
pub struct AttendanceTableReader {
    reader: DocumentReader,
    layout: SiteLayout,
    rules: RosterRules,
}

impl AttendanceTableReader {
    pub fn new(reader: DocumentReader, layout: SiteLayout, rules: RosterRules) -> Self {
        Self {
            reader,
            layout,
            rules,
        }
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    /// Wait for the roster body, then read it.
    ///
    /// A roster body that never appears is a `StructuralMismatch`.
    pub async fn read(
        &self,
        timeout: Duration,
    ) -> Result<(RosterSnapshot, RosterAlert), FlowError> {
        let locator = Locator::id(self.layout.roster_body_id.clone());
        let region = match self.reader.wait_present(&locator, timeout).await {
            Ok(region) => region,
            Err(ActionError::WaitTimeout(what)) => {
                return Err(FlowError::structural(format!("no attendance table: {what}")))
            }
            Err(err) => return Err(err.into()),
        };
        self.read_region(&region).await
    }

    /// Extract and classify the rows of `region`, stopping at a make-up
    /// separator.
    pub async fn read_region(
        &self,
        region: &NodeHandle,
    ) -> Result<(RosterSnapshot, RosterAlert), FlowError> {
        let rows = self.reader.list_children(region, "tr").await?;
        let mut classifier = Classifier::new(self.rules.clone());

        for row in &rows {
            let raw = match self.extract(row).await {
                Ok(raw) => raw,
                Err(err) if err.is_retryable() => {
                    debug!(row = %row, error = %err, "skipping unreadable row");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if classifier.push(raw) == Flow::Halt {
                debug!(row = %row, "make-up block reached, stopping");
                break;
            }
        }

        let (snapshot, alert) = classifier.finish();
        info!(
            students = snapshot.student_count(),
            waitlist = alert.waitlist_count,
            low_attendance = alert.low_attendance.len(),
            "roster read"
        );
        Ok((snapshot, alert))
    }

    async fn extract(&self, row: &NodeHandle) -> Result<RawRow, ActionError> {
        let reader = &self.reader;
        let layout = &self.layout;

        if reader.has_class(row, &layout.separator_row_class).await?
            || reader.has_class(row, &layout.separator_class).await?
        {
            let text = match reader
                .text_within(row, &layout.separator_text_selector)
                .await?
            {
                Some(text) => text,
                None => reader.driver().read_text(row).await?.trim().to_string(),
            };
            return Ok(RawRow::Separator { text });
        }

        let cells = reader
            .driver()
            .locate_all(&Locator::within(row, "td"))
            .await?;
        if cells.is_empty() {
            return Ok(RawRow::Empty);
        }

        let name = reader.text_within(row, &layout.name_selector).await?;
        let phone = reader.text_within(row, &layout.phone_selector).await?;

        let slots = reader
            .driver()
            .locate_all(&Locator::within(row, layout.slot_selector.clone()))
            .await?;
        let mut present = 0;
        for slot in &slots {
            let mark = reader
                .find(&Locator::within(slot, layout.mark_selector.clone()))
                .await?;
            if let Some(mark) = mark {
                if reader.has_class(&mark, &layout.present_class).await? {
                    present += 1;
                }
            }
        }

        Ok(RawRow::Data {
            name,
            phone,
            present,
            slots: slots.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::stub::{Document, Element, ElementKey, MemoryDriver};
    use std::sync::Arc;

    fn student(
        doc: &mut Document,
        body: ElementKey,
        name: &str,
        phone: Option<&str>,
        marks: &[bool],
    ) {
        let row = doc.append(body, Element::new("tr"));
        let cell = doc.append(row, Element::new("td").class("second-col"));
        doc.append(cell, Element::new("a").text(name));
        if let Some(phone) = phone {
            doc.append(cell, Element::new("span").class("staff-phone").text(phone));
        }
        for present in marks {
            let slot = doc.append(row, Element::new("td").class("date"));
            let mark = Element::new("a").class("checkbox");
            doc.append(slot, if *present { mark.class("active") } else { mark });
        }
    }

    fn separator(doc: &mut Document, body: ElementKey, text: &str) {
        let row = doc.append(body, Element::new("tr").class("attendance-separator"));
        doc.append(row, Element::new("td").class("separator").text(text));
    }

    fn table_reader(driver: &Arc<MemoryDriver>) -> AttendanceTableReader {
        AttendanceTableReader::new(
            DocumentReader::new(driver.clone(), Duration::from_millis(5)),
            SiteLayout::default(),
            RosterRules::default(),
        )
    }

    #[tokio::test]
    async fn reads_students_waitlist_and_stops_at_make_up() {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| {
            let root = doc.root();
            let body = doc.append(root, Element::new("tbody").id("table-body"));
            student(doc, body, "Doe, Jane", Some("555-0100"), &[true, false, false, false]);
            student(doc, body, "Lee, Sam", None, &[true, true, true, true]);
            doc.append(body, Element::new("tr"));
            separator(doc, body, "Waitlisted: 1");
            student(doc, body, "Kim, Ana", None, &[false, false, false, false]);
            separator(doc, body, "Make-up");
            student(doc, body, "Fox, Al", None, &[false, false, false, false]);
        });

        let (snapshot, alert) = table_reader(&driver)
            .read(Duration::from_millis(50))
            .await
            .unwrap();

        let regular: Vec<_> = snapshot.regular().map(|s| s.canonical_name.as_str()).collect();
        assert_eq!(regular, ["Jane Doe", "Sam Lee"]);
        assert_eq!(alert.waitlist, ["Ana Kim"]);
        assert!(!snapshot.contains("Al Fox"));

        assert_eq!(alert.low_attendance.len(), 1);
        let jane = &alert.low_attendance[0];
        assert_eq!(jane.present_count, 1);
        assert_eq!(jane.tracked_slots, 4);
        assert_eq!(jane.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn missing_table_is_a_structural_mismatch() {
        let driver = Arc::new(MemoryDriver::new());
        let err = table_reader(&driver)
            .read(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::StructuralMismatch(_)));
    }
}
