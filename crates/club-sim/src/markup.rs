//! Markup of the simulated pages.

use action_primitives::stub::{Document, Element, ElementKey};

use crate::scenario::{AccountSpec, ClubSpec, DaySpec, StudentSpec};

pub(crate) const SELECTED: &str = "selected_row";
pub(crate) const ACCOUNT_ATTR: &str = "data-account";

pub(crate) fn program_link(id: &str) -> String {
    format!("row_program_{id}")
}

pub(crate) fn program_list(id: &str) -> String {
    format!("program_{id}_list")
}

pub(crate) fn session_link(id: &str) -> String {
    format!("row_session_{id}")
}

pub(crate) fn session_list(id: &str) -> String {
    format!("session_{id}_list")
}

pub(crate) fn day_link(id: &str) -> String {
    format!("row_day_{id}")
}

/// Static page: program tree, attendance button and an empty work area.
pub(crate) fn build_page(doc: &mut Document, spec: &ClubSpec) {
    let root = doc.root();
    doc.append(root, Element::new("input").attr("name", "login"));
    doc.append(root, Element::new("input").attr("name", "password"));
    doc.append(root, Element::new("button").id("loginButton").text("Log in"));
    doc.append(root, Element::new("button").attr("name", "selectPosButton").text("Continue"));

    if spec.faults.unreachable {
        return;
    }

    let container = doc.append(root, Element::new("div").id("all-events-container"));
    let events = doc.append(container, Element::new("div").id("eventsBlock"));
    let programs = doc.append(events, Element::new("div").id("programBlock"));

    for program in &spec.programs {
        doc.append(
            programs,
            Element::new("a")
                .id(program_link(&program.id))
                .class("row")
                .text(program.name.clone()),
        );
        let sessions = doc.append(
            programs,
            Element::new("div").id(program_list(&program.id)).hidden(),
        );
        for session in &program.sessions {
            doc.append(
                sessions,
                Element::new("a")
                    .id(session_link(&session.id))
                    .class("row")
                    .text(session.name.clone()),
            );
            let days = doc.append(
                sessions,
                Element::new("div").id(session_list(&session.id)).hidden(),
            );
            for day in &session.days {
                doc.append(
                    days,
                    Element::new("a")
                        .id(day_link(&day.id))
                        .class("row")
                        .text(day.name.clone()),
                );
            }
        }
    }

    doc.append(
        container,
        Element::new("a").id("attendance").text("Attendance").hidden(),
    );
    doc.append(container, Element::new("div").id("workArea"));
}

/// Mark `link` as the only selected row among its siblings.
pub(crate) fn select_row(doc: &mut Document, link: ElementKey) {
    if let Some(parent) = doc.parent(link) {
        for sibling in doc.children(parent) {
            doc.remove_class(sibling, SELECTED);
        }
    }
    doc.add_class(link, SELECTED);
}

/// Show `list` and hide the other lists next to it.
pub(crate) fn reveal_list(doc: &mut Document, list: ElementKey) {
    if let Some(parent) = doc.parent(list) {
        for sibling in doc.children(parent) {
            if doc.tag(sibling) == "div" {
                doc.set_hidden(sibling, sibling != list);
            }
        }
    }
}

pub(crate) fn clear_work_area(doc: &mut Document) {
    if let Some(area) = doc.by_id("workArea") {
        doc.clear_children(area);
    }
}

/// Attendance table and the (collapsed) registration form for `day`.
pub(crate) fn render_attendance(doc: &mut Document, day: &DaySpec) {
    clear_work_area(doc);
    let Some(area) = doc.by_id("workArea") else {
        return;
    };

    let table = doc.append(area, Element::new("table").class("attendance"));
    let body = doc.append(table, Element::new("tbody").id("table-body"));
    render_rows(doc, body, day);

    doc.append(area, Element::new("a").id("registerUserLink").text("Register User"));
    let form = doc.append(area, Element::new("div").id("registerForm").hidden());
    doc.append(form, Element::new("input").id("userInput").attr("type", "text"));
    doc.append(
        form,
        Element::new("input")
            .class("button bold")
            .attr("type", "button")
            .attr("value", "Add"),
    );
}

/// Rebuild the rows of an existing table body; old row handles go stale.
pub(crate) fn rerender_rows(doc: &mut Document, day: &DaySpec) {
    if let Some(body) = doc.by_id("table-body") {
        doc.clear_children(body);
        render_rows(doc, body, day);
    }
}

fn render_rows(doc: &mut Document, body: ElementKey, day: &DaySpec) {
    let header = doc.append(body, Element::new("tr").class("header"));
    doc.append(header, Element::new("th").text("Name"));

    for student in &day.roster {
        student_row(doc, body, student);
    }
    if !day.waitlist.is_empty() {
        separator_row(doc, body, &format!("Waitlisted: {}", day.waitlist.len()));
        for student in &day.waitlist {
            student_row(doc, body, student);
        }
    }
    if !day.makeup.is_empty() {
        separator_row(doc, body, "Make-up");
        for student in &day.makeup {
            student_row(doc, body, student);
        }
    }
}

fn separator_row(doc: &mut Document, body: ElementKey, text: &str) {
    let row = doc.append(body, Element::new("tr").class("attendance-separator"));
    doc.append(row, Element::new("td").class("separator").text(text));
}

fn student_row(doc: &mut Document, body: ElementKey, student: &StudentSpec) {
    let row = doc.append(body, Element::new("tr").class("student"));
    doc.append(row, Element::new("td").class("first-col"));
    let name_cell = doc.append(row, Element::new("td").class("second-col"));
    doc.append(name_cell, Element::new("a").text(student.name.clone()));
    if let Some(phone) = &student.phone {
        doc.append(name_cell, Element::new("span").class("staff-phone").text(phone.clone()));
    }
    for present in &student.marks {
        let slot = doc.append(row, Element::new("td").class("date"));
        let mark = Element::new("a").class("checkbox");
        doc.append(slot, if *present { mark.class("active") } else { mark });
    }
}

/// Expand the registration form with an empty search.
pub(crate) fn open_register_form(doc: &mut Document) {
    if let Some(form) = doc.by_id("registerForm") {
        doc.set_hidden(form, false);
    }
    if let Some(input) = doc.by_id("userInput") {
        doc.set_value(input, "");
    }
    if let Some(list) = doc.by_id("ac_ul") {
        doc.remove(list);
    }
}

pub(crate) fn close_register_form(doc: &mut Document) {
    if let Some(list) = doc.by_id("ac_ul") {
        doc.remove(list);
    }
    if let Some(form) = doc.by_id("registerForm") {
        doc.set_hidden(form, true);
    }
}

/// Replace the suggestion list with the accounts matching `query`.
pub(crate) fn render_suggestions(doc: &mut Document, accounts: &[AccountSpec], query: &str) {
    if let Some(list) = doc.by_id("ac_ul") {
        doc.remove(list);
    }
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return;
    }
    let Some(form) = doc.by_id("registerForm") else {
        return;
    };

    let list = doc.append(form, Element::new("ul").id("ac_ul"));
    for (index, account) in accounts.iter().enumerate() {
        let label = account.search_label();
        if !label.to_lowercase().contains(&query) {
            continue;
        }
        let item = doc.append(list, Element::new("li").attr(ACCOUNT_ATTR, index.to_string()));
        doc.append(item, Element::new("span").text(label));
        if let Some(note) = &account.note {
            doc.append(item, Element::new("small").text(note.clone()));
        }
    }
}
