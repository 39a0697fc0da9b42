//! Terminal rendering of session state.

use crate::core::policy::ActionPanel;
use crate::core::queue::EventQueue;
use crate::core::tracker::{RecordOutcome, TagView, Tracker};
use crate::core::{SyncOutcome, cache::RefreshReport};
use crate::models::geo::coord_to_wire;
use crate::models::{Lookup, PendingEvent};
use crate::remote::Delivery;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREY, RESET, color_for_status, colorize_optional, paint};
use crate::utils::table::Table;
use chrono::{DateTime, Local, Utc};

pub fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn status_label(lookup: &Lookup) -> String {
    match lookup.status() {
        Some(st) => paint(st.name(), color_for_status(st)),
        None => paint(lookup.label(), GREY),
    }
}

fn print_panel(panel: &ActionPanel) {
    println!("Actions:");
    for (status, enabled) in &panel.actions {
        if *enabled {
            println!("  [x] {:<14} ({})", status.action_code(), status.name());
        } else {
            println!("  {GREY}[ ] {:<14} (current){RESET}", status.action_code());
        }
    }
    if panel.location_refresh {
        println!("  [x] {:<14} (location only)", "GEO");
    }
}

pub fn print_tag_view(view: &TagView) {
    println!();
    println!("TAG     : {}", view.tag);
    println!("STATUS  : {}", status_label(&view.lookup));
    if let Lookup::Registered(rec) = &view.lookup {
        println!("SECTOR  : {}", colorize_optional(&rec.sector));
        println!("CLASS   : {}", colorize_optional(&rec.class));
    }
    println!();
    print_panel(&view.panel);
    println!();
}

fn describe_event(ev: &PendingEvent) -> String {
    let coords = if ev.fix().is_empty() {
        "no coordinates".to_string()
    } else {
        format!("{} / {}", coord_to_wire(ev.lat), coord_to_wire(ev.lon))
    };
    format!("{} → {} ({coords})", ev.tag, ev.status.name())
}

pub fn print_record_outcome(outcome: &RecordOutcome) {
    match outcome {
        RecordOutcome::Queued(ev) => success(format!("Queued: {}", describe_event(ev))),
        RecordOutcome::Submitted(ev) => success(format!("Submitted: {}", describe_event(ev))),
        RecordOutcome::Declined { request, .. } => {
            warning(format!("Not recorded, {} is still held.", request.tag()))
        }
    }
}

pub fn print_refresh_report(report: &RefreshReport) {
    success(format!("Status table updated: {} tags.", report.tags));
    if report.skipped_blank > 0 {
        info(format!("{} rows without identifier skipped.", report.skipped_blank));
    }
    if report.skipped_unknown > 0 {
        warning(format!("{} rows with an unknown status skipped.", report.skipped_unknown));
    }
}

pub fn print_sync_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Offline => warning("Offline: nothing was sent."),
        SyncOutcome::Empty => info("Nothing to send."),
        SyncOutcome::Sent {
            count,
            remaining,
            delivery,
        } => {
            let how = match delivery {
                Delivery::Assumed => "sent",
                Delivery::Acknowledged => "acknowledged",
            };
            success(format!("{count} events {how}, {remaining} still pending."));
        }
    }
}

pub fn queue_table(queue: &EventQueue) -> Table {
    let mut table = Table::with_headers(&[
        "#", "EVENT", "TIMESTAMP", "TAG", "STATUS", "USER", "LAT", "LON", "OBS",
    ]);
    for (i, ev) in queue.iter().enumerate() {
        let short_id: String = ev.event_id.to_string().chars().take(8).collect();
        table.add_row(vec![
            (i + 1).to_string(),
            short_id,
            local_time(ev.timestamp),
            ev.tag.clone(),
            ev.status.to_wire().to_string(),
            ev.user.clone(),
            coord_to_wire(ev.lat),
            coord_to_wire(ev.lon),
            ev.obs.clone(),
        ]);
    }
    table
}

pub fn print_queue(queue: &EventQueue) {
    if queue.is_empty() {
        info("Queue is empty.");
        return;
    }
    println!("Pending events (newest first):\n");
    print!("{}", queue_table(queue).render());
}

/// One-line session summary: held tag, queue size, last sync.
pub fn print_session_status(tracker: &Tracker) {
    let held = tracker.hold().current().unwrap_or("-");
    let last = tracker
        .last_sync_at()
        .map(local_time)
        .unwrap_or_else(|| "never".to_string());
    let who = if tracker.operator().logged_in {
        tracker.operator().full_name.clone()
    } else {
        tracker.event_user()
    };
    println!(
        "{GREY}held: {held} | pending: {} | last sync: {last} | user: {who}{RESET}",
        tracker.queue().size()
    );
}
