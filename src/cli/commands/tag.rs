//! Hold handling from the command line: `load`, `show`, `release`, `lookup`.

use super::open_tracker;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::Lookup;
use crate::models::tag::normalize_tag;
use crate::ui::messages::{info, success, warning};
use crate::ui::render::{print_session_status, print_tag_view};

pub fn load(tag: &str, cfg: &Config) -> AppResult<()> {
    let mut tracker = open_tracker(cfg)?;
    let view = tracker.load_tag(tag)?;

    if view.reloaded {
        info(format!("{} is already loaded.", view.tag));
    } else {
        success(format!("Loaded {}.", view.tag));
    }
    if !view.lookup.is_registered() {
        warning("Tag not found in the status table: it will be recorded as a new tag.");
    }
    print_tag_view(&view);
    tracker.close()
}

pub fn show(cfg: &Config) -> AppResult<()> {
    let tracker = open_tracker(cfg)?;
    match tracker.view() {
        Ok(view) => print_tag_view(&view),
        Err(AppError::NoTagHeld) => info("No tag loaded. Use `tagtrack load <TAG>`."),
        Err(e) => return Err(e),
    }
    print_session_status(&tracker);
    tracker.close()
}

pub fn release(cfg: &Config) -> AppResult<()> {
    let mut tracker = open_tracker(cfg)?;
    match tracker.release()? {
        Some(tag) => success(format!("Released {tag}.")),
        None => info("No tag loaded."),
    }
    tracker.close()
}

/// Cache lookup without touching the hold.
pub fn lookup(tag: &str, cfg: &Config) -> AppResult<()> {
    let tag = normalize_tag(tag)
        .ok_or_else(|| AppError::Validation("tag identifier must not be empty".into()))?;
    let tracker = open_tracker(cfg)?;

    match tracker.lookup(&tag) {
        Lookup::Registered(rec) => {
            println!("{tag}: {} (sector: {}, class: {})", rec.status.name(), rec.sector, rec.class);
        }
        Lookup::Unregistered => println!("{tag}: {}", Lookup::Unregistered.label()),
    }
    tracker.close()
}
