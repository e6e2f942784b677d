use caseport_schema::{Priority, State};
use tracing::warn;

/// Lowercased alphanumerics only, so `Needs Work`, `needs_work` and `NEEDSWORK` agree.
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn map_state(raw: Option<&str>) -> State {
    let Some(raw) = raw else {
        return State::default();
    };
    match normalize(raw).as_str() {
        "ready" | "actual" | "approved" | "active" | "final" | "published" => State::Ready,
        "needswork" | "needsupdate" | "rework" | "review" | "inreview" | "outdated" => {
            State::NeedsWork
        }
        "" | "notready" | "draft" | "new" => State::NotReady,
        _ => {
            warn!(state = raw, "unknown state; using NotReady");
            State::NotReady
        }
    }
}

pub fn map_priority(raw: Option<&str>) -> Priority {
    let Some(raw) = raw else {
        return Priority::default();
    };
    match normalize(raw).as_str() {
        "lowest" | "trivial" => Priority::Lowest,
        "low" | "minor" => Priority::Low,
        "" | "medium" | "normal" | "moderate" => Priority::Medium,
        "high" | "major" | "important" => Priority::High,
        "highest" | "critical" | "blocker" | "urgent" => Priority::Highest,
        _ => {
            warn!(priority = raw, "unknown priority; using Medium");
            Priority::Medium
        }
    }
}
