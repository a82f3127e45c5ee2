use chrono::Utc;

use crate::api::Time;

/// Relative age label such as `5m ago`, computed against `now`
pub fn time_ago(then: Time, now: Time) -> String {
    let s = (now - then).num_seconds().max(0);
    if s < 60 {
        return format!("{s}s ago");
    }
    let m = s / 60;
    if m < 60 {
        return format!("{m}m ago");
    }
    let h = m / 60;
    if h < 24 {
        return format!("{h}h ago");
    }
    let d = h / 24;
    if d < 7 {
        return format!("{d}d ago");
    }
    let w = d / 7;
    if w < 4 {
        return format!("{w}w ago");
    }
    let mo = d / 30;
    if mo < 12 {
        return format!("{mo}mo ago");
    }
    format!("{}y ago", d / 365)
}

pub fn time_ago_now(then: Time) -> String {
    time_ago(then, Utc::now())
}
