//! Display helpers for pass-through diagnostic fields.

/// Last `\r`/`\n`-separated reading of a raw uptime value.
///
/// Some firmware joins a stale and a fresh reading into one string; the
/// last one is authoritative.
pub fn last_reading(raw: &str) -> &str {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_else(|| raw.trim())
}

/// Compact uptime for display.
///
/// Understands `"000d 01:23:46"`, `"01:23:46"` and a bare seconds count;
/// anything else is shown as received.
pub fn format_uptime(raw: &str) -> String {
    let value = last_reading(raw);

    if let Some((days, time)) = value.split_once("d ") {
        let days: u64 = days.trim().parse().unwrap_or(0);
        let parts: Vec<&str> = time.split(':').collect();
        if parts.len() < 2 {
            return format!("{}d", days);
        }
        let hours: u64 = parts[0].trim().parse().unwrap_or(0);
        let minutes: u64 = parts[1].trim().parse().unwrap_or(0);
        return if days > 0 {
            format!("{}d {}h", days, hours)
        } else {
            hours_minutes(hours, minutes)
        };
    }

    if value.contains(':') {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() < 2 {
            return value.to_string();
        }
        let hours: u64 = parts[0].trim().parse().unwrap_or(0);
        let minutes: u64 = parts[1].trim().parse().unwrap_or(0);
        return hours_minutes(hours, minutes);
    }

    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        let seconds: u64 = value.parse().unwrap_or(0);
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        return if hours > 24 {
            format!("{}d {}h", hours / 24, hours % 24)
        } else {
            hours_minutes(hours, minutes)
        };
    }

    value.to_string()
}

fn hours_minutes(hours: u64, minutes: u64) -> String {
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
