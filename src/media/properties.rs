use std::time::Duration;

/// Ordered key/value bag handed to the rendering layer. Keys keep insertion
/// order; later inserts of an existing key are appended, not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(&'static str, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.push((key, value.into()));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// General short duration: `[d:]h:mm:ss[.fffffff]`, hours unpadded, the
/// fraction in 100ns ticks with trailing zeros dropped.
///
/// `5400s` renders as `1:30:00`, `90.5s` as `0:01:30.5`.
pub fn format_short_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let h = (total % 86_400) / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    let mut out = if days > 0 {
        format!("{days}:{h}:{m:02}:{s:02}")
    } else {
        format!("{h}:{m:02}:{s:02}")
    };

    let ticks = duration.subsec_nanos() / 100;
    if ticks > 0 {
        let frac = format!("{ticks:07}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Human readable byte count: plain bytes below 900, then two decimals in
/// the smallest unit that keeps the number under 900.
pub fn format_file_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if size < 900 {
        return format!("{size} B");
    }
    let mut value = size as f64 / 1024.0;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value < 900.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} {}", UNITS[UNITS.len() - 1])
}
