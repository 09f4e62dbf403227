//! Shared formatting helpers.
//!
//! Pure text functions (no ratatui styles) used by the TUI widgets and by
//! the one-shot plain output.

/// Truncates `s` to at most `width` characters.
pub fn chunk(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncates and left-aligns `s` into exactly `width` characters.
pub fn cell_left(s: &str, width: usize) -> String {
    format!("{:<width$}", chunk(s, width))
}

/// Truncates and right-aligns `s` into exactly `width` characters.
pub fn cell_right(s: &str, width: usize) -> String {
    format!("{:>width$}", chunk(s, width))
}

/// Format a per-second rate: `"0"`, `"12.5"`, `"1.2k"`, `"3.4M"`.
pub fn format_rate(v: f64) -> String {
    if v <= 0.0 {
        "0".to_string()
    } else if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else if v >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Format a counter with thousands suffixes: `"999"`, `"12.3k"`, `"4.5M"`, `"1.2G"`.
pub fn format_count(n: u64) -> String {
    let f = n as f64;
    if n >= 1_000_000_000 {
        format!("{:.1}G", f / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", f / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}k", f / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format server uptime: `"45s"`, `"3m 5s"`, `"2h 10m"`, `"12d 3h"`.
pub fn format_uptime(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format a picosecond timer value like `format_pico_time()`:
/// `"850 ps"`, `"1.20 us"`, `"3.40 ms"`, `"12.50 s"`, `"2.00 m"`.
pub fn format_picos(ps: u64) -> String {
    const NS: f64 = 1e3;
    const US: f64 = 1e6;
    const MS: f64 = 1e9;
    const S: f64 = 1e12;
    const M: f64 = 60e12;
    let f = ps as f64;
    if f >= M {
        format!("{:.2} m", f / M)
    } else if f >= S {
        format!("{:.2} s", f / S)
    } else if f >= MS {
        format!("{:.2} ms", f / MS)
    } else if f >= US {
        format!("{:.2} us", f / US)
    } else if f >= NS {
        format!("{:.2} ns", f / NS)
    } else {
        format!("{} ps", ps)
    }
}
