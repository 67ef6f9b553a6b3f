//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::{OwoColorize, Stream};

/// Status message helpers. Styling is dropped when the target stream is not
/// a colour terminal or `NO_COLOR` is set.
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
    }

    /// Print an error message to stderr
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message to stderr
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a label/value line
    pub fn field(label: &str, value: &str) {
        let padded = format!("{label:<18}");
        println!("  {} {}", padded.if_supports_color(Stream::Stdout, |t| t.dimmed()), value);
    }
}

/// Format a pipeline time in milliseconds for display
pub fn format_duration_ms(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.0}µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

/// Format a distance: meters under 1 km, otherwise km with one decimal
pub fn format_distance(km: Option<f64>) -> String {
    match km {
        Some(km) if km < 1.0 => format!("{:.0} m", km * 1000.0),
        Some(km) => format!("{:.1} km", km),
        None => "—".to_string(),
    }
}

/// Format a freshness percentage
pub fn format_freshness(percent: Option<f64>) -> String {
    percent.map_or_else(|| "—".to_string(), |p| format!("{:.0}%", p))
}

/// Format a unit price with two decimals
pub fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| "—".to_string(), |p| format!("{:.2}", p))
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
