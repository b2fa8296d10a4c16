//! Color constants and helpers for the TUI.

use ratatui::style::Color;

/// Power sparkline color.
pub const POWER_COLOR: Color = Color::Cyan;
/// Tank gauge color when high (>= 60%).
pub const LEVEL_HIGH: Color = Color::Blue;
/// Tank gauge color when medium (>= 30%).
pub const LEVEL_MID: Color = Color::Yellow;
/// Tank gauge color when low (< 30%).
pub const LEVEL_LOW: Color = Color::Red;
/// Running pump indicator.
pub const PUMP_ON: Color = Color::Green;
/// Stopped pump indicator.
pub const PUMP_OFF: Color = Color::DarkGray;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Watering mode `off` indicator.
pub const MODE_OFF: Color = Color::Magenta;

/// Returns a color based on the tank fill level in percent.
pub fn level_color(level_percent: f64) -> Color {
    if level_percent >= 60.0 {
        LEVEL_HIGH
    } else if level_percent >= 30.0 {
        LEVEL_MID
    } else {
        LEVEL_LOW
    }
}

/// Scales kW readings to integer bars for a sparkline (1 bar = 10 W).
pub fn sparkline_bars(kw: impl Iterator<Item = f64>) -> Vec<u64> {
    kw.map(|v| (v.max(0.0) * 100.0).round() as u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_color_thresholds() {
        assert_eq!(level_color(75.0), LEVEL_HIGH);
        assert_eq!(level_color(45.0), LEVEL_MID);
        assert_eq!(level_color(10.0), LEVEL_LOW);
    }

    #[test]
    fn sparkline_clamps_negative() {
        assert_eq!(sparkline_bars([0.25, -1.0, 3.5].into_iter()), vec![25, 0, 350]);
    }
}
