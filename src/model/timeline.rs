use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How far ahead of today the timeline reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowSpan {
    #[default]
    FourWeeks,
    EightWeeks,
    TwelveWeeks,
}

impl WindowSpan {
    pub const ALL: [WindowSpan; 3] = [Self::FourWeeks, Self::EightWeeks, Self::TwelveWeeks];

    pub fn weeks(self) -> i64 {
        match self {
            Self::FourWeeks => 4,
            Self::EightWeeks => 8,
            Self::TwelveWeeks => 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FourWeeks => "4 weeks",
            Self::EightWeeks => "8 weeks",
            Self::TwelveWeeks => "12 weeks",
        }
    }
}

/// Days of history shown left of today.
const LOOKBACK_DAYS: i64 = 3;

/// The visible slice of time, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimelineWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window from a few days before `now` through `span` weeks after it.
    pub fn around(now: DateTime<Utc>, span: WindowSpan) -> Self {
        Self::new(
            now - Duration::days(LOOKBACK_DAYS),
            now + Duration::weeks(span.weeks()),
        )
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    pub fn clamp(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        t.clamp(self.start, self.end.max(self.start))
    }
}

/// Converts between pixel offsets in the timeline viewport and timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMapper {
    window: TimelineWindow,
    width_px: f32,
}

impl TimeMapper {
    /// Returns `None` for a zero-width container or an empty/inverted window,
    /// so callers skip the geometry update instead of producing NaN positions.
    pub fn new(window: TimelineWindow, width_px: f32) -> Option<Self> {
        if !(width_px.is_finite() && width_px > 0.0) || window.end <= window.start {
            return None;
        }
        Some(Self { window, width_px })
    }

    pub fn window(&self) -> TimelineWindow {
        self.window
    }

    pub fn width_px(&self) -> f32 {
        self.width_px
    }

    fn span_ms(&self) -> f64 {
        self.window.length().num_milliseconds() as f64
    }

    /// Position of `t` in the window as a fraction clamped to `[0, 1]`.
    pub fn time_to_fraction(&self, t: DateTime<Utc>) -> f64 {
        let offset = (t - self.window.start).num_milliseconds() as f64;
        (offset / self.span_ms()).clamp(0.0, 1.0)
    }

    pub fn fraction_to_time(&self, f: f64) -> DateTime<Utc> {
        let offset = (f.clamp(0.0, 1.0) * self.span_ms()).round() as i64;
        self.window.start + Duration::milliseconds(offset)
    }

    pub fn ms_per_pixel(&self) -> f64 {
        self.span_ms() / self.width_px as f64
    }

    /// Convert a horizontal pointer delta into a time delta.
    pub fn pixels_to_duration(&self, dx: f32) -> Duration {
        Duration::milliseconds((dx as f64 * self.ms_per_pixel()).round() as i64)
    }

    pub fn time_to_x(&self, t: DateTime<Utc>) -> f32 {
        (self.time_to_fraction(t) * self.width_px as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn mapper() -> TimeMapper {
        TimeMapper::new(TimelineWindow::new(day(0), day(28)), 280.0).unwrap()
    }

    #[test]
    fn degenerate_inputs_yield_no_mapper() {
        let w = TimelineWindow::new(day(0), day(28));
        assert!(TimeMapper::new(w, 0.0).is_none());
        assert!(TimeMapper::new(w, f32::NAN).is_none());
        assert!(TimeMapper::new(TimelineWindow::new(day(5), day(5)), 100.0).is_none());
        assert!(TimeMapper::new(TimelineWindow::new(day(5), day(1)), 100.0).is_none());
    }

    #[test]
    fn fraction_round_trip() {
        let m = mapper();
        for i in 0..=20 {
            let f = i as f64 / 20.0;
            let back = m.time_to_fraction(m.fraction_to_time(f));
            assert!((back - f).abs() < 1e-9, "{f} came back as {back}");
        }
    }

    #[test]
    fn fractions_clamp_outside_window() {
        let m = mapper();
        assert_eq!(m.time_to_fraction(day(-10)), 0.0);
        assert_eq!(m.time_to_fraction(day(40)), 1.0);
        assert_eq!(m.time_to_fraction(day(7)), 0.25);
    }

    #[test]
    fn pixel_deltas_map_to_days() {
        let m = mapper();
        assert_eq!(m.ms_per_pixel(), Duration::days(1).num_milliseconds() as f64 / 10.0);
        assert_eq!(m.pixels_to_duration(100.0), Duration::days(10));
        assert_eq!(m.pixels_to_duration(-25.0), -Duration::hours(60));
        assert_eq!(m.time_to_x(day(7)), 70.0);
        assert_eq!(m.width_px(), 280.0);
    }

    #[test]
    fn window_around_now() {
        let now = day(10);
        let w = TimelineWindow::around(now, WindowSpan::EightWeeks);
        assert_eq!(w.start, day(7));
        assert_eq!(w.end, day(10 + 56));
        assert!(w.contains(day(7)));
        assert!(!w.contains(w.end));
    }
}
