//! Time slider arithmetic: slider positions in percent map to moments in the
//! past, 100 being now.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const STEP_PERCENT: f64 = 10.0;
pub const ANIMATION_STEP_PERCENT: u32 = 5;
pub const HOUR_MARK_SPACING: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// The last 24 hours, in whole hours.
    Day,
    /// The last 7 days, in whole days.
    #[default]
    Week,
}

impl TimeWindow {
    fn span_units(self) -> f64 {
        match self {
            TimeWindow::Day => 24.0,
            TimeWindow::Week => 7.0,
        }
    }

    fn unit(self) -> Duration {
        match self {
            TimeWindow::Day => Duration::hours(1),
            TimeWindow::Week => Duration::days(1),
        }
    }
}

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 100.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Whole window units back from now for a slider position. Partial units
/// round up, so any move off 100 reaches at least one unit into the past.
pub fn units_back(window: TimeWindow, percent: f64) -> i32 {
    let fraction = (100.0 - clamp_percent(percent)) / 100.0;
    (fraction * window.span_units()).ceil() as i32
}

pub fn time_at(now: DateTime<Utc>, window: TimeWindow, percent: f64) -> DateTime<Utc> {
    now - window.unit() * units_back(window, percent)
}

pub fn step_back(percent: f64) -> f64 {
    clamp_percent(percent - STEP_PERCENT)
}

pub fn step_forward(percent: f64) -> f64 {
    clamp_percent(percent + STEP_PERCENT)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeMark {
    pub hours_back: i64,
    pub percent: f64,
    pub at: DateTime<Utc>,
}

/// Marks every four hours across the day window, oldest first.
pub fn hour_marks(now: DateTime<Utc>) -> Vec<TimeMark> {
    (0..=24 / HOUR_MARK_SPACING)
        .rev()
        .map(|mark| mark * HOUR_MARK_SPACING)
        .map(|hours_back| TimeMark {
            hours_back,
            percent: 100.0 - hours_back as f64 / 24.0 * 100.0,
            at: now - Duration::hours(hours_back),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub percent: u32,
    pub at: DateTime<Utc>,
}

/// Positions a replay walks through, from the far end of the window to now.
pub fn animation_frames(now: DateTime<Utc>, window: TimeWindow) -> Vec<AnimationFrame> {
    (0..=100)
        .step_by(ANIMATION_STEP_PERCENT as usize)
        .map(|percent| AnimationFrame {
            percent,
            at: time_at(now, window, f64::from(percent)),
        })
        .collect()
}

/// Everything the slider needs to render one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderState {
    pub window: TimeWindow,
    pub percent: f64,
    pub units_back: i32,
    pub at: DateTime<Utc>,
    pub previous_percent: f64,
    pub next_percent: f64,
    pub hour_marks: Vec<TimeMark>,
    pub animation_frames: Vec<AnimationFrame>,
}

impl SliderState {
    pub fn new(now: DateTime<Utc>, window: TimeWindow, percent: f64) -> Self {
        let percent = clamp_percent(percent);
        Self {
            window,
            percent,
            units_back: units_back(window, percent),
            at: time_at(now, window, percent),
            previous_percent: step_back(percent),
            next_percent: step_forward(percent),
            hour_marks: hour_marks(now),
            animation_frames: animation_frames(now, window),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap()
    }

    #[test]
    fn ends_of_the_slider() {
        assert_eq!(time_at(now(), TimeWindow::Week, 100.0), now());
        assert_eq!(time_at(now(), TimeWindow::Week, 0.0), now() - Duration::days(7));
        assert_eq!(time_at(now(), TimeWindow::Day, 0.0), now() - Duration::hours(24));
        assert_eq!(time_at(now(), TimeWindow::Day, 150.0), now());
        assert_eq!(time_at(now(), TimeWindow::Day, -3.0), now() - Duration::hours(24));
    }

    #[test]
    fn partial_units_round_up() {
        // 10% of a week is 0.7 days.
        assert_eq!(units_back(TimeWindow::Week, 90.0), 1);
        // 50% of a day is exactly 12 hours.
        assert_eq!(units_back(TimeWindow::Day, 50.0), 12);
        assert_eq!(units_back(TimeWindow::Day, 99.0), 1);
        assert_eq!(units_back(TimeWindow::Day, f64::NAN), 0);
    }

    #[test]
    fn stepping_is_clamped() {
        assert_eq!(step_back(5.0), 0.0);
        assert_eq!(step_back(55.0), 45.0);
        assert_eq!(step_forward(95.0), 100.0);
    }

    #[test]
    fn hour_marks_run_oldest_first() {
        let marks = hour_marks(now());
        assert_eq!(marks.len(), 7);
        assert_eq!(marks[0].hours_back, 24);
        assert_eq!(marks[0].percent, 0.0);
        assert_eq!(marks[6].hours_back, 0);
        assert_eq!(marks[6].percent, 100.0);
        assert_eq!(marks[3].at, now() - Duration::hours(12));
    }

    #[test]
    fn animation_walks_toward_now() {
        let frames = animation_frames(now(), TimeWindow::Day);
        assert_eq!(frames.len(), 21);
        assert_eq!(frames[0].at, now() - Duration::hours(24));
        assert_eq!(frames[20].at, now());
        assert!(frames.windows(2).all(|pair| pair[0].at <= pair[1].at));
    }

    #[test]
    fn slider_state_combines_the_pieces() {
        let state = SliderState::new(now(), TimeWindow::Week, 95.0);
        assert_eq!(state.units_back, 1);
        assert_eq!(state.at, now() - Duration::days(1));
        assert_eq!(state.previous_percent, 85.0);
        assert_eq!(state.next_percent, 100.0);
        assert_eq!(state.animation_frames.len(), 21);
        assert_eq!(state.animation_frames[0].at, now() - Duration::days(7));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["window"], "week");
        assert_eq!(json["animationFrames"][20]["percent"], 100);
    }
}
