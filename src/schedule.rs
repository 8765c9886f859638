use chrono::{Datelike, Local, NaiveDateTime, Timelike};

/// Wall-clock snapshot taken once per tick. The derived strings use the same
/// formats the logs store: `YYYY-MM-DD` dates and `HH:MM` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub date: String,
    pub time: String,
    pub hour_label: String,
    pub hour: u32,
    pub day: u32,
    pub minute: u32,
}

impl Stamp {
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    pub fn from_naive(at: NaiveDateTime) -> Self {
        Self {
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M").to_string(),
            hour_label: at.format("%H").to_string(),
            hour: at.hour(),
            day: at.day(),
            minute: at.minute(),
        }
    }
}

/// Which logs crossed their boundary since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    pub hour: bool,
    pub day: bool,
}

/// Outcome of feeding one successful counter sample to the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sample since startup; no delta can be derived yet, so this tick
    /// writes nothing and renders nothing.
    BaselineEstablished,
    /// Delta relative to the previous sample, plus whether the hourly
    /// notification gate is open at this tick.
    Recorded { delta: i64, notify: bool },
}

/// The scheduler's owned state: previous counter value plus the hour and day
/// seen at the previous tick. The hour log is keyed to the hour only and the
/// day log to the day only; the two are never cross-wired.
pub struct TickState {
    baseline: Option<i64>,
    last_hour: u32,
    last_day: u32,
}

impl TickState {
    pub fn new(start: &Stamp) -> Self {
        Self {
            baseline: None,
            last_hour: start.hour,
            last_day: start.day,
        }
    }

    /// Tick step 1: flags boundary crossings and advances the bookkeeping.
    /// Runs before any fetch or write; each flag fires exactly once per
    /// crossing, including on ticks whose fetch later fails.
    pub fn rollover(&mut self, now: &Stamp) -> Rollover {
        let hour = now.hour != self.last_hour;
        let day = now.day != self.last_day;
        if hour {
            self.last_hour = now.hour;
        }
        if day {
            self.last_day = now.day;
        }
        Rollover { hour, day }
    }

    /// Tick steps 3 and 4: establishes the baseline on the first sample,
    /// otherwise derives the per-minute delta (negative deltas included) and
    /// advances the baseline to the current value.
    pub fn observe(&mut self, now: &Stamp, current: i64) -> Observation {
        match self.baseline.replace(current) {
            None => Observation::BaselineEstablished,
            Some(previous) => Observation::Recorded {
                delta: current - previous,
                notify: now.minute == 0,
            },
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }
}
