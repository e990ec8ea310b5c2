//! Date-time (low/high precision) and time-of-day buffers (spec §4.4).

use std::sync::Mutex;

use crate::column::{
    Column, DateTimeColumn, TemporalStorage, TimeOfDayColumn, INSTANT_MAX_SECOND, INSTANT_MIN_SECOND, LONG_MAX, LONG_MIN,
};
use crate::error::Error;

/// Validates a `(seconds, nanos)` argument pair against spec §4.3's ranges.
/// `nanos` is only checked for high-precision buffers, since the
/// low-precision variant never stores it.
fn validate_instant(seconds: i64, nanos: i32, high_precision: bool) -> Result<(), Error> {
    if !(INSTANT_MIN_SECOND..=INSTANT_MAX_SECOND).contains(&seconds) {
        return Err(Error::invalid_argument(format!(
            "seconds {seconds} is out of range [{INSTANT_MIN_SECOND}, {INSTANT_MAX_SECOND}]"
        )));
    }
    if high_precision && !(0..=999_999_999).contains(&nanos) {
        return Err(Error::invalid_argument(format!(
            "nanos {nanos} is out of range [0, 999999999]"
        )));
    }
    Ok(())
}

enum Seconds {
    Fixed(Vec<i64>),
    Growing(Vec<i64>),
}

impl Seconds {
    fn as_slice(&self) -> &[i64] {
        match self {
            Seconds::Fixed(v) | Seconds::Growing(v) => v,
        }
    }
    fn as_mut_slice(&mut self) -> &mut [i64] {
        match self {
            Seconds::Fixed(v) | Seconds::Growing(v) => v,
        }
    }
    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

struct Inner {
    seconds: Seconds,
    nanos: Option<Vec<i32>>,
    frozen: bool,
}

/// A date-time buffer. `high_precision` buffers additionally carry a
/// nanosecond-of-second component alongside the seconds-since-epoch value.
pub struct DateTimeBuffer {
    inner: Mutex<Inner>,
    high_precision: bool,
}

impl DateTimeBuffer {
    pub fn new_fixed(capacity: usize, high_precision: bool) -> Self {
        DateTimeBuffer {
            inner: Mutex::new(Inner {
                seconds: Seconds::Fixed(vec![LONG_MIN; capacity]),
                nanos: high_precision.then(|| vec![0i32; capacity]),
                frozen: false,
            }),
            high_precision,
        }
    }

    pub fn new_growing(high_precision: bool) -> Self {
        DateTimeBuffer {
            inner: Mutex::new(Inner {
                seconds: Seconds::Growing(Vec::new()),
                nanos: high_precision.then(Vec::new),
                frozen: false,
            }),
            high_precision,
        }
    }

    /// Writes `seconds_since_epoch` (and, for high precision buffers,
    /// `nanos_of_second`) at `row`. Pass `None` for a missing value.
    pub fn set(&self, row: usize, value: Option<(i64, i32)>) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("date-time buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        let len = inner.seconds.len();
        if row >= len {
            return Err(Error::out_of_range(format!(
                "row {row} is out of range for a buffer of length {len}"
            )));
        }
        if let Some((s, n)) = value {
            validate_instant(s, n, self.high_precision)?;
        }
        let (s, n) = value.unwrap_or((LONG_MIN, 0));
        inner.seconds.as_mut_slice()[row] = s;
        if let Some(nanos) = inner.nanos.as_mut() {
            nanos[row] = n;
        }
        Ok(())
    }

    pub fn push(&self, value: Option<(i64, i32)>) -> Result<usize, Error> {
        let mut inner = self.inner.lock().expect("date-time buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        if let Some((s, n)) = value {
            validate_instant(s, n, self.high_precision)?;
        }
        let (s, n) = value.unwrap_or((LONG_MIN, 0));
        match &mut inner.seconds {
            Seconds::Growing(v) => {
                v.push(s);
                if let Some(nanos) = inner.nanos.as_mut() {
                    nanos.push(n);
                }
                Ok(v.len() - 1)
            }
            Seconds::Fixed(_) => Err(Error::unsupported_operation(
                "cannot push onto a fixed-length date-time buffer",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("date-time buffer lock poisoned").seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(&self) -> Column {
        let mut inner = self.inner.lock().expect("date-time buffer lock poisoned");
        inner.frozen = true;
        let seconds: std::sync::Arc<[i64]> = std::sync::Arc::from(inner.seconds.as_slice().to_vec().into_boxed_slice());
        let storage = if self.high_precision {
            let nanos = inner.nanos.clone().unwrap_or_default();
            TemporalStorage::HighPrecision {
                seconds,
                nanos: std::sync::Arc::from(nanos.into_boxed_slice()),
            }
        } else {
            TemporalStorage::LowPrecision(seconds)
        };
        Column::DateTime(DateTimeColumn::new(storage))
    }
}

struct TimeInner {
    nanos_of_day: Vec<i64>,
    frozen: bool,
    growing: bool,
}

/// A time-of-day buffer: nanoseconds since midnight.
pub struct TimeOfDayBuffer {
    inner: Mutex<TimeInner>,
}

impl TimeOfDayBuffer {
    pub fn new_fixed(capacity: usize) -> Self {
        TimeOfDayBuffer {
            inner: Mutex::new(TimeInner {
                nanos_of_day: vec![LONG_MAX; capacity],
                frozen: false,
                growing: false,
            }),
        }
    }

    pub fn new_growing() -> Self {
        TimeOfDayBuffer {
            inner: Mutex::new(TimeInner {
                nanos_of_day: Vec::new(),
                frozen: false,
                growing: true,
            }),
        }
    }

    pub fn set(&self, row: usize, value: Option<i64>) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("time-of-day buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        if inner.growing {
            return Err(Error::unsupported_operation(
                "cannot random-access write a growing time-of-day buffer",
            ));
        }
        let len = inner.nanos_of_day.len();
        if row >= len {
            return Err(Error::out_of_range(format!(
                "row {row} is out of range for a buffer of length {len}"
            )));
        }
        inner.nanos_of_day[row] = value.unwrap_or(LONG_MAX);
        Ok(())
    }

    pub fn push(&self, value: Option<i64>) -> Result<usize, Error> {
        let mut inner = self.inner.lock().expect("time-of-day buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        if !inner.growing {
            return Err(Error::unsupported_operation(
                "cannot push onto a fixed-length time-of-day buffer",
            ));
        }
        inner.nanos_of_day.push(value.unwrap_or(LONG_MAX));
        Ok(inner.nanos_of_day.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("time-of-day buffer lock poisoned").nanos_of_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(&self) -> Column {
        let mut inner = self.inner.lock().expect("time-of-day buffer lock poisoned");
        inner.frozen = true;
        Column::TimeOfDay(TimeOfDayColumn::new(inner.nanos_of_day.clone()))
    }
}
