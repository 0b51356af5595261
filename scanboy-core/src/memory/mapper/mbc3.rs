use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RtcCounters {
    nanos: u32,
    seconds: u8,
    minutes: u8,
    hours: u8,
    days: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RealTimeClock {
    last_update: SystemTime,
    live: RtcCounters,
    latched: RtcCounters,
    latch_armed: bool,
    day_overflow: bool,
    halted: bool,
}

impl RealTimeClock {
    pub(crate) fn new(now: SystemTime) -> Self {
        Self {
            last_update: now,
            live: RtcCounters::default(),
            latched: RtcCounters::default(),
            latch_armed: false,
            day_overflow: false,
            halted: false,
        }
    }

    /// Advance the live counters by the wall-clock time elapsed since the last update.
    pub(crate) fn update(&mut self, now: SystemTime) {
        let since = now.duration_since(self.last_update).unwrap_or_else(|err| {
            log::error!(
                "Time has gone backwards: last_update={:?}, now={now:?}: {err}",
                self.last_update
            );
            Duration::from_secs(0)
        });
        self.last_update = now;

        if !self.halted {
            self.advance(since);
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        let nanos = u128::from(self.live.nanos) + elapsed.as_nanos();
        self.live.nanos = (nanos % NANOS_PER_SECOND) as u32;

        let seconds = u128::from(self.live.seconds) + nanos / NANOS_PER_SECOND;
        self.live.seconds = (seconds % 60) as u8;

        let minutes = u128::from(self.live.minutes) + seconds / 60;
        self.live.minutes = (minutes % 60) as u8;

        let hours = u128::from(self.live.hours) + minutes / 60;
        self.live.hours = (hours % 24) as u8;

        let days = u128::from(self.live.days) + hours / 24;
        self.live.days = (days % 512) as u16;
        if days >= 512 {
            self.day_overflow = true;
        }
    }

    pub(crate) fn process_latch_write(&mut self, value: u8) {
        if value == 0x00 {
            self.latch_armed = true;
        } else if self.latch_armed {
            self.latch_armed = false;
            self.latched = self.live;
            log::trace!("RTC latched: {:?}", self.latched);
        }
    }

    pub(crate) fn read_register(&self, register: u8) -> Option<u8> {
        match register {
            0x08 => Some(self.latched.seconds),
            0x09 => Some(self.latched.minutes),
            0x0A => Some(self.latched.hours),
            0x0B => Some(self.latched.days as u8),
            0x0C => Some(
                (u8::from(self.day_overflow) << 7)
                    | (u8::from(self.halted) << 6)
                    | (self.latched.days >> 8) as u8,
            ),
            _ => None,
        }
    }

    pub(crate) fn write_register(&mut self, register: u8, value: u8) {
        match register {
            0x08 if value < 60 => {
                self.live.seconds = value;
                self.live.nanos = 0;
            }
            0x09 if value < 60 => {
                self.live.minutes = value;
            }
            0x0A if value < 24 => {
                self.live.hours = value;
            }
            0x0B => {
                self.live.days = (self.live.days & 0x0100) | u16::from(value);
            }
            0x0C => {
                self.live.days = (self.live.days & 0x00FF) | (u16::from(value & 0x01) << 8);
                self.halted = value & 0x40 != 0;
                self.day_overflow = value & 0x80 != 0;
            }
            0x08..=0x0A => {
                log::warn!("Dropping out-of-range RTC write: register={register:02X}, value={value}");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch_plus(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn counters_cascade() {
        let mut rtc = RealTimeClock::new(epoch_plus(0));
        rtc.update(epoch_plus(86_400 + 3_600 + 61));
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);

        assert_eq!(Some(1), rtc.read_register(0x08));
        assert_eq!(Some(1), rtc.read_register(0x09));
        assert_eq!(Some(1), rtc.read_register(0x0A));
        assert_eq!(Some(1), rtc.read_register(0x0B));
        assert_eq!(Some(0), rtc.read_register(0x0C));
    }

    #[test]
    fn day_counter_overflows() {
        let mut rtc = RealTimeClock::new(epoch_plus(0));
        rtc.update(epoch_plus(513 * 86_400));
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);

        assert_eq!(Some(1), rtc.read_register(0x0B));
        assert_eq!(Some(0x80), rtc.read_register(0x0C));
    }

    #[test]
    fn latch_needs_rearming() {
        let mut rtc = RealTimeClock::new(epoch_plus(0));
        rtc.update(epoch_plus(5));
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);
        assert_eq!(Some(5), rtc.read_register(0x08));

        rtc.update(epoch_plus(9));
        rtc.process_latch_write(0x01);
        assert_eq!(Some(5), rtc.read_register(0x08));

        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);
        assert_eq!(Some(9), rtc.read_register(0x08));
    }

    #[test]
    fn halted_clock_does_not_advance() {
        let mut rtc = RealTimeClock::new(epoch_plus(0));
        rtc.write_register(0x0C, 0x40);
        rtc.update(epoch_plus(100));
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);

        assert_eq!(Some(0), rtc.read_register(0x08));
        assert_eq!(Some(0x40), rtc.read_register(0x0C));
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut rtc = RealTimeClock::new(epoch_plus(0));
        rtc.write_register(0x08, 59);
        rtc.write_register(0x09, 60);
        rtc.write_register(0x0A, 24);
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);

        assert_eq!(Some(59), rtc.read_register(0x08));
        assert_eq!(Some(0), rtc.read_register(0x09));
        assert_eq!(Some(0), rtc.read_register(0x0A));
    }

    #[test]
    fn time_going_backwards_is_ignored() {
        let mut rtc = RealTimeClock::new(epoch_plus(100));
        rtc.update(epoch_plus(50));
        rtc.update(epoch_plus(52));
        rtc.process_latch_write(0x00);
        rtc.process_latch_write(0x01);

        assert_eq!(Some(2), rtc.read_register(0x08));
    }
}
