//! Translation between kernel input records and key events
//!
//! [`RawEvent`] is the kernel's `struct input_event` laid out bit-for-bit;
//! [`KeyEvent`] is what the rest of the daemon works with. Only `EV_KEY`
//! records with value 0 (release) or 1 (press) become key events. Repeats,
//! sync reports, scan codes, LED updates and everything else decode to
//! `None` and are dropped.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};

use crate::keycodes::Keycode;
use crate::time::{self, SystemTimestamp};

/// `EV_SYN`
pub const EV_SYN: u16 = 0x00;
/// `EV_KEY`
pub const EV_KEY: u16 = 0x01;
/// `SYN_REPORT`
pub const SYN_REPORT: u16 = 0;

const NANOS_PER_MICRO: u64 = 1_000;
const MICROS_PER_SEC: u64 = 1_000_000;

/// The kernel's `struct input_event` on 64-bit Linux.
///
/// `subseconds` is `tv_usec`: microseconds within the second.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawEvent {
    pub seconds: u64,
    pub subseconds: u64,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

const _: () = assert!(std::mem::size_of::<RawEvent>() == RawEvent::SIZE);

impl RawEvent {
    pub const SIZE: usize = 24;

    pub fn new(time: SystemTimestamp, kind: u16, code: u16, value: i32) -> Self {
        Self {
            seconds: time.seconds,
            subseconds: u64::from(time.nanoseconds) / NANOS_PER_MICRO,
            kind,
            code,
            value,
        }
    }

    /// Timestamp of this record. Out-of-range microseconds carry into the
    /// seconds field.
    pub fn timestamp(&self) -> SystemTimestamp {
        let seconds = self
            .seconds
            .saturating_add(self.subseconds / MICROS_PER_SEC);
        let micros = self.subseconds % MICROS_PER_SEC;
        // micros < 1_000_000, so the product fits in u32
        SystemTimestamp::new(seconds, (micros * NANOS_PER_MICRO) as u32)
    }

    /// The record as the bytes the kernel reads and writes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.seconds.to_ne_bytes());
        bytes[8..16].copy_from_slice(&self.subseconds.to_ne_bytes());
        bytes[16..18].copy_from_slice(&self.kind.to_ne_bytes());
        bytes[18..20].copy_from_slice(&self.code.to_ne_bytes());
        bytes[20..24].copy_from_slice(&self.value.to_ne_bytes());
        bytes
    }

    pub fn is_sync(&self) -> bool {
        self.kind == EV_SYN && self.code == SYN_REPORT && self.value == 0
    }
}

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    Press,
    Release,
}

/// A key press or release at a point in time.
///
/// Timestamps are kept at microsecond resolution, the finest the kernel
/// record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent<C = Keycode> {
    switch: Switch,
    code: C,
    time: DateTime<Utc>,
}

impl<C: Copy> KeyEvent<C> {
    pub fn new(switch: Switch, code: C, time: DateTime<Utc>) -> Self {
        Self {
            switch,
            code,
            time: time.trunc_subsecs(6),
        }
    }

    pub fn press(code: C, time: DateTime<Utc>) -> Self {
        Self::new(Switch::Press, code, time)
    }

    pub fn release(code: C, time: DateTime<Utc>) -> Self {
        Self::new(Switch::Release, code, time)
    }

    pub fn switch(&self) -> Switch {
        self.switch
    }

    pub fn code(&self) -> C {
        self.code
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn is_press(&self) -> bool {
        self.switch == Switch::Press
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.switch {
            Switch::Press => "press",
            Switch::Release => "release",
        };
        write!(f, "{} {} ({})", action, self.code, self.code.0)
    }
}

/// Decode a kernel record into a key event.
pub fn decode(raw: &RawEvent) -> Option<KeyEvent> {
    if raw.kind != EV_KEY {
        return None;
    }
    let switch = match raw.value {
        0 => Switch::Release,
        1 => Switch::Press,
        _ => return None,
    };
    Some(KeyEvent {
        switch,
        code: Keycode(raw.code),
        time: time::from_system(raw.timestamp()),
    })
}

/// Encode a key event as a kernel record.
pub fn encode(event: &KeyEvent) -> RawEvent {
    let value = match event.switch {
        Switch::Press => 1,
        Switch::Release => 0,
    };
    RawEvent::new(time::to_system(event.time), EV_KEY, event.code.0, value)
}

/// The `SYN_REPORT` record that must follow every key record.
pub fn sync(time: DateTime<Utc>) -> RawEvent {
    sync_at(time::to_system(time))
}

pub(crate) fn sync_at(time: SystemTimestamp) -> RawEvent {
    RawEvent::new(time, EV_SYN, SYN_REPORT, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(seconds: u64, subseconds: u64, kind: u16, code: u16, value: i32) -> RawEvent {
        RawEvent {
            seconds,
            subseconds,
            kind,
            code,
            value,
        }
    }

    #[test]
    fn test_value_zero_is_release_and_one_is_press() {
        let release = decode(&raw(10, 0, EV_KEY, 30, 0)).unwrap();
        assert_eq!(release.switch(), Switch::Release);

        let press = decode(&raw(10, 0, EV_KEY, 30, 1)).unwrap();
        assert_eq!(press.switch(), Switch::Press);
        assert_eq!(press.code(), Keycode(30));
    }

    #[test]
    fn test_repeat_and_other_types_decode_to_nothing() {
        assert_eq!(decode(&raw(10, 0, EV_KEY, 30, 2)), None);
        assert_eq!(decode(&raw(10, 0, EV_KEY, 30, -1)), None);
        assert_eq!(decode(&raw(10, 0, EV_SYN, 0, 0)), None);
        // EV_MSC / MSC_SCAN
        assert_eq!(decode(&raw(10, 0, 0x04, 4, 0x70004)), None);
        // EV_LED
        assert_eq!(decode(&raw(10, 0, 0x11, 1, 1)), None);
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let event = decode(&raw(1, 0, EV_KEY, 700, 1)).unwrap();
        assert_eq!(event.code(), Keycode(700));
        assert_eq!(event.code().name(), None);
    }

    #[test]
    fn test_decode_then_encode_reproduces_record() {
        let records = [
            raw(1_600_000_000, 500_000, EV_KEY, 30, 1),
            raw(1_600_000_000, 500_000, EV_KEY, 30, 0),
            raw(0, 0, EV_KEY, 1, 1),
            raw(1_700_000_123, 999_999, EV_KEY, 248, 0),
            raw(42, 1, EV_KEY, 65535, 1),
        ];
        for record in records {
            let event = decode(&record).unwrap();
            assert_eq!(encode(&event), record);
        }
    }

    #[test]
    fn test_encode_then_decode_reproduces_event() {
        let time = DateTime::from_timestamp(1_600_000_000, 123_456_789).unwrap();
        for event in [
            KeyEvent::press(Keycode(30), time),
            KeyEvent::release(Keycode(58), time),
            KeyEvent::press(Keycode(91), DateTime::from_timestamp(0, 0).unwrap()),
        ] {
            assert_eq!(decode(&encode(&event)), Some(event));
        }
    }

    #[test]
    fn test_encode_sets_type_and_value() {
        let time = time::now();
        let press = encode(&KeyEvent::press(Keycode(30), time));
        assert_eq!(press.kind, EV_KEY);
        assert_eq!(press.value, 1);

        let release = encode(&KeyEvent::release(Keycode(30), time));
        assert_eq!(release.kind, EV_KEY);
        assert_eq!(release.value, 0);
    }

    #[test]
    fn test_sync_record() {
        let time = DateTime::from_timestamp(1_600_000_000, 500_000_000).unwrap();
        let record = sync(time);
        assert_eq!(record, raw(1_600_000_000, 500_000, EV_SYN, SYN_REPORT, 0));
        assert!(record.is_sync());
        assert_eq!(decode(&record), None);
    }

    #[test]
    fn test_timestamps_truncate_to_microseconds() {
        let time = DateTime::from_timestamp(5, 1_999).unwrap();
        let event = KeyEvent::press(Keycode(30), time);
        assert_eq!(event.time().timestamp_subsec_nanos(), 1_000);
    }

    #[test]
    fn test_out_of_range_microseconds_carry() {
        let record = raw(5, 2_500_000, EV_KEY, 30, 1);
        assert_eq!(record.timestamp(), SystemTimestamp::new(7, 500_000_000));
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(RawEvent::SIZE, 24);
        let record = raw(1, 2, EV_KEY, 30, 1);
        let bytes = record.to_bytes();
        assert_eq!(&bytes[0..8], &1u64.to_ne_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_ne_bytes());
        assert_eq!(&bytes[16..18], &EV_KEY.to_ne_bytes());
        assert_eq!(&bytes[18..20], &30u16.to_ne_bytes());
        assert_eq!(&bytes[20..24], &1i32.to_ne_bytes());
    }

    #[test]
    fn test_display() {
        let event = KeyEvent::press(Keycode(30), time::now());
        assert_eq!(event.to_string(), "press a (30)");
    }
}
