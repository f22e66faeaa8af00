//! Hit types for pixel detector data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Event quality flags attached by the raw data interpreter.
///
/// The clusterizer never interprets these bits; it copies them into the
/// cluster summaries of the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventStatus(pub u16);

impl EventStatus {
    /// No error bits set.
    pub const OK: Self = Self(0);
    /// Event contains a service record.
    pub const HAS_SERVICE_RECORD: Self = Self(0x0001);
    /// Event has no trigger word.
    pub const NO_TRIGGER_WORD: Self = Self(0x0002);
    /// LVL1ID changed within the event.
    pub const NON_CONST_LVL1ID: Self = Self(0x0004);
    /// Fewer data headers than expected.
    pub const EVENT_INCOMPLETE: Self = Self(0x0008);
    /// Unknown data word seen.
    pub const UNKNOWN_WORD: Self = Self(0x0010);
    /// BCID did not increase by one between data headers.
    pub const BCID_JUMP: Self = Self(0x0020);
    /// Trigger number error.
    pub const TRIGGER_ERROR: Self = Self(0x0040);
    /// Event truncated by the interpreter.
    pub const TRUNCATED: Self = Self(0x0080);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no error bit is set.
    #[inline]
    #[must_use]
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A single pixel hit of one acquisition event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Event number shared by all hits of one event.
    pub event_number: u64,
    /// Pixel column.
    pub column: u16,
    /// Pixel row.
    pub row: u16,
    /// Time bucket (BCID) relative to the trigger window.
    pub time_bucket: i16,
    /// Time over threshold (charge proxy).
    pub tot: u16,
    /// Event quality flags.
    pub event_status: EventStatus,
}

impl Hit {
    /// Creates a hit with a clean event status.
    #[inline]
    #[must_use]
    pub fn new(event_number: u64, column: u16, row: u16, time_bucket: i16, tot: u16) -> Self {
        Self {
            event_number,
            column,
            row,
            time_bucket,
            tot,
            event_status: EventStatus::OK,
        }
    }

    /// Sets the event status.
    #[must_use]
    pub fn with_event_status(mut self, status: EventStatus) -> Self {
        self.event_status = status;
        self
    }

    /// Checks if this hit is a planar neighbour of another (8-connectivity).
    #[inline]
    #[must_use]
    pub fn is_adjacent(&self, other: &Self) -> bool {
        let dc = (i32::from(self.column) - i32::from(other.column)).abs();
        let dr = (i32::from(self.row) - i32::from(other.row)).abs();
        dc <= 1 && dr <= 1 && (dc != 0 || dr != 0)
    }
}
