/// A BACnet date; `0xFF` in any field means "unspecified".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Date {
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.year_since_1900, self.month, self.day, self.weekday]
    }

    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self {
            year_since_1900: b[0],
            month: b[1],
            day: b[2],
            weekday: b[3],
        }
    }
}

impl Time {
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.hour, self.minute, self.second, self.hundredths]
    }

    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self {
            hour: b[0],
            minute: b[1],
            second: b[2],
            hundredths: b[3],
        }
    }
}
