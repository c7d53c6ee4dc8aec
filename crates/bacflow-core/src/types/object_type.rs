macro_rules! object_types {
    ($($variant:ident = $value:literal, $name:literal;)*) => {
        /// BACnet object type identifiers.
        ///
        /// Known standard types are named variants; anything else is carried as
        /// [`Proprietary`](Self::Proprietary).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum ObjectType {
            $($variant,)*
            Proprietary(u16),
        }

        impl ObjectType {
            pub const fn to_u16(self) -> u16 {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Proprietary(v) => v,
                }
            }

            pub const fn from_u16(value: u16) -> Self {
                match value {
                    $($value => Self::$variant,)*
                    v => Self::Proprietary(v),
                }
            }

            /// Protocol spelling, e.g. `analog-input`. `None` for proprietary types.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)*
                    Self::Proprietary(_) => None,
                }
            }

            /// Resolves a protocol spelling or a decimal number.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    other => other.parse::<u16>().ok().filter(|v| *v <= 0x3FF).map(Self::from_u16),
                }
            }
        }
    };
}

object_types! {
    AnalogInput = 0, "analog-input";
    AnalogOutput = 1, "analog-output";
    AnalogValue = 2, "analog-value";
    BinaryInput = 3, "binary-input";
    BinaryOutput = 4, "binary-output";
    BinaryValue = 5, "binary-value";
    Calendar = 6, "calendar";
    Command = 7, "command";
    Device = 8, "device";
    EventEnrollment = 9, "event-enrollment";
    File = 10, "file";
    Group = 11, "group";
    Loop = 12, "loop";
    MultiStateInput = 13, "multi-state-input";
    MultiStateOutput = 14, "multi-state-output";
    NotificationClass = 15, "notification-class";
    Program = 16, "program";
    Schedule = 17, "schedule";
    Averaging = 18, "averaging";
    MultiStateValue = 19, "multi-state-value";
    TrendLog = 20, "trend-log";
    LifeSafetyPoint = 21, "life-safety-point";
    LifeSafetyZone = 22, "life-safety-zone";
    Accumulator = 23, "accumulator";
    PulseConverter = 24, "pulse-converter";
    EventLog = 25, "event-log";
    GlobalGroup = 26, "global-group";
    TrendLogMultiple = 27, "trend-log-multiple";
    LoadControl = 28, "load-control";
    StructuredView = 29, "structured-view";
    AccessDoor = 30, "access-door";
}

impl core::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "proprietary-{}", self.to_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectType;
    use std::string::ToString;

    #[test]
    fn numeric_mapping_roundtrips() {
        for v in 0..=30u16 {
            assert_eq!(ObjectType::from_u16(v).to_u16(), v);
        }
        assert_eq!(ObjectType::from_u16(8), ObjectType::Device);
        assert_eq!(ObjectType::from_u16(600), ObjectType::Proprietary(600));
    }

    #[test]
    fn names_resolve_both_ways() {
        assert_eq!(ObjectType::AnalogInput.name(), Some("analog-input"));
        assert_eq!(
            ObjectType::from_name("multi-state-value"),
            Some(ObjectType::MultiStateValue)
        );
        assert_eq!(ObjectType::from_name("8"), Some(ObjectType::Device));
        assert_eq!(ObjectType::from_name("bogus"), None);
        assert_eq!(ObjectType::from_name("4096"), None);
        assert_eq!(ObjectType::Proprietary(700).to_string(), "proprietary-700");
    }
}
