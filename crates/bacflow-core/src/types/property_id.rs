macro_rules! property_ids {
    ($($variant:ident = $value:literal, $name:literal;)*) => {
        /// BACnet property identifiers.
        ///
        /// Common standard properties are named variants; vendor-specific or
        /// unrecognised identifiers use [`Proprietary`](Self::Proprietary).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum PropertyId {
            $($variant,)*
            Proprietary(u32),
        }

        impl PropertyId {
            pub const fn to_u32(self) -> u32 {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Proprietary(v) => v,
                }
            }

            pub const fn from_u32(value: u32) -> Self {
                match value {
                    $($value => Self::$variant,)*
                    v => Self::Proprietary(v),
                }
            }

            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)*
                    Self::Proprietary(_) => None,
                }
            }

            /// Resolves a protocol spelling (`present-value`) or a decimal identifier.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    other => other.parse::<u32>().ok().map(Self::from_u32),
                }
            }
        }
    };
}

property_ids! {
    AckedTransitions = 0, "acked-transitions";
    Action = 2, "action";
    ActiveText = 4, "active-text";
    AlarmValue = 6, "alarm-value";
    ApduSegmentTimeout = 10, "apdu-segment-timeout";
    ApduTimeout = 11, "apdu-timeout";
    ApplicationSoftwareVersion = 12, "application-software-version";
    ControlledVariableReference = 19, "controlled-variable-reference";
    CovIncrement = 22, "cov-increment";
    DaylightSavingsStatus = 24, "daylight-savings-status";
    Deadband = 25, "deadband";
    Description = 28, "description";
    DeviceAddressBinding = 30, "device-address-binding";
    EventEnable = 35, "event-enable";
    EventState = 36, "event-state";
    ExceptionSchedule = 38, "exception-schedule";
    FirmwareRevision = 44, "firmware-revision";
    HighLimit = 45, "high-limit";
    InactiveText = 46, "inactive-text";
    ListOfGroupMembers = 53, "list-of-group-members";
    ListOfObjectPropertyReferences = 54, "list-of-object-property-references";
    LocalDate = 56, "local-date";
    LocalTime = 57, "local-time";
    Location = 58, "location";
    LowLimit = 59, "low-limit";
    ManipulatedVariableReference = 60, "manipulated-variable-reference";
    MaxApduLengthAccepted = 62, "max-apdu-length-accepted";
    MaxPresValue = 65, "max-pres-value";
    MinPresValue = 69, "min-pres-value";
    ModelName = 70, "model-name";
    NotificationClass = 17, "notification-class";
    NumberOfApduRetries = 73, "number-of-apdu-retries";
    NumberOfStates = 74, "number-of-states";
    ObjectIdentifier = 75, "object-identifier";
    ObjectList = 76, "object-list";
    ObjectName = 77, "object-name";
    ObjectPropertyReference = 78, "object-property-reference";
    ObjectType = 79, "object-type";
    OutOfService = 81, "out-of-service";
    Polarity = 84, "polarity";
    PresentValue = 85, "present-value";
    PriorityArray = 87, "priority-array";
    ProtocolObjectTypesSupported = 96, "protocol-object-types-supported";
    ProtocolServicesSupported = 97, "protocol-services-supported";
    ProtocolVersion = 98, "protocol-version";
    RecipientList = 102, "recipient-list";
    Reliability = 103, "reliability";
    RelinquishDefault = 104, "relinquish-default";
    SegmentationSupported = 107, "segmentation-supported";
    Setpoint = 108, "setpoint";
    SetpointReference = 109, "setpoint-reference";
    StateText = 110, "state-text";
    StatusFlags = 111, "status-flags";
    SystemStatus = 112, "system-status";
    TimeDelay = 113, "time-delay";
    Units = 117, "units";
    UtcOffset = 119, "utc-offset";
    VendorIdentifier = 120, "vendor-identifier";
    VendorName = 121, "vendor-name";
    WeeklySchedule = 123, "weekly-schedule";
    ProtocolRevision = 139, "protocol-revision";
    LogDeviceObjectProperty = 132, "log-device-object-property";
    ActiveCovSubscriptions = 152, "active-cov-subscriptions";
    DatabaseRevision = 155, "database-revision";
    StructuredObjectList = 209, "structured-object-list";
    SubordinateList = 211, "subordinate-list";
    ActualShedLevel = 212, "actual-shed-level";
    ExpectedShedLevel = 214, "expected-shed-level";
    RequestedShedLevel = 218, "requested-shed-level";
}

impl PropertyId {
    /// Properties that only exist on the device object.
    pub const fn is_device_property(self) -> bool {
        matches!(
            self,
            Self::ApduSegmentTimeout
                | Self::ApduTimeout
                | Self::ApplicationSoftwareVersion
                | Self::DaylightSavingsStatus
                | Self::DatabaseRevision
                | Self::DeviceAddressBinding
                | Self::FirmwareRevision
                | Self::LocalDate
                | Self::LocalTime
                | Self::Location
                | Self::MaxApduLengthAccepted
                | Self::ModelName
                | Self::NumberOfApduRetries
                | Self::ObjectList
                | Self::ProtocolObjectTypesSupported
                | Self::ProtocolRevision
                | Self::ProtocolServicesSupported
                | Self::ProtocolVersion
                | Self::SegmentationSupported
                | Self::StructuredObjectList
                | Self::SystemStatus
                | Self::UtcOffset
                | Self::VendorIdentifier
                | Self::VendorName
        )
    }
}

impl core::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "proprietary-{}", self.to_u32()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PropertyId;

    #[test]
    fn resolve_by_name_or_number() {
        assert_eq!(
            PropertyId::from_name("present-value"),
            Some(PropertyId::PresentValue)
        );
        assert_eq!(PropertyId::from_name("85"), Some(PropertyId::PresentValue));
        assert_eq!(
            PropertyId::from_name("5000"),
            Some(PropertyId::Proprietary(5000))
        );
        assert_eq!(PropertyId::from_name("not-a-property"), None);
    }

    #[test]
    fn numeric_mapping() {
        assert_eq!(PropertyId::PresentValue.to_u32(), 85);
        assert_eq!(PropertyId::from_u32(76), PropertyId::ObjectList);
        assert_eq!(PropertyId::ObjectName.name(), Some("object-name"));
    }

    #[test]
    fn device_only_properties() {
        assert!(PropertyId::ObjectList.is_device_property());
        assert!(PropertyId::VendorName.is_device_property());
        assert!(!PropertyId::PresentValue.is_device_property());
        assert!(!PropertyId::ObjectName.is_device_property());
    }
}
