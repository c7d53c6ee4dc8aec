//! Concrete types of context-tagged values inside well-known constructed properties.
//!
//! A context tag only carries a number, so a decoder cannot tell an object
//! identifier from an unsigned value by the tag byte alone. The table below
//! records, per property, which application type sits at each tag position.

use crate::encoding::tag::AppTag;
use crate::types::PropertyId;
use crate::DecodeError;

/// One `(property, tag position) -> application type` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTagType {
    pub property: PropertyId,
    pub tag_num: u8,
    pub app_tag: AppTag,
}

const fn row(property: PropertyId, tag_num: u8, app_tag: AppTag) -> ContextTagType {
    ContextTagType {
        property,
        tag_num,
        app_tag,
    }
}

/// Rows grouped by property; order does not matter for lookup.
pub static CONTEXT_TAG_TYPES: &[ContextTagType] = &[
    // BACnetActionCommand
    row(PropertyId::Action, 0, AppTag::ObjectId),
    row(PropertyId::Action, 1, AppTag::ObjectId),
    row(PropertyId::Action, 2, AppTag::Enumerated),
    row(PropertyId::Action, 3, AppTag::UnsignedInt),
    row(PropertyId::Action, 5, AppTag::UnsignedInt),
    row(PropertyId::Action, 6, AppTag::UnsignedInt),
    row(PropertyId::Action, 7, AppTag::Boolean),
    row(PropertyId::Action, 8, AppTag::Boolean),
    // BACnetReadAccessSpecification
    row(PropertyId::ListOfGroupMembers, 0, AppTag::ObjectId),
    // BACnetSpecialEvent / BACnetCalendarEntry
    row(PropertyId::ExceptionSchedule, 1, AppTag::ObjectId),
    row(PropertyId::ExceptionSchedule, 3, AppTag::UnsignedInt),
    // BACnetDeviceObjectPropertyReference
    row(PropertyId::LogDeviceObjectProperty, 0, AppTag::ObjectId),
    row(PropertyId::LogDeviceObjectProperty, 1, AppTag::Enumerated),
    row(PropertyId::LogDeviceObjectProperty, 2, AppTag::UnsignedInt),
    row(PropertyId::LogDeviceObjectProperty, 3, AppTag::ObjectId),
    row(PropertyId::ListOfObjectPropertyReferences, 0, AppTag::ObjectId),
    row(PropertyId::ListOfObjectPropertyReferences, 1, AppTag::Enumerated),
    row(PropertyId::ListOfObjectPropertyReferences, 2, AppTag::UnsignedInt),
    row(PropertyId::ListOfObjectPropertyReferences, 3, AppTag::ObjectId),
    row(PropertyId::SubordinateList, 0, AppTag::ObjectId),
    row(PropertyId::SubordinateList, 1, AppTag::ObjectId),
    // BACnetRecipient
    row(PropertyId::RecipientList, 0, AppTag::ObjectId),
    // BACnetCOVSubscription
    row(PropertyId::ActiveCovSubscriptions, 2, AppTag::Boolean),
    row(PropertyId::ActiveCovSubscriptions, 3, AppTag::UnsignedInt),
    row(PropertyId::ActiveCovSubscriptions, 4, AppTag::Real),
    // BACnetShedLevel
    row(PropertyId::ActualShedLevel, 0, AppTag::UnsignedInt),
    row(PropertyId::ActualShedLevel, 1, AppTag::UnsignedInt),
    row(PropertyId::ActualShedLevel, 2, AppTag::Real),
    row(PropertyId::ExpectedShedLevel, 0, AppTag::UnsignedInt),
    row(PropertyId::ExpectedShedLevel, 1, AppTag::UnsignedInt),
    row(PropertyId::ExpectedShedLevel, 2, AppTag::Real),
    row(PropertyId::RequestedShedLevel, 0, AppTag::UnsignedInt),
    row(PropertyId::RequestedShedLevel, 1, AppTag::UnsignedInt),
    row(PropertyId::RequestedShedLevel, 2, AppTag::Real),
    // BACnetObjectPropertyReference
    row(PropertyId::SetpointReference, 0, AppTag::ObjectId),
    row(PropertyId::SetpointReference, 1, AppTag::Enumerated),
    row(PropertyId::SetpointReference, 2, AppTag::UnsignedInt),
    row(PropertyId::ControlledVariableReference, 0, AppTag::ObjectId),
    row(PropertyId::ControlledVariableReference, 1, AppTag::Enumerated),
    row(PropertyId::ControlledVariableReference, 2, AppTag::UnsignedInt),
    row(PropertyId::ManipulatedVariableReference, 0, AppTag::ObjectId),
    row(PropertyId::ManipulatedVariableReference, 1, AppTag::Enumerated),
    row(PropertyId::ManipulatedVariableReference, 2, AppTag::UnsignedInt),
    row(PropertyId::ObjectPropertyReference, 0, AppTag::ObjectId),
    row(PropertyId::ObjectPropertyReference, 1, AppTag::Enumerated),
    row(PropertyId::ObjectPropertyReference, 2, AppTag::UnsignedInt),
];

/// Resolves the application type of context tag `tag_num` under `property`.
///
/// Without a table entry the tag number itself is read as an application
/// tag number; numbers beyond the application range are unsupported.
pub fn context_tag_type(property: Option<PropertyId>, tag_num: u8) -> Result<AppTag, DecodeError> {
    let known = property.and_then(|property| {
        CONTEXT_TAG_TYPES
            .iter()
            .find(|entry| entry.property == property && entry.tag_num == tag_num)
    });
    match known {
        Some(entry) => Ok(entry.app_tag),
        None => AppTag::from_u8(tag_num),
    }
}
