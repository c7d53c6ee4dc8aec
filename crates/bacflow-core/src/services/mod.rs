//! Service codecs for the flows this stack drives: property read/write
//! (single and multiple) and device discovery.

pub mod context;
pub mod i_am;
pub mod read_property;
pub mod read_property_multiple;
pub mod value_codec;
pub mod who_is;
pub mod write_property;
pub mod write_property_multiple;
