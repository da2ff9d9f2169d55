//! # dlna-parser
//!
//! XML parsing for the documents a DLNA/UPnP media server hands out: the
//! device description, per-service SCPD documents and the DIDL-Lite listings
//! returned by ContentDirectory Browse and Search. Also splits `protocolInfo`
//! strings and their DLNA.ORG parameters.
//!
//! Nothing here performs I/O; fetching is done by `dlna-client`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dlna_parser::{DeviceDescriptor, DidlLite};
//!
//! let device = DeviceDescriptor::from_xml(description_xml)?;
//! let listing = DidlLite::from_xml(result_text)?;
//! ```

pub mod common;
pub mod description;
pub mod didl;
pub mod error;
pub mod protocol_info;

pub use description::{DeviceDescriptor, Icon, ServiceDescription, ServiceDescriptor, StateVariable};
pub use didl::{parse_items, DidlLite, MediaItem, MediaMetadata, Resource};
pub use error::{ParseError, ParseResult};
pub use protocol_info::{is_valid_flags, DlnaParameters, ProtocolInfo};
