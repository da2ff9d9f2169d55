//! Common utilities shared by the document parsers
//!
//! - [`xml_decode`]: namespace stripping, entity unescaping and the serde entry point

pub mod xml_decode;
