//! Format-preserving INI document model
//!
//! Parses line-oriented INI text into a document that can be queried and
//! edited in place without disturbing comments, blank lines, indentation,
//! delimiter choice (`=` or `:`), or multi-line continuations. A document
//! that is parsed and re-emitted without mutation round-trips byte for byte.

pub mod document;

pub use document::IniDocument;
