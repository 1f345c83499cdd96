#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A crate for reading metadata out of ROM images, disc images, and media
//! files, plus a PNG decoder for the images those files tend to carry.
//!
//! Every reader follows the same shape:
//!
//! 1) [`detect`] looks at a header snapshot and tells you which format (if
//!    any) the bytes belong to.
//! 2) The format's reader type opens a [`ByteSource`], reads the fixed header,
//!    and checks the magic again.
//! 3) The reader decodes whatever tag data the format has into an owned
//!    mapping, and projects it into a [`FieldList`] (for people to look at)
//!    and a [`MetaList`] (for metadata queries).
//!
//! Images go through [`png::decode`] and come out as a [`PixelBuffer`].

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod ascii_array;
pub use ascii_array::*;

pub mod byte_source;
pub use byte_source::*;

pub mod cp1252;

pub mod detect;
pub use detect::*;

pub mod error;
pub use error::*;

pub mod fields;
pub use fields::*;

pub mod image;
pub use image::*;

mod parser_helpers;
pub(crate) use parser_helpers::*;

#[cfg(feature = "spc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "spc")))]
pub mod spc;

#[cfg(feature = "gcn")]
#[cfg_attr(docs_rs, doc(cfg(feature = "gcn")))]
pub mod gcn;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;
