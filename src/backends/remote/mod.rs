//! # Remote atomic backends
//!
//! Whole-object stores lifted onto the full [`crate::contract::Ufs`]
//! surface via [`crate::bridge::AtomicToDescriptor`]. `http` is the fully
//! worked exemplar; `ftp`, `s3`, and `drs` share its shape against their
//! own transports and document their own directory-listing quirks.

pub mod drs;
pub mod ftp;
pub mod http;
pub mod s3;

pub use drs::DrsUfs;
pub use ftp::FtpUfs;
pub use http::HttpBlobUfs;
pub use s3::S3Ufs;
