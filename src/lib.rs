//! Fetches a version-pinned `auth_server` release archive, extracts it and
//! installs the executable under a caller chosen name.
//!
//! ```no_run
//! # async fn run() -> Result<(), authservice_binary::Error> {
//! let path = authservice_binary::versioned_binary(
//!     "0.6.0-rc0",
//!     std::path::Path::new("/tmp/authservice"),
//!     authservice_binary::DEFAULT_BINARY_NAME,
//! )
//! .await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod providers;

#[cfg(test)]
mod test_support;

pub use crate::error::{DownloadError, Error, ExtractError, TransportError};
pub use crate::models::platform::Platform;
pub use crate::providers::binary_fetcher::{
    BinaryFetcher, DEFAULT_ARCHIVED_BINARY_NAME, DEFAULT_BINARY_NAME, archive_url,
    archive_url_for, versioned_binary,
};
