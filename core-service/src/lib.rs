//! Song catalog facade and bootstrap helpers.
//!
//! This crate wires the record store from `core-library` and the metadata
//! lookup from `core-metadata` into [`SongLibraryService`], the single entry
//! point a transport layer talks to. Every operation takes a
//! [`RequestContext`] and fails with a [`CatalogError`] whose
//! [`kind`](CatalogError::kind) is one of five stable categories.
//!
//! Desktop and server hosts typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) and call [`bootstrap_desktop`].
//!
//! ```no_run
//! # #[cfg(feature = "desktop-shims")]
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::CoreConfig;
//! use core_service::{bootstrap_desktop, AddSongRequest, RequestContext};
//!
//! let config = CoreConfig::from_env()?;
//! let library = bootstrap_desktop(&config).await?;
//!
//! let ctx = RequestContext::background();
//! match library.add(&ctx, &AddSongRequest::new("Muse", "Uprising")).await {
//!     Ok(song) => println!("added {}", song.id),
//!     Err(e) => eprintln!("{}: {}", e.kind().as_str(), e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod context;
pub mod error;
pub mod service;

pub use bootstrap::bootstrap;
#[cfg(feature = "desktop-shims")]
pub use bootstrap::bootstrap_desktop;
pub use context::{Interrupted, RequestContext};
pub use error::{
    CatalogError, CatalogResult, CoreError, ErrorKind, Result, StorageError, UpstreamError,
};
pub use service::{parse_release_date, AddSongRequest, SongLibraryService, RELEASE_DATE_FORMAT};
