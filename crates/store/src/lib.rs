//! Catnav Store - GitHub-backed storage for the navigation dashboard
//!
//! The dashboard keeps its data set in a single JavaScript module inside a
//! GitHub repository. This crate reads and writes that file (and any other
//! file in the repository) through the GitHub Contents API, using the
//! file's content hash to detect concurrent edits.
//!
//! # Features
//!
//! - **Content store**: fetch, update and upload files with optimistic concurrency
//! - **Document codec**: lossless load/save of the `export const mockData = ...` module
//! - **Connectivity check**: non-destructive verification of credentials and access
//! - **Icon harvesting**: mirror remotely hosted site icons into a local directory
//!
//! # Examples
//!
//! ```rust,no_run
//! use catnav_store::ContentStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Coordinates come from CATNAV_GITHUB_TOKEN, _OWNER, _REPO and _BRANCH
//! let store = ContentStore::from_env();
//!
//! let mut document = store.load_navigation_document().await?;
//! document.set_title("猫猫导航");
//!
//! let commit = store.save_navigation_document(&document).await?;
//! println!("committed {}", commit.commit_sha().unwrap_or("?"));
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod icons;
pub mod store;

// Re-export commonly used types
pub use api::{CommitResult, ConnectionStatus};
pub use config::{ConfigSetting, EnvSettings, RepositoryCoordinates, SettingsSource, StoreSettings};
pub use document::EncodeOptions;
pub use error::{ContentStoreError, Result};
pub use http::{HttpExecutor, HttpRequest, HttpResponse, ReqwestExecutor};
pub use icons::{DownloadOptions, IconReport, IconSource, collect_remote_icons, download_icons};
pub use store::{ContentStore, FileContent, RemoteFile};

pub use catnav_types::{Category, NavigationDocument, Site};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
