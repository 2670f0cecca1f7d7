//! Addonenv
//!
//! Administration of installable addons for a modular application
//! platform: manifest inspection, activation via filesystem links, and
//! static introspection of an addon's source tree.
//!
//! # Architecture
//!
//! - **manifest**: safe-literal parsing of the addon descriptor file
//! - **addon**: addon identity and memoized manifest access
//! - **scan**: line-pattern and syntax-tree scanners over a source tree
//! - **introspect**: declared models, records, and fields
//! - **link**: the enable/disable activation state machine
//! - **env**: the target environment collaborator
//!
//! # Usage
//!
//! ```no_run
//! use addonenv::{Addon, SystemEnvironment};
//!
//! let addon = Addon::new("addons/sale_extra/__openerp__.py")?;
//! let env = SystemEnvironment::new("/opt/platform/addons");
//! println!("{}: {:?}", addon.name()?, addon.depends()?);
//! addon.enable(&env, false)?;
//! # Ok::<(), addonenv::AddonError>(())
//! ```

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod addon;
pub mod env;
pub mod error;
pub mod introspect;
pub mod link;
pub mod manifest;
pub mod scan;

// Re-export main types
pub use addon::Addon;
pub use env::{Environment, SystemEnvironment};
pub use error::AddonError;
pub use introspect::FieldDecl;
pub use link::LinkState;
pub use manifest::{Manifest, Value};
pub use scan::ScanResult;
