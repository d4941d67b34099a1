#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod config;
pub mod context;
pub mod models;
pub mod notice;
pub mod pathmap;
pub mod registry;
pub mod resolver;

pub use config::{Environment, MapEnvironment, ProcessEnvironment, ResolverConfig};
pub use context::ResolutionContext;
pub use models::ResolvedPath;
pub use notice::{NoticeListener, ResolverChanged};
pub use pathmap::{PathmapRule, PathmapTable};
pub use registry::{DefaultContextRegistry, RegistryError};
pub use resolver::{DefaultResolver, PathmapResolver, Resolver};
