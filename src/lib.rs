#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod component;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod cyclic;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod options;
pub(crate) mod overriding;
pub(crate) mod pipeline;
pub(crate) mod registry;
pub(crate) mod visualize;

pub mod global;

pub use any::{Instance, TypeInfo};
pub use component::{Component, Deferred, DeferredSlot, FieldValue, FieldValues};
pub use config::Config;
pub use container::Container;
pub use dependency_resolver::DependencyResolver;
pub use errors::{
    quick_panic, CyclePath, FieldErrorKind, InstantiateErrorKind, InstantiatorResult, KeyList, ProvideErrorKind, ResolveErrorKind,
};
pub use inject::{Group, Inject, Name, Named};
pub use instantiator::{instance, Instantiator, Invocable, Outputs};
pub use key::{Dependency, Key, Qualifier};
pub use options::ProvideOptions;
pub use registry::{ProvideInfo, ProviderId};
