use core::panic::Location;

use super::{CyclePath, KeyList};
use crate::{any::TypeInfo, key::Key};

#[derive(thiserror::Error, Debug)]
pub enum ProvideErrorKind {
    #[error("Cannot provide {key} from {location}: already provided by {existing}")]
    Conflict {
        key: Key,
        location: &'static Location<'static>,
        existing: &'static Location<'static>,
    },
    #[error("Cannot provide from {location}: this function introduces a cycle: {path}")]
    CycleDetected {
        location: &'static Location<'static>,
        path: CyclePath,
    },
    #[error("Cannot provide from {location}: name and group are mutually exclusive")]
    InvalidOptions { location: &'static Location<'static> },
    #[error("Cannot provide from {location}: {key} is returned more than once")]
    DuplicateOutput {
        key: Key,
        location: &'static Location<'static>,
    },
    #[error("Cannot provide from {location}: the constructor has no outputs")]
    NoOutputs { location: &'static Location<'static> },
    #[error("Cannot provide from {location}: capability source {source_type} isn't an output of the constructor")]
    UnusedCapability {
        source_type: TypeInfo,
        location: &'static Location<'static>,
    },
    #[error("Cannot provide from {location}: cyclic resolution is supported only for components")]
    ResolveCyclicUnsupported { location: &'static Location<'static> },
    #[error("Cannot provide from {location}: value group {key} can't be a deferred field")]
    DeferredGroup {
        key: Key,
        location: &'static Location<'static>,
    },
    #[error("Cannot override {key} from {location}: value groups can't be overridden")]
    InvalidOverride {
        key: Key,
        location: &'static Location<'static>,
    },
    #[error("Cannot override from {location}: no provider to override was found for {outputs}")]
    NoOverrideTarget {
        outputs: KeyList,
        location: &'static Location<'static>,
    },
    #[error("Cannot override from {location}: outputs {outputs} are provided by more than one provider")]
    AmbiguousOverride {
        outputs: KeyList,
        location: &'static Location<'static>,
    },
    #[error("Cannot override from {location}: the provider from {existing} has already been called, override is allowed only before first use")]
    AlreadyCalled {
        location: &'static Location<'static>,
        existing: &'static Location<'static>,
    },
}

impl ProvideErrorKind {
    #[inline]
    #[must_use]
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            Self::Conflict { location, .. }
            | Self::CycleDetected { location, .. }
            | Self::InvalidOptions { location }
            | Self::DuplicateOutput { location, .. }
            | Self::NoOutputs { location }
            | Self::UnusedCapability { location, .. }
            | Self::ResolveCyclicUnsupported { location }
            | Self::DeferredGroup { location, .. }
            | Self::InvalidOverride { location, .. }
            | Self::NoOverrideTarget { location, .. }
            | Self::AmbiguousOverride { location, .. }
            | Self::AlreadyCalled { location, .. } => location,
        }
    }
}
