use alloc::{boxed::Box, sync::Arc};
use core::panic::Location;

use super::{CyclePath, InstantiateErrorKind};
use crate::{any::TypeInfo, key::Key};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Missing dependency {key}{}", .requested_by.map(|location| alloc::format!(" requested by {location}")).unwrap_or_default())]
    MissingDependency {
        key: Key,
        requested_by: Option<&'static Location<'static>>,
    },
    #[error("Could not build arguments for function {location}: {source}")]
    ArgumentsFailed {
        location: &'static Location<'static>,
        #[source]
        source: Box<ResolveErrorKind>,
    },
    #[error("Constructor {location} failed: {source}")]
    ConstructorFailed {
        location: &'static Location<'static>,
        #[source]
        source: Arc<InstantiateErrorKind>,
    },
    /// Also reported when another thread is building a provider on the path at the same time,
    /// resolutions sharing a container must be serialized.
    #[error("Cycle detected in dependency graph: {path}")]
    CycleDetected { path: CyclePath },
    #[error("Incorrect provided type. Actual: {actual}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeInfo },
    #[error("Could not inject deferred dependencies of {key} provided by {location}: {source}")]
    PropertyInjectFailed {
        key: Key,
        location: &'static Location<'static>,
        #[source]
        source: Arc<ResolveErrorKind>,
    },
    #[error("Component {component} has no deferred slot at field {index}")]
    NoDeferredSlot { component: TypeInfo, index: usize },
    #[error("Function {location} failed: {source}")]
    InvokeFailed {
        location: &'static Location<'static>,
        #[source]
        source: InstantiateErrorKind,
    },
}

impl ResolveErrorKind {
    /// Innermost error of the wrapping chain
    #[must_use]
    pub fn root_cause(&self) -> &ResolveErrorKind {
        match self {
            Self::ArgumentsFailed { source, .. } => source.root_cause(),
            Self::PropertyInjectFailed { source, .. } => source.root_cause(),
            _ => self,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }

    /// Annotates the error with the location of the code that requested the value.
    #[must_use]
    pub(crate) fn with_caller(self, location: &'static Location<'static>) -> Self {
        match self {
            Self::MissingDependency { key, requested_by: None } => Self::MissingDependency {
                key,
                requested_by: Some(location),
            },
            err => Self::ArgumentsFailed {
                location,
                source: Box::new(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResolveErrorKind;
    use crate::{errors::CyclePath, key::Key};

    use alloc::{boxed::Box, string::ToString as _, sync::Arc, vec};
    use core::panic::Location;

    #[test]
    fn test_with_caller_fills_missing_location() {
        let location = Location::caller();
        let err = ResolveErrorKind::MissingDependency {
            key: Key::of::<i32>(),
            requested_by: None,
        }
        .with_caller(location);

        assert!(matches!(
            err,
            ResolveErrorKind::MissingDependency {
                requested_by: Some(requested_by),
                ..
            } if requested_by == location
        ));
        assert!(err.to_string().starts_with("Missing dependency i32 requested by "));
    }

    #[test]
    fn test_with_caller_wraps_other_errors() {
        let location = Location::caller();
        let err = ResolveErrorKind::CycleDetected {
            path: CyclePath(vec![Key::of::<i32>(), Key::of::<i32>()]),
        }
        .with_caller(location);

        assert!(matches!(err, ResolveErrorKind::ArgumentsFailed { .. }));
        assert!(matches!(err.root_cause(), ResolveErrorKind::CycleDetected { .. }));
    }

    #[test]
    fn test_root_cause_through_shared_errors() {
        let location = Location::caller();
        let err = ResolveErrorKind::PropertyInjectFailed {
            key: Key::of::<u8>(),
            location,
            source: Arc::new(ResolveErrorKind::ArgumentsFailed {
                location,
                source: Box::new(ResolveErrorKind::MissingDependency {
                    key: Key::named::<i32>("a"),
                    requested_by: Some(location),
                }),
            }),
        };

        assert!(!err.is_missing_dependency());
        assert!(matches!(
            err.root_cause(),
            ResolveErrorKind::MissingDependency { key, .. } if *key == Key::named::<i32>("a")
        ));
    }
}
