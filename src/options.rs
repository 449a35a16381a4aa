use alloc::{borrow::Cow, sync::Arc, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    panic::Location,
};

use crate::{
    any::{Instance, TypeInfo},
    errors::ProvideErrorKind,
    key::{Key, Qualifier},
};

/// Converts an output value to a capability it's provided as.
pub(crate) type Cast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

#[derive(Clone)]
struct Capability {
    source: TypeInfo,
    target: TypeInfo,
    cast: Cast,
}

/// Key a provider output is bound to.
#[derive(Clone)]
pub(crate) struct Output {
    pub(crate) key: Key,
    /// Index of the value in the values returned by the constructor
    pub(crate) index: usize,
    pub(crate) cast: Option<Cast>,
}

impl Debug for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("key", &self.key)
            .field("index", &self.index)
            .field("cast", &self.cast.is_some())
            .finish()
    }
}

/// Options of a provider registration.
///
/// ## Options
/// - `name`:
///   Binds every output to the slot with the name instead of the default one.
/// - `group`:
///   Adds every output as a member of the value group. Groups never conflict.
///   Mutually exclusive with `name`.
/// - `as`:
///   Provides the output of type `T` as the capability `Cap` (usually a trait object) instead of `T`.
///   Can be repeated to provide the same value as several capabilities.
/// - `override`:
///   Replaces the provider with exactly the same outputs, if it hasn't been called yet.
/// - `resolve_cyclic`:
///   Allows the component to take part in a dependency cycle through its deferred fields.
#[derive(Clone, Default)]
pub struct ProvideOptions {
    name: Option<Cow<'static, str>>,
    group: Option<Cow<'static, str>>,
    capabilities: Vec<Capability>,
    overriding: bool,
    resolve_cyclic: bool,
}

impl ProvideOptions {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: None,
            group: None,
            capabilities: Vec::new(),
            overriding: false,
            resolve_cyclic: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn group(mut self, group: impl Into<Cow<'static, str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// # Examples
    /// ```rust
    /// use entwine::{Container, ProvideOptions};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync {}
    ///
    /// struct English;
    ///
    /// impl Greeter for English {}
    ///
    /// let container = Container::new();
    /// container
    ///     .provide_with_options(
    ///         || Ok(English),
    ///         ProvideOptions::new().with_as::<English, dyn Greeter>(|value| value as Arc<dyn Greeter>),
    ///     )
    ///     .unwrap();
    ///
    /// assert!(container.extract::<dyn Greeter>().is_ok());
    /// assert!(container.extract::<English>().is_err());
    /// ```
    #[must_use]
    pub fn with_as<T, Cap>(mut self, cast: fn(Arc<T>) -> Arc<Cap>) -> Self
    where
        T: Send + Sync + 'static,
        Cap: ?Sized + Send + Sync + 'static,
    {
        self.capabilities.push(Capability {
            source: TypeInfo::of::<T>(),
            target: TypeInfo::of::<Cap>(),
            cast: Arc::new(move |instance| instance.downcast::<T>().map(|value| Instance::new(cast(value)))),
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn with_override(mut self) -> Self {
        self.overriding = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn resolve_cyclic(mut self) -> Self {
        self.resolve_cyclic = true;
        self
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_override(&self) -> bool {
        self.overriding
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_resolve_cyclic(&self) -> bool {
        self.resolve_cyclic
    }

    /// Keys the values returned by the constructor are bound to, in the order of the values.
    pub(crate) fn outputs(&self, types: &[TypeInfo], location: &'static Location<'static>) -> Result<Vec<Output>, ProvideErrorKind> {
        let qualifier = match (&self.name, &self.group) {
            (Some(_), Some(_)) => return Err(ProvideErrorKind::InvalidOptions { location }),
            (Some(name), None) => Qualifier::Name(name.clone()),
            (None, Some(group)) => Qualifier::Group(group.clone()),
            (None, None) => Qualifier::Default,
        };
        if types.is_empty() {
            return Err(ProvideErrorKind::NoOutputs { location });
        }
        if let Some(capability) = self.capabilities.iter().find(|capability| !types.contains(&capability.source)) {
            return Err(ProvideErrorKind::UnusedCapability {
                source_type: capability.source,
                location,
            });
        }

        let mut outputs: Vec<Output> = Vec::with_capacity(types.len());
        for (index, type_info) in types.iter().enumerate() {
            let mut capabilities = self.capabilities.iter().filter(|capability| capability.source == *type_info).peekable();
            if capabilities.peek().is_none() {
                outputs.push(Output {
                    key: Key::new(*type_info, qualifier.clone()),
                    index,
                    cast: None,
                });
                continue;
            }
            for capability in capabilities {
                outputs.push(Output {
                    key: Key::new(capability.target, qualifier.clone()),
                    index,
                    cast: Some(capability.cast.clone()),
                });
            }
        }

        for (position, output) in outputs.iter().enumerate() {
            if outputs[..position].iter().any(|previous| previous.key == output.key) {
                return Err(ProvideErrorKind::DuplicateOutput {
                    key: output.key.clone(),
                    location,
                });
            }
        }

        Ok(outputs)
    }
}

impl Debug for ProvideOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideOptions")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("as", &self.capabilities.iter().map(|capability| capability.target.name).collect::<Vec<_>>())
            .field("override", &self.overriding)
            .field("resolve_cyclic", &self.resolve_cyclic)
            .finish()
    }
}
