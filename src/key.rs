use alloc::borrow::Cow;
use core::fmt::{self, Display, Formatter};

use crate::any::TypeInfo;

/// Distinguishes slots of the same type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Qualifier {
    Default,
    Name(Cow<'static, str>),
    Group(Cow<'static, str>),
}

/// Address of a dependency slot: the type plus an optional name or group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key {
    pub type_info: TypeInfo,
    pub qualifier: Qualifier,
}

impl Key {
    #[inline]
    #[must_use]
    pub const fn new(type_info: TypeInfo, qualifier: Qualifier) -> Self {
        Self { type_info, qualifier }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), Qualifier::Default)
    }

    #[inline]
    #[must_use]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TypeInfo::of::<T>(), Qualifier::Name(name.into()))
    }

    #[inline]
    #[must_use]
    pub fn grouped<T: ?Sized + 'static>(group: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TypeInfo::of::<T>(), Qualifier::Group(group.into()))
    }

    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.qualifier, Qualifier::Group(_))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Default => write!(f, "{}", self.type_info),
            Qualifier::Name(name) => write!(f, "{}[name=\"{name}\"]", self.type_info),
            Qualifier::Group(group) => write!(f, "{}[group=\"{group}\"]", self.type_info),
        }
    }
}

/// A declared input of a provider.
///
/// ## Fields
/// - `optional`:
///   If `true`, a missing provider resolves to "no value" instead of failing.
/// - `deferred`:
///   If `true` and the owning provider opted into cyclic resolution, the input isn't resolved while
///   the value is constructed, but assigned afterwards, when the value is first handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub key: Key,
    pub optional: bool,
    pub deferred: bool,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            optional: false,
            deferred: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Key::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Key::named::<T>(name))
    }

    #[inline]
    #[must_use]
    pub fn grouped<T: ?Sized + 'static>(group: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Key::grouped::<T>(group))
    }

    /// Cycle-forming field, see [`crate::Deferred`]
    #[inline]
    #[must_use]
    pub fn deferred<T: ?Sized + 'static>() -> Self {
        Self {
            deferred: true,
            ..Self::of::<T>()
        }
    }

    #[inline]
    #[must_use]
    pub fn deferred_named<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            deferred: true,
            ..Self::named::<T>(name)
        }
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Dependency, Key, Qualifier};

    use alloc::{string::ToString as _, vec::Vec};

    #[test]
    fn test_structural_equality() {
        assert_eq!(Key::of::<i32>(), Key::of::<i32>());
        assert_eq!(Key::named::<i32>("a"), Key::named::<i32>(alloc::string::String::from("a")));
        assert_ne!(Key::of::<i32>(), Key::named::<i32>("a"));
        assert_ne!(Key::named::<i32>("a"), Key::grouped::<i32>("a"));
        assert_ne!(Key::of::<i32>(), Key::of::<u32>());
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::of::<i32>().to_string(), "i32");
        assert_eq!(Key::named::<i32>("a").to_string(), "i32[name=\"a\"]");
        assert_eq!(Key::grouped::<bool>("flags").to_string(), "bool[group=\"flags\"]");
    }

    #[test]
    fn test_ordering_is_total() {
        let mut keys = [Key::grouped::<i32>("g"), Key::of::<i32>(), Key::named::<i32>("n")].to_vec();
        keys.sort();
        keys.dedup();

        assert_eq!(keys.len(), 3);
        assert_eq!(
            keys.iter().map(|key| &key.qualifier).collect::<Vec<_>>(),
            [&Qualifier::Default, &Qualifier::Name("n".into()), &Qualifier::Group("g".into())]
        );
    }

    #[test]
    fn test_dependency_builders() {
        let dependency = Dependency::deferred_named::<i32>("a").optional();

        assert!(dependency.deferred);
        assert!(dependency.optional);
        assert_eq!(dependency.key, Key::named::<i32>("a"));
        assert!(Dependency::grouped::<i32>("g").key.is_group());
    }
}
