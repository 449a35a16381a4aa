use alloc::{sync::Arc, vec, vec::Vec};
use core::fmt::{self, Debug, Formatter};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::{Instance, TypeInfo},
    errors::{FieldErrorKind, InstantiateErrorKind, InstantiatorErrorKind},
    inject::downcast,
    instantiator::BoxedConstructor,
    key::Dependency,
    Container, ResolveErrorKind,
};

/// Struct-shaped provider: a value built from its fields, each field being a resolved dependency.
///
/// Fields are addressed by their index in [`Component::fields`].
/// A field declared with [`Dependency::deferred`] and read with [`FieldValues::take_deferred`] may form a cycle
/// if the component is provided with [`crate::ProvideOptions::resolve_cyclic`]:
/// it's left empty while the value is assembled and filled when the value is first handed out.
///
/// # Examples
/// ```rust
/// use entwine::{Component, Dependency, FieldValues, InstantiateErrorKind};
/// use std::sync::Arc;
///
/// struct Config {
///     url: Arc<String>,
///     retries: Option<Arc<u8>>,
/// }
///
/// impl Component for Config {
///     fn fields() -> Vec<Dependency> {
///         vec![Dependency::named::<String>("url"), Dependency::of::<u8>().optional()]
///     }
///
///     fn assemble(values: &mut FieldValues) -> Result<Self, InstantiateErrorKind> {
///         Ok(Self {
///             url: values.take(0)?,
///             retries: values.take_optional(1)?,
///         })
///     }
/// }
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    fn fields() -> Vec<Dependency>;

    fn assemble(values: &mut FieldValues) -> Result<Self, InstantiateErrorKind>;

    /// Slot of the deferred field with the index, if there is one.
    #[allow(unused_variables)]
    fn deferred(&self, index: usize) -> Option<&dyn DeferredSlot> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Single(Instance),
    Group(Vec<Instance>),
}

#[derive(Debug)]
enum Slot {
    Empty,
    Value(FieldValue),
    Taken,
}

/// Resolved values of component fields, by field index.
///
/// Fields that weren't resolved, because they are deferred or optional and missing, are empty.
#[derive(Debug)]
pub struct FieldValues {
    slots: Vec<Slot>,
}

impl FieldValues {
    #[inline]
    #[must_use]
    pub fn new(values: Vec<Option<FieldValue>>) -> Self {
        Self {
            slots: values.into_iter().map(|value| value.map_or(Slot::Empty, Slot::Value)).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn take_value(&mut self, index: usize) -> Result<Option<FieldValue>, FieldErrorKind> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or(FieldErrorKind::OutOfRange { index, len })?;
        match core::mem::replace(slot, Slot::Taken) {
            Slot::Empty => Ok(None),
            Slot::Value(value) => Ok(Some(value)),
            Slot::Taken => Err(FieldErrorKind::Taken { index }),
        }
    }

    /// # Errors
    /// Returns [`FieldErrorKind::Missing`] if the field wasn't resolved.
    pub fn take<T: ?Sized + 'static>(&mut self, index: usize) -> Result<Arc<T>, FieldErrorKind> {
        self.take_optional(index)?.ok_or(FieldErrorKind::Missing { index })
    }

    /// # Errors
    /// Returns an error if the field is a group, was already taken or has another type.
    pub fn take_optional<T: ?Sized + 'static>(&mut self, index: usize) -> Result<Option<Arc<T>>, FieldErrorKind> {
        match self.take_value(index)? {
            None => Ok(None),
            Some(FieldValue::Single(instance)) => instance.downcast().map(Some).ok_or(FieldErrorKind::IncorrectType {
                index,
                expected: TypeInfo::of::<T>(),
            }),
            Some(FieldValue::Group(_)) => Err(FieldErrorKind::IncorrectType {
                index,
                expected: TypeInfo::of::<T>(),
            }),
        }
    }

    /// Members of a group field. An empty field is an empty group.
    ///
    /// # Errors
    /// Returns an error if the field isn't a group, was already taken or a member has another type.
    pub fn take_group<T: ?Sized + 'static>(&mut self, index: usize) -> Result<Vec<Arc<T>>, FieldErrorKind> {
        let incorrect_type = FieldErrorKind::IncorrectType {
            index,
            expected: TypeInfo::of::<T>(),
        };
        match self.take_value(index)? {
            None => Ok(vec![]),
            Some(FieldValue::Group(members)) => members
                .iter()
                .map(|member| member.downcast().ok_or_else(|| incorrect_type.clone()))
                .collect(),
            Some(FieldValue::Single(_)) => Err(incorrect_type),
        }
    }

    /// Deferred field: empty if the field will be filled after assembling, filled if it was resolved eagerly.
    ///
    /// # Errors
    /// Returns an error if the field is a group, was already taken or has another type.
    pub fn take_deferred<T: ?Sized + 'static>(&mut self, index: usize) -> Result<Deferred<T>, FieldErrorKind> {
        Ok(self.take_optional(index)?.map_or_else(Deferred::new, Deferred::filled))
    }
}

/// Fill-once cell of a deferred field.
pub struct Deferred<T: ?Sized> {
    value: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> Deferred<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { value: Mutex::new(None) }
    }

    #[inline]
    #[must_use]
    pub fn filled(value: Arc<T>) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Value of the field, `None` until the field is filled.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.lock().clone()
    }

    #[inline]
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: ?Sized> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Debug for Deferred<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("type", &TypeInfo::of::<T>().name)
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// Type-erased access to a [`Deferred`] field.
pub trait DeferredSlot: Send + Sync {
    /// Sets the field to the value.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::IncorrectType`] if the value has another type than the field.
    fn fill(&self, value: &Instance) -> Result<(), ResolveErrorKind>;
}

impl<T: ?Sized + Send + Sync + 'static> DeferredSlot for Deferred<T> {
    fn fill(&self, value: &Instance) -> Result<(), ResolveErrorKind> {
        let value = downcast::<T>(value)?;
        *self.value.lock() = Some(value);
        Ok(())
    }
}

/// Assigns a resolved value to a deferred field of an already built component.
pub(crate) type Injector = Arc<dyn Fn(&Instance, usize, &Instance) -> Result<(), ResolveErrorKind> + Send + Sync>;

#[must_use]
pub(crate) fn injector<C: Component>() -> Injector {
    Arc::new(|target, index, value| {
        let component = downcast::<C>(target)?;
        let slot = component.deferred(index).ok_or(ResolveErrorKind::NoDeferredSlot {
            component: TypeInfo::of::<C>(),
            index,
        })?;
        slot.fill(value)
    })
}

/// Constructor of a component. If `defer` is set, deferred fields are left empty.
#[must_use]
pub(crate) fn boxed_component<C: Component>(fields: Arc<[Dependency]>, defer: bool) -> BoxedConstructor {
    Arc::new(move |container: &Container| {
        let mut values = Vec::with_capacity(fields.len());
        for dependency in fields.iter() {
            if defer && dependency.deferred {
                values.push(None);
                continue;
            }

            let value = if dependency.key.is_group() {
                container.resolve_group(&dependency.key).map(FieldValue::Group)
            } else {
                container.resolve_single(&dependency.key).map(FieldValue::Single)
            };
            match value {
                Ok(value) => values.push(Some(value)),
                Err(err) if dependency.optional && err.is_missing_dependency() => values.push(None),
                Err(err) => return Err(InstantiatorErrorKind::Deps(err)),
            }
        }

        let component = C::assemble(&mut FieldValues::new(values)).map_err(InstantiatorErrorKind::Factory)?;

        debug!("Assembled");

        Ok(vec![Instance::new(Arc::new(component))])
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_component, injector, Component, Deferred, DeferredSlot as _, FieldValue, FieldValues};
    use crate::{
        any::{Instance, TypeInfo},
        errors::{FieldErrorKind, InstantiateErrorKind},
        key::Dependency,
        Container, ResolveErrorKind,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
        vec::Vec,
    };
    use tracing_test::traced_test;

    struct Node {
        id: Arc<i32>,
        tags: Vec<Arc<String>>,
        next: Deferred<Node>,
    }

    impl Component for Node {
        fn fields() -> Vec<Dependency> {
            vec![
                Dependency::of::<i32>(),
                Dependency::grouped::<String>("tags"),
                Dependency::deferred::<Node>().optional(),
            ]
        }

        fn assemble(values: &mut FieldValues) -> Result<Self, InstantiateErrorKind> {
            Ok(Self {
                id: values.take(0)?,
                tags: values.take_group(1)?,
                next: values.take_deferred(2)?,
            })
        }

        fn deferred(&self, index: usize) -> Option<&dyn super::DeferredSlot> {
            match index {
                2 => Some(&self.next),
                _ => None,
            }
        }
    }

    #[test]
    fn test_field_values() {
        let mut values = FieldValues::new(vec![
            Some(FieldValue::Single(Instance::new(Arc::new(1i32)))),
            Some(FieldValue::Group(vec![Instance::new(Arc::new(String::from("a")))])),
            None,
        ]);

        assert_eq!(values.len(), 3);
        assert_eq!(*values.take::<i32>(0).unwrap(), 1);
        assert_eq!(values.take::<i32>(0).unwrap_err(), FieldErrorKind::Taken { index: 0 });
        assert_eq!(
            values.take::<i32>(1).unwrap_err(),
            FieldErrorKind::IncorrectType {
                index: 1,
                expected: TypeInfo::of::<i32>(),
            }
        );
        assert_eq!(values.take::<u8>(2).unwrap_err(), FieldErrorKind::Missing { index: 2 });
        assert_eq!(values.take::<u8>(3).unwrap_err(), FieldErrorKind::OutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn test_deferred_fill() {
        let deferred = Deferred::<i32>::new();
        assert!(!deferred.is_filled());
        assert!(deferred.get().is_none());

        let value = Instance::new(Arc::new(5i32));
        deferred.fill(&value).unwrap();
        assert_eq!(*deferred.get().unwrap(), 5);

        let err = deferred.fill(&Instance::new(Arc::new(5u8))).unwrap_err();
        assert!(matches!(err, ResolveErrorKind::IncorrectType { .. }));
        assert_eq!(format!("{deferred:?}"), "Deferred { type: \"i32\", filled: true }");
    }

    #[test]
    #[traced_test]
    fn test_boxed_component_defers_fields() {
        let container = Container::new();
        container.supply(7i32).unwrap();

        let fields: Arc<[Dependency]> = Node::fields().into();
        let constructor = boxed_component::<Node>(fields, true);
        let values = constructor(&container).ok().unwrap();
        let node = values[0].downcast::<Node>().unwrap();

        assert_eq!(*node.id, 7);
        assert!(node.tags.is_empty());
        assert!(!node.next.is_filled());

        let next = Instance::new(Arc::new(Node {
            id: Arc::new(8),
            tags: vec![],
            next: Deferred::new(),
        }));
        injector::<Node>()(&values[0], 2, &next).unwrap();
        assert_eq!(*node.next.get().unwrap().id, 8);

        let err = injector::<Node>()(&values[0], 0, &next).unwrap_err();
        assert!(matches!(err, ResolveErrorKind::NoDeferredSlot { index: 0, .. }));
    }

    #[test]
    #[traced_test]
    fn test_boxed_component_missing_field() {
        let container = Container::new();

        let constructor = boxed_component::<Node>(Node::fields().into(), true);
        let Err(err) = constructor(&container) else {
            panic!("i32 isn't provided");
        };
        assert!(err.to_string().starts_with("Missing dependency i32"));
    }
}
