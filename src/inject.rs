use alloc::{sync::Arc, vec::Vec};
use core::marker::PhantomData;

use crate::{
    any::{Instance, TypeInfo},
    dependency_resolver::DependencyResolver,
    key::{Dependency, Key},
    Container, ResolveErrorKind,
};

/// Compile-time name of a named or grouped slot, see [`crate::name!`].
pub trait Name: 'static {
    const NAME: &'static str;
}

/// Singleton of the default slot of `Dep`.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

/// Singleton of the slot of `Dep` named [`Name::NAME`].
pub struct Named<Dep: ?Sized, N>(pub Arc<Dep>, pub PhantomData<N>);

/// All members of the value group of `Dep` called [`Name::NAME`], in registration order.
pub struct Group<Dep: ?Sized, G>(pub Vec<Arc<Dep>>, pub PhantomData<G>);

impl<Dep: ?Sized, N> Named<Dep, N> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<Dep> {
        self.0
    }
}

impl<Dep: ?Sized, G> Group<Dep, G> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<Arc<Dep>> {
        self.0
    }
}

pub(crate) fn downcast<Dep: ?Sized + 'static>(instance: &Instance) -> Result<Arc<Dep>, ResolveErrorKind> {
    instance.downcast().ok_or_else(|| ResolveErrorKind::IncorrectType {
        expected: TypeInfo::of::<Dep>(),
        actual: instance.type_info(),
    })
}

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    fn dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::of::<Dep>());
    }

    fn resolve(container: &Container) -> Result<Self, Self::Error> {
        let instance = container.resolve_single(&Key::of::<Dep>())?;
        downcast(&instance).map(Self)
    }
}

impl<Dep: ?Sized + Send + Sync + 'static, N: Name> DependencyResolver for Named<Dep, N> {
    type Error = ResolveErrorKind;

    fn dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::named::<Dep>(N::NAME));
    }

    fn resolve(container: &Container) -> Result<Self, Self::Error> {
        let instance = container.resolve_single(&Key::named::<Dep>(N::NAME))?;
        downcast(&instance).map(|dependency| Self(dependency, PhantomData))
    }
}

impl<Dep: ?Sized + Send + Sync + 'static, G: Name> DependencyResolver for Group<Dep, G> {
    type Error = ResolveErrorKind;

    fn dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::grouped::<Dep>(G::NAME));
    }

    fn resolve(container: &Container) -> Result<Self, Self::Error> {
        let members = container
            .resolve_group(&Key::grouped::<Dep>(G::NAME))?
            .iter()
            .map(downcast::<Dep>)
            .collect::<Result<_, _>>()?;
        Ok(Self(members, PhantomData))
    }
}
