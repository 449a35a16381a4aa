use alloc::vec::Vec;

use super::errors::ResolveErrorKind;
use crate::{key::Dependency, Container};

pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    /// Appends the declared inputs in the order they are resolved.
    fn dependencies(dependencies: &mut Vec<Dependency>);

    fn resolve(container: &Container) -> Result<Self, Self::Error>;
}

/// Optional dependency: resolves to `None` if the dependency has no provider.
impl<Dep: DependencyResolver> DependencyResolver for Option<Dep> {
    type Error = ResolveErrorKind;

    fn dependencies(dependencies: &mut Vec<Dependency>) {
        let start = dependencies.len();
        Dep::dependencies(dependencies);
        for dependency in &mut dependencies[start..] {
            dependency.optional = true;
        }
    }

    fn resolve(container: &Container) -> Result<Self, Self::Error> {
        match Dep::resolve(container).map_err(Into::into) {
            Ok(dependency) => Ok(Some(dependency)),
            Err(err) if err.is_missing_dependency() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn dependencies(dependencies: &mut Vec<Dependency>) {
                $( $ty::dependencies(dependencies); )*
            }

            #[inline]
            #[allow(unused_variables)]
            fn resolve(container: &Container) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(container).map_err(Into::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
