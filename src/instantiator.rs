use alloc::{sync::Arc, vec, vec::Vec};
use tracing::debug;

use super::{
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind},
};
use crate::{
    any::{Instance, TypeInfo},
    Container, ResolveErrorKind,
};

pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

/// A function called once by [`Container::invoke`] with its resolved dependencies.
pub trait Invocable<Deps>: Sized
where
    Deps: DependencyResolver,
{
    type Output;
    type Error: Into<InstantiateErrorKind>;

    fn invoke(self, dependencies: Deps) -> Result<Self::Output, Self::Error>;
}

/// Several values returned by one constructor, each registered under its own key.
pub trait Outputs: 'static {
    fn type_infos(type_infos: &mut Vec<TypeInfo>);

    fn into_instances(self) -> Vec<Instance>;
}

pub(crate) type BoxedConstructor =
    Arc<dyn Fn(&Container) -> Result<Vec<Instance>, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>> + Send + Sync>;

#[must_use]
fn boxed_instantiator_factory<Inst, Deps>(instantiator: Inst, into_instances: fn(Inst::Provides) -> Vec<Instance>) -> BoxedConstructor
where
    Inst: Instantiator<Deps> + Send + Sync,
    Deps: DependencyResolver + 'static,
{
    Arc::new(move |container| {
        let dependencies = match Deps::resolve(container) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(InstantiatorErrorKind::Deps(err.into())),
        };
        let provides = match instantiator.clone().instantiate(dependencies) {
            Ok(provides) => provides,
            Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
        };

        debug!("Constructed");

        Ok(into_instances(provides))
    })
}

#[inline]
#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedConstructor
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver + 'static,
{
    boxed_instantiator_factory(instantiator, |provides| vec![Instance::new(Arc::new(provides))])
}

#[inline]
#[must_use]
pub(crate) fn boxed_outputs_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedConstructor
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Outputs,
    Deps: DependencyResolver + 'static,
{
    boxed_instantiator_factory(instantiator, Outputs::into_instances)
}

/// Constructor handing out an already existing value.
#[must_use]
pub(crate) fn boxed_value<T: Send + Sync + 'static>(value: T) -> BoxedConstructor {
    let value = Instance::new(Arc::new(value));
    Arc::new(move |_| Ok(vec![value.clone()]))
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }

        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Invocable<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Result<Response, Err>,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Output = Response;
            type Error = Err;

            fn invoke(self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Output, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

macro_rules! impl_outputs {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<$($ty,)*> Outputs for ($($ty,)*)
        where
            $( $ty: Send + Sync + 'static, )*
        {
            #[allow(unused_variables)]
            fn type_infos(type_infos: &mut Vec<TypeInfo>) {
                $( type_infos.push(TypeInfo::of::<$ty>()); )*
            }

            fn into_instances(self) -> Vec<Instance> {
                let ($($ty,)*) = self;
                vec![$( Instance::new(Arc::new($ty)), )*]
            }
        }
    };
}

all_the_tuples!(impl_outputs);

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the container.
#[inline]
#[must_use]
pub const fn instance<T: Clone + 'static>(val: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok(val.clone())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_instantiator, boxed_outputs_instantiator, DependencyResolver, InstantiateErrorKind, Instantiator, Outputs};
    use crate::{any::TypeInfo, inject::Inject, Container};

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec::Vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    struct Request(bool);
    struct Response(bool);

    #[test]
    #[allow(dead_code)]
    fn test_factory_helper() {
        fn resolver<Deps: DependencyResolver, F: Instantiator<Deps>>(_f: F) {}
        fn resolver_with_dep<Deps: DependencyResolver>() {
            resolver(|| Ok::<_, InstantiateErrorKind>(()));
            resolver(|Inject(_): Inject<u8>| Ok::<_, InstantiateErrorKind>(()));
        }
    }

    #[test]
    fn test_outputs_type_infos() {
        let mut type_infos = Vec::new();
        <(i32, String)>::type_infos(&mut type_infos);

        assert_eq!(type_infos, [TypeInfo::of::<i32>(), TypeInfo::of::<String>()]);
        assert_eq!((1i32, String::from("a")).into_instances().len(), 2);
    }

    #[test]
    #[traced_test]
    fn test_boxed_instantiator_factory() {
        let instantiator_request_call_count = Arc::new(AtomicU8::new(0));
        let instantiator_response_call_count = Arc::new(AtomicU8::new(0));

        let container = Container::new();
        container
            .provide({
                let instantiator_request_call_count = instantiator_request_call_count.clone();
                move || {
                    instantiator_request_call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call instantiator request");
                    Ok(Request(true))
                }
            })
            .unwrap();

        let instantiator_response = boxed_instantiator({
            let instantiator_response_call_count = instantiator_response_call_count.clone();
            move |val_1: Inject<Request>, val_2: Inject<Request>| {
                assert!(Arc::ptr_eq(&val_1.0, &val_2.0));

                instantiator_response_call_count.fetch_add(1, Ordering::SeqCst);

                debug!("Call instantiator response");
                Ok::<_, InstantiateErrorKind>(Response(val_1.0 .0))
            }
        });

        let response_1 = instantiator_response(&container).ok().unwrap();
        let response_2 = instantiator_response(&container).ok().unwrap();

        assert!(response_1[0].downcast::<Response>().unwrap().0);
        assert!(response_2[0].downcast::<Response>().unwrap().0);
        assert_eq!(instantiator_request_call_count.load(Ordering::SeqCst), 1);
        // The boxed constructor itself isn't memoized, the container does it
        assert_eq!(instantiator_response_call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_boxed_outputs_instantiator() {
        let container = Container::new();
        let instantiator = boxed_outputs_instantiator(|| Ok::<_, InstantiateErrorKind>((1i32, String::from("a"))));

        let outputs = instantiator(&container).ok().unwrap();

        assert_eq!(*outputs[0].downcast::<i32>().unwrap(), 1);
        assert_eq!(*outputs[1].downcast::<String>().unwrap(), "a");
    }
}
