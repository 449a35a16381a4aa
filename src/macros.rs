macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([]);
        $name!([T1]);
        $name!([T1, T2]);
        $name!([T1, T2, T3]);
        $name!([T1, T2, T3, T4]);
        $name!([T1, T2, T3, T4, T5]);
        $name!([T1, T2, T3, T4, T5, T6]);
        $name!([T1, T2, T3, T4, T5, T6, T7]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12]);
    };
}

/// Declares a zero-sized marker implementing [`crate::Name`].
///
/// # Examples
/// ```rust
/// use entwine::{name, Container, Named};
///
/// name!(pub Primary = "primary");
///
/// let container = Container::new();
/// container.supply_with_options(1i32, entwine::ProvideOptions::new().name("primary")).unwrap();
///
/// let value = container.invoke(|Named(value, _): Named<i32, Primary>| Ok(*value)).unwrap();
/// assert_eq!(value, 1);
/// ```
#[macro_export]
macro_rules! name {
    ($vis:vis $marker:ident = $name:literal) => {
        $vis struct $marker;

        impl $crate::Name for $marker {
            const NAME: &'static str = $name;
        }
    };
}

/// Panics if any of the passed results is an error, listing every failure with its position.
///
/// # Examples
/// ```rust,should_panic
/// use entwine::{quick_panic, Container};
///
/// let container = Container::new();
/// quick_panic!(container.supply(1i32), container.supply(2i32));
/// ```
#[macro_export]
macro_rules! quick_panic {
    ($($result:expr),+ $(,)?) => {
        $crate::quick_panic(&[$(
            $result.as_ref().err().map(|err| err as &dyn ::core::fmt::Display)
        ),+])
    };
}
