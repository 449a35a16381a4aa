mod instantiate;
mod instantiator;
mod provide;
mod resolve;

pub use instantiate::{FieldErrorKind, InstantiateErrorKind};
pub(crate) use instantiator::InstantiatorErrorKind;
pub use provide::ProvideErrorKind;
pub use resolve::ResolveErrorKind;

use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display, Formatter, Write as _};

use crate::key::Key;

pub type InstantiatorResult<T, Err = InstantiateErrorKind> = Result<T, Err>;

/// Keys forming a dependency cycle, the first key is repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(pub Vec<Key>);

impl Display for CyclePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, key) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyList(pub Vec<Key>);

impl Display for KeyList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (index, key) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_char(']')
    }
}

/// Panics if any of `errors` is set, with one `[index]: message` line per error.
///
/// Prefer the [`crate::quick_panic!`] macro, which accepts results directly.
///
/// # Panics
/// Panics if at least one error is passed.
#[track_caller]
pub fn quick_panic(errors: &[Option<&dyn Display>]) {
    let mut message = String::new();
    for (index, err) in errors.iter().enumerate() {
        let Some(err) = err else {
            continue;
        };
        if !message.is_empty() {
            message.push('\n');
        }
        let _ = write!(message, "[{index}]: {err}");
    }
    if !message.is_empty() {
        panic!("{message}");
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{quick_panic, CyclePath, KeyList};
    use crate::key::Key;

    use alloc::{string::ToString as _, vec};
    use core::fmt::Display;

    #[test]
    fn test_cycle_path_display() {
        let path = CyclePath(vec![Key::of::<i32>(), Key::named::<bool>("b"), Key::of::<i32>()]);
        assert_eq!(path.to_string(), "i32 -> bool[name=\"b\"] -> i32");
    }

    #[test]
    fn test_key_list_display() {
        assert_eq!(KeyList(vec![]).to_string(), "[]");
        assert_eq!(KeyList(vec![Key::of::<i32>(), Key::of::<u8>()]).to_string(), "[i32, u8]");
    }

    #[test]
    fn test_quick_panic_without_errors() {
        quick_panic(&[None, None]);
    }

    #[test]
    #[should_panic(expected = "[1]: boom")]
    fn test_quick_panic_with_error() {
        let err = "boom";
        quick_panic(&[None, Some(&err as &dyn Display)]);
    }
}
