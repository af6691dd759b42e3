//! Elements whose presence is decided at runtime

use crate::error::Result;

/// A value wrapped with a runtime condition, see [`dynamic`]
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamic<T> {
    pub(crate) active: bool,
    pub(crate) value: T,
}

/// Include `value` only if `active` is true.
///
/// Dynamic elements are still type checked, but they do not count as
/// statically required or provided when a statement is checked.
///
/// # Examples
/// ```
/// use sqlweave_core::{dynamic, value};
///
/// let maybe = dynamic(false, value(17));
/// assert!(!maybe.is_active());
/// ```
pub fn dynamic<T>(active: bool, value: T) -> Dynamic<T> {
    Dynamic { active, value }
}

impl<T> Dynamic<T> {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// One entry of a clause argument list
#[derive(Debug, Clone, PartialEq)]
pub enum Element<T> {
    Static(T),
    Dynamic { active: bool, value: T },
}

impl<T> Element<T> {
    pub fn value(&self) -> &T {
        match self {
            Element::Static(value) | Element::Dynamic { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Element::Static(value) | Element::Dynamic { value, .. } => value,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Element::Static(_))
    }

    /// Static elements are always active
    pub fn is_active(&self) -> bool {
        match self {
            Element::Static(_) => true,
            Element::Dynamic { active, .. } => *active,
        }
    }

    /// The value if it is part of the rendered statement
    pub fn active_value(&self) -> Option<&T> {
        if self.is_active() {
            Some(self.value())
        } else {
            None
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Element<U> {
        match self {
            Element::Static(value) => Element::Static(f(value)),
            Element::Dynamic { active, value } => Element::Dynamic {
                active,
                value: f(value),
            },
        }
    }

    pub fn as_ref(&self) -> Element<&T> {
        match self {
            Element::Static(value) => Element::Static(value),
            Element::Dynamic { active, value } => Element::Dynamic {
                active: *active,
                value,
            },
        }
    }
}

impl<T> From<Dynamic<T>> for Element<T> {
    fn from(dynamic: Dynamic<T>) -> Self {
        Element::Dynamic {
            active: dynamic.active,
            value: dynamic.value,
        }
    }
}

/// Conversion into one clause argument
pub trait IntoElement<T> {
    fn into_element(self) -> Result<Element<T>>;
}

impl<T, X: IntoElement<T>> IntoElement<T> for Dynamic<X> {
    fn into_element(self) -> Result<Element<T>> {
        let active = self.active;
        let value = self.value.into_element()?.into_value();
        Ok(Element::Dynamic { active, value })
    }
}

/// Conversion into a clause argument list: a single argument, a tuple, an
/// array or a `Vec` of arguments.
///
/// Single arguments are covered per element type, next to their
/// [`IntoElement`] impls.
pub trait IntoElementList<T> {
    fn into_elements(self) -> Result<Vec<Element<T>>>;
}

impl<T, X: IntoElement<T>> IntoElementList<T> for Dynamic<X> {
    fn into_elements(self) -> Result<Vec<Element<T>>> {
        Ok(vec![self.into_element()?])
    }
}

impl<T, E: IntoElement<T>> IntoElementList<T> for Vec<E> {
    fn into_elements(self) -> Result<Vec<Element<T>>> {
        self.into_iter().map(IntoElement::into_element).collect()
    }
}

impl<T, E: IntoElement<T>, const N: usize> IntoElementList<T> for [E; N] {
    fn into_elements(self) -> Result<Vec<Element<T>>> {
        self.into_iter().map(IntoElement::into_element).collect()
    }
}

macro_rules! impl_element_list_for_tuple {
    ($($name:ident),+) => {
        impl<T, $($name: IntoElement<T>),+> IntoElementList<T> for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_elements(self) -> Result<Vec<Element<T>>> {
                let ($($name,)+) = self;
                Ok(vec![$($name.into_element()?),+])
            }
        }
    };
}

impl_element_list_for_tuple!(A, B);
impl_element_list_for_tuple!(A, B, C);
impl_element_list_for_tuple!(A, B, C, D);
impl_element_list_for_tuple!(A, B, C, D, E);
impl_element_list_for_tuple!(A, B, C, D, E, F);
impl_element_list_for_tuple!(A, B, C, D, E, F, G);
impl_element_list_for_tuple!(A, B, C, D, E, F, G, H);
impl_element_list_for_tuple!(A, B, C, D, E, F, G, H, I);
impl_element_list_for_tuple!(A, B, C, D, E, F, G, H, I, J);

/// Values of the active elements, in order
pub(crate) fn active_values<T>(elements: &[Element<T>]) -> impl Iterator<Item = &T> {
    elements.iter().filter_map(Element::active_value)
}

/// Values of the static elements, in order
pub(crate) fn static_values<T>(elements: &[Element<T>]) -> impl Iterator<Item = &T> {
    elements
        .iter()
        .filter(|element| element.is_static())
        .map(Element::value)
}
