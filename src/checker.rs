//! Fluent shape assertions.
//!
//! A [`ShapeChecker`] wraps one [`TypeShape`] and one error factory. Every assertion either
//! returns the checker for further chaining or produces the caller's error type, built from a
//! message of the form `"<name> is <property>."` or `"<name> is not <property>."`. Checks are
//! pure inspection and never touch the shape itself.
//!
//! # Example
//!
//! ```rust
//! use bareforge::prelude::*;
//!
//! let string = corelib().string();
//! let checker = ShapeChecker::new(&*string, Error::Ineligible);
//!
//! assert!(checker.is_final().and_then(|c| c.is_not_abstract()).is_ok());
//! match checker.is_abstract() {
//!     Err(Error::Ineligible(message)) => assert_eq!(message, "String is not abstract."),
//!     _ => unreachable!(),
//! }
//! ```

use strum::{Display, EnumIter};

use crate::typesystem::TypeShape;

/// A shape property that can be asserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Property {
    /// The shape is a primitive value type
    #[strum(serialize = "a primitive")]
    Primitive,
    /// The shape is an array
    #[strum(serialize = "an array")]
    Array,
    /// The shape is an enum
    #[strum(serialize = "an enum")]
    Enum,
    /// The shape is a composite
    #[strum(serialize = "a composite")]
    Composite,
    /// The shape is an interface
    #[strum(serialize = "an interface")]
    Interface,
    /// The shape is abstract
    #[strum(serialize = "abstract")]
    Abstract,
    /// The shape is final
    #[strum(serialize = "final")]
    Final,
    /// The shape is public
    #[strum(serialize = "public")]
    Public,
    /// The shape is private
    #[strum(serialize = "private")]
    Private,
    /// The shape is protected
    #[strum(serialize = "protected")]
    Protected,
    /// The shape is static
    #[strum(serialize = "static")]
    Static,
    /// The shape is sealed
    #[strum(serialize = "sealed")]
    Sealed,
}

impl Property {
    /// Evaluate the property on a shape
    #[must_use]
    pub fn holds_for<S: TypeShape + ?Sized>(self, shape: &S) -> bool {
        match self {
            Property::Primitive => shape.is_primitive(),
            Property::Array => shape.is_array(),
            Property::Enum => shape.is_enum(),
            Property::Composite => shape.is_composite(),
            Property::Interface => shape.is_interface(),
            Property::Abstract => shape.is_abstract(),
            Property::Final => shape.is_final(),
            Property::Public => shape.is_public(),
            Property::Private => shape.is_private(),
            Property::Protected => shape.is_protected(),
            Property::Static => shape.is_static(),
            Property::Sealed => shape.is_sealed(),
        }
    }
}

/// Fluent assertions over one shape
pub struct ShapeChecker<'a, S: ?Sized, F> {
    shape: &'a S,
    error: F,
}

impl<'a, S, F, X> ShapeChecker<'a, S, F>
where
    S: TypeShape + ?Sized,
    F: Fn(String) -> X,
{
    /// Wrap a shape and the factory producing the error for a failed assertion
    ///
    /// ## Arguments
    /// * 'shape' - The shape to inspect
    /// * 'error' - Builds the error from the failure message
    pub fn new(shape: &'a S, error: F) -> Self {
        ShapeChecker { shape, error }
    }

    /// The inspected shape
    #[must_use]
    pub fn shape(&self) -> &'a S {
        self.shape
    }

    /// Assert that `property` holds (`expected == true`) or does not hold
    ///
    /// # Errors
    /// Returns the caller's error if the assertion fails.
    pub fn expect(self, property: Property, expected: bool) -> Result<Self, X> {
        if property.holds_for(self.shape) == expected {
            return Ok(self);
        }

        let negation = if expected { "not " } else { "" };
        Err((self.error)(format!(
            "{} is {}{}.",
            self.shape.simple_name(),
            negation,
            property
        )))
    }
}

macro_rules! assertion_pair {
    ($($property:ident ($phrase:literal) => $is:ident, $is_not:ident;)*) => {
        impl<'a, S, F, X> ShapeChecker<'a, S, F>
        where
            S: TypeShape + ?Sized,
            F: Fn(String) -> X,
        {
            $(
                #[doc = concat!("Assert that the shape is ", $phrase, ".")]
                ///
                /// # Errors
                /// Returns the caller's error if the assertion fails.
                pub fn $is(self) -> Result<Self, X> {
                    self.expect(Property::$property, true)
                }

                #[doc = concat!("Assert that the shape is not ", $phrase, ".")]
                ///
                /// # Errors
                /// Returns the caller's error if the assertion fails.
                pub fn $is_not(self) -> Result<Self, X> {
                    self.expect(Property::$property, false)
                }
            )*
        }
    };
}

assertion_pair! {
    Primitive ("a primitive") => is_primitive, is_not_primitive;
    Array ("an array") => is_array, is_not_array;
    Enum ("an enum") => is_enum, is_not_enum;
    Composite ("a composite") => is_composite, is_not_composite;
    Interface ("an interface") => is_interface, is_not_interface;
    Abstract ("abstract") => is_abstract, is_not_abstract;
    Final ("final") => is_final, is_not_final;
    Public ("public") => is_public, is_not_public;
    Private ("private") => is_private, is_not_private;
    Protected ("protected") => is_protected, is_not_protected;
    Static ("static") => is_static, is_not_static;
    Sealed ("sealed") => is_sealed, is_not_sealed;
}

impl<S: ?Sized, F: Clone> Clone for ShapeChecker<'_, S, F> {
    fn clone(&self) -> Self {
        ShapeChecker {
            shape: self.shape,
            error: self.error.clone(),
        }
    }
}

impl<S: ?Sized, F: Copy> Copy for ShapeChecker<'_, S, F> {}
