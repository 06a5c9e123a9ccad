//! Constructors of described types.
//!
//! A [`Constructor`] is the regular initialization protocol of a type: it takes one argument
//! per parameter, lets an optional body validate and normalize those arguments, and then
//! assigns every parameter to the slot of the same name. Composites always carry exactly one
//! canonical constructor whose parameters are their components in declared order.

use std::{fmt, sync::Arc};

use crate::{
    gateway::MemoryGateway,
    typesystem::{SlotType, TypeDescriptor, TypeRef},
    value::{ObjectRef, Value},
    Error, Result,
};

/// Body of a constructor: validates and normalizes the arguments in place.
///
/// Returning `Err(message)` rejects the construction; the message surfaces as
/// [`Error::ConstructorRejected`].
pub type ConstructorBody =
    Arc<dyn Fn(&mut [Value]) -> std::result::Result<(), String> + Send + Sync>;

/// A named, typed constructor parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Name of the parameter, equal to the slot it initializes
    pub name: String,
    /// Declared type of the parameter
    pub ty: SlotType,
}

/// The initialization protocol of a type
#[derive(Clone, Default)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    body: Option<ConstructorBody>,
}

impl Constructor {
    /// Create a constructor with the given parameters and no body
    ///
    /// ## Arguments
    /// * 'parameters' - `(name, type)` pairs in declaration order
    pub fn new<I, N>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (N, SlotType)>,
        N: Into<String>,
    {
        Constructor {
            parameters: parameters
                .into_iter()
                .map(|(name, ty)| Parameter {
                    name: name.into(),
                    ty,
                })
                .collect(),
            body: None,
        }
    }

    /// Attach a body that runs before the parameters are assigned
    ///
    /// ## Arguments
    /// * 'body' - Validation and normalization logic
    #[must_use]
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut [Value]) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    pub(crate) fn with_shared_body(mut self, body: Option<ConstructorBody>) -> Self {
        self.body = body;
        self
    }

    /// The parameters of this constructor
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of parameters
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if the erased parameter types equal `types`, in order
    #[must_use]
    pub fn matches_signature<'a, I>(&self, types: I) -> bool
    where
        I: IntoIterator<Item = &'a SlotType>,
    {
        let mut types = types.into_iter();
        let mut parameters = self.parameters.iter();
        loop {
            match (parameters.next(), types.next()) {
                (Some(parameter), Some(ty)) if parameter.ty.same_erasure(ty) => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    /// Verify that `args` can be passed to this constructor
    ///
    /// ## Arguments
    /// * 'owner' - The type this constructor belongs to
    /// * 'args'  - The arguments
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] or [`Error::ArgumentMismatch`].
    pub fn check_arguments(&self, owner: &TypeDescriptor, args: &[Value]) -> Result<()> {
        if args.len() != self.parameters.len() {
            return Err(Error::ArgumentCount {
                type_name: owner.name().to_string(),
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }

        for (parameter, arg) in self.parameters.iter().zip(args) {
            if !parameter.ty.accepts(arg) {
                return Err(Error::ArgumentMismatch {
                    type_name: owner.name().to_string(),
                    parameter: parameter.name.clone(),
                    expected: parameter.ty.name(),
                    actual: arg.type_name(),
                });
            }
        }

        Ok(())
    }

    /// Run the constructor and publish the initialized instance.
    ///
    /// Arguments are checked before and after the body runs, so a body can only normalize
    /// values within their declared types.
    ///
    /// # Errors
    /// Returns an error if the arguments do not fit, the body rejects them, or a parameter
    /// names a slot the owner does not have.
    pub(crate) fn invoke(
        &self,
        owner: &TypeRef,
        gateway: &dyn MemoryGateway,
        mut args: Vec<Value>,
    ) -> Result<ObjectRef> {
        self.check_arguments(owner, &args)?;

        if let Some(body) = &self.body {
            body(&mut args).map_err(|message| Error::ConstructorRejected {
                type_name: owner.name().to_string(),
                message,
            })?;
            self.check_arguments(owner, &args)?;
        }

        let mut targets = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            let slot = owner.slot_by_name(&parameter.name).ok_or_else(|| {
                type_error!(
                    "Constructor parameter `{}` of {} has no matching slot",
                    parameter.name,
                    owner.name()
                )
            })?;
            targets.push(slot);
        }

        // HAZARD(ignores constructor): the storage is zero until the parameters are written
        // below; slots without a parameter keep that zero.
        let mut raw = gateway.allocate_bare(owner);
        for (slot, value) in targets.into_iter().zip(args) {
            // SAFETY: the slot was resolved on `owner` and the value passed the parameter check,
            // whose type has the same erasure as the slot type.
            unsafe { gateway.write_slot(&mut raw, slot, value) };
        }

        Ok(raw.publish())
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{corelib, typesystem::PrimitiveKind};

    #[test]
    fn signature_matching_is_positional() {
        let ctor = Constructor::new([
            ("x", SlotType::Primitive(PrimitiveKind::I32)),
            ("name", SlotType::reference(&corelib().string())),
        ]);

        assert!(ctor.matches_signature([
            &SlotType::Primitive(PrimitiveKind::I32),
            &SlotType::reference(&corelib().string()),
        ]));
        assert!(!ctor.matches_signature([
            &SlotType::reference(&corelib().string()),
            &SlotType::Primitive(PrimitiveKind::I32),
        ]));
        assert!(!ctor.matches_signature([&SlotType::Primitive(PrimitiveKind::I32)]));
        assert_eq!(ctor.arity(), 2);
    }

    #[test]
    fn argument_checks() {
        let owner = corelib().object();
        let ctor = Constructor::new([("x", SlotType::Primitive(PrimitiveKind::I64))]);

        assert!(ctor.check_arguments(&owner, &[Value::I64(7)]).is_ok());
        assert!(matches!(
            ctor.check_arguments(&owner, &[]),
            Err(Error::ArgumentCount {
                expected: 1,
                actual: 0,
                ..
            })
        ));
        match ctor.check_arguments(&owner, &[Value::I32(7)]) {
            Err(Error::ArgumentMismatch {
                parameter,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(parameter, "x");
                assert_eq!(expected, "i64");
                assert_eq!(actual, "i32");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
