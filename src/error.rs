use thiserror::Error;

macro_rules! type_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::TypeError($msg.to_string())
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::TypeError(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into distinct categories that callers are expected to treat differently.
/// Memory and type-confusion faults are not represented: writing a value of the wrong shape
/// into a raw storage slot panics.
///
/// # Error Categories
///
/// ## Eligibility Violations
/// - [`Error::Ineligible`] - The type shape does not support the requested operation
///
/// ## Contract Violations
/// - [`Error::MissingMapper`] - No slot mapper was supplied
/// - [`Error::UnmappedSlot`] - The slot mapper declined to supply a value
/// - [`Error::SlotValueMismatch`] - A mapped value does not fit its slot (precheck only)
///
/// ## Construction Errors
/// - [`Error::ConstructorNotFound`] - No canonical constructor matches the components
/// - [`Error::ArgumentCount`] - Wrong number of constructor arguments
/// - [`Error::ArgumentMismatch`] - A constructor argument has the wrong type
/// - [`Error::ConstructorRejected`] - The constructor body refused its arguments
///
/// ## Limits
/// - [`Error::InstanceTooLarge`] - Instance storage exceeds the configured limit
/// - [`Error::ArrayTooLong`] - Array length exceeds the configured limit
///
/// ## Type System Errors
/// - [`Error::TypeError`] - A type description is inconsistent
/// - [`Error::TypeInsert`] - A type could not be registered
/// - [`Error::TypeNotFound`] - A type lookup failed
///
/// # Examples
///
/// ```rust,no_run
/// use bareforge::{corelib, Error, InstantiationEngine};
///
/// let engine = InstantiationEngine::new();
/// let object = corelib().object();
///
/// match engine.force_populate(&object, Some(|_: &bareforge::SlotDescriptor| None)) {
///     Ok(instance) => println!("populated {}", instance),
///     Err(Error::Ineligible(message)) => eprintln!("wrong shape: {}", message),
///     Err(Error::UnmappedSlot { type_name, slot }) => eprintln!("{}.{} unmapped", type_name, slot),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Eligibility
    /// The type shape is not eligible for the requested operation.
    ///
    /// Raised by the [`ShapeChecker`](crate::ShapeChecker) before any memory is touched.
    /// The message names the offending type and the violated property, for example
    /// `"Shape is an interface."`.
    #[error("{0}")]
    Ineligible(String),

    // Contract
    /// No slot mapper was passed to an operation that requires one.
    ///
    /// A mapper has to be passed even for types without slots. Pass `|_| None` for types
    /// that have no slots.
    #[error("{operation} requires a slot mapper even for types without slots")]
    MissingMapper {
        /// The engine operation that was invoked
        operation: &'static str,
    },

    /// The slot mapper returned no value for a slot.
    #[error("No value was mapped for slot {type_name}.{slot}")]
    UnmappedSlot {
        /// Simple name of the type being populated
        type_name: String,
        /// Name of the unmapped slot
        slot: String,
    },

    /// A mapped value does not fit the declared type of its slot.
    ///
    /// Only produced when [`EngineConfig::precheck_slot_values`](crate::EngineConfig) is
    /// enabled; otherwise the same condition is a fatal fault inside the gateway.
    #[error("Slot {type_name}.{slot} is declared as {expected} but was mapped to {actual}")]
    SlotValueMismatch {
        /// Simple name of the type being populated
        type_name: String,
        /// Name of the slot
        slot: String,
        /// Declared slot type
        expected: String,
        /// Description of the mapped value
        actual: String,
    },

    // Construction
    /// The composite type has no constructor matching its declared component types.
    #[error("{type_name} has no canonical constructor")]
    ConstructorNotFound {
        /// Simple name of the composite type
        type_name: String,
    },

    /// A constructor was invoked with the wrong number of arguments.
    #[error("Constructor of {type_name} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Simple name of the constructed type
        type_name: String,
        /// Number of declared parameters
        expected: usize,
        /// Number of supplied arguments
        actual: usize,
    },

    /// A constructor argument does not match its parameter type.
    #[error("Constructor of {type_name} expects {expected} for `{parameter}`, got {actual}")]
    ArgumentMismatch {
        /// Simple name of the constructed type
        type_name: String,
        /// Name of the parameter
        parameter: String,
        /// Declared parameter type
        expected: String,
        /// Description of the supplied value
        actual: String,
    },

    /// The constructor body rejected its arguments.
    ///
    /// This originates from ordinary application logic (for example a range check inside a
    /// composite's canonical constructor) and is therefore recoverable.
    #[error("Constructor of {type_name} failed - {message}")]
    ConstructorRejected {
        /// Simple name of the constructed type
        type_name: String,
        /// Message produced by the constructor body
        message: String,
    },

    // Limits
    /// The instance storage of a type exceeds the configured maximum.
    #[error("{type_name} needs {size} bytes of storage, limit is {limit}")]
    InstanceTooLarge {
        /// Simple name of the type
        type_name: String,
        /// Required storage in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// The requested array length exceeds the configured maximum.
    #[error("Array of {type_name} with {length} elements exceeds limit of {limit}")]
    ArrayTooLong {
        /// Simple name of the array type
        type_name: String,
        /// Requested length
        length: usize,
        /// Configured limit
        limit: usize,
    },

    // Type system
    /// General error while describing a type.
    ///
    /// Produced by the [`TypeBuilder`](crate::TypeBuilder) when a description is
    /// inconsistent, e.g. extending a final type or declaring slots on an interface.
    #[error("{0}")]
    TypeError(String),

    /// Failed to insert new type into the `TypeRegistry`.
    ///
    /// The associated value is the full name that is already taken.
    #[error("Failed to insert new type into TypeRegistry - {0}")]
    TypeInsert(String),

    /// Failed to find type in the `TypeRegistry`.
    #[error("Failed to find type in TypeRegistry - {0}")]
    TypeNotFound(String),
}
