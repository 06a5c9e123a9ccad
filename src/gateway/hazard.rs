//! Classification of the rules a gateway call breaks.

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

/// A language guarantee that an operation deliberately circumvents.
///
/// Every call into a [`MemoryGateway`](crate::gateway::MemoryGateway) is logged with the
/// hazard it relies on, as the `hazard` field of a `trace` event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Hazard {
    /// An instance is created without running any constructor or initializer
    IgnoresConstructor,
    /// A slot declared final is assigned after construction
    ModifiesFinalSlot,
    /// A slot not visible to the caller is assigned
    ModifiesPrivateSlot,
    /// A constructor is invoked regardless of its visibility
    InvokesPrivateConstructor,
    /// A privileged static is read to obtain a capability
    ReadsPrivilegedValue,
}

impl Hazard {
    /// A one-line description of the broken guarantee
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Hazard::IgnoresConstructor => {
                "instances exist whose constructor invariants were never established"
            }
            Hazard::ModifiesFinalSlot => "values assumed immutable change after publication",
            Hazard::ModifiesPrivateSlot => "encapsulated state is written from outside its type",
            Hazard::InvokesPrivateConstructor => "restricted construction paths are bypassed",
            Hazard::ReadsPrivilegedValue => "a process-wide unchecked memory capability escapes",
        }
    }
}
