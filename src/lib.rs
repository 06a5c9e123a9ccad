// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'gateway/capability.rs' allocates and frees raw instance storage
// - 'value/instance.rs' reads and writes slots at computed offsets

//! # bareforge
//!
//! Raw instantiation for a managed type model: create instances without running their
//! constructors, populate every slot regardless of visibility or finality, and build
//! composites through their canonical constructor from mapped component values.
//!
//! ## Features
//!
//! - **🧱 Type model** - Classes, composites, interfaces, enums, arrays and primitives with
//!   inheritance, slot shadowing and computed instance layouts
//! - **🔍 Shape checks** - Fluent assertions over type modifiers with uniform messages
//! - **🔓 Raw memory gateway** - Unchecked allocation and slot writes behind a single
//!   privileged capability
//! - **⚙️ Instantiation engine** - Bare creation, forced population and canonical
//!   construction, with configurable limits
//! - **🧵 Thread safe** - Descriptors, registries and the engine can be shared freely
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bareforge::prelude::*;
//!
//! let point = TypeBuilder::composite("geo", "Point")
//!     .component("x", PrimitiveKind::I32)
//!     .component("y", PrimitiveKind::I32)
//!     .validator(|args| match args[0] {
//!         Value::I32(x) if x < 0 => Err("x must not be negative".to_string()),
//!         _ => Ok(()),
//!     })
//!     .build()?;
//!
//! let engine = InstantiationEngine::new();
//!
//! // No constructor runs, both components are zero
//! let origin = engine.create_bare(&point)?;
//!
//! // The canonical constructor validates the mapped components
//! let p = engine.construct_canonical(&point, Some(|slot: &SlotDescriptor| match slot.name() {
//!     "x" => Some(Value::I32(3)),
//!     _ => Some(Value::I32(4)),
//! }))?;
//!
//! println!("{} {}", origin, p);
//! # Ok::<(), bareforge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`typesystem`] - Type descriptors, the builder, the core library and the registry
//! - [`checker`] - The [`ShapeChecker`] with its fluent shape assertions
//! - [`gateway`] - The [`MemoryGateway`](gateway::MemoryGateway) performing raw memory
//!   operations
//! - [`engine`] - The [`InstantiationEngine`] and its slot mappers
//! - [`value`] - Runtime values and managed objects
//! - [`config`] - Limits and checks of the engine
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). Eligibility failures carry
//! a message of the form `"<Type> is abstract."` or `"<Type> is not a composite."`; mapper,
//! construction and limit failures have their own variants. Writing a value that does not
//! fit its slot without the precheck enabled is type confusion, which panics.
//!
//! ## Logging
//!
//! Operations emit [`tracing`] events: `debug` for each engine operation and `trace` for
//! every bypass of the regular initialization protocol, tagged with its
//! [`Hazard`](gateway::Hazard).

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use bareforge::prelude::*;
///
/// let engine = InstantiationEngine::new();
/// let zero = engine.create_bare(&corelib().primitive(PrimitiveKind::F64))?;
/// assert_eq!(zero, Value::F64(0.0));
/// # Ok::<(), bareforge::Error>(())
/// ```
pub mod prelude;

pub mod checker;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod typesystem;
pub mod value;

/// `bareforge` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `bareforge` Error type
///
/// # Examples
///
/// ```rust
/// use bareforge::{corelib, Error, InstantiationEngine};
///
/// let engine = InstantiationEngine::new();
/// match engine.construct_canonical(&corelib().string(), bareforge::engine::NO_MAPPER) {
///     Err(Error::Ineligible(message)) => assert_eq!(message, "String is not a composite."),
///     other => panic!("{:?}", other),
/// }
/// ```
pub use error::Error;

pub use checker::{Property, ShapeChecker};
pub use config::{EngineConfig, EngineLimits};
pub use engine::{map_by_name, InstantiationEngine, SlotMapperFn};
pub use typesystem::{
    corelib, Constructor, CoreLibrary, PrimitiveKind, SlotDescriptor, SlotType, TypeBuilder,
    TypeDescriptor, TypeRef, TypeRegistry, TypeShape,
};
pub use value::{ObjectRef, Value};
