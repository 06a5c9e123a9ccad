//! # bareforge Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the bareforge library. Import this module to get quick access to the type model
//! and the instantiation engine.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all bareforge operations
pub use crate::Error;

/// The result type used throughout bareforge
pub use crate::Result;

// ================================================================================================
// Type System
// ================================================================================================

/// Type descriptors and their predicates
pub use crate::typesystem::{TypeDescriptor, TypeKind, TypeRef, TypeShape, TypeToken};

/// Building and registering types
pub use crate::typesystem::{Constructor, TypeBuilder, TypeRegistry};

/// Built-in types
pub use crate::typesystem::{corelib, CoreLibrary, PrimitiveKind};

/// Slots and modifiers
pub use crate::typesystem::{
    SlotAttributes, SlotDescriptor, SlotType, TypeAttributes, Visibility,
};

// ================================================================================================
// Shape Checks
// ================================================================================================

/// Fluent shape assertions
pub use crate::checker::{Property, ShapeChecker};

// ================================================================================================
// Instantiation
// ================================================================================================

/// The instantiation engine and slot mappers
pub use crate::engine::{map_by_name, InstantiationEngine, SlotMapperFn, NO_MAPPER};

/// Engine configuration
pub use crate::config::{EngineConfig, EngineLimits};

/// Raw memory operations and their hazards
pub use crate::gateway::{heap_gateway, Hazard, MemoryGateway};

// ================================================================================================
// Runtime Values
// ================================================================================================

/// Values and managed objects
pub use crate::value::{ArrayObject, Instance, ManagedObject, ObjectRef, Value};
