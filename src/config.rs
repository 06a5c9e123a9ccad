//! Instantiation engine configuration.
//!
//! # Overview
//!
//! - [`EngineConfig`] - Top-level configuration container
//! - [`EngineLimits`] - Resource limits checked before any memory is allocated
//!
//! # Configuration Presets
//!
//! - [`EngineConfig::default()`] - Generous limits, mapped values are not prechecked
//! - [`EngineConfig::strict()`] - Small limits, every mapped value is prechecked
//!
//! # Example
//!
//! ```rust,no_run
//! use bareforge::{EngineConfig, EngineLimits, InstantiationEngine};
//!
//! let config = EngineConfig {
//!     limits: EngineLimits::new().with_max_array_length(4096),
//!     precheck_slot_values: true,
//! };
//! let engine = InstantiationEngine::with_config(config);
//! ```

/// Configuration of an [`InstantiationEngine`](crate::InstantiationEngine).
///
/// # Default Configuration
///
/// - 1 MiB maximum instance size
/// - 1,048,576 maximum array length
/// - mapped values are not prechecked; a mismatch is a fault inside the gateway
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Resource limits.
    pub limits: EngineLimits,

    /// Whether mapped slot values are checked against their slot types before writing.
    ///
    /// When enabled, a value that does not fit its slot is reported as
    /// [`Error::SlotValueMismatch`](crate::Error::SlotValueMismatch) and nothing is
    /// allocated. When disabled, the gateway treats the same condition as type confusion
    /// and panics.
    pub precheck_slot_values: bool,
}

impl EngineConfig {
    /// Creates a configuration that reports every contract violation as an error.
    ///
    /// # Settings
    ///
    /// - **Instance size**: 64 KiB
    /// - **Array length**: 65,536
    /// - **Precheck**: enabled
    #[must_use]
    pub fn strict() -> Self {
        Self {
            limits: EngineLimits {
                max_instance_size: 64 * 1024,
                max_array_length: 1 << 16,
            },
            precheck_slot_values: true,
        }
    }

    /// Replace the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Enable or disable the precheck of mapped values.
    #[must_use]
    pub fn with_precheck(mut self, enabled: bool) -> Self {
        self.precheck_slot_values = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: EngineLimits::default(),
            precheck_slot_values: false,
        }
    }
}

/// Resource limits of the instantiation engine.
///
/// # Default Values
///
/// | Limit | Default Value |
/// |-------|---------------|
/// | `max_instance_size` | 1 MiB |
/// | `max_array_length` | 1,048,576 |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    /// Maximum bytes of storage a single instance may occupy.
    pub max_instance_size: usize,

    /// Maximum number of elements of an array created by the engine.
    pub max_array_length: usize,
}

impl EngineLimits {
    /// Creates default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum instance size.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Maximum storage of one instance in bytes
    #[must_use]
    pub fn with_max_instance_size(mut self, bytes: usize) -> Self {
        self.max_instance_size = bytes;
        self
    }

    /// Sets the maximum array length.
    ///
    /// # Arguments
    ///
    /// * `length` - Maximum number of elements
    #[must_use]
    pub fn with_max_array_length(mut self, length: usize) -> Self {
        self.max_array_length = length;
        self
    }
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_instance_size: 1024 * 1024, // 1 MiB
            max_array_length: 1 << 20,
        }
    }
}
