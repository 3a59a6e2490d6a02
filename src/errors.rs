//! Error Types
//!
//! This module defines the error types used throughout the scene runtime.
//!
//! # Overview
//!
//! The main error type [`SceneError`] covers the failure modes of the
//! fallible scene operations:
//! - Stale handles whose targets have been destroyed
//! - Component type mismatches during state copies
//! - Unregistered component types
//! - Singleton violations (a second skybox)
//!
//! Most mutating operations on the scene are deliberately infallible and
//! degrade to logged no-ops on stale handles; only the operations where
//! the caller needs to distinguish outcomes, such as cloning, return
//! [`Result<T>`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use vesper_scene::errors::{Result, SceneError};
//!
//! fn duplicate(scene: &mut Scene, src: ObjectHandle) -> Result<ObjectHandle> {
//!     scene.clone_object(src)
//! }
//! ```

use thiserror::Error;

use crate::component::ComponentTypeId;
use crate::registry::{ComponentHandle, ObjectHandle};

/// The main error type for the scene runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// The object behind this handle has been destroyed.
    #[error("Stale object handle: {0:?}")]
    StaleObject(ObjectHandle),

    /// The component behind this handle has been destroyed.
    #[error("Stale component handle: {0:?}")]
    StaleComponent(ComponentHandle),

    // ========================================================================
    // Component Errors
    // ========================================================================
    /// A state copy was attempted between different component kinds.
    #[error("Component type mismatch: expected {expected:?}, found {found:?}")]
    ComponentTypeMismatch {
        /// The kind the destination component holds
        expected: ComponentTypeId,
        /// The kind of the source component
        found: ComponentTypeId,
    },

    /// No factory is registered for this component type.
    #[error("Unknown component type: {0:?}")]
    UnknownComponentType(ComponentTypeId),

    /// The scene already holds a live skybox component.
    #[error("Scene already has a skybox component")]
    SkyboxAlreadyPresent,
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;
