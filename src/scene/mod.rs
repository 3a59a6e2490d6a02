//! Scene graph module.
//!
//! Hierarchy and transform management:
//! - `SceneObject`: graph node (parent/child links, transform, mobility, activation)
//! - `Transform`: TRS fields plus cached local/world matrices and dirty bits
//! - `Scene`: the graph itself; owns the registry and every mutation path
//! - `SceneObjectMut`: chainable single-object editing
//! - `propagation`: split-borrow hierarchy walks (fan-out, lazy recompute)

pub mod object;
pub(crate) mod propagation;
pub mod scene;
pub mod transform;
pub mod wrapper;

pub use object::{Mobility, SceneObject};
pub use scene::{ObjectBuilder, Scene, SceneEvents, SceneStats};
pub use transform::{Transform, TransformChange, TransformDirty};
pub use wrapper::SceneObjectMut;
