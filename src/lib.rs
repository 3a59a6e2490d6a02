#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod component;
pub mod errors;
pub mod events;
pub mod registry;
pub mod scene;

pub use component::{Aabb, CameraComponent, Component, ComponentEvent, ComponentFactories, ComponentHooks, ComponentKind, ComponentTypeId, LightComponent, LightKind, Lifecycle, MeshRendererComponent, Projection, RunFlags, SimulationFlags, SkyboxComponent};
pub use errors::{Result, SceneError};
pub use events::{Signal, Subscription};
pub use registry::{ComponentHandle, ObjectHandle, Registry};
pub use scene::{Mobility, ObjectBuilder, Scene, SceneEvents, SceneObject, SceneObjectMut, SceneStats, Transform, TransformChange, TransformDirty};
