//! Components: behavior units attached to scene objects.
//!
//! A [`Component`] binds one concrete [`ComponentKind`] to exactly one
//! owning object and drives its lifecycle state machine:
//!
//! ```text
//! Stopped -> Created -> Initialized -> { Enabled <-> Disabled } -> Destroyed
//! ```
//!
//! Hooks fire at most once per transition. Attachment runs `instantiate`
//! and `on_created`; the first time the owner becomes part of an active
//! hierarchy runs `on_initialized` followed by `on_enabled`; activation
//! toggles alternate `on_enabled`/`on_disabled`; destruction runs
//! `on_destroyed` exactly once before the handle is unregistered, after
//! which no hook ever fires again.
//!
//! Concrete kinds form a closed set dispatched through the
//! [`ComponentHooks`] capability trait. Hooks only touch the kind's own
//! state (renderer-facing proxies are opaque flags); `mark_dirty` is the
//! seam through which external subsystems request a proxy refresh without
//! this crate depending on their types.

pub mod camera;
pub mod factory;
pub mod light;
pub mod mesh;
pub mod skybox;

pub use camera::{CameraComponent, Projection};
pub use factory::ComponentFactories;
pub use light::{LightComponent, LightKind};
pub use mesh::{Aabb, MeshRendererComponent};
pub use skybox::SkyboxComponent;

use bitflags::bitflags;
use uuid::Uuid;

use crate::registry::{ComponentHandle, ObjectHandle};
use crate::scene::transform::TransformChange;

bitflags! {
    /// Per-component run policy.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RunFlags: u8 {
        /// Receive transform notifications even outside Game simulation.
        const ALWAYS_RUN = 1 << 0;
    }
}

bitflags! {
    /// Which simulation subsystems are currently running.
    ///
    /// An explicit input to notification delivery: components without
    /// [`RunFlags::ALWAYS_RUN`] only hear transform changes while `GAME`
    /// is set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SimulationFlags: u8 {
        const GAME = 1 << 0;
        const PHYSICS = 1 << 1;
        const SCRIPTING = 1 << 2;
        const ANIMATION = 1 << 3;
    }
}

/// Lifecycle states of a component. See the module docs for the
/// transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Constructed but not yet attached.
    #[default]
    Stopped,
    /// Attached; `instantiate` and `on_created` have run.
    Created,
    /// First activation reached; `on_initialized` has run.
    Initialized,
    Enabled,
    Disabled,
    /// Terminal; no further hook may fire.
    Destroyed,
}

/// Discriminant for the closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentTypeId {
    Camera,
    Light,
    MeshRenderer,
    Skybox,
}

/// Payload of the scene-wide component creation/destruction signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentEvent {
    pub object: ObjectHandle,
    pub component: ComponentHandle,
    pub type_id: ComponentTypeId,
}

/// Capability surface every concrete component kind implements.
///
/// Lifecycle hooks default to no-ops; a kind overrides the ones it needs.
/// Hooks are infallible and must not reach back into the scene: state a
/// kind derives from its owner's world transform is pulled lazily through
/// the scene's accessors instead of being pushed through hooks.
pub trait ComponentHooks {
    /// Constructs engine-side resources. Runs once, at attach, before any
    /// other hook; the component is not usable before this.
    fn instantiate(&mut self) {}

    fn on_created(&mut self) {}

    /// Runs once, the first time the owner joins an active hierarchy.
    fn on_initialized(&mut self) {}

    fn on_enabled(&mut self) {}

    fn on_disabled(&mut self) {}

    /// The owner's transform changed; `change` says how. Delivery is
    /// filtered by the wrapper's notify mask and run flags.
    fn on_transform_changed(&mut self, change: TransformChange) {
        let _ = change;
    }

    /// Runs exactly once, before the handle is unregistered.
    fn on_destroyed(&mut self) {}

    /// External request to refresh renderer-facing cached state.
    fn mark_dirty(&mut self) {}

    /// Copies type-specific fields from `source`; never copies caches or
    /// proxies. Returns `false` when `source` holds a different kind.
    fn copy_state_from(&mut self, source: &ComponentKind) -> bool;

    /// Notify mask a fresh instance of this kind starts with.
    fn default_notify_mask(&self) -> TransformChange {
        TransformChange::empty()
    }
}

/// The closed set of concrete component kinds.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    Camera(CameraComponent),
    Light(LightComponent),
    MeshRenderer(MeshRendererComponent),
    Skybox(SkyboxComponent),
}

impl ComponentKind {
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        match self {
            Self::Camera(_) => ComponentTypeId::Camera,
            Self::Light(_) => ComponentTypeId::Light,
            Self::MeshRenderer(_) => ComponentTypeId::MeshRenderer,
            Self::Skybox(_) => ComponentTypeId::Skybox,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Camera(_) => "Camera",
            Self::Light(_) => "Light",
            Self::MeshRenderer(_) => "MeshRenderer",
            Self::Skybox(_) => "Skybox",
        }
    }

    fn hooks_mut(&mut self) -> &mut dyn ComponentHooks {
        match self {
            Self::Camera(c) => c,
            Self::Light(c) => c,
            Self::MeshRenderer(c) => c,
            Self::Skybox(c) => c,
        }
    }

    fn hooks(&self) -> &dyn ComponentHooks {
        match self {
            Self::Camera(c) => c,
            Self::Light(c) => c,
            Self::MeshRenderer(c) => c,
            Self::Skybox(c) => c,
        }
    }

    pub(crate) fn instantiate(&mut self) {
        self.hooks_mut().instantiate();
    }

    pub(crate) fn on_created(&mut self) {
        self.hooks_mut().on_created();
    }

    pub(crate) fn on_initialized(&mut self) {
        self.hooks_mut().on_initialized();
    }

    pub(crate) fn on_enabled(&mut self) {
        self.hooks_mut().on_enabled();
    }

    pub(crate) fn on_disabled(&mut self) {
        self.hooks_mut().on_disabled();
    }

    pub(crate) fn on_transform_changed(&mut self, change: TransformChange) {
        self.hooks_mut().on_transform_changed(change);
    }

    pub(crate) fn on_destroyed(&mut self) {
        self.hooks_mut().on_destroyed();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.hooks_mut().mark_dirty();
    }

    pub(crate) fn copy_state_from(&mut self, source: &ComponentKind) -> bool {
        self.hooks_mut().copy_state_from(source)
    }

    #[must_use]
    pub fn default_notify_mask(&self) -> TransformChange {
        self.hooks().default_notify_mask()
    }
}

/// A component instance: one [`ComponentKind`] bound to one owning object,
/// plus the lifecycle and notification bookkeeping shared by all kinds.
#[derive(Debug)]
pub struct Component {
    /// Display name; defaults to the kind's type name.
    pub name: String,
    uuid: Uuid,
    pub(crate) instance_id: u64,
    pub(crate) owner: ObjectHandle,
    pub(crate) state: Lifecycle,
    pub(crate) notify_mask: TransformChange,
    pub(crate) run_flags: RunFlags,
    pub(crate) pending_destroy: bool,
    /// Serial stamp of the last transform notification delivered to this
    /// component; 0 until the first delivery.
    pub(crate) transform_serial: u64,
    pub(crate) kind: ComponentKind,
}

impl Component {
    pub(crate) fn new(owner: ObjectHandle, kind: ComponentKind) -> Self {
        Self {
            name: kind.type_name().to_owned(),
            uuid: Uuid::new_v4(),
            instance_id: 0,
            owner,
            state: Lifecycle::Stopped,
            notify_mask: kind.default_notify_mask(),
            run_flags: RunFlags::empty(),
            pending_destroy: false,
            transform_serial: 0,
            kind,
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Monotonic id issued at registration; unique for the scene's lifetime.
    #[inline]
    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// The owning scene object. A component has exactly one owner; moving
    /// a component is remove-then-add, never an in-place owner swap.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> ObjectHandle {
        self.owner
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> Lifecycle {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.kind.type_id()
    }

    #[inline]
    #[must_use]
    pub fn notify_mask(&self) -> TransformChange {
        self.notify_mask
    }

    /// Replaces the set of transform-change categories this component
    /// observes.
    pub fn set_notify_mask(&mut self, mask: TransformChange) {
        self.notify_mask = mask;
    }

    #[inline]
    #[must_use]
    pub fn run_flags(&self) -> RunFlags {
        self.run_flags
    }

    pub fn set_run_flags(&mut self, flags: RunFlags) {
        self.run_flags = flags;
    }

    #[inline]
    #[must_use]
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// Stamp of the most recent transform notification; later deliveries
    /// carry strictly larger stamps scene-wide.
    #[inline]
    #[must_use]
    pub fn transform_serial(&self) -> u64 {
        self.transform_serial
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Mutable access to the kind's own fields (light color, camera
    /// projection and so on). Lifecycle state is not reachable here.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut ComponentKind {
        &mut self.kind
    }

    // ========================================================================
    // Lifecycle transitions (scene internal)
    // ========================================================================

    /// Attach transition: `Stopped -> Created`.
    pub(crate) fn begin_life(&mut self) {
        debug_assert_eq!(self.state, Lifecycle::Stopped);
        self.kind.instantiate();
        self.state = Lifecycle::Created;
        self.kind.on_created();
    }

    /// The owner's hierarchy became active. Runs `on_initialized` on the
    /// first activation, then `on_enabled`.
    pub(crate) fn enter_active(&mut self) {
        if self.state == Lifecycle::Created {
            self.kind.on_initialized();
            self.state = Lifecycle::Initialized;
        }
        if matches!(self.state, Lifecycle::Initialized | Lifecycle::Disabled) {
            self.kind.on_enabled();
            self.state = Lifecycle::Enabled;
        }
    }

    /// The owner's hierarchy became inactive.
    pub(crate) fn enter_inactive(&mut self) {
        if self.state == Lifecycle::Enabled {
            self.kind.on_disabled();
            self.state = Lifecycle::Disabled;
        }
    }

    /// Terminal transition; idempotent so the deferred and immediate
    /// destruction paths can share it.
    pub(crate) fn finish_destroy(&mut self) {
        if self.state == Lifecycle::Destroyed {
            return;
        }
        self.kind.on_destroyed();
        self.state = Lifecycle::Destroyed;
    }

    /// Delivery filter for transform notifications: mask intersection plus
    /// run-state, destroyed components excluded.
    pub(crate) fn wants_transform_change(
        &self,
        change: TransformChange,
        sim: SimulationFlags,
    ) -> bool {
        if self.state == Lifecycle::Destroyed {
            return false;
        }
        if !self.notify_mask.intersects(change) {
            return false;
        }
        self.run_flags.contains(RunFlags::ALWAYS_RUN) || sim.contains(SimulationFlags::GAME)
    }
}
