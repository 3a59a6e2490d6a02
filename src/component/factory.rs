//! Factory table mapping type ids to component constructors.
//!
//! Drives type-id based attachment and component cloning; the built-in
//! kinds are pre-registered and an entry can be overridden to swap in a
//! differently-configured default.

use rustc_hash::FxHashMap;

use super::{
    CameraComponent, ComponentKind, ComponentTypeId, LightComponent, MeshRendererComponent,
    SkyboxComponent,
};

type Factory = fn() -> ComponentKind;

pub struct ComponentFactories {
    table: FxHashMap<ComponentTypeId, Factory>,
}

impl Default for ComponentFactories {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ComponentFactories {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: FxHashMap::default(),
        }
    }

    /// Table with all built-in kinds registered.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut factories = Self::empty();
        factories.register(ComponentTypeId::Camera, || {
            ComponentKind::Camera(CameraComponent::new())
        });
        factories.register(ComponentTypeId::Light, || {
            ComponentKind::Light(LightComponent::new())
        });
        factories.register(ComponentTypeId::MeshRenderer, || {
            ComponentKind::MeshRenderer(MeshRendererComponent::new())
        });
        factories.register(ComponentTypeId::Skybox, || {
            ComponentKind::Skybox(SkyboxComponent::new())
        });
        factories
    }

    /// Registers `factory` for `type_id`, replacing any previous entry.
    pub fn register(&mut self, type_id: ComponentTypeId, factory: Factory) {
        self.table.insert(type_id, factory);
    }

    /// Builds a fresh kind, or `None` when no factory is registered.
    #[must_use]
    pub fn create(&self, type_id: ComponentTypeId) -> Option<ComponentKind> {
        self.table.get(&type_id).map(|factory| factory())
    }

    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.table.contains_key(&type_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
