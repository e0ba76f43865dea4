//! Time-driven behavior registry.
//!
//! Named bindings from a scene node to an update function of simulation
//! time. Bindings run in registration order, so an earlier binding can
//! publish shared uniforms (the sun writes the light direction) that a
//! later hook reads. Updates must be pure in `time` and current shared
//! state: the UI scrubs time in both directions and re-visits instants.

use crate::scene::{NodeId, Scene};
use crate::uniforms::DrawStateBag;

/// Plain function pointer, so a binding cannot smuggle state past the
/// time argument.
pub type UpdateFn = fn(f64, NodeId, &mut Scene, &mut DrawStateBag);

struct Binding {
    name: String,
    node: NodeId,
    update: UpdateFn,
}

#[derive(Default)]
pub struct BehaviorRegistry {
    bindings: Vec<Binding>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering an existing name replaces the binding in place,
    /// keeping its original evaluation position.
    pub fn register(&mut self, name: &str, node: NodeId, update: UpdateFn) {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.name == name) {
            binding.node = node;
            binding.update = update;
        } else {
            self.bindings.push(Binding { name: name.to_string(), node, update });
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run every binding against one simulation time, in registration
    /// order.
    pub fn update_all(&self, time: f64, scene: &mut Scene, bag: &mut DrawStateBag) {
        for binding in &self.bindings {
            (binding.update)(time, binding.node, scene, bag);
        }
    }
}
