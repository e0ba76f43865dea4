//! Hierarchical scene transform graph.
//!
//! Nodes form a rooted tree stored in an arena indexed by [`NodeId`].
//! Each node owns a local transform; world transforms are the ancestor
//! chain product, recomputed on demand since behaviors rewrite local
//! transforms every frame. Traversal is depth-first pre-order: an
//! enabled node runs its state hook, draws its mesh under the
//! accumulated transform, then recurses. A disabled node hides its
//! whole subtree.

use nalgebra::{Matrix4, Point3, Vector3};

use crate::uniforms::{self, DrawStateBag};

pub type NodeId = usize;

/// Per-node state hook: reads fields off the node itself and writes
/// uniforms or pipeline state before the node's mesh draws.
pub type StateHook =
    fn(&SceneNode, &mut DrawStateBag, &mut dyn DrawSurface) -> Result<(), String>;

/// The narrow imperative renderer interface the graph drives. The glow
/// renderer implements it for real frames; tests substitute a recorder.
pub trait DrawSurface {
    fn set_depth(&mut self, test: bool, mask: bool);
    fn set_blend(&mut self, on: bool);
    fn set_cull(&mut self, on: bool);
    fn clear(&mut self, color: [f64; 4]);
    fn use_program(&mut self, name: &str) -> Result<(), String>;
    fn draw_mesh(&mut self, name: &str, bag: &DrawStateBag) -> Result<(), String>;
}

pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Matrix4<f64>,
    pub enabled: bool,
    /// Children may be suppressed without disabling the node itself.
    pub visit_children: bool,
    pub mesh: Option<String>,
    pub hook: Option<StateHook>,
    /// Per-node fade, read by hooks instead of enclosing scope.
    pub alpha: f64,
}

impl SceneNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Matrix4::identity(),
            enabled: true,
            visit_children: true,
            mesh: None,
            hook: None,
            alpha: 1.0,
        }
    }
}

#[derive(Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id]
    }

    /// Append `child` to `parent`'s ordered child list. Ownership is
    /// exclusive: a node that already has a parent cannot be reattached.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), String> {
        if let Some(existing) = self.nodes[child].parent {
            return Err(format!(
                "node '{}' already has parent '{}'",
                self.nodes[child].name, self.nodes[existing].name
            ));
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// First node with the given name, in creation order. Names are not
    /// unique (the cloud and atmosphere layers share one); later
    /// duplicates are reachable only by id.
    pub fn lookup(&self, name: &str) -> Result<NodeId, String> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .ok_or_else(|| format!("no node named '{name}' in scene"))
    }

    /// Depth-first pre-order traversal from `root`, invoking state hooks
    /// and drawing meshes under accumulated world transforms.
    pub fn traverse(
        &self,
        root: NodeId,
        bag: &mut DrawStateBag,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), String> {
        self.visit(root, &Matrix4::identity(), bag, surface)
    }

    fn visit(
        &self,
        id: NodeId,
        parent_world: &Matrix4<f64>,
        bag: &mut DrawStateBag,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), String> {
        let node = &self.nodes[id];
        if !node.enabled {
            return Ok(());
        }
        let world = parent_world * node.transform;
        if let Some(hook) = node.hook {
            hook(node, bag, surface)?;
        }
        if let Some(mesh) = &node.mesh {
            bag.set_mat4(uniforms::MODEL_MATRIX, world);
            surface.draw_mesh(mesh, bag)?;
        }
        if node.visit_children {
            for &child in &node.children {
                self.visit(child, &world, bag, surface)?;
            }
        }
        Ok(())
    }

    /// World transform of `node` relative to `root`: the chain product
    /// of local transforms in parent-to-child order. Errs when `node`
    /// does not lie under `root`.
    pub fn world_transform(&self, node: NodeId, root: NodeId) -> Result<Matrix4<f64>, String> {
        let mut chain = vec![node];
        let mut current = node;
        while current != root {
            match self.nodes[current].parent {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => {
                    return Err(format!(
                        "node '{}' is not in the subtree of '{}'",
                        self.nodes[node].name, self.nodes[root].name
                    ));
                }
            }
        }
        let mut world = Matrix4::identity();
        for &id in chain.iter().rev() {
            world *= self.nodes[id].transform;
        }
        Ok(world)
    }

    /// World-space origin of a node, for camera placement.
    pub fn node_origin(&self, node: NodeId, root: NodeId) -> Result<Vector3<f64>, String> {
        let world = self.world_transform(node, root)?;
        let origin = world.transform_point(&Point3::origin());
        Ok(origin.coords)
    }

    /// View matrix looking from one node toward another, with a third
    /// node supplying the up reference. The caller picks an up node
    /// well off the eye-target axis.
    pub fn camera_view(
        &self,
        from: NodeId,
        to: NodeId,
        up_ref: NodeId,
        root: NodeId,
    ) -> Result<Matrix4<f64>, String> {
        let eye = self.node_origin(from, root)?;
        let target = self.node_origin(to, root)?;
        let up = self.node_origin(up_ref, root)? - eye;
        Ok(look_from_at(eye, target, up))
    }
}

/// Right-handed view matrix: forward toward the target, right from
/// forward x up, true up re-derived from the pair.
pub fn look_from_at(eye: Vector3<f64>, target: Vector3<f64>, up: Vector3<f64>) -> Matrix4<f64> {
    let forward = (target - eye).normalize();
    let right = forward.cross(&up).normalize();
    let true_up = right.cross(&forward);
    Matrix4::new(
        right.x, right.y, right.z, -right.dot(&eye),
        true_up.x, true_up.y, true_up.z, -true_up.dot(&eye),
        -forward.x, -forward.y, -forward.z, forward.dot(&eye),
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::MODEL_MATRIX;

    /// Records surface calls so traversal order and counts can be
    /// asserted without a GL context.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub programs: Vec<String>,
        pub draws: Vec<String>,
        pub model_translations: Vec<[f64; 3]>,
    }

    impl DrawSurface for RecordingSurface {
        fn set_depth(&mut self, _test: bool, _mask: bool) {}
        fn set_blend(&mut self, _on: bool) {}
        fn set_cull(&mut self, _on: bool) {}
        fn clear(&mut self, _color: [f64; 4]) {}
        fn use_program(&mut self, name: &str) -> Result<(), String> {
            self.programs.push(name.to_string());
            Ok(())
        }
        fn draw_mesh(&mut self, name: &str, bag: &DrawStateBag) -> Result<(), String> {
            self.draws.push(name.to_string());
            let m = bag.mat4(MODEL_MATRIX).expect("model matrix set before draw");
            self.model_translations.push([m[(0, 3)], m[(1, 3)], m[(2, 3)]]);
            Ok(())
        }
    }

    fn counting_hook(
        _node: &SceneNode,
        bag: &mut DrawStateBag,
        _surface: &mut dyn DrawSurface,
    ) -> Result<(), String> {
        let count = bag.float("HOOK_COUNT").unwrap_or(0.0);
        bag.set_float("HOOK_COUNT", count + 1.0);
        Ok(())
    }

    #[test]
    fn test_add_child_rejects_second_parent() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root"));
        let other = scene.add_node(SceneNode::new("other"));
        let child = scene.add_node(SceneNode::new("child"));
        scene.add_child(root, child).unwrap();
        assert!(scene.add_child(other, child).is_err());
        assert_eq!(scene.node(root).children, vec![child]);
        assert!(scene.node(other).children.is_empty());
    }

    #[test]
    fn test_lookup_first_match_for_duplicate_names() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root"));
        let clouds = scene.add_node(SceneNode::new("clouds"));
        let atmosphere = scene.add_node(SceneNode::new("clouds"));
        scene.add_child(root, clouds).unwrap();
        scene.add_child(root, atmosphere).unwrap();
        assert_eq!(scene.lookup("clouds").unwrap(), clouds);
        assert!(scene.lookup("missing").is_err());
    }

    #[test]
    fn test_two_node_chain_pre_order() {
        let mut scene = Scene::new();
        let mut root = SceneNode::new("root");
        root.hook = Some(counting_hook);
        root.mesh = Some("ball".to_string());
        let root = scene.add_node(root);

        let mut child = SceneNode::new("child");
        child.hook = Some(counting_hook);
        child.mesh = Some("ball".to_string());
        child.transform = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let child = scene.add_node(child);
        scene.add_child(root, child).unwrap();

        let mut bag = DrawStateBag::new();
        let mut surface = RecordingSurface::default();
        scene.traverse(root, &mut bag, &mut surface).unwrap();

        assert_eq!(bag.float("HOOK_COUNT"), Some(2.0));
        assert_eq!(surface.draws, vec!["ball", "ball"]);
        assert_eq!(surface.model_translations[0], [0.0, 0.0, 0.0]);
        assert_eq!(surface.model_translations[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_disabled_subtree_never_visited() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root"));
        let mut middle = SceneNode::new("middle");
        middle.enabled = false;
        let middle = scene.add_node(middle);
        let mut leaf = SceneNode::new("leaf");
        leaf.hook = Some(counting_hook);
        leaf.mesh = Some("ball".to_string());
        let leaf = scene.add_node(leaf);
        scene.add_child(root, middle).unwrap();
        scene.add_child(middle, leaf).unwrap();

        let mut bag = DrawStateBag::new();
        let mut surface = RecordingSurface::default();
        scene.traverse(root, &mut bag, &mut surface).unwrap();
        assert_eq!(bag.float("HOOK_COUNT"), None);
        assert!(surface.draws.is_empty());
    }

    #[test]
    fn test_visit_children_suppresses_recursion_only() {
        let mut scene = Scene::new();
        let mut root = SceneNode::new("root");
        root.mesh = Some("ball".to_string());
        root.visit_children = false;
        let root = scene.add_node(root);
        let mut child = SceneNode::new("child");
        child.mesh = Some("ball".to_string());
        let child = scene.add_node(child);
        scene.add_child(root, child).unwrap();

        let mut bag = DrawStateBag::new();
        let mut surface = RecordingSurface::default();
        scene.traverse(root, &mut bag, &mut surface).unwrap();
        // The node itself still draws; the child does not.
        assert_eq!(surface.draws, vec!["ball"]);
    }

    #[test]
    fn test_world_transform_chains_to_root() {
        let mut scene = Scene::new();
        let mut root = SceneNode::new("root");
        root.transform = Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0));
        let root = scene.add_node(root);
        let mut child = SceneNode::new("child");
        child.transform = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let child = scene.add_node(child);
        scene.add_child(root, child).unwrap();

        let world = scene.world_transform(child, root).unwrap();
        assert_eq!(world[(0, 3)], 1.0);
        assert_eq!(world[(1, 3)], 2.0);

        // Against itself as root, a node's world transform is its own
        // local transform.
        let own = scene.world_transform(child, child).unwrap();
        assert_eq!(own, scene.node(child).transform);
    }

    #[test]
    fn test_world_transform_outside_subtree_errs() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root"));
        let a = scene.add_node(SceneNode::new("a"));
        let b = scene.add_node(SceneNode::new("b"));
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();
        assert!(scene.world_transform(a, b).is_err());
    }

    #[test]
    fn test_look_from_at_orthonormal() {
        let eye = Vector3::new(3.0, 1.0, -2.0);
        let view = look_from_at(eye, Vector3::zeros(), Vector3::new(0.2, 1.0, 0.1));
        let r = Vector3::new(view[(0, 0)], view[(0, 1)], view[(0, 2)]);
        let u = Vector3::new(view[(1, 0)], view[(1, 1)], view[(1, 2)]);
        let b = Vector3::new(view[(2, 0)], view[(2, 1)], view[(2, 2)]);
        for v in [r, u, b] {
            assert!((v.norm() - 1.0).abs() < 1.0e-12);
        }
        assert!(r.dot(&u).abs() < 1.0e-12);
        assert!(r.dot(&b).abs() < 1.0e-12);
        assert!(u.dot(&b).abs() < 1.0e-12);
        // The eye maps to the view-space origin.
        let mapped = view.transform_point(&Point3::from(eye));
        assert!(mapped.coords.norm() < 1.0e-12);
        // The target sits ahead of the camera, along -Z.
        let target = view.transform_point(&Point3::origin());
        assert!(target.z < 0.0);
        assert!(target.x.abs() < 1.0e-12);
        assert!(target.y.abs() < 1.0e-12);
    }

    #[test]
    fn test_camera_view_resolves_node_origins() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root"));
        let mut eye = SceneNode::new("eye");
        eye.transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));
        let eye = scene.add_node(eye);
        let mut target = SceneNode::new("target");
        target.transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -5.0));
        let target = scene.add_node(target);
        let mut up = SceneNode::new("up");
        up.transform = Matrix4::new_translation(&Vector3::new(0.0, 50.0, 0.0));
        let up = scene.add_node(up);
        for id in [eye, target, up] {
            scene.add_child(root, id).unwrap();
        }

        let view = scene.camera_view(eye, target, up, root).unwrap();
        let t = view.transform_point(&Point3::new(0.0, 0.0, -5.0));
        assert!((t.z + 15.0).abs() < 1.0e-9);
        assert!(t.x.abs() < 1.0e-9 && t.y.abs() < 1.0e-9);
    }
}
