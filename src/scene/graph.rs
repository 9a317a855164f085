//! In-memory scene host
//!
//! Keeps a parent/child tree of spawned templates with local transforms.
//! Used by the headless binary and by tests to inspect what the track
//! manager built.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use super::{Handle, Rgb, SceneHost, Template, Transform};

/// A spawned instance
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub template: Template,
    pub parent: Option<Handle>,
    pub children: Vec<Handle>,
    pub transform: Transform,
    pub light: Option<Rgb>,
}

/// Tree of live instances
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<Handle, SceneNode>,
    next_id: u64,
    spawned: u64,
    destroyed: u64,
    /// Operations that referenced a handle no longer alive
    stale: u64,
}

impl SceneGraph {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node is alive
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if `handle` is still alive
    pub fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains_key(&handle)
    }

    /// Live node behind a handle
    pub fn node(&self, handle: Handle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    /// Total spawn calls so far
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Total nodes removed, including cascaded descendants
    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    /// Operations on handles that were already gone
    pub fn stale_operations(&self) -> u64 {
        self.stale
    }

    /// Live instances of one template
    pub fn count(&self, template: Template) -> usize {
        self.nodes.values().filter(|n| n.template == template).count()
    }

    /// Live handles of one template, in spawn order
    pub fn handles_of(&self, template: Template) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.template == template)
            .map(|(h, _)| *h)
            .collect();
        handles.sort();
        handles
    }

    /// Compose local transforms up to the root
    pub fn world_matrix(&self, handle: Handle) -> Option<Mat4> {
        let mut node = self.nodes.get(&handle)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.to_matrix() * matrix;
        }
        Some(matrix)
    }

    /// World-space origin of a node
    pub fn world_position(&self, handle: Handle) -> Option<Vec3> {
        self.world_matrix(handle).map(|m| m.transform_point3(Vec3::ZERO))
    }

    fn detach(&mut self, handle: Handle) {
        let parent = self.nodes.get(&handle).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != handle);
        }
    }

    fn mark_stale(&mut self, op: &str, handle: Handle) {
        log::warn!("{} on stale handle {:?}", op, handle);
        self.stale += 1;
    }
}

impl SceneHost for SceneGraph {
    fn spawn(&mut self, template: Template) -> Handle {
        self.next_id += 1;
        self.spawned += 1;
        let handle = Handle(self.next_id);
        self.nodes.insert(
            handle,
            SceneNode {
                template,
                parent: None,
                children: Vec::new(),
                transform: Transform::IDENTITY,
                light: None,
            },
        );
        handle
    }

    fn set_parent(&mut self, handle: Handle, parent: Option<Handle>) {
        if !self.contains(handle) || parent.is_some_and(|p| !self.contains(p)) {
            self.mark_stale("set_parent", handle);
            return;
        }
        self.detach(handle);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.push(handle);
        }
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.parent = parent;
        }
    }

    fn set_local_transform(&mut self, handle: Handle, transform: Transform) {
        match self.nodes.get_mut(&handle) {
            Some(node) => node.transform = transform,
            None => self.mark_stale("set_local_transform", handle),
        }
    }

    fn set_light_color(&mut self, handle: Handle, color: Rgb) {
        match self.nodes.get_mut(&handle) {
            Some(node) => node.light = Some(color),
            None => self.mark_stale("set_light_color", handle),
        }
    }

    fn destroy(&mut self, handle: Handle) {
        if !self.contains(handle) {
            self.mark_stale("destroy", handle);
            return;
        }
        self.detach(handle);

        let mut pending = vec![handle];
        while let Some(h) = pending.pop() {
            if let Some(node) = self.nodes.remove(&h) {
                self.destroyed += 1;
                pending.extend(node.children);
            }
        }
    }
}
