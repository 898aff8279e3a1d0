//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and reference their children by index, and
//! leaves reference a contiguous range of a primitive-index array. The tree
//! is built once, with a binned surface area heuristic, and is read-only
//! afterwards so any number of render threads can traverse it at once.

use crate::{Color, Hit, Primitive};
use tessera_math::{Aabb, Interval, Ray, Vec3};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Number of buckets the SAH sweep evaluates per split.
const SAH_BINS: usize = 12;
const TRAVERSAL_COST: f32 = 1.0;
const INTERSECTION_COST: f32 = 1.0;

/// Branches deeper than this become leaves; keeps traversal stacks bounded.
const MAX_TREE_DEPTH: usize = 48;
const STACK_SIZE: usize = 64;

/// Number of visited nodes that maps to full white in [`Bvh::debug`].
const DEBUG_NODES_FOR_WHITE: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    /// Internal node with two children.
    Branch { left: u32, right: u32 },
    /// Leaf covering `indices[first..first + count]`.
    Leaf { first: u32, count: u32 },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: Aabb,
    kind: NodeKind,
}

/// Shape of a built hierarchy, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub primitives: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    pub max_leaf_size: usize,
}

/// BVH over an owned set of primitives.
pub struct Bvh {
    primitives: Vec<Box<dyn Primitive>>,
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
    stats: BvhStats,
}

struct PrimitiveInfo {
    index: u32,
    centroid: Vec3,
    bbox: Aabb,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    bbox: Aabb,
    count: u32,
}

struct Builder {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
    stats: BvhStats,
}

impl Bvh {
    /// Build a BVH over `primitives`, taking ownership of them.
    ///
    /// An empty list gives a hierarchy that never reports a hit.
    pub fn new(primitives: Vec<Box<dyn Primitive>>) -> Self {
        let mut info: Vec<PrimitiveInfo> = primitives
            .iter()
            .enumerate()
            .map(|(index, prim)| {
                let bbox = prim.bounding_box();
                PrimitiveInfo {
                    index: index as u32,
                    centroid: bbox.centroid(),
                    bbox,
                }
            })
            .collect();

        let mut builder = Builder {
            nodes: Vec::with_capacity(2 * info.len()),
            indices: Vec::with_capacity(info.len()),
            stats: BvhStats {
                primitives: info.len(),
                ..BvhStats::default()
            },
        };

        if !info.is_empty() {
            builder.build(&mut info, 0);
        }
        builder.stats.nodes = builder.nodes.len();

        let stats = builder.stats;
        log::info!(
            "BVH: {} primitives, {} nodes, {} leaves, depth {}, largest leaf {}",
            stats.primitives,
            stats.nodes,
            stats.leaves,
            stats.depth,
            stats.max_leaf_size
        );

        Self {
            primitives,
            nodes: builder.nodes,
            indices: builder.indices,
            stats,
        }
    }

    pub fn primitives(&self) -> &[Box<dyn Primitive>] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    /// Bounds of the whole scene.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| root.bbox)
    }

    /// Closest hit along the ray, or [`Hit::MISS`].
    pub fn intersect(&self, ray: &Ray) -> Hit<'_> {
        self.traverse(ray).0
    }

    /// Traversal-cost visualization: a grey level proportional to the
    /// number of nodes the ray visited.
    pub fn debug(&self, ray: &Ray) -> Color {
        let (_, visited) = self.traverse(ray);
        Color::splat(visited as f32 / DEBUG_NODES_FOR_WHITE)
    }

    /// Any-hit query for shadow rays: true if something lies along the ray
    /// before `ray.t_max`.
    pub fn occluded(&self, ray: &Ray) -> bool {
        let Some(root) = self.nodes.first() else {
            return false;
        };
        let interval = Interval::new(0.0, ray.t_max);
        if root.bbox.hit(ray, interval).is_none() {
            return false;
        }

        let mut stack = [0u32; STACK_SIZE];
        let mut stack_ptr = 1;

        while stack_ptr > 0 {
            stack_ptr -= 1;
            let node = &self.nodes[stack[stack_ptr] as usize];

            match node.kind {
                NodeKind::Leaf { first, count } => {
                    let range = first as usize..(first + count) as usize;
                    if self.indices[range]
                        .iter()
                        .any(|&prim| self.primitives[prim as usize].hit(ray, interval).is_hit())
                    {
                        return true;
                    }
                }
                NodeKind::Branch { left, right } => {
                    for child in [left, right] {
                        if self.nodes[child as usize].bbox.hit(ray, interval).is_some() {
                            stack[stack_ptr] = child;
                            stack_ptr += 1;
                        }
                    }
                }
            }
        }

        false
    }

    /// Reference intersection that tests every primitive in turn.
    pub fn linear_scan(&self, ray: &Ray) -> Hit<'_> {
        let mut closest = Hit::MISS;
        let mut closest_t = ray.t_max;

        for (index, prim) in self.primitives.iter().enumerate() {
            let hit = prim.hit(ray, Interval::new(0.0, closest_t));
            if hit.is_hit() && hit.t < closest_t {
                closest_t = hit.t;
                closest = hit.with_primitive(index);
            }
        }

        closest
    }

    /// Ordered closest-hit traversal. Also returns how many nodes were
    /// visited.
    fn traverse(&self, ray: &Ray) -> (Hit<'_>, u32) {
        let mut closest = Hit::MISS;
        let mut visited = 0;

        let Some(root) = self.nodes.first() else {
            return (closest, visited);
        };
        let mut closest_t = ray.t_max;
        let Some(t_root) = root.bbox.hit(ray, Interval::new(0.0, closest_t)) else {
            return (closest, visited);
        };

        let mut stack = [(0u32, 0.0f32); STACK_SIZE];
        stack[0] = (0, t_root);
        let mut stack_ptr = 1;

        while stack_ptr > 0 {
            stack_ptr -= 1;
            let (node_idx, t_entry) = stack[stack_ptr];

            // Something closer was found after this node was pushed
            if t_entry > closest_t {
                continue;
            }
            visited += 1;

            match self.nodes[node_idx as usize].kind {
                NodeKind::Leaf { first, count } => {
                    let range = first as usize..(first + count) as usize;
                    for &prim in &self.indices[range] {
                        let hit = self.primitives[prim as usize].hit(ray, Interval::new(0.0, closest_t));
                        if hit.is_hit() && hit.t < closest_t {
                            closest_t = hit.t;
                            closest = hit.with_primitive(prim as usize);
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    let interval = Interval::new(0.0, closest_t);
                    let t_left = self.nodes[left as usize].bbox.hit(ray, interval);
                    let t_right = self.nodes[right as usize].bbox.hit(ray, interval);

                    match (t_left, t_right) {
                        (Some(tl), Some(tr)) => {
                            // Push the farther child first so the nearer one pops next
                            let (near, far) = if tl <= tr {
                                ((left, tl), (right, tr))
                            } else {
                                ((right, tr), (left, tl))
                            };
                            stack[stack_ptr] = far;
                            stack[stack_ptr + 1] = near;
                            stack_ptr += 2;
                        }
                        (Some(tl), None) => {
                            stack[stack_ptr] = (left, tl);
                            stack_ptr += 1;
                        }
                        (None, Some(tr)) => {
                            stack[stack_ptr] = (right, tr);
                            stack_ptr += 1;
                        }
                        (None, None) => {}
                    }
                }
            }
        }

        (closest, visited)
    }
}

impl Builder {
    /// Recursive construction over `prims`; returns the new node's index.
    fn build(&mut self, prims: &mut [PrimitiveInfo], depth: usize) -> u32 {
        let count = prims.len();
        self.stats.depth = self.stats.depth.max(depth + 1);

        let bbox = prims.iter().fold(Aabb::EMPTY, |mut acc, p| {
            acc.grow(&p.bbox);
            acc
        });

        if count <= LEAF_MAX_SIZE || depth >= MAX_TREE_DEPTH {
            return self.leaf(prims, bbox);
        }

        // Split along the axis where the centroids spread the most
        let centroid_bounds = prims.iter().fold(Aabb::EMPTY, |mut acc, p| {
            acc.grow_point(p.centroid);
            acc
        });
        let axis = centroid_bounds.longest_axis();
        if centroid_bounds.axis_interval(axis).size() < 1e-7 {
            return self.leaf(prims, bbox);
        }

        let (split_pos, split_cost) = sah_split(prims, axis, &centroid_bounds, &bbox);
        if split_cost >= INTERSECTION_COST * count as f32 {
            return self.leaf(prims, bbox);
        }

        let mut mid = partition(prims, axis, split_pos);
        if mid == 0 || mid == count {
            // Degenerate SAH partition: fall back to the median
            mid = count / 2;
            prims.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
        }

        let node_idx = self.nodes.len() as u32;
        self.nodes.push(BvhNode {
            bbox,
            kind: NodeKind::Leaf { first: 0, count: 0 },
        });

        let (left_prims, right_prims) = prims.split_at_mut(mid);
        let left = self.build(left_prims, depth + 1);
        let right = self.build(right_prims, depth + 1);
        self.nodes[node_idx as usize].kind = NodeKind::Branch { left, right };

        node_idx
    }

    fn leaf(&mut self, prims: &[PrimitiveInfo], bbox: Aabb) -> u32 {
        let node_idx = self.nodes.len() as u32;
        let first = self.indices.len() as u32;
        self.indices.extend(prims.iter().map(|p| p.index));

        self.nodes.push(BvhNode {
            bbox,
            kind: NodeKind::Leaf {
                first,
                count: prims.len() as u32,
            },
        });

        self.stats.leaves += 1;
        self.stats.max_leaf_size = self.stats.max_leaf_size.max(prims.len());
        node_idx
    }
}

/// Binned SAH sweep along `axis`. Returns the split position and its cost.
fn sah_split(prims: &[PrimitiveInfo], axis: usize, centroid_bounds: &Aabb, bbox: &Aabb) -> (f32, f32) {
    let node_area = bbox.surface_area();
    if node_area <= 0.0 {
        return (0.0, f32::INFINITY);
    }

    let slab = centroid_bounds.axis_interval(axis);
    let extent = slab.size();
    let scale = SAH_BINS as f32 / extent;

    let mut bins = [Bin::default(); SAH_BINS];
    for prim in prims {
        let bin = (((prim.centroid[axis] - slab.min) * scale) as usize).min(SAH_BINS - 1);
        bins[bin].bbox.grow(&prim.bbox);
        bins[bin].count += 1;
    }

    let mut left_areas = [0.0f32; SAH_BINS - 1];
    let mut left_counts = [0u32; SAH_BINS - 1];
    let mut running = Bin::default();
    for i in 0..SAH_BINS - 1 {
        running.bbox.grow(&bins[i].bbox);
        running.count += bins[i].count;
        left_areas[i] = running.bbox.surface_area();
        left_counts[i] = running.count;
    }

    let mut best = (0.0, f32::INFINITY);
    running = Bin::default();
    for i in (0..SAH_BINS - 1).rev() {
        running.bbox.grow(&bins[i + 1].bbox);
        running.count += bins[i + 1].count;

        if left_counts[i] == 0 || running.count == 0 {
            continue;
        }

        let cost = TRAVERSAL_COST
            + INTERSECTION_COST
                * (left_counts[i] as f32 * left_areas[i]
                    + running.count as f32 * running.bbox.surface_area())
                / node_area;

        if cost < best.1 {
            best = (slab.min + (i + 1) as f32 * extent / SAH_BINS as f32, cost);
        }
    }

    best
}

/// Move primitives whose centroid lies below `split_pos` to the front.
/// Returns the number moved.
fn partition(prims: &mut [PrimitiveInfo], axis: usize, split_pos: f32) -> usize {
    let mut left = 0;
    let mut right = prims.len();

    while left < right {
        if prims[left].centroid[axis] < split_pos {
            left += 1;
        } else {
            right -= 1;
            prims.swap(left, right);
        }
    }

    left
}
