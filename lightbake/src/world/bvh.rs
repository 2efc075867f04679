use std::ops::Index;

use glam::Vec3;
use lightbake_math::BoundingBox;

use crate::Ray;

/// Bounding volume hierarchy over triangles, built using SAH.
///
/// Special thanks to:
/// - https://jacco.ompf2.com/2022/04/13/how-to-build-a-bvh-part-1-basics/,
/// - https://github.com/svenstaro/bvh.
#[derive(Debug, Default)]
pub struct Bvh {
    root: Option<BvhNode>,
}

#[derive(Debug)]
enum BvhNode {
    Internal {
        bb: BoundingBox,
        left: Box<Self>,
        right: Box<Self>,
    },

    Leaf {
        bb: BoundingBox,
        triangles: Vec<usize>,
    },
}

/// Triangle as seen by the builder: its id and world-space positions.
pub struct BvhTriangle {
    pub id: usize,
    pub positions: [Vec3; 3],
}

impl BvhTriangle {
    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions)
    }

    fn center(&self) -> Vec3 {
        self.positions.into_iter().sum::<Vec3>() / 3.0
    }
}

impl Bvh {
    pub fn build(triangles: impl IntoIterator<Item = BvhTriangle>) -> Self {
        let mut root = SahBvhNode::default();

        for triangle in triangles {
            root.add(triangle);
        }

        if root.triangles.is_empty() {
            return Self::default();
        }

        root.balance();

        Self {
            root: Some(root.map()),
        }
    }

    /// Calls `f` with id of every triangle whose leaf's bounding box is
    /// crossed by the ray.
    pub fn traverse(&self, ray: Ray, mut f: impl FnMut(usize)) {
        let Some(root) = &self.root else {
            return;
        };

        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            match node {
                BvhNode::Internal { bb, left, right } => {
                    if ray.distance_to_box(bb.min(), bb.max()) < f32::MAX {
                        stack.push(right);
                        stack.push(left);
                    }
                }

                BvhNode::Leaf { bb, triangles } => {
                    if ray.distance_to_box(bb.min(), bb.max()) < f32::MAX {
                        for &triangle in triangles {
                            f(triangle);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct SahBvhNode {
    bb: BoundingBox,
    triangles: Vec<BvhTriangle>,
    children: Option<[Box<Self>; 2]>,
}

impl SahBvhNode {
    const MAX_LEAF_SIZE: usize = 2;

    fn add(&mut self, triangle: BvhTriangle) {
        self.bb += triangle.bounds();
        self.triangles.push(triangle);
    }

    fn balance(&mut self) {
        if self.triangles.len() <= Self::MAX_LEAF_SIZE {
            return;
        }

        let best = self
            .triangles
            .iter()
            .map(|triangle| triangle.center())
            .flat_map(|split_at| {
                Axis::all().map(move |split_by| (split_at, split_by))
            })
            .map(|(split_at, split_by)| {
                let splitting_cost =
                    self.estimate_splitting(split_at, split_by);

                (split_at, split_by, splitting_cost)
            })
            .min_by(|(_, _, cost_a), (_, _, cost_b)| cost_a.total_cmp(cost_b));

        if let Some((split_at, split_by, splitting_cost)) = best {
            let current_cost =
                (self.triangles.len() as f32) * self.bb.half_area();

            if splitting_cost < current_cost {
                self.split(split_at, split_by);
            }
        }
    }

    fn estimate_splitting(&self, split_at: Vec3, split_by: Axis) -> f32 {
        let mut left = 0;
        let mut left_bb = BoundingBox::default();
        let mut right = 0;
        let mut right_bb = BoundingBox::default();

        for triangle in &self.triangles {
            let (side, side_bb) =
                if triangle.center()[split_by] < split_at[split_by] {
                    (&mut left, &mut left_bb)
                } else {
                    (&mut right, &mut right_bb)
                };

            *side += 1;
            *side_bb += triangle.bounds();
        }

        if left == 0 || right == 0 {
            return f32::MAX;
        }

        (left as f32) * left_bb.half_area()
            + (right as f32) * right_bb.half_area()
    }

    fn split(&mut self, split_at: Vec3, split_by: Axis) {
        let mut left = Self::default();
        let mut right = Self::default();

        for triangle in self.triangles.drain(..) {
            let side = if triangle.center()[split_by] < split_at[split_by] {
                &mut left
            } else {
                &mut right
            };

            side.add(triangle);
        }

        left.balance();
        right.balance();

        self.children = Some([Box::new(left), Box::new(right)]);
    }

    fn map(self) -> BvhNode {
        if let Some([left, right]) = self.children {
            BvhNode::Internal {
                bb: self.bb,
                left: Box::new(left.map()),
                right: Box::new(right.map()),
            }
        } else {
            BvhNode::Leaf {
                bb: self.bb,
                triangles: self
                    .triangles
                    .into_iter()
                    .map(|triangle| triangle.id)
                    .collect(),
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn all() -> impl Iterator<Item = Self> {
        [Self::X, Self::Y, Self::Z].into_iter()
    }
}

impl Index<Axis> for Vec3 {
    type Output = f32;

    fn index(&self, index: Axis) -> &Self::Output {
        match index {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}
