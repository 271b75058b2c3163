use glam::Vec3;
use scenery_history::{EntityError, HandleEditable};

/// Minimum handles an area-like shape is created with.
pub const MIN_AREA_HANDLES: usize = 3;

fn check_index(index: usize, count: usize) -> Result<(), EntityError> {
    if index >= count {
        return Err(EntityError::HandleOutOfRange { index, count });
    }
    Ok(())
}

/// A removal must leave at least [`MIN_AREA_HANDLES`] handles behind.
fn check_removal(index: usize, count: usize) -> Result<(), EntityError> {
    check_index(index, count)?;
    if count <= MIN_AREA_HANDLES {
        return Err(EntityError::TooFewHandles {
            min: MIN_AREA_HANDLES,
        });
    }
    Ok(())
}

/// Painted area outlined by freeform control points.
///
/// The fill mesh is rebuilt by the geometry layer whenever `mesh_dirty` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformArea {
    points: Vec<Vec3>,
    pub mesh_dirty: bool,
}

impl FreeformArea {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            mesh_dirty: true,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl HandleEditable for FreeformArea {
    fn handle_count(&self) -> usize {
        self.points.len()
    }

    fn handle_position(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    fn add_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError> {
        if index > self.points.len() {
            return Err(EntityError::HandleOutOfRange {
                index,
                count: self.points.len(),
            });
        }
        self.points.insert(index, position);
        self.mesh_dirty = true;
        Ok(())
    }

    fn remove_handle(&mut self, index: usize) -> Result<Vec3, EntityError> {
        check_removal(index, self.points.len())?;
        self.mesh_dirty = true;
        Ok(self.points.remove(index))
    }

    fn move_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError> {
        check_index(index, self.points.len())?;
        self.points[index] = position;
        self.mesh_dirty = true;
        Ok(())
    }
}

/// Closed polygon boundary. Keeps an axis-aligned bounding box of its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonBoundary {
    vertices: Vec<Vec3>,
    bounds: Option<(Vec3, Vec3)>,
}

impl PolygonBoundary {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        let mut boundary = Self {
            vertices,
            bounds: None,
        };
        boundary.recompute_bounds();
        boundary
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// `(min, max)` corners, `None` when there are no vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.bounds
    }

    fn recompute_bounds(&mut self) {
        self.bounds = self.vertices.iter().fold(None, |acc, v| match acc {
            None => Some((*v, *v)),
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
        });
    }
}

impl HandleEditable for PolygonBoundary {
    fn handle_count(&self) -> usize {
        self.vertices.len()
    }

    fn handle_position(&self, index: usize) -> Option<Vec3> {
        self.vertices.get(index).copied()
    }

    fn add_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError> {
        if index > self.vertices.len() {
            return Err(EntityError::HandleOutOfRange {
                index,
                count: self.vertices.len(),
            });
        }
        self.vertices.insert(index, position);
        self.recompute_bounds();
        Ok(())
    }

    fn remove_handle(&mut self, index: usize) -> Result<Vec3, EntityError> {
        check_removal(index, self.vertices.len())?;
        let removed = self.vertices.remove(index);
        self.recompute_bounds();
        Ok(removed)
    }

    fn move_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError> {
        check_index(index, self.vertices.len())?;
        self.vertices[index] = position;
        self.recompute_bounds();
        Ok(())
    }
}
