use glam::{DVec2, DVec3};
use smartcenter_shared::PerspectiveCamera;

/// Edge length of one district tile in world units.
pub const TILE_SIZE: f64 = 300.0;
/// Gap between neighbouring tiles.
pub const TILE_GAP: f64 = 40.0;

/// A district laid flat on the ground plane (`y = 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictTile {
    pub id: String,
    pub center: DVec3,
    pub half_extent: f64,
}

impl DistrictTile {
    /// Corners in winding order around +Y.
    pub fn corners(&self) -> [DVec3; 4] {
        let h = self.half_extent;
        let c = self.center;
        [
            c + DVec3::new(-h, 0.0, -h),
            c + DVec3::new(h, 0.0, -h),
            c + DVec3::new(h, 0.0, h),
            c + DVec3::new(-h, 0.0, h),
        ]
    }
}

/// Square-ish grid centered on the origin, filled row by row in `ids` order.
pub fn layout_grid<S: AsRef<str>>(ids: &[S]) -> Vec<DistrictTile> {
    if ids.is_empty() {
        return Vec::new();
    }
    let columns = (ids.len() as f64).sqrt().ceil() as usize;
    let rows = ids.len().div_ceil(columns);
    let pitch = TILE_SIZE + TILE_GAP;
    let origin_x = -(columns as f64 - 1.0) * pitch / 2.0;
    let origin_z = -(rows as f64 - 1.0) * pitch / 2.0;

    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            let col = (index % columns) as f64;
            let row = (index / columns) as f64;
            DistrictTile {
                id: id.as_ref().to_string(),
                center: DVec3::new(origin_x + col * pitch, 0.0, origin_z + row * pitch),
                half_extent: TILE_SIZE / 2.0,
            }
        })
        .collect()
}

/// Screen-space quad of a tile as seen this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedTile {
    pub id: String,
    pub corners: [DVec2; 4],
    pub label_at: DVec2,
    pub depth: f64,
}

impl ProjectedTile {
    pub fn contains(&self, point: DVec2) -> bool {
        // Convex quad: the point must sit on the same side of every edge.
        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let cross = (b - a).perp_dot(point - a);
            if cross.abs() < f64::EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }
}

/// Project every tile, dropping any with a corner behind the camera. The result
/// is sorted far to near, which is also the painter's draw order.
pub fn project_tiles(
    camera: &PerspectiveCamera,
    tiles: &[DistrictTile],
    width: f64,
    height: f64,
) -> Vec<ProjectedTile> {
    let mut projected: Vec<ProjectedTile> = tiles
        .iter()
        .filter_map(|tile| {
            let [a, b, c, d] = tile.corners();
            let corners = [
                camera.project(a, width, height)?,
                camera.project(b, width, height)?,
                camera.project(c, width, height)?,
                camera.project(d, width, height)?,
            ];
            let label = camera.project(tile.center, width, height)?;
            Some(ProjectedTile {
                id: tile.id.clone(),
                corners: corners.map(|corner| corner.screen),
                label_at: label.screen,
                depth: label.depth,
            })
        })
        .collect();
    projected.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    projected
}

/// Nearest tile under `point`, if any.
pub fn hit_test(projected: &[ProjectedTile], point: DVec2) -> Option<&str> {
    projected
        .iter()
        .rev()
        .find(|tile| tile.contains(point))
        .map(|tile| tile.id.as_str())
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, DVec3};
    use smartcenter_shared::{CameraRig, PerspectiveCamera};

    use super::*;

    fn top_down_camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 10_000.0)
            .with_position(DVec3::new(0.0, 1500.0, 1.0));
        camera.look_at(DVec3::ZERO);
        camera
    }

    #[test]
    fn nine_districts_form_a_centered_three_by_three_grid() {
        let ids = ["A", "B", "C", "D", "E", "F", "G", "H", "I"];
        let tiles = layout_grid(&ids);
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[4].id, "E");
        assert_eq!(tiles[4].center, DVec3::ZERO);
        assert_eq!(tiles[0].center, DVec3::new(-340.0, 0.0, -340.0));
        assert_eq!(tiles[8].center, DVec3::new(340.0, 0.0, 340.0));
    }

    #[test]
    fn partial_last_row_keeps_column_count() {
        let tiles = layout_grid(&["north", "south", "east"]);
        assert_eq!(tiles.len(), 3);
        // Two columns, two rows; the third tile starts the second row.
        assert_eq!(tiles[2].center.x, tiles[0].center.x);
        assert!(tiles[2].center.z > tiles[0].center.z);
        assert!(layout_grid::<&str>(&[]).is_empty());
    }

    #[test]
    fn center_of_viewport_hits_middle_tile() {
        let tiles = layout_grid(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
        let projected = project_tiles(&top_down_camera(), &tiles, 800.0, 800.0);
        assert_eq!(projected.len(), 9);
        assert_eq!(hit_test(&projected, DVec2::new(400.0, 400.0)), Some("E"));
        assert_eq!(hit_test(&projected, DVec2::new(2.0, 2.0)), None);
    }

    #[test]
    fn tiles_behind_camera_are_culled() {
        let tiles = layout_grid(&["A"]);
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 10_000.0)
            .with_position(DVec3::new(0.0, 100.0, -2000.0));
        camera.look_at(DVec3::new(0.0, 100.0, -4000.0));
        assert!(project_tiles(&camera, &tiles, 800.0, 600.0).is_empty());
    }

    #[test]
    fn draw_order_is_far_to_near() {
        let tiles = layout_grid(&["A", "B", "C", "D"]);
        let mut camera = PerspectiveCamera::new(75.0, 4.0 / 3.0, 0.1, 10_000.0)
            .with_position(DVec3::new(0.0, 800.0, 1200.0));
        camera.look_at(DVec3::ZERO);
        let projected = project_tiles(&camera, &tiles, 800.0, 600.0);
        assert_eq!(projected.len(), 4);
        assert!(
            projected
                .windows(2)
                .all(|pair| pair[0].depth >= pair[1].depth)
        );
        // Back row (negative z) is farther from a camera at +z.
        assert!(matches!(projected[0].id.as_str(), "A" | "B"));
    }

    #[test]
    fn degenerate_quad_contains_nothing() {
        let tile = ProjectedTile {
            id: "A".to_string(),
            corners: [DVec2::ZERO; 4],
            label_at: DVec2::ZERO,
            depth: 1.0,
        };
        assert!(!tile.contains(DVec2::ZERO));
    }
}
