use super::*;
use crate::scene::error::SceneError;
use std::collections::VecDeque;

/// 10x10 cells of 16 world units.
fn small_grid() -> NavGrid {
    NavGrid::new(160.0, 160.0, 16, 16)
}

fn rect_poly(min: Vec2, max: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(max.x, max.y),
        Vec2::new(min.x, max.y),
    ]
}

/// Blocks the whole column x = 5.
fn wall_at_column_five(nav: &mut NavGrid) {
    nav.apply_terrain(&rect_poly(Vec2::new(80.0, 0.0), Vec2::new(95.0, 160.0)), TerrainFlags::BLOCKED, true);
}

fn all_flags(nav: &NavGrid) -> Vec<Option<TerrainFlags>> {
    let size = nav.grid_size();
    (0..size.y)
        .flat_map(|y| (0..size.x).map(move |x| (x, y)))
        .map(|(x, y)| nav.flags(x, y))
        .collect()
}

#[test]
fn test_resize_uses_ceiling() {
    let nav = NavGrid::new(100.0, 33.0, 16, 16);
    assert_eq!(nav.grid_size(), IVec2::new(7, 3));
    assert_eq!(nav.flags(6, 2), Some(TerrainFlags::empty()));
    assert_eq!(nav.flags(7, 0), None);
}

#[test]
fn test_cost_factors() {
    assert_eq!(TerrainFlags::empty().cost(), 1.0);
    assert_eq!(TerrainFlags::SLOW.cost(), 3.0);
    assert_eq!(TerrainFlags::FAST.cost(), 0.5);
    assert_eq!((TerrainFlags::SLOW | TerrainFlags::FAST).cost(), 1.5);
    assert_eq!((TerrainFlags::FAST | TerrainFlags::DANGER).cost(), 10.5);
    assert!(TerrainFlags::BLOCKED.cost().is_infinite());

    let nav = small_grid();
    assert!(nav.cost(-1, 0).is_infinite(), "Out of bounds costs infinity");
    assert!(!nav.is_walkable(0, 10), "Out of bounds is never walkable");
    assert!(nav.is_walkable(9, 9));
}

#[test]
fn test_heuristic_is_octile() {
    let h = heuristic(IVec2::new(0, 0), IVec2::new(3, 4));
    let expected = 7.0 + (std::f32::consts::SQRT_2 - 2.0) * 3.0;
    assert!((h - expected).abs() < 1e-5, "got {}", h);
    assert_eq!(heuristic(IVec2::new(2, 2), IVec2::new(2, 2)), 0.0);
}

#[test]
fn test_cell_conversions() {
    let nav = small_grid();
    assert_eq!(nav.world_to_cell(Vec2::new(17.0, 31.9)), IVec2::new(1, 1));
    assert_eq!(nav.world_to_cell(Vec2::new(-0.5, 0.0)), IVec2::new(-1, 0), "Floor, not truncation");
    assert_eq!(nav.cell_to_world(IVec2::new(2, 0)), Vec2::new(40.0, 8.0));
}

#[test]
fn test_apply_terrain_scanline_fill() {
    let mut nav = small_grid();
    nav.apply_terrain(&rect_poly(Vec2::new(32.0, 32.0), Vec2::new(80.0, 80.0)), TerrainFlags::BLOCKED, true);

    for y in 2..=4 {
        for x in 2..=5 {
            assert!(!nav.is_walkable(x, y), "({}, {}) should be blocked", x, y);
        }
    }
    assert!(nav.is_walkable(1, 2));
    assert!(nav.is_walkable(6, 3));
    assert!(nav.is_walkable(3, 1));
    // Row 5's midline (y = 88) lies below the polygon
    assert!(nav.is_walkable(3, 5));
}

#[test]
fn test_terrain_flag_round_trip() {
    let mut nav = small_grid();
    nav.apply_terrain(&rect_poly(Vec2::new(0.0, 0.0), Vec2::new(64.0, 64.0)), TerrainFlags::DANGER, true);
    let before = all_flags(&nav);

    let poly = rect_poly(Vec2::new(20.0, 20.0), Vec2::new(120.0, 100.0));
    nav.apply_terrain(&poly, TerrainFlags::BLOCKED, true);
    assert_ne!(all_flags(&nav), before);

    nav.apply_terrain(&poly, TerrainFlags::BLOCKED, false);
    assert_eq!(all_flags(&nav), before, "Removing the same polygon restores the previous flags");
    assert_eq!(nav.flags(1, 1), Some(TerrainFlags::DANGER));
}

#[test]
fn test_degenerate_polygon_is_ignored() {
    let mut nav = small_grid();
    assert!(nav.take_changed(), "Fresh grid reports a change");
    assert!(!nav.take_changed());

    nav.apply_terrain(&[Vec2::ZERO, Vec2::new(100.0, 100.0)], TerrainFlags::BLOCKED, true);
    assert!(!nav.take_changed());
    assert!(all_flags(&nav).iter().all(|f| *f == Some(TerrainFlags::empty())));

    wall_at_column_five(&mut nav);
    assert!(nav.take_changed());
    nav.reset_terrain();
    assert!(nav.take_changed());
    assert!(nav.is_walkable(5, 5));
}

#[test]
fn test_polygon_outside_grid_is_clipped() {
    let mut nav = small_grid();
    nav.apply_terrain(&rect_poly(Vec2::new(-100.0, -100.0), Vec2::new(20.0, 20.0)), TerrainFlags::SLOW, true);
    assert_eq!(nav.flags(0, 0), Some(TerrainFlags::SLOW));
    assert_eq!(nav.flags(1, 0), Some(TerrainFlags::SLOW));
    assert_eq!(nav.flags(2, 0), Some(TerrainFlags::empty()));
    // Row 1's midline (y = 24) lies past the polygon
    assert_eq!(nav.flags(0, 1), Some(TerrainFlags::empty()));
}

#[test]
fn test_find_path_open_terrain() {
    let mut nav = small_grid();
    let mut path = Vec::new();

    assert!(nav.find_path(IVec2::new(0, 0), IVec2::new(3, 0), &mut path));
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(2, 0), IVec2::new(3, 0)]);
    assert_eq!(nav.path_cost(&path), 3.0);
}

#[test]
fn test_find_path_trivial_and_invalid_start() {
    let mut nav = small_grid();
    let mut path = vec![IVec2::new(9, 9)];

    assert!(nav.find_path(IVec2::new(4, 4), IVec2::new(4, 4), &mut path));
    assert_eq!(path, vec![IVec2::new(4, 4)]);

    assert!(!nav.find_path(IVec2::new(-1, 4), IVec2::new(4, 4), &mut path));
    assert!(path.is_empty(), "Failed search leaves no stale path behind");
}

#[test]
fn test_find_path_best_effort_behind_barrier() {
    let mut nav = small_grid();
    wall_at_column_five(&mut nav);
    let mut path = Vec::new();

    assert!(nav.find_path(IVec2::new(1, 5), IVec2::new(8, 5), &mut path), "Unreachable goal still yields a path");
    assert_eq!(path.first(), Some(&IVec2::new(1, 5)));
    assert_eq!(path.last(), Some(&IVec2::new(4, 5)), "Path stops on the near side of the wall");
    assert!(path.iter().all(|cell| cell.x < 5));
}

#[test]
fn test_find_path_avoids_danger() {
    let mut nav = small_grid();
    // Dangerous band across x = 5 except for the bottom row
    nav.apply_terrain(&rect_poly(Vec2::new(80.0, 0.0), Vec2::new(95.0, 144.0)), TerrainFlags::DANGER, true);
    let mut path = Vec::new();

    assert!(nav.find_path(IVec2::new(0, 5), IVec2::new(9, 5), &mut path));
    assert!(path.contains(&IVec2::new(5, 9)), "Detour through the safe gap: {:?}", path);
    assert!(nav.path_cost(&path) < 19.0, "Cheaper than walking through danger");
}

#[test]
fn test_search_buffer_is_reused_between_calls() {
    let mut nav = small_grid();
    let mut path = Vec::new();

    assert!(nav.find_path(IVec2::new(1, 5), IVec2::new(8, 5), &mut path));
    assert_eq!(path.len(), 8);

    wall_at_column_five(&mut nav);
    // Leave a single gap at the top
    nav.apply_terrain(&rect_poly(Vec2::new(80.0, 0.0), Vec2::new(95.0, 15.0)), TerrainFlags::BLOCKED, false);
    assert!(nav.is_walkable(5, 0));

    assert!(nav.find_path(IVec2::new(1, 5), IVec2::new(8, 5), &mut path));
    assert_eq!(path.last(), Some(&IVec2::new(8, 5)));
    assert!(path.contains(&IVec2::new(5, 0)), "Second search must see the new wall: {:?}", path);
}

#[test]
fn test_line_of_sight() {
    let mut nav = small_grid();
    assert!(nav.line_of_sight(IVec2::new(0, 0), IVec2::new(9, 7)));

    wall_at_column_five(&mut nav);
    assert!(!nav.line_of_sight(IVec2::new(0, 0), IVec2::new(9, 7)));
    assert!(nav.line_of_sight(IVec2::new(0, 0), IVec2::new(4, 9)));
    assert!(!nav.line_of_sight(IVec2::new(5, 5), IVec2::new(5, 5)), "Blocked endpoint");
}

#[test]
fn test_refine_path_keeps_turning_points() {
    let mut path = vec![
        IVec2::new(0, 0),
        IVec2::new(1, 0),
        IVec2::new(2, 0),
        IVec2::new(3, 1),
        IVec2::new(4, 2),
        IVec2::new(4, 3),
    ];
    refine_path(&mut path);
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(2, 0), IVec2::new(4, 2), IVec2::new(4, 3)]);

    let mut short = vec![IVec2::new(0, 0), IVec2::new(5, 5)];
    refine_path(&mut short);
    assert_eq!(short.len(), 2);
}

#[test]
fn test_smooth_path_pulls_string() {
    let nav = small_grid();
    let mut path = vec![
        IVec2::new(0, 0),
        IVec2::new(1, 0),
        IVec2::new(2, 0),
        IVec2::new(2, 1),
        IVec2::new(2, 2),
    ];
    nav.smooth_path(&mut path);
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(2, 2)]);
}

#[test]
fn test_find_waypoints_shortcut_and_fallback() {
    let mut nav = small_grid();
    let mut path = Vec::new();

    assert!(nav.find_waypoints(IVec2::new(0, 0), IVec2::new(5, 3), &mut path));
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(5, 3)], "Direct segment in plain sight");

    wall_at_column_five(&mut nav);
    nav.apply_terrain(&rect_poly(Vec2::new(80.0, 0.0), Vec2::new(95.0, 15.0)), TerrainFlags::BLOCKED, false);

    let mut raw = Vec::new();
    assert!(nav.find_path(IVec2::new(1, 5), IVec2::new(8, 5), &mut raw));
    assert!(nav.find_waypoints(IVec2::new(1, 5), IVec2::new(8, 5), &mut path));
    assert_eq!(path.first(), Some(&IVec2::new(1, 5)));
    assert_eq!(path.last(), Some(&IVec2::new(8, 5)));
    assert!(path.len() <= raw.len(), "Refined path keeps only turning points: {:?}", path);

    nav.set_shortcut_distance(0.0);
    nav.reset_terrain();
    assert!(nav.find_waypoints(IVec2::new(0, 0), IVec2::new(5, 0), &mut path));
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(5, 0)], "Straight A* run collapses to its endpoints");
}

#[test]
fn test_find_waypoints_far_off_grid_goal() {
    let mut nav = small_grid();
    let mut path = Vec::new();

    assert!(nav.find_waypoints(IVec2::new(0, 0), IVec2::new(50_000, 0), &mut path));
    assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(9, 0)], "Best effort towards the goal");

    assert!(nav.find_waypoints(IVec2::new(4, 4), IVec2::new(i32::MIN, i32::MAX), &mut path));
    let last = *path.last().unwrap();
    assert!(nav.in_bounds(last.x, last.y));

    nav.set_shortcut_distance(f32::MAX);
    assert!(nav.find_waypoints(IVec2::new(0, 0), IVec2::new(i32::MAX, 0), &mut path));
    assert_eq!(path.last(), Some(&IVec2::new(9, 0)));
}

#[test]
fn test_heuristic_extreme_cells() {
    let h = heuristic(IVec2::new(i32::MIN, 0), IVec2::new(i32::MAX, 0));
    assert!(h.is_finite() && h > 4.0e9);
    assert!(!small_grid().line_of_sight(IVec2::new(0, 0), IVec2::new(i32::MAX, i32::MIN)));
}

#[test]
fn test_oversized_resize_leaves_empty_grid() {
    let mut nav = NavGrid::new(f32::MAX, f32::MAX, 1, 1);
    assert_eq!(nav.grid_size(), IVec2::ZERO);
    assert!(!nav.is_walkable(0, 0));

    let mut path = Vec::new();
    assert!(!nav.find_path(IVec2::new(0, 0), IVec2::new(3, 3), &mut path));
    assert!(path.is_empty());

    nav.resize(160.0, 160.0, 16, 16);
    assert_eq!(nav.grid_size(), IVec2::new(10, 10));
}

#[test]
fn test_clip_movement() {
    let mut nav = small_grid();
    wall_at_column_five(&mut nav);

    // Same walkable cell: accepted as is
    let to = Vec2::new(25.0, 22.0);
    assert_eq!(nav.clip_movement(Vec2::new(20.0, 20.0), to), to);

    // Same blocked cell: rejected
    let from = Vec2::new(82.0, 40.0);
    assert_eq!(nav.clip_movement(from, Vec2::new(84.0, 40.0)), from);

    // Crossing the wall: clamped to the last free sample
    let clipped = nav.clip_movement(Vec2::new(40.0, 40.0), Vec2::new(120.0, 40.0));
    assert_eq!(clipped, Vec2::new(72.0, 40.0));

    // Free movement across several cells is untouched
    let free = nav.clip_movement(Vec2::new(8.0, 8.0), Vec2::new(40.0, 72.0));
    assert!((free - Vec2::new(40.0, 72.0)).length() < 1e-3);
}

#[test]
fn test_steer_along_path() {
    let nav = small_grid();
    let mut path: VecDeque<IVec2> = VecDeque::from([IVec2::new(2, 0)]);

    let velocity = nav.steer_along_path(&mut path, Vec2::new(8.0, 8.0), 60.0, 1.0);
    assert_eq!(velocity, Vec2::new(60.0, 0.0));
    assert_eq!(path.len(), 1);

    let velocity = nav.steer_along_path(&mut path, Vec2::new(40.5, 8.0), 60.0, 1.0);
    assert_eq!(velocity, Vec2::ZERO, "Arrived: waypoint consumed");
    assert!(path.is_empty());
}

#[test]
fn test_debug_colors() {
    let mut nav = small_grid();
    nav.apply_terrain(&rect_poly(Vec2::new(0.0, 0.0), Vec2::new(15.0, 15.0)), TerrainFlags::BLOCKED | TerrainFlags::FAST, true);

    let colors = nav.debug_colors();
    assert_eq!(colors.len(), 100);
    assert_eq!(colors[0], [230, 241, 55, 255]);
    assert_eq!(colors[1], [0, 0, 0, 0]);
}

#[test]
fn test_snapshot_restore() {
    let mut nav = small_grid();
    wall_at_column_five(&mut nav);
    nav.apply_terrain(&rect_poly(Vec2::new(0.0, 0.0), Vec2::new(30.0, 30.0)), TerrainFlags::SLOW, true);

    let snapshot = nav.snapshot();
    let mut restored = NavGrid::default();
    restored.restore(&snapshot).expect("valid snapshot");

    assert_eq!(restored.grid_size(), nav.grid_size());
    assert_eq!(all_flags(&restored), all_flags(&nav));
}

#[test]
fn test_snapshot_rejects_bad_input() {
    let nav = small_grid();
    let mut target = NavGrid::new(32.0, 32.0, 16, 16);

    let mut wrong_version = nav.snapshot();
    wrong_version.version = 99;
    assert!(matches!(
        target.restore(&wrong_version),
        Err(SceneError::SnapshotVersion { found: 99, expected: TERRAIN_SNAPSHOT_VERSION })
    ));

    let mut truncated = nav.snapshot();
    truncated.flags.pop();
    assert!(matches!(
        target.restore(&truncated),
        Err(SceneError::SnapshotSize { expected: 100, found: 99 })
    ));
    assert_eq!(target.grid_size(), IVec2::new(2, 2), "Rejected snapshot leaves the grid alone");
}

#[test]
fn test_snapshot_rejects_oversized_header() {
    let mut target = small_grid();
    wall_at_column_five(&mut target);
    let before = all_flags(&target);

    let huge = TerrainSnapshot {
        version: TERRAIN_SNAPSHOT_VERSION,
        world_size: Vec2::splat(1.0e9),
        cell_size: UVec2::ONE,
        grid_size: IVec2::splat(1_000_000_000),
        flags: Vec::new(),
    };
    assert!(matches!(target.restore(&huge), Err(SceneError::SnapshotSize { found: 0, .. })));

    let saturated = TerrainSnapshot {
        world_size: Vec2::splat(f32::MAX),
        grid_size: IVec2::splat(i32::MAX),
        ..huge
    };
    assert!(matches!(target.restore(&saturated), Err(SceneError::SnapshotSize { .. })));

    assert_eq!(target.grid_size(), IVec2::new(10, 10));
    assert_eq!(all_flags(&target), before);
}

#[test]
fn test_terrain_flags_serde() {
    let flags = TerrainFlags::BLOCKED | TerrainFlags::DANGER;
    let json = serde_json::to_string(&flags).unwrap();
    let back: TerrainFlags = serde_json::from_str(&json).unwrap();
    assert_eq!(back, flags);

    let bytes = bincode::serialize(&vec![flags, TerrainFlags::SLOW]).unwrap();
    let back: Vec<TerrainFlags> = bincode::deserialize(&bytes).unwrap();
    assert_eq!(back, vec![flags, TerrainFlags::SLOW]);
}

#[test]
fn test_snapshot_file_round_trip() {
    let mut nav = small_grid();
    wall_at_column_five(&mut nav);

    let path = std::env::temp_dir().join(format!("isoscene_terrain_{}.bin", std::process::id()));
    save_terrain(&path, &nav.snapshot()).expect("save");
    let loaded = load_terrain(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, nav.snapshot());
}
