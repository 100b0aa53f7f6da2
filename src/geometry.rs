use eframe::egui::{Pos2, Rect, Vec2};
use rand::Rng;

/// Radius of a drawn target, in points. Presses within it grab the target.
pub const TARGET_RADIUS: f32 = 32.0;

/// The delete handle sits on the selected target's top-right edge.
pub const DELETE_HANDLE_OFFSET: Vec2 = Vec2::new(24.0, -24.0);
pub const DELETE_HANDLE_RADIUS: f32 = 12.0;

/// Fraction of each axis kept free on both sides when scattering targets.
pub const SCATTER_MARGIN: f32 = 0.1;

pub fn hits_target(center: Pos2, pointer: Pos2) -> bool {
    center.distance(pointer) <= TARGET_RADIUS
}

pub fn delete_handle_center(target: Pos2) -> Pos2 {
    target + DELETE_HANDLE_OFFSET
}

pub fn hits_delete_handle(target: Pos2, pointer: Pos2) -> bool {
    delete_handle_center(target).distance(pointer) <= DELETE_HANDLE_RADIUS
}

/// Layout-local centre of an area, used when a target is added without a position.
pub fn area_center(area: Rect) -> Pos2 {
    Pos2::new(area.width().max(0.0) / 2.0, area.height().max(0.0) / 2.0)
}

/// Picks a layout-local point in `[0.1*W, 0.9*W] x [0.1*H, 0.9*H]`.
pub fn scatter_point<R: Rng + ?Sized>(rng: &mut R, area: Rect) -> Pos2 {
    let w = area.width().max(0.0);
    let h = area.height().max(0.0);
    let x = rng.gen_range(w * SCATTER_MARGIN..=w * (1.0 - SCATTER_MARGIN));
    let y = rng.gen_range(h * SCATTER_MARGIN..=h * (1.0 - SCATTER_MARGIN));
    Pos2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_scatter_stays_inside_inset() {
        let area = Rect::from_min_size(Pos2::new(40.0, 80.0), Vec2::new(500.0, 300.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = scatter_point(&mut rng, area);
            assert!(p.x >= 50.0 && p.x <= 450.0, "x out of inset: {}", p.x);
            assert!(p.y >= 30.0 && p.y <= 270.0, "y out of inset: {}", p.y);
        }
    }

    #[test]
    fn test_scatter_degenerate_area() {
        let area = Rect::from_min_size(Pos2::ZERO, Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(scatter_point(&mut rng, area), Pos2::ZERO);
    }

    #[test]
    fn test_hit_testing() {
        let c = Pos2::new(100.0, 100.0);
        assert!(hits_target(c, Pos2::new(120.0, 110.0)));
        assert!(!hits_target(c, Pos2::new(140.0, 140.0)));
        assert!(hits_delete_handle(c, Pos2::new(124.0, 76.0)));
        assert!(!hits_delete_handle(c, c));
    }

    #[test]
    fn test_area_center_is_layout_local() {
        let area = Rect::from_min_size(Pos2::new(10.0, 60.0), Vec2::new(200.0, 100.0));
        assert_eq!(area_center(area), Pos2::new(100.0, 50.0));
    }
}
