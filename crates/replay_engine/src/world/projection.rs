use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::grid::GridCoord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn lerp(self, target: Vec2, ratio: f32) -> Vec2 {
        self + (target - self) * ratio
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f32,
    pub height: f32,
}

impl PixelSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f32) -> PixelSize {
        PixelSize::new(self.width * factor, self.height * factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    pub tile_pixel_width: f32,
    pub angle_radians: f32,
}

/// Isometric grid projection.
///
/// The map is centered on the pixel origin: the middle cell of the grid lands
/// on `(0, 0)`, row 0 / column 0 is the top corner of the diamond, and `y`
/// grows upward. Cell `(r, c)` maps to
/// `x = (c - r) * half_width`, `y = ((n - 1) - (r + c)) * half_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProjector {
    rhombus: PixelSize,
    half_rhombus: PixelSize,
    map_size: usize,
}

impl GridProjector {
    pub fn new(geometry: TileGeometry, map_size: usize) -> Self {
        let width = geometry.tile_pixel_width;
        let height = (width * geometry.angle_radians.sin()).round();
        let rhombus = PixelSize::new(width, height);
        Self {
            rhombus,
            half_rhombus: rhombus.scaled(0.5),
            map_size,
        }
    }

    pub fn map_size(&self) -> usize {
        self.map_size
    }

    pub fn rhombus_size(&self) -> PixelSize {
        self.rhombus
    }

    pub fn half_rhombus_size(&self) -> PixelSize {
        self.half_rhombus
    }

    /// Center of the rhombus drawn for `coord`.
    pub fn tile_origin(&self, coord: GridCoord) -> Vec2 {
        let center = self.map_size as f32 - 1.0;
        let x = (coord.col - coord.row) as f32 * self.half_rhombus.width;
        let y = (center - (coord.row + coord.col) as f32) * self.half_rhombus.height;
        Vec2::new(x, y)
    }

    /// Nearest cell to `pixel`, or `None` when it falls outside the map.
    pub fn pixel_to_grid(&self, pixel: Vec2) -> Option<GridCoord> {
        if self.half_rhombus.width <= 0.0 || self.half_rhombus.height <= 0.0 {
            return None;
        }
        let diagonal = pixel.x / self.half_rhombus.width;
        let depth = (self.map_size as f32 - 1.0) - pixel.y / self.half_rhombus.height;
        let row = ((depth - diagonal) * 0.5).round();
        let col = ((depth + diagonal) * 0.5).round();
        if !row.is_finite() || !col.is_finite() {
            return None;
        }
        let coord = GridCoord::new(row as i32, col as i32);
        coord.in_square(self.map_size).then_some(coord)
    }

    pub fn grid_pixel_size(&self, map_size: usize) -> PixelSize {
        PixelSize::new(
            map_size as f32 * self.half_rhombus.width * 2.0,
            map_size as f32 * self.half_rhombus.height * 2.0,
        )
    }

    pub fn map_pixel_size(&self) -> PixelSize {
        self.grid_pixel_size(self.map_size)
    }

    /// Canvas extent of the playable area, excluding the border ring on each side.
    pub fn real_map_pixel_size(&self, map_size: usize, border_size: usize) -> PixelSize {
        let playable = map_size as f32 - border_size as f32 * 2.0;
        PixelSize::new(
            playable * self.rhombus.width,
            playable * self.rhombus.height,
        )
    }
}

/// Clamps a viewport translation to a rectangle of `bounds` centered on the origin.
pub fn clamp_drag_position(candidate: Vec2, bounds: PixelSize) -> Vec2 {
    let half_width = (bounds.width * 0.5).max(0.0);
    let half_height = (bounds.height * 0.5).max(0.0);
    Vec2::new(
        clamp_axis(candidate.x, half_width),
        clamp_axis(candidate.y, half_height),
    )
}

fn clamp_axis(value: f32, half_extent: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(-half_extent, half_extent)
}
