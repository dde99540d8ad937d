use std::ops::{Add, Sub};
use wlheadless_sys::*;

/// A point in surface-local or output-local coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Point {
  pub x: i32,
  pub y: i32,
}

impl Point {
  pub const ZERO: Point = Point { x: 0, y: 0 };

  pub fn new(x: i32, y: i32) -> Self {
    Point { x, y }
  }
}

impl Add for Point {
  type Output = Point;

  fn add(self, rhs: Point) -> Point {
    Point::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Point {
  type Output = Point;

  fn sub(self, rhs: Point) -> Point {
    Point::new(self.x - rhs.x, self.y - rhs.y)
  }
}

/// A width/height pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Size {
  pub width: u32,
  pub height: u32,
}

impl Size {
  pub const ZERO: Size = Size { width: 0, height: 0 };

  pub fn new(width: u32, height: u32) -> Self {
    Size { width, height }
  }
}

/// An axis-aligned rectangle, used for the damage regions handed to
/// `surface-image` listeners.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

impl Rectangle {
  pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
    Rectangle { x, y, width, height }
  }

  pub fn from_box(box_: &wlr_box) -> Self {
    Rectangle {
      x: box_.x,
      y: box_.y,
      width: box_.width.max(0) as u32,
      height: box_.height.max(0) as u32,
    }
  }

  /// Builds the list of damage rectangles from a pixman region, as
  /// `pixman_region32_rectangles` hands them back: a flat array of
  /// `x1,y1,x2,y2` boxes sharing the region's lifetime.
  ///
  /// # Safety
  /// `region` must point to a valid, initialized `pixman_region32`.
  pub unsafe fn from_region(region: *const pixman_region32) -> Vec<Rectangle> {
    let mut n_rects: i32 = 0;
    let boxes = pixman_region32_rectangles(region, &mut n_rects);
    if boxes.is_null() || n_rects <= 0 {
      return Vec::new();
    }
    (0..n_rects as isize)
      .map(|i| {
        let b = &*boxes.offset(i);
        Rectangle::new(b.x1, b.y1, (b.x2 - b.x1).max(0) as u32, (b.y2 - b.y1).max(0) as u32)
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn point_add_and_sub_are_inverses() {
    let a = Point::new(3, -5);
    let b = Point::new(10, 2);
    assert_eq!(a + b - b, a);
  }

  #[test]
  fn rectangle_from_box_clamps_negative_dimensions() {
    let box_ = wlr_box { x: 1, y: 2, width: -1, height: 4 };
    let rect = Rectangle::from_box(&box_);
    assert_eq!(rect, Rectangle::new(1, 2, 0, 4));
  }

  #[test]
  fn from_region_reads_the_shimmed_rectangles() {
    let region = pixman_region32 { extents: Default::default(), data: std::ptr::null_mut() };
    let rects = unsafe { Rectangle::from_region(&region) };
    assert_eq!(rects, vec![Rectangle::new(0, 0, 4, 2)]);
  }

  #[test]
  fn from_region_is_empty_when_shim_reports_no_damage() {
    let mut region = pixman_region32 { extents: Default::default(), data: std::ptr::null_mut() };
    region.extents.x2 = -1; // signals the shim below to report zero rects
    let rects = unsafe { Rectangle::from_region(&region) };
    assert!(rects.is_empty());
  }
}

#[cfg(test)]
static mut TEST_DAMAGE_BOX: pixman_box32 = pixman_box32 { x1: 0, y1: 0, x2: 4, y2: 2 };

#[cfg(test)]
pub unsafe fn pixman_region32_rectangles(region: *const pixman_region32, n_rects: *mut i32) -> *mut pixman_box32 {
  if (*region).extents.x2 < 0 {
    *n_rects = 0;
    return std::ptr::null_mut();
  }
  *n_rects = 1;
  std::ptr::addr_of_mut!(TEST_DAMAGE_BOX)
}
