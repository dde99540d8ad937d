use crate::error::{CompositorError, Result};
use std::ptr;
use std::time::Instant;
use wlheadless_sys::*;

/// A synthetic pointer bound to the seat and a `wlr_cursor` handle
/// (kept around so the pointer participates in the output layout, even
/// though nothing here warps it — the embedder supplies coordinates
/// already in surface-local space, mirroring [`super::keyboard::Keyboard`]'s
/// explicit-focus model).
pub struct Pointer {
  seat: *mut wlr_seat,
  cursor: *mut wlr_cursor,
  started_at: Instant,
}

impl Pointer {
  pub fn new(seat: *mut wlr_seat, output_layout: *mut wlr_output_layout) -> Result<Pointer> {
    if seat.is_null() {
      return Err(CompositorError::NullSeat);
    }

    let cursor = unsafe { wlr_cursor_create() };
    if cursor.is_null() {
      return Err(CompositorError::CursorCreateFailed);
    }
    unsafe { wlr_cursor_attach_output_layout(cursor, output_layout) };

    Ok(Pointer { seat, cursor, started_at: Instant::now() })
  }

  fn time_msec(&self) -> u32 {
    self.started_at.elapsed().as_millis() as u32
  }

  /// Moves the pointer within the currently focused surface and ends
  /// the batch of events with a frame, per wlroots convention.
  pub fn move_to(&self, sx: f64, sy: f64) {
    unsafe {
      wlr_seat_pointer_notify_motion(self.seat, self.time_msec(), sx, sy);
      wlr_seat_pointer_notify_frame(self.seat);
    }
  }

  pub fn button(&self, button: u32, pressed: bool) {
    let state = if pressed { 1 } else { 0 };
    unsafe {
      wlr_seat_pointer_notify_button(self.seat, self.time_msec(), button, state);
      wlr_seat_pointer_notify_frame(self.seat);
    }
  }

  pub fn scroll(&self, orientation: u32, delta: f64, delta_discrete: i32, source: u32) {
    unsafe {
      wlr_seat_pointer_notify_axis(self.seat, self.time_msec(), orientation, delta, delta_discrete, source);
      wlr_seat_pointer_notify_frame(self.seat);
    }
  }

  /// Clears seat pointer focus when `surface` is null; otherwise
  /// notifies the seat of pointer enter at `(sx, sy)` in that surface's
  /// local coordinates.
  pub fn focus(&self, surface: *mut wlr_surface, sx: f64, sy: f64) {
    if surface.is_null() {
      unsafe { wlr_seat_pointer_clear_focus(self.seat) };
    } else {
      unsafe { wlr_seat_pointer_notify_enter(self.seat, surface, sx, sy) };
    }
  }
}

impl Drop for Pointer {
  fn drop(&mut self) {
    unsafe { wlr_cursor_destroy(self.cursor) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // wlr_seat and wlr_output_layout are opaque and never dereferenced by
  // the shims below, so dangling non-null pointers stand in for them.
  fn fake_seat() -> *mut wlr_seat {
    std::ptr::NonNull::dangling().as_ptr()
  }
  fn fake_output_layout() -> *mut wlr_output_layout {
    std::ptr::NonNull::dangling().as_ptr()
  }

  #[test]
  fn new_rejects_a_null_seat() {
    match Pointer::new(ptr::null_mut(), fake_output_layout()) {
      Err(CompositorError::NullSeat) => {}
      other => panic!("expected NullSeat, got {:?}", other),
    }
  }

  #[test]
  fn move_button_and_scroll_do_not_panic() {
    let pointer = Pointer::new(fake_seat(), fake_output_layout()).unwrap();
    pointer.move_to(1.5, 2.5);
    pointer.button(272, true);
    pointer.button(272, false);
    pointer.scroll(0, 10.0, 1, 0);
  }

  #[test]
  fn focus_accepts_null_to_clear() {
    let pointer = Pointer::new(fake_seat(), fake_output_layout()).unwrap();
    pointer.focus(ptr::null_mut(), 0.0, 0.0);
  }
}

#[cfg(test)]
pub unsafe fn wlr_cursor_create() -> *mut wlr_cursor {
  Box::into_raw(Box::new(std::mem::zeroed::<wlr_cursor>()))
}
#[cfg(test)]
pub unsafe fn wlr_cursor_attach_output_layout(_cursor: *mut wlr_cursor, _layout: *mut wlr_output_layout) {}
#[cfg(test)]
pub unsafe fn wlr_cursor_destroy(cursor: *mut wlr_cursor) {
  drop(Box::from_raw(cursor));
}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_notify_motion(_seat: *mut wlr_seat, _time_msec: u32, _sx: f64, _sy: f64) {}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_notify_button(_seat: *mut wlr_seat, _time_msec: u32, _button: u32, _state: u32) -> u32 {
  0
}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_notify_axis(
  _seat: *mut wlr_seat,
  _time_msec: u32,
  _orientation: u32,
  _value: f64,
  _value_discrete: i32,
  _source: u32,
) {
}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_notify_enter(_seat: *mut wlr_seat, _surface: *mut wlr_surface, _sx: f64, _sy: f64) {}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_clear_focus(_seat: *mut wlr_seat) {}
#[cfg(test)]
pub unsafe fn wlr_seat_pointer_notify_frame(_seat: *mut wlr_seat) {}
