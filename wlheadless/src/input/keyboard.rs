use crate::config::KeyboardConfig;
use crate::error::{CompositorError, Result};
use log::{debug, info};
use std::pin::Pin;
use std::ptr;
use std::time::Instant;
use wlheadless_sys::*;
use xkbcommon::xkb;

/// A synthetic keyboard bound to the seat: the embedder's only source
/// of key events, since there is no physical hardware behind a
/// headless backend (§4.6).
pub struct Keyboard {
  seat: *mut wlr_seat,
  keyboard: *mut wlr_keyboard,
  started_at: Instant,
  event_manager: Pin<Box<KeyboardEventManager>>,
}

wayland_listener!(
  pub KeyboardEventManager,
  (),
  [
    led_update => led_update_notify: |_this: &mut KeyboardEventManager, data: *mut libc::c_void,| unsafe {
      debug!("Keyboard: led_update {:#x}", data as usize);
    };
  ]
);

impl Keyboard {
  /// Fails immediately with [`CompositorError::NullSeat`] rather than
  /// leaving an unusable facade around (§9 resolved open question).
  pub fn new(seat: *mut wlr_seat) -> Result<Keyboard> {
    if seat.is_null() {
      return Err(CompositorError::NullSeat);
    }

    let keyboard = unsafe { wlr_keyboard_create() };
    let mut event_manager = KeyboardEventManager::new(());
    unsafe { event_manager.led_update(&mut (*keyboard).events.led_update) };

    let mut facade = Keyboard { seat, keyboard, started_at: Instant::now(), event_manager };
    facade.set_layout(&KeyboardConfig::default())?;
    Ok(facade)
  }

  /// Builds an XKB context and keymap from the rule names, binds it to
  /// the synthetic keyboard, and releases the transient context/keymap
  /// (the keymap itself is retained by wlroots once set).
  pub fn set_layout(&mut self, config: &KeyboardConfig) -> Result<()> {
    let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
    let keymap = xkb::Keymap::new_from_names(
      &context,
      &config.rules,
      &config.model,
      &config.layout,
      &config.variant,
      Some(config.options.clone()),
      xkb::KEYMAP_COMPILE_NO_FLAGS,
    )
    .ok_or_else(|| CompositorError::KeymapCompileFailed { layout: config.layout.clone() })?;

    unsafe {
      if !wlr_keyboard_set_keymap(self.keyboard, keymap.get_raw_ptr()) {
        return Err(CompositorError::KeymapCompileFailed { layout: config.layout.clone() });
      }
      wlr_keyboard_set_repeat_info(self.keyboard, config.repeat_rate, config.repeat_delay);
    }
    info!("Keyboard::set_layout: {}/{}/{}/{}", config.rules, config.model, config.layout, config.variant);
    Ok(())
  }

  /// Notifies the seat of a key event stamped with a millisecond
  /// timestamp measured from this facade's construction (monotonic).
  pub fn press_key(&self, keycode: u32, pressed: bool) {
    let time_msec = self.started_at.elapsed().as_millis() as u32;
    let state = if pressed { 1 } else { 0 };
    unsafe { wlr_seat_keyboard_notify_key(self.seat, time_msec, keycode, state) };
  }

  /// `rate` in the native call is repeats-per-second, not a millisecond
  /// interval, so `interval_ms` is converted before crossing the FFI
  /// boundary (a 40ms interval is 25Hz, not a "rate" of 40).
  pub fn set_repeat_rate(&self, delay_ms: i32, interval_ms: i32) {
    let rate = if interval_ms > 0 { 1000 / interval_ms } else { 0 };
    unsafe { wlr_keyboard_set_repeat_info(self.keyboard, rate, delay_ms) };
  }

  pub fn update_modifiers(&self, depressed: u32, latched: u32, locked: u32, group: u32) {
    let modifiers = wlr_keyboard_modifiers { depressed, latched, locked, group };
    unsafe { wlr_seat_keyboard_notify_modifiers(self.seat, &modifiers) };
  }

  /// Clears seat focus when `surface` is null; otherwise notifies the
  /// seat of keyboard enter on that surface.
  pub fn focus(&self, surface: *mut wlr_surface) {
    if surface.is_null() {
      unsafe { wlr_seat_keyboard_clear_focus(self.seat) };
    } else {
      unsafe { wlr_seat_keyboard_notify_enter(self.seat, surface, ptr::null(), 0, ptr::null()) };
    }
  }

  /// The virtual keyboard has no autonomous state of its own to report.
  pub fn clear_keys_pressed(&self) {}

  pub fn get_keycodes_down(&self) -> Vec<u32> {
    Vec::new()
  }

  pub fn get_layout_group(&self) -> u32 {
    0
  }
}

impl Drop for Keyboard {
  fn drop(&mut self) {
    unsafe { wlr_keyboard_destroy(self.keyboard) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::*;

  // wlr_seat is opaque and none of the seat-notify shims below ever
  // dereference it, so a dangling non-null pointer stands in for one.
  fn fake_seat() -> *mut wlr_seat {
    std::ptr::NonNull::dangling().as_ptr()
  }

  #[test]
  fn new_rejects_a_null_seat() {
    match Keyboard::new(ptr::null_mut()) {
      Err(CompositorError::NullSeat) => {}
      other => panic!("expected NullSeat, got {:?}", other),
    }
  }

  #[test]
  fn new_binds_the_led_update_listener() {
    let keyboard = Keyboard::new(fake_seat()).unwrap();
    assert_eq!(WlSignal::from_ptr(unsafe { &mut (*keyboard.keyboard).events.led_update }).listener_count(), 1);
  }

  #[test]
  fn press_key_does_not_panic_before_any_time_has_elapsed() {
    let keyboard = Keyboard::new(fake_seat()).unwrap();
    keyboard.press_key(30, true);
    keyboard.press_key(30, false);
  }

  #[test]
  fn set_repeat_rate_converts_the_interval_to_hertz() {
    let keyboard = Keyboard::new(fake_seat()).unwrap();
    keyboard.set_repeat_rate(600, 40);
    unsafe {
      assert_eq!((*keyboard.keyboard).repeat_rate, 25);
      assert_eq!((*keyboard.keyboard).repeat_delay, 600);
    }
  }

  #[test]
  fn set_repeat_rate_treats_a_zero_interval_as_no_repeat() {
    let keyboard = Keyboard::new(fake_seat()).unwrap();
    keyboard.set_repeat_rate(600, 0);
    unsafe {
      assert_eq!((*keyboard.keyboard).repeat_rate, 0);
    }
  }
}

#[cfg(test)]
pub unsafe fn wlr_keyboard_create() -> *mut wlr_keyboard {
  Box::into_raw(Box::new(wlr_keyboard {
    xkb_state: ptr::null_mut(),
    keymap: ptr::null_mut(),
    modifiers: wlr_keyboard_modifiers::default(),
    repeat_rate: 0,
    repeat_delay: 0,
    events: wlr_keyboard_events {
      key: crate::test_util::new_wl_signal(),
      modifiers: crate::test_util::new_wl_signal(),
      led_update: crate::test_util::new_wl_signal(),
    },
  }))
}
#[cfg(test)]
pub unsafe fn wlr_keyboard_destroy(keyboard: *mut wlr_keyboard) {
  drop(Box::from_raw(keyboard));
}
#[cfg(test)]
pub unsafe fn wlr_keyboard_set_keymap(_keyboard: *mut wlr_keyboard, _keymap: *mut xkb_keymap) -> bool {
  true
}
#[cfg(test)]
pub unsafe fn wlr_keyboard_set_repeat_info(keyboard: *mut wlr_keyboard, rate: i32, delay: i32) {
  (*keyboard).repeat_rate = rate;
  (*keyboard).repeat_delay = delay;
}
#[cfg(test)]
pub unsafe fn wlr_seat_keyboard_notify_key(_seat: *mut wlr_seat, _time_msec: u32, _key: u32, _state: u32) {}
#[cfg(test)]
pub unsafe fn wlr_seat_keyboard_notify_modifiers(_seat: *mut wlr_seat, _modifiers: *const wlr_keyboard_modifiers) {}
#[cfg(test)]
pub unsafe fn wlr_seat_keyboard_notify_enter(
  _seat: *mut wlr_seat,
  _surface: *mut wlr_surface,
  _keycodes: *const u32,
  _num_keycodes: usize,
  _modifiers: *const wlr_keyboard_modifiers,
) {
}
#[cfg(test)]
pub unsafe fn wlr_seat_keyboard_clear_focus(_seat: *mut wlr_seat) {}
