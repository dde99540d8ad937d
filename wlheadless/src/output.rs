use log::debug;
use std::cell::RefCell;
use std::pin::Pin;
use std::ptr;
use std::rc::{Rc, Weak};
use wlheadless_sys::*;

/// One headless output. Scene commits happen on its `frame` signal;
/// the library's own pacing decides cadence (§4.3).
pub struct Output {
  registry: Weak<OutputManager>,
  native: *mut wlr_output,
  scene_output: *mut wlr_scene_output,
  event_manager: RefCell<Option<Pin<Box<OutputEventManager>>>>,
}

wayland_listener!(
  pub OutputEventManager,
  Weak<Output>,
  [
    frame => frame_notify: |this: &mut OutputEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(output) = this.data.upgrade() {
        wlr_scene_output_commit(output.scene_output, ptr::null());
        wlr_output_schedule_frame(output.native);
      }
    };
    destroy => destroy_notify: |this: &mut OutputEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(output) = this.data.upgrade() {
        if let Some(registry) = output.registry.upgrade() {
          registry.remove(output.native);
        }
      }
    };
  ]
);

/// Tracks every live headless output. There is normally exactly one
/// (created at `initialize()` time), but nothing here assumes that.
pub struct OutputManager {
  scene: *mut wlr_scene,
  output_layout: *mut wlr_output_layout,
  allocator: *mut wlr_allocator,
  renderer: *mut wlr_renderer,
  outputs: RefCell<Vec<Rc<Output>>>,
}

impl OutputManager {
  pub fn new(
    scene: *mut wlr_scene,
    output_layout: *mut wlr_output_layout,
    allocator: *mut wlr_allocator,
    renderer: *mut wlr_renderer,
  ) -> Rc<OutputManager> {
    Rc::new(OutputManager { scene, output_layout, allocator, renderer, outputs: RefCell::new(Vec::new()) })
  }

  /// Handles `wlr_backend.events.new_output` (§4.3).
  pub fn new_output(self: &Rc<Self>, native: *mut wlr_output) {
    unsafe {
      if !wlr_output_init_render(native, self.allocator, self.renderer) {
        debug!("OutputManager::new_output: wlr_output_init_render failed");
      }
    }

    let scene_output = unsafe { wlr_scene_output_create(self.scene, native) };
    unsafe { wlr_output_layout_add_auto(self.output_layout, native) };

    let output = Rc::new(Output { registry: Rc::downgrade(self), native, scene_output, event_manager: RefCell::new(None) });

    let mut event_manager = OutputEventManager::new(Rc::downgrade(&output));
    unsafe {
      event_manager.frame(&mut (*native).events.frame);
      event_manager.destroy(&mut (*native).events.destroy);
    }
    *output.event_manager.borrow_mut() = Some(event_manager);

    unsafe {
      let mut state = wlr_output_state::default();
      wlr_output_state_init(&mut state);
      wlr_output_state_set_enabled(&mut state, true);
      wlr_output_commit_state(native, &state);
      wlr_output_state_finish(&mut state);
    }

    debug!("OutputManager::new_output: output initialized");
    self.outputs.borrow_mut().push(output);
  }

  fn remove(&self, native: *mut wlr_output) {
    self.outputs.borrow_mut().retain(|o| o.native != native);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::*;

  fn new_output_native() -> wlr_output {
    wlr_output { width: 0, height: 0, events: wlr_output_events { frame: new_wl_signal(), destroy: new_wl_signal() } }
  }

  fn new_manager() -> Rc<OutputManager> {
    OutputManager::new(ptr::null_mut(), ptr::null_mut(), ptr::null_mut(), ptr::null_mut())
  }

  #[test]
  fn new_output_is_tracked_and_subscribed() {
    let manager = new_manager();
    let mut native = new_output_native();
    manager.new_output(&mut native as *mut _);

    assert_eq!(manager.outputs.borrow().len(), 1);
    assert_eq!(WlSignal::from_ptr(&mut native.events.frame).listener_count(), 1);
    assert_eq!(WlSignal::from_ptr(&mut native.events.destroy).listener_count(), 1);
  }

  #[test]
  fn destroy_unsubscribes_and_drops_the_output_record() {
    let manager = new_manager();
    let mut native = new_output_native();
    manager.new_output(&mut native as *mut _);

    WlSignal::from_ptr(&mut native.events.destroy).emit();

    assert_eq!(manager.outputs.borrow().len(), 0);
  }
}

#[cfg(test)]
pub unsafe fn wlr_output_init_render(_output: *mut wlr_output, _allocator: *mut wlr_allocator, _renderer: *mut wlr_renderer) -> bool {
  true
}
#[cfg(test)]
pub unsafe fn wlr_scene_output_create(_scene: *mut wlr_scene, _output: *mut wlr_output) -> *mut wlr_scene_output {
  ptr::null_mut()
}
#[cfg(test)]
pub unsafe fn wlr_output_layout_add_auto(_layout: *mut wlr_output_layout, _output: *mut wlr_output) {}
#[cfg(test)]
pub unsafe fn wlr_output_state_init(_state: *mut wlr_output_state) {}
#[cfg(test)]
pub unsafe fn wlr_output_state_set_enabled(_state: *mut wlr_output_state, _enabled: bool) {}
#[cfg(test)]
pub unsafe fn wlr_output_commit_state(_output: *mut wlr_output, _state: *const wlr_output_state) -> bool {
  true
}
#[cfg(test)]
pub unsafe fn wlr_output_state_finish(_state: *mut wlr_output_state) {}
