use crate::event::{CompositorEvent, EventBus, NativePtr};
use log::debug;
use std::pin::Pin;
use std::rc::Rc;
use wlheadless_sys::*;

/// Forces server-side decorations on every toplevel regardless of what
/// the client requested (§4.5). This is the compositor's only
/// decoration policy — there is no per-window override.
pub struct DecorationManager {
  bus: Rc<EventBus>,
  event_manager: Pin<Box<DecorationManagerEventManager>>,
}

wayland_listener!(
  pub DecorationManagerEventManager,
  Rc<EventBus>,
  [
    new_toplevel_decoration => new_toplevel_decoration_notify: |this: &mut DecorationManagerEventManager, data: *mut libc::c_void,| unsafe {
      let decoration = data as *mut wlr_xdg_toplevel_decoration_v1;
      let client_requested_ssd = (*decoration).requested_mode == WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_SERVER_SIDE;
      wlr_xdg_toplevel_decoration_v1_set_mode(decoration, WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_SERVER_SIDE);
      debug!("DecorationManager: forced server-side mode (client requested ssd: {})", client_requested_ssd);
      this.data.fire(CompositorEvent::Ssd {
        toplevel: NativePtr::from_ptr((*decoration).toplevel),
        client_requested_ssd,
      });
    };
  ]
);

impl DecorationManager {
  /// Returns `None` (after logging a warning) if the decoration manager
  /// global could not be created — non-fatal per §4.1 step 9.
  pub fn new(display: *mut wl_display, bus: Rc<EventBus>) -> Option<DecorationManager> {
    let manager = unsafe { wlr_xdg_decoration_manager_v1_create(display) };
    if manager.is_null() {
      log::warn!("xdg-decoration manager unavailable; clients will not be told to use SSD");
      return None;
    }

    let mut event_manager = DecorationManagerEventManager::new(bus.clone());
    unsafe { event_manager.new_toplevel_decoration(&mut (*manager).events.new_toplevel_decoration) };

    Some(DecorationManager { bus, event_manager })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::*;
  use std::cell::Cell;
  use std::ptr;

  #[test]
  fn forces_server_side_even_when_client_requested_client_side() {
    let bus = Rc::new(EventBus::new());
    let seen = Rc::new(Cell::new(false));
    let seen2 = seen.clone();
    bus.add_event_listener(
      "ssd",
      Rc::new(move |e: &CompositorEvent| {
        if let CompositorEvent::Ssd { client_requested_ssd, .. } = e {
          assert!(!client_requested_ssd);
          seen2.set(true);
        }
      }),
    );

    let mut event_manager = DecorationManagerEventManager::new(bus);
    let mut signal = new_wl_signal();
    unsafe { event_manager.new_toplevel_decoration(&mut signal) };

    let mut decoration = wlr_xdg_toplevel_decoration_v1 {
      toplevel: ptr::null_mut(),
      current_mode: WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_NONE,
      requested_mode: WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_CLIENT_SIDE,
    };

    unsafe {
      wayland_sys::server::signal::wl_signal_emit(&mut signal, &mut decoration as *mut _ as *mut libc::c_void);
    }

    assert!(seen.get());
    assert_eq!(decoration.current_mode, WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_SERVER_SIDE);
  }
}

#[cfg(test)]
pub unsafe fn wlr_xdg_toplevel_decoration_v1_set_mode(decoration: *mut wlr_xdg_toplevel_decoration_v1, mode: wlr_xdg_toplevel_decoration_v1_mode) -> u32 {
  (*decoration).current_mode = mode;
  0
}
