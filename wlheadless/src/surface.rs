use crate::event::{CompositorEvent, EventBus, NativePtr, PixelImage, WindowId};
use crate::geometry::Rectangle;
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::pin::Pin;
use std::ptr;
use std::rc::{Rc, Weak};
use wlheadless_sys::*;

unsafe fn cstr_to_string(ptr: *const c_char) -> String {
  if ptr.is_null() {
    String::new()
  } else {
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
  }
}

/// One live XDG surface of role None or Toplevel (Popups are never
/// tracked). Owns the scene-tree node used to composite it and the
/// intrusive listener record wired to its native signals.
pub struct Window {
  registry: Weak<SurfaceRegistry>,
  pub wid: WindowId,
  native: *mut wlr_xdg_surface,
  scene_tree: *mut wlr_scene_tree,
  title: RefCell<String>,
  app_id: RefCell<String>,
  mapped: Cell<bool>,
  event_manager: RefCell<Option<Pin<Box<XdgSurfaceEventManager>>>>,
}

impl Window {
  fn toplevel(&self) -> *mut wlr_xdg_toplevel {
    unsafe { (*self.native).toplevel }
  }

  fn size(&self) -> (u32, u32) {
    let mut box_ = wlr_box::default();
    unsafe { wlr_xdg_surface_get_geometry(self.native, &mut box_) };
    (box_.width.max(0) as u32, box_.height.max(0) as u32)
  }

  fn geometry(&self) -> wlr_box {
    let mut box_ = wlr_box::default();
    unsafe { wlr_xdg_surface_get_geometry(self.native, &mut box_) };
    box_
  }
}

wayland_listener!(
  pub XdgSurfaceEventManager,
  Weak<Window>,
  [
    map => map_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        window.mapped.set(true);
        let (w, h) = window.size();
        debug!("Window({}): map {}x{}", window.wid, w, h);
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Map {
            wid: window.wid,
            title: window.title.borrow().clone(),
            app_id: window.app_id.borrow().clone(),
            size: (w, h),
          });
        }
      }
    };
    unmap => unmap_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        window.mapped.set(false);
        debug!("Window({}): unmap", window.wid);
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Unmap { wid: window.wid });
        }
      }
    };
    destroy => destroy_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        debug!("Window({}): destroy", window.wid);
        if let Some(registry) = window.registry.upgrade() {
          registry.remove(window.wid);
        }
      }
    };
    commit => commit_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        window.on_commit();
      }
    };
    request_move => request_move_notify: |this: &mut XdgSurfaceEventManager, data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        let event = data as *const wlr_xdg_toplevel_move_event;
        let serial = if event.is_null() { 0 } else { (*event).serial };
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Move { wid: window.wid, serial });
        }
      }
    };
    request_resize => request_resize_notify: |this: &mut XdgSurfaceEventManager, data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        let event = data as *const wlr_xdg_toplevel_resize_event;
        let (serial, edges) = if event.is_null() { (0, 0) } else { ((*event).serial, (*event).edges) };
        debug!("Window({}): request_resize edges={} (not forwarded)", window.wid, edges);
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Resize { wid: window.wid, serial });
        }
      }
    };
    request_maximize => request_maximize_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Maximize { wid: window.wid });
        }
      }
    };
    request_fullscreen => request_fullscreen_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Fullscreen { wid: window.wid });
        }
      }
    };
    request_minimize => request_minimize_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::Minimize { wid: window.wid });
        }
      }
    };
    set_title => set_title_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        let title = cstr_to_string((*window.toplevel()).title);
        debug!("Window({}): set_title {:?}", window.wid, title);
        *window.title.borrow_mut() = title.clone();
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::SetTitle { wid: window.wid, title });
        }
      }
    };
    set_app_id => set_app_id_notify: |this: &mut XdgSurfaceEventManager, _data: *mut libc::c_void,| unsafe {
      if let Some(window) = this.data.upgrade() {
        let app_id = cstr_to_string((*window.toplevel()).app_id);
        debug!("Window({}): set_app_id {:?}", window.wid, app_id);
        *window.app_id.borrow_mut() = app_id.clone();
        if let Some(registry) = window.registry.upgrade() {
          registry.bus.fire(CompositorEvent::SetAppId { wid: window.wid, app_id });
        }
      }
    };
  ]
);

impl Window {
  fn on_commit(self: &Rc<Self>) {
    let native = self.native;
    unsafe {
      if (*native).role == WLR_XDG_SURFACE_ROLE_TOPLEVEL && (*native).initialized && !(*native).configured {
        wlr_xdg_toplevel_set_size(native, 800, 600);
        wlr_xdg_surface_schedule_configure(native);
        debug!("Window({}): sent initial 800x600 configure", self.wid);
      }
    }

    let surface = unsafe { (*native).surface };
    let rects = unsafe { Rectangle::from_region(&(*surface).current.buffer_damage) };
    let mapped = self.mapped.get();

    let image = if mapped { unsafe { read_surface_image(surface, &self.geometry()) } } else { None };

    if let Some(registry) = self.registry.upgrade() {
      registry.bus.fire(CompositorEvent::Commit { wid: self.wid, mapped, rects });
      if let Some(image) = image {
        registry.bus.fire(CompositorEvent::SurfaceImage { wid: self.wid, image: Rc::new(image) });
      }
    }
  }
}

/// Reads the mapped surface's client buffer back into a BGRA pixel
/// buffer. Returns `None` (after logging) if there is no buffer/texture
/// yet, or if the GPU readback itself fails.
unsafe fn read_surface_image(surface: *mut wlr_surface, geometry: &wlr_box) -> Option<PixelImage> {
  if (*surface).buffer.is_null() {
    return None;
  }
  let texture = wlr_surface_get_texture(surface);
  if texture.is_null() {
    return None;
  }

  let width = (*texture).width;
  let height = (*texture).height;
  let stride = 4 * width;
  let mut bytes = vec![0u8; (stride * height) as usize];

  let options = wlr_texture_read_pixels_options {
    data: bytes.as_mut_ptr() as *mut _,
    format: DRM_FORMAT_ABGR8888,
    stride,
    dst_x: 0,
    dst_y: 0,
    src_box: wlr_box { x: geometry.x, y: geometry.y, width: width as i32, height: height as i32 },
  };

  if !wlr_texture_read_pixels(texture, &options) {
    warn!("texture readback failed, dropping frame");
    return None;
  }

  Some(PixelImage { width, height, stride, bpp: 32, bytes })
}

/// Tracks every live XDG surface and assigns the process-wide,
/// never-reused `wid` sequence.
pub struct SurfaceRegistry {
  bus: Rc<EventBus>,
  scene_root: *mut wlr_scene_tree,
  next_wid: Cell<WindowId>,
  windows: RefCell<Vec<Rc<Window>>>,
}

impl SurfaceRegistry {
  pub fn new(bus: Rc<EventBus>, scene_root: *mut wlr_scene_tree) -> Rc<SurfaceRegistry> {
    Rc::new(SurfaceRegistry { bus, scene_root, next_wid: Cell::new(1), windows: RefCell::new(Vec::new()) })
  }

  /// Handles `wlr_xdg_shell.events.new_surface`. Silently ignores
  /// Popup-role surfaces; everything else (None and Toplevel) gets a
  /// `wid` and the full map/unmap/destroy/commit subscription set.
  pub fn new_xdg_surface(self: &Rc<Self>, native: *mut wlr_xdg_surface) {
    let role = unsafe { (*native).role };
    if role == WLR_XDG_SURFACE_ROLE_POPUP {
      debug!("new_xdg_surface: ignoring popup-role surface");
      return;
    }

    let wid = self.next_wid.get();
    self.next_wid.set(wid + 1);

    let scene_tree = unsafe { wlr_scene_xdg_surface_create(self.scene_root, native) };

    let (title, app_id) = if role == WLR_XDG_SURFACE_ROLE_TOPLEVEL {
      let toplevel = unsafe { (*native).toplevel };
      unsafe { (cstr_to_string((*toplevel).title), cstr_to_string((*toplevel).app_id)) }
    } else {
      (String::new(), String::new())
    };

    let window = Rc::new(Window {
      registry: Rc::downgrade(self),
      wid,
      native,
      scene_tree,
      title: RefCell::new(title.clone()),
      app_id: RefCell::new(app_id.clone()),
      mapped: Cell::new(false),
      event_manager: RefCell::new(None),
    });

    let mut event_manager = XdgSurfaceEventManager::new(Rc::downgrade(&window));
    unsafe {
      event_manager.map(&mut (*native).events.map);
      event_manager.unmap(&mut (*native).events.unmap);
      event_manager.destroy(&mut (*native).events.destroy);
      event_manager.commit(&mut (*(*native).surface).events.commit);
      if role == WLR_XDG_SURFACE_ROLE_TOPLEVEL {
        let toplevel = (*native).toplevel;
        event_manager.request_move(&mut (*toplevel).events.request_move);
        event_manager.request_resize(&mut (*toplevel).events.request_resize);
        event_manager.request_maximize(&mut (*toplevel).events.request_maximize);
        event_manager.request_fullscreen(&mut (*toplevel).events.request_fullscreen);
        event_manager.request_minimize(&mut (*toplevel).events.request_minimize);
        event_manager.set_title(&mut (*toplevel).events.set_title);
        event_manager.set_app_id(&mut (*toplevel).events.set_app_id);
      }
    }
    *window.event_manager.borrow_mut() = Some(event_manager);

    let (w, h) = window.size();
    debug!("new_xdg_surface: wid={} title={:?} app_id={:?}", wid, title, app_id);
    self.windows.borrow_mut().push(window.clone());
    self.bus.fire(CompositorEvent::NewSurface {
      native: NativePtr::from_ptr(native),
      wid,
      title,
      app_id,
      size: (w, h),
    });
  }

  fn remove(&self, wid: WindowId) {
    let mut windows = self.windows.borrow_mut();
    if let Some(pos) = windows.iter().position(|w| w.wid == wid) {
      let window = windows.remove(pos);
      unsafe { wlr_scene_node_destroy(window.scene_tree) };
      drop(window);
    }
    drop(windows);
    self.bus.fire(CompositorEvent::Destroy { wid });
  }

  pub fn find(&self, native: *mut wlr_xdg_surface) -> Option<Rc<Window>> {
    self.windows.borrow().iter().find(|w| w.native == native).cloned()
  }

  /// Drives a toplevel size configure (`resize`, §6 of the embedder API).
  pub fn resize(&self, native: *mut wlr_xdg_surface, width: u32, height: u32) {
    if let Some(window) = self.find(native) {
      unsafe { wlr_xdg_toplevel_set_size(window.native, width, height) };
    }
  }

  /// Sets the toplevel's activated state (`focus`, §6 of the embedder API).
  pub fn set_focus(&self, native: *mut wlr_xdg_surface, focused: bool) {
    if let Some(window) = self.find(native) {
      unsafe { wlr_xdg_toplevel_set_activated(window.native, focused) };
    }
  }
}

impl Drop for SurfaceRegistry {
  fn drop(&mut self) {
    for window in self.windows.borrow_mut().drain(..) {
      unsafe { wlr_scene_node_destroy(window.scene_tree) };
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::*;
  use std::cell::Cell;

  fn zeroed_toplevel() -> wlr_xdg_toplevel {
    wlr_xdg_toplevel {
      base: ptr::null_mut(),
      title: ptr::null_mut(),
      app_id: ptr::null_mut(),
      current: wlr_xdg_toplevel_state { activated: false, maximized: false, fullscreen: false, resizing: false },
      events: wlr_xdg_toplevel_events {
        request_move: new_wl_signal(),
        request_resize: new_wl_signal(),
        request_maximize: new_wl_signal(),
        request_fullscreen: new_wl_signal(),
        request_minimize: new_wl_signal(),
        set_title: new_wl_signal(),
        set_app_id: new_wl_signal(),
      },
    }
  }

  fn zeroed_surface() -> wlr_surface {
    wlr_surface {
      current: wlr_surface_state {
        width: 4,
        height: 2,
        buffer_damage: pixman_region32 { extents: Default::default(), data: ptr::null_mut() },
      },
      events: wlr_surface_events { commit: new_wl_signal() },
      buffer: ptr::null_mut(),
    }
  }

  fn new_registry() -> (Rc<SurfaceRegistry>, Box<wlr_scene_tree>) {
    let mut root = Box::new(unsafe { std::mem::zeroed::<wlr_scene_tree>() });
    let registry = SurfaceRegistry::new(Rc::new(EventBus::new()), root.as_mut() as *mut _);
    (registry, root)
  }

  #[test]
  fn none_and_toplevel_role_surfaces_get_a_wid_popup_does_not() {
    let (registry, _root) = new_registry();
    let mut toplevel = zeroed_toplevel();
    let mut surface = zeroed_surface();
    let mut xdg_surface = wlr_xdg_surface {
      role: WLR_XDG_SURFACE_ROLE_TOPLEVEL,
      surface: &mut surface as *mut _,
      toplevel: &mut toplevel as *mut _,
      initialized: true,
      configured: false,
      configure_serial: 0,
      geometry: wlr_box::default(),
      events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
    };
    toplevel.base = &mut xdg_surface as *mut _;

    registry.new_xdg_surface(&mut xdg_surface as *mut _);
    assert_eq!(registry.windows.borrow().len(), 1);
    assert_eq!(registry.windows.borrow()[0].wid, 1);

    let mut popup_surface = zeroed_surface();
    let mut popup = wlr_xdg_surface {
      role: WLR_XDG_SURFACE_ROLE_POPUP,
      surface: &mut popup_surface as *mut _,
      toplevel: ptr::null_mut(),
      initialized: true,
      configured: false,
      configure_serial: 0,
      geometry: wlr_box::default(),
      events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
    };
    registry.new_xdg_surface(&mut popup as *mut _);
    assert_eq!(registry.windows.borrow().len(), 1, "popups must not be tracked");
  }

  #[test]
  fn wids_are_assigned_in_order_and_never_reused_after_destroy() {
    let (registry, _root) = new_registry();

    let make = |role| {
      let toplevel = Box::new(zeroed_toplevel());
      let surface = Box::new(zeroed_surface());
      (Box::into_raw(toplevel), Box::into_raw(surface), role)
    };

    let mut surfaces = Vec::new();
    for _ in 0..2 {
      let (toplevel_ptr, surface_ptr, _) = make(WLR_XDG_SURFACE_ROLE_TOPLEVEL);
      let xdg_surface = Box::into_raw(Box::new(wlr_xdg_surface {
        role: WLR_XDG_SURFACE_ROLE_TOPLEVEL,
        surface: surface_ptr,
        toplevel: toplevel_ptr,
        initialized: true,
        configured: false,
        configure_serial: 0,
        geometry: wlr_box::default(),
        events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
      }));
      unsafe { (*toplevel_ptr).base = xdg_surface };
      registry.new_xdg_surface(xdg_surface);
      surfaces.push(xdg_surface);
    }

    let wids: Vec<_> = registry.windows.borrow().iter().map(|w| w.wid).collect();
    assert_eq!(wids, vec![1, 2]);

    registry.remove(1);
    assert_eq!(registry.windows.borrow().iter().map(|w| w.wid).collect::<Vec<_>>(), vec![2]);

    let (toplevel_ptr, surface_ptr, _) = make(WLR_XDG_SURFACE_ROLE_TOPLEVEL);
    let xdg_surface = Box::into_raw(Box::new(wlr_xdg_surface {
      role: WLR_XDG_SURFACE_ROLE_TOPLEVEL,
      surface: surface_ptr,
      toplevel: toplevel_ptr,
      initialized: true,
      configured: false,
      configure_serial: 0,
      geometry: wlr_box::default(),
      events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
    }));
    unsafe { (*toplevel_ptr).base = xdg_surface };
    registry.new_xdg_surface(xdg_surface);

    assert_eq!(registry.windows.borrow().iter().map(|w| w.wid).collect::<Vec<_>>(), vec![2, 3]);
  }

  #[test]
  fn map_fires_after_new_surface_and_carries_cached_title() {
    let (registry, _root) = new_registry();
    let title = std::ffi::CString::new("hello").unwrap();
    let mut toplevel = zeroed_toplevel();
    toplevel.title = title.as_ptr() as *mut _;
    let mut surface = zeroed_surface();
    let mut xdg_surface = wlr_xdg_surface {
      role: WLR_XDG_SURFACE_ROLE_TOPLEVEL,
      surface: &mut surface as *mut _,
      toplevel: &mut toplevel as *mut _,
      initialized: true,
      configured: false,
      configure_serial: 0,
      geometry: wlr_box::default(),
      events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
    };
    toplevel.base = &mut xdg_surface as *mut _;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = seen.clone();
    registry.bus.add_event_listener(
      "new-surface",
      Rc::new(move |_: &CompositorEvent| seen2.borrow_mut().push("new-surface")),
    );
    let seen3 = seen.clone();
    registry.bus.add_event_listener(
      "map",
      Rc::new(move |e: &CompositorEvent| {
        if let CompositorEvent::Map { title, .. } = e {
          assert_eq!(title.as_str(), "hello");
        }
        seen3.borrow_mut().push("map");
      }),
    );

    registry.new_xdg_surface(&mut xdg_surface as *mut _);
    WlSignal::from_ptr(&mut xdg_surface.events.map).emit();

    assert_eq!(*seen.borrow(), vec!["new-surface", "map"]);
  }

  #[test]
  fn destroy_removes_the_window_and_fires_exactly_once() {
    let (registry, _root) = new_registry();
    let mut toplevel = zeroed_toplevel();
    let mut surface = zeroed_surface();
    let mut xdg_surface = wlr_xdg_surface {
      role: WLR_XDG_SURFACE_ROLE_TOPLEVEL,
      surface: &mut surface as *mut _,
      toplevel: &mut toplevel as *mut _,
      initialized: true,
      configured: false,
      configure_serial: 0,
      geometry: wlr_box::default(),
      events: wlr_xdg_surface_events { map: new_wl_signal(), unmap: new_wl_signal(), destroy: new_wl_signal() },
    };
    toplevel.base = &mut xdg_surface as *mut _;
    registry.new_xdg_surface(&mut xdg_surface as *mut _);

    let destroys = Rc::new(Cell::new(0));
    let destroys2 = destroys.clone();
    registry
      .bus
      .add_event_listener("destroy", Rc::new(move |_: &CompositorEvent| destroys2.set(destroys2.get() + 1)));

    registry.remove(1);
    assert_eq!(destroys.get(), 1);
    assert!(registry.windows.borrow().is_empty());
  }
}

#[cfg(test)]
pub unsafe fn wlr_scene_xdg_surface_create(parent: *mut wlr_scene_tree, _xdg_surface: *mut wlr_xdg_surface) -> *mut wlr_scene_tree {
  parent
}
#[cfg(test)]
pub unsafe fn wlr_scene_node_destroy(_node: *mut wlr_scene_tree) {}
#[cfg(test)]
pub unsafe fn wlr_xdg_surface_get_geometry(surface: *mut wlr_xdg_surface, box_: *mut wlr_box) {
  *box_ = (*surface).geometry;
}
#[cfg(test)]
pub unsafe fn wlr_xdg_toplevel_set_size(_surface: *mut wlr_xdg_surface, _width: u32, _height: u32) -> u32 {
  0
}
#[cfg(test)]
pub unsafe fn wlr_xdg_surface_schedule_configure(_surface: *mut wlr_xdg_surface) -> u32 {
  0
}
#[cfg(test)]
pub unsafe fn wlr_xdg_toplevel_set_activated(_surface: *mut wlr_xdg_surface, _activated: bool) -> u32 {
  0
}
#[cfg(test)]
pub unsafe fn wlr_surface_get_texture(surface: *mut wlr_surface) -> *mut wlr_texture {
  if (*surface).buffer.is_null() {
    return ptr::null_mut();
  }
  Box::into_raw(Box::new(wlr_texture {
    width: (*surface).current.width as u32,
    height: (*surface).current.height as u32,
  }))
}
#[cfg(test)]
pub unsafe fn wlr_texture_read_pixels(texture: *mut wlr_texture, options: *const wlr_texture_read_pixels_options) -> bool {
  let len = ((*texture).height * (*options).stride) as usize;
  std::ptr::write_bytes((*options).data as *mut u8, 0xAB, len);
  true
}
