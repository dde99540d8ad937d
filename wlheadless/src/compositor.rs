use crate::config::ConfigManager;
use crate::decoration::DecorationManager;
use crate::error::{CompositorError, Result};
use crate::event::{CompositorEvent, EventBus};
use crate::input::keyboard::Keyboard;
use crate::input::pointer::Pointer;
use crate::output::OutputManager;
use crate::surface::SurfaceRegistry;
use log::info;
use std::env;
use std::ffi::{CStr, CString};
use std::pin::Pin;
use std::rc::Rc;
use wayland_sys::server::*;
use wlheadless_sys::*;

/// Ties every subsystem together for one headless compositor instance.
/// One process normally owns exactly one of these; nothing here
/// prevents more than one, aside from the backend's own requirements.
pub struct Compositor {
  display: *mut wl_display,
  backend: *mut wlr_backend,
  renderer: *mut wlr_renderer,
  allocator: *mut wlr_allocator,
  xdg_shell: *mut wlr_xdg_shell,
  scene: *mut wlr_scene,
  output_layout: *mut wlr_output_layout,
  seat: *mut wlr_seat,

  surface_registry: Rc<SurfaceRegistry>,
  output_manager: Rc<OutputManager>,
  decoration_manager: Option<DecorationManager>,

  keyboard: Keyboard,
  pointer: Pointer,

  bus: Rc<EventBus>,
  config: Rc<ConfigManager>,

  event_manager: Pin<Box<CompositorEventManager>>,
  socket_name: String,
  cleaned_up: bool,
}

wayland_listener!(
  pub CompositorEventManager,
  (Rc<SurfaceRegistry>, Rc<OutputManager>),
  [
    new_output => new_output_notify: |this: &mut CompositorEventManager, data: *mut libc::c_void,| unsafe {
      this.data.1.new_output(data as *mut wlr_output);
    };
    new_xdg_surface => new_xdg_surface_notify: |this: &mut CompositorEventManager, data: *mut libc::c_void,| unsafe {
      this.data.0.new_xdg_surface(data as *mut wlr_xdg_surface);
    };
  ]
);

impl Compositor {
  /// Brings up the whole stack in the order laid out in §4.1: each
  /// step must succeed or the whole call fails with a variant naming
  /// the failing step.
  pub fn initialize() -> Result<Compositor> {
    let bus = Rc::new(EventBus::new());
    let config = Rc::new(ConfigManager::new());

    unsafe {
      let display = ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_create,) as *mut wl_display;
      if display.is_null() {
        return Err(CompositorError::DisplayCreateFailed);
      }

      let event_loop = ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_get_event_loop, display);

      let backend = wlr_headless_backend_create(event_loop);
      if backend.is_null() {
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::BackendCreateFailed);
      }
      let output_size = config.config().output;
      if wlr_headless_add_output(backend, output_size.width, output_size.height).is_null() {
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::OutputCreateFailed);
      }

      let renderer = wlr_renderer_autocreate(backend);
      if renderer.is_null() {
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::RendererCreateFailed);
      }
      if !wlr_renderer_init_wl_display(renderer, display) {
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::RendererBindFailed);
      }

      let allocator = wlr_allocator_autocreate(backend, renderer);
      if allocator.is_null() {
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::AllocatorCreateFailed);
      }

      if wlr_compositor_create(display, 5, renderer).is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::CompositorCreateFailed);
      }
      if wlr_data_device_manager_create(display).is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::DataDeviceManagerCreateFailed);
      }

      let xdg_shell = wlr_xdg_shell_create(display, 3);
      if xdg_shell.is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::XdgShellCreateFailed);
      }

      let scene = wlr_scene_create();
      if scene.is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::SceneCreateFailed);
      }
      let output_layout = wlr_output_layout_create();
      if output_layout.is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::OutputLayoutCreateFailed);
      }
      wlr_scene_attach_output_layout(scene, output_layout);

      let surface_registry = SurfaceRegistry::new(bus.clone(), &mut (*scene).tree as *mut wlr_scene_tree);
      let output_manager = OutputManager::new(scene, output_layout, allocator, renderer);

      let decoration_manager = DecorationManager::new(display, bus.clone());

      let seat_name = CString::new("seat0").unwrap();
      let seat = wlr_seat_create(display, seat_name.as_ptr());
      if seat.is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::SeatCreateFailed);
      }
      wlr_seat_set_capabilities(
        seat,
        wl_seat_capability::WL_SEAT_CAPABILITY_POINTER
          | wl_seat_capability::WL_SEAT_CAPABILITY_KEYBOARD
          | wl_seat_capability::WL_SEAT_CAPABILITY_TOUCH,
      );

      let keyboard = Keyboard::new(seat)?;
      let pointer = Pointer::new(seat, output_layout)?;

      let mut event_manager = CompositorEventManager::new((surface_registry.clone(), output_manager.clone()));
      event_manager.new_output(&mut (*backend).events.new_output);
      event_manager.new_xdg_surface(&mut (*xdg_shell).events.new_surface);

      let socket = ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_add_socket_auto, display);
      if socket.is_null() {
        wlr_allocator_destroy(allocator);
        wlr_renderer_destroy(renderer);
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::SocketCreateFailed);
      }
      let socket_name = CStr::from_ptr(socket).to_string_lossy().into_owned();
      env::set_var("WAYLAND_DISPLAY", &socket_name);

      if !wlr_backend_start(backend) {
        wlr_backend_destroy(backend);
        ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, display);
        return Err(CompositorError::BackendStartFailed);
      }

      info!("Compositor::initialize: listening on WAYLAND_DISPLAY={}", socket_name);

      Ok(Compositor {
        display,
        backend,
        renderer,
        allocator,
        xdg_shell,
        scene,
        output_layout,
        seat,
        surface_registry,
        output_manager,
        decoration_manager,
        keyboard,
        pointer,
        bus,
        config,
        event_manager,
        socket_name,
        cleaned_up: false,
      })
    }
  }

  pub fn socket_name(&self) -> &str {
    &self.socket_name
  }

  pub fn config(&self) -> &Rc<ConfigManager> {
    &self.config
  }

  /// Blocks in the library's own dispatch loop until the display is
  /// destroyed (self-driven mode, §5).
  pub fn run(&self) {
    unsafe { ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_run, self.display) };
  }

  /// A single non-blocking dispatch plus a client flush, for embedders
  /// that drive their own reactor around [`Self::get_event_loop_fd`].
  pub fn process_events(&self) {
    unsafe {
      let event_loop = ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_get_event_loop, self.display);
      ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_event_loop_dispatch, event_loop, 0);
      ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_flush_clients, self.display);
    }
  }

  pub fn get_event_loop_fd(&self) -> i32 {
    unsafe {
      let event_loop = ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_get_event_loop, self.display);
      ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_event_loop_get_fd, event_loop)
    }
  }

  pub fn get_pointer_device(&self) -> &Pointer {
    &self.pointer
  }

  pub fn get_keyboard_device(&self) -> &Keyboard {
    &self.keyboard
  }

  pub fn resize(&self, xdg_surface: *mut wlr_xdg_surface, width: u32, height: u32) {
    self.surface_registry.resize(xdg_surface, width, height);
  }

  pub fn focus(&self, xdg_surface: *mut wlr_xdg_surface, focused: bool) {
    self.surface_registry.set_focus(xdg_surface, focused);
  }

  pub fn add_event_listener(&self, name: &str, callback: Rc<dyn Fn(&CompositorEvent)>) {
    self.bus.add_event_listener(name, callback);
  }

  /// Removes the first listener under `name` that is the same `Rc` as
  /// `callback` (per `Rc::ptr_eq`) — the same value passed to
  /// [`Self::add_event_listener`], not a separately issued id.
  pub fn remove_event_listener(&self, name: &str, callback: &Rc<dyn Fn(&CompositorEvent)>) {
    self.bus.remove_event_listener(name, callback);
  }

  /// Tears everything down in reverse dependency order. Idempotent: a
  /// second call (explicit or via `Drop`) is a no-op.
  pub fn cleanup(&mut self) {
    if self.cleaned_up {
      return;
    }
    self.cleaned_up = true;

    unsafe {
      ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy_clients, self.display);
    }
    drop(self.decoration_manager.take());

    unsafe {
      wlr_scene_node_destroy(&mut (*self.scene).tree as *mut wlr_scene_tree);
      wlr_output_layout_destroy(self.output_layout);
      wlr_seat_destroy(self.seat);
      wlr_allocator_destroy(self.allocator);
      wlr_renderer_destroy(self.renderer);
      wlr_backend_destroy(self.backend);
      ffi_dispatch!(WAYLAND_SERVER_HANDLE, wl_display_destroy, self.display);
    }

    info!("Compositor::cleanup: torn down");
  }
}

impl Drop for Compositor {
  fn drop(&mut self) {
    self.cleanup();
  }
}
