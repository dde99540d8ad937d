//! Hand-written FFI declarations for the subset of libwlroots (and its
//! companion XDG-decoration protocol) that `wlheadless` binds: the
//! headless backend, the scene graph, the XDG shell, XDG decoration,
//! seat/keyboard/cursor, and GPU texture readback.
//!
//! Unlike a typical `*-sys` crate this is not bindgen-generated against
//! system headers — no `libwlroots` + `meson` + `clang` toolchain is
//! available to generate against here, so the types and signatures
//! below are declared directly, scoped to exactly what `wlheadless`
//! calls. `wl_display`/`wl_event_loop`/`wl_listener`/`wl_signal`/`wl_list`
//! themselves come straight from `wayland-sys`, which already binds
//! libwayland-server via `dlopen` — there is no need to redeclare those.

#![allow(non_camel_case_types, non_upper_case_globals)]

pub extern crate libc;
pub extern crate wayland_server;
pub extern crate wayland_sys;
pub extern crate xkbcommon_sys;

pub use wayland_sys::common::wl_list;
pub use wayland_sys::server::{wl_display, wl_event_loop, wl_listener, wl_signal};
use libc::{c_char, c_void, timespec};
use xkbcommon_sys::{xkb_keymap, xkb_state};

pub mod wl_seat_capability {
  pub const WL_SEAT_CAPABILITY_POINTER: u32 = 1;
  pub const WL_SEAT_CAPABILITY_KEYBOARD: u32 = 2;
  pub const WL_SEAT_CAPABILITY_TOUCH: u32 = 4;
}

// ---------------------------------------------------------------------
// Geometry / damage
// ---------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct wlr_box {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct pixman_box32 {
  pub x1: i32,
  pub y1: i32,
  pub x2: i32,
  pub y2: i32,
}

/// Opaque pixman region; `data` is only ever touched by pixman itself.
#[repr(C)]
pub struct pixman_region32 {
  pub extents: pixman_box32,
  pub data: *mut c_void,
}

extern "C" {
  /// Returns a pointer to `*n_rects` contiguous boxes owned by `region`.
  pub fn pixman_region32_rectangles(
    region: *const pixman_region32,
    n_rects: *mut i32,
  ) -> *mut pixman_box32;
}

/// fourcc_code('A', 'B', '2', '4')
pub const DRM_FORMAT_ABGR8888: u32 = 0x3432_4241;

// ---------------------------------------------------------------------
// Display / backend / renderer / allocator
// ---------------------------------------------------------------------

#[repr(C)]
pub struct wlr_backend_events {
  pub new_output: wl_signal,
  pub new_input: wl_signal,
}

#[repr(C)]
pub struct wlr_backend {
  pub events: wlr_backend_events,
}

#[repr(C)]
pub struct wlr_renderer {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_allocator {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_compositor {
  _private: [u8; 0],
}

extern "C" {
  pub fn wlr_headless_backend_create(event_loop: *mut wl_event_loop) -> *mut wlr_backend;
  pub fn wlr_headless_add_output(
    backend: *mut wlr_backend,
    width: u32,
    height: u32,
  ) -> *mut wlr_output;
  pub fn wlr_backend_start(backend: *mut wlr_backend) -> bool;
  pub fn wlr_backend_destroy(backend: *mut wlr_backend);

  pub fn wlr_renderer_autocreate(backend: *mut wlr_backend) -> *mut wlr_renderer;
  pub fn wlr_renderer_init_wl_display(renderer: *mut wlr_renderer, display: *mut wl_display) -> bool;
  pub fn wlr_renderer_destroy(renderer: *mut wlr_renderer);

  pub fn wlr_allocator_autocreate(
    backend: *mut wlr_backend,
    renderer: *mut wlr_renderer,
  ) -> *mut wlr_allocator;
  pub fn wlr_allocator_destroy(allocator: *mut wlr_allocator);

  pub fn wlr_compositor_create(
    display: *mut wl_display,
    version: u32,
    renderer: *mut wlr_renderer,
  ) -> *mut wlr_compositor;
  pub fn wlr_data_device_manager_create(display: *mut wl_display) -> *mut wlr_data_device_manager;
}

#[repr(C)]
pub struct wlr_data_device_manager {
  _private: [u8; 0],
}

// ---------------------------------------------------------------------
// Output / output layout / scene
// ---------------------------------------------------------------------

#[repr(C)]
pub struct wlr_output_events {
  pub frame: wl_signal,
  pub destroy: wl_signal,
}

#[repr(C)]
pub struct wlr_output {
  pub width: i32,
  pub height: i32,
  pub events: wlr_output_events,
}

#[repr(C)]
#[derive(Default)]
pub struct wlr_output_state {
  pub committed: u32,
}

#[repr(C)]
pub struct wlr_output_layout {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_scene_tree {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_scene {
  pub tree: wlr_scene_tree,
}

#[repr(C)]
pub struct wlr_scene_output {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_scene_output_layout {
  _private: [u8; 0],
}

extern "C" {
  pub fn wlr_output_init_render(
    output: *mut wlr_output,
    allocator: *mut wlr_allocator,
    renderer: *mut wlr_renderer,
  ) -> bool;
  pub fn wlr_output_layout_create() -> *mut wlr_output_layout;
  pub fn wlr_output_layout_add_auto(layout: *mut wlr_output_layout, output: *mut wlr_output);
  pub fn wlr_output_layout_destroy(layout: *mut wlr_output_layout);
  pub fn wlr_output_create_global(output: *mut wlr_output);
  pub fn wlr_output_destroy(output: *mut wlr_output);
  pub fn wlr_output_schedule_frame(output: *mut wlr_output);

  pub fn wlr_output_state_init(state: *mut wlr_output_state);
  pub fn wlr_output_state_set_enabled(state: *mut wlr_output_state, enabled: bool);
  pub fn wlr_output_state_finish(state: *mut wlr_output_state);
  pub fn wlr_output_commit_state(output: *mut wlr_output, state: *const wlr_output_state) -> bool;

  pub fn wlr_scene_create() -> *mut wlr_scene;
  pub fn wlr_scene_xdg_surface_create(
    parent: *mut wlr_scene_tree,
    xdg_surface: *mut wlr_xdg_surface,
  ) -> *mut wlr_scene_tree;
  pub fn wlr_scene_attach_output_layout(
    scene: *mut wlr_scene,
    layout: *mut wlr_output_layout,
  ) -> *mut wlr_scene_output_layout;
  pub fn wlr_scene_output_create(scene: *mut wlr_scene, output: *mut wlr_output) -> *mut wlr_scene_output;
  pub fn wlr_scene_output_commit(scene_output: *mut wlr_scene_output, options: *const c_void) -> bool;
  pub fn wlr_scene_output_send_frame_done(scene_output: *mut wlr_scene_output, now: *const timespec);
  pub fn wlr_scene_node_destroy(node: *mut wlr_scene_tree);
}

// ---------------------------------------------------------------------
// Surfaces / XDG shell
// ---------------------------------------------------------------------

pub type wlr_xdg_surface_role = u32;
pub const WLR_XDG_SURFACE_ROLE_NONE: wlr_xdg_surface_role = 0;
pub const WLR_XDG_SURFACE_ROLE_TOPLEVEL: wlr_xdg_surface_role = 1;
pub const WLR_XDG_SURFACE_ROLE_POPUP: wlr_xdg_surface_role = 2;

#[repr(C)]
pub struct wlr_surface_state {
  pub width: i32,
  pub height: i32,
  pub buffer_damage: pixman_region32,
}

#[repr(C)]
pub struct wlr_surface_events {
  pub commit: wl_signal,
}

#[repr(C)]
pub struct wlr_surface {
  pub current: wlr_surface_state,
  pub events: wlr_surface_events,
  pub buffer: *mut wlr_client_buffer,
}

#[repr(C)]
pub struct wlr_client_buffer {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_texture {
  pub width: u32,
  pub height: u32,
}

#[repr(C)]
pub struct wlr_texture_read_pixels_options {
  pub data: *mut c_void,
  pub format: u32,
  pub stride: u32,
  pub dst_x: u32,
  pub dst_y: u32,
  pub src_box: wlr_box,
}

extern "C" {
  pub fn wlr_surface_is_xdg_surface(surface: *mut wlr_surface) -> bool;
  pub fn wlr_xdg_surface_from_wlr_surface(surface: *mut wlr_surface) -> *mut wlr_xdg_surface;
  pub fn wlr_surface_get_texture(surface: *mut wlr_surface) -> *mut wlr_texture;
  pub fn wlr_texture_read_pixels(
    texture: *mut wlr_texture,
    options: *const wlr_texture_read_pixels_options,
  ) -> bool;
}

#[repr(C)]
pub struct wlr_xdg_shell_events {
  pub new_surface: wl_signal,
}

#[repr(C)]
pub struct wlr_xdg_shell {
  pub events: wlr_xdg_shell_events,
}

#[repr(C)]
pub struct wlr_xdg_surface_events {
  pub map: wl_signal,
  pub unmap: wl_signal,
  pub destroy: wl_signal,
}

#[repr(C)]
pub struct wlr_xdg_surface {
  pub role: wlr_xdg_surface_role,
  pub surface: *mut wlr_surface,
  /// Non-null only when `role == WLR_XDG_SURFACE_ROLE_TOPLEVEL`.
  pub toplevel: *mut wlr_xdg_toplevel,
  pub initialized: bool,
  pub configured: bool,
  pub configure_serial: u32,
  pub geometry: wlr_box,
  pub events: wlr_xdg_surface_events,
}

#[repr(C)]
pub struct wlr_xdg_toplevel_state {
  pub activated: bool,
  pub maximized: bool,
  pub fullscreen: bool,
  pub resizing: bool,
}

#[repr(C)]
pub struct wlr_xdg_toplevel_events {
  pub request_move: wl_signal,
  pub request_resize: wl_signal,
  pub request_maximize: wl_signal,
  pub request_fullscreen: wl_signal,
  pub request_minimize: wl_signal,
  pub set_title: wl_signal,
  pub set_app_id: wl_signal,
}

#[repr(C)]
pub struct wlr_xdg_toplevel {
  pub base: *mut wlr_xdg_surface,
  pub title: *mut c_char,
  pub app_id: *mut c_char,
  pub current: wlr_xdg_toplevel_state,
  pub events: wlr_xdg_toplevel_events,
}

#[repr(C)]
pub struct wlr_xdg_toplevel_move_event {
  pub serial: u32,
}

#[repr(C)]
pub struct wlr_xdg_toplevel_resize_event {
  pub serial: u32,
  pub edges: u32,
}

extern "C" {
  pub fn wlr_xdg_shell_create(display: *mut wl_display, version: u32) -> *mut wlr_xdg_shell;
  pub fn wlr_xdg_surface_get_geometry(surface: *mut wlr_xdg_surface, box_: *mut wlr_box);
  pub fn wlr_xdg_surface_schedule_configure(surface: *mut wlr_xdg_surface) -> u32;
  pub fn wlr_xdg_toplevel_set_size(surface: *mut wlr_xdg_surface, width: u32, height: u32) -> u32;
  pub fn wlr_xdg_toplevel_set_activated(surface: *mut wlr_xdg_surface, activated: bool) -> u32;
  pub fn wlr_xdg_toplevel_send_close(surface: *mut wlr_xdg_surface);
}

// ---------------------------------------------------------------------
// XDG decoration
// ---------------------------------------------------------------------

pub type wlr_xdg_toplevel_decoration_v1_mode = u32;
pub const WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_NONE: wlr_xdg_toplevel_decoration_v1_mode = 0;
pub const WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_CLIENT_SIDE: wlr_xdg_toplevel_decoration_v1_mode = 1;
pub const WLR_XDG_TOPLEVEL_DECORATION_V1_MODE_SERVER_SIDE: wlr_xdg_toplevel_decoration_v1_mode = 2;

#[repr(C)]
pub struct wlr_xdg_decoration_manager_v1_events {
  pub new_toplevel_decoration: wl_signal,
}

#[repr(C)]
pub struct wlr_xdg_decoration_manager_v1 {
  pub events: wlr_xdg_decoration_manager_v1_events,
}

#[repr(C)]
pub struct wlr_xdg_toplevel_decoration_v1 {
  pub toplevel: *mut wlr_xdg_toplevel,
  pub current_mode: wlr_xdg_toplevel_decoration_v1_mode,
  pub requested_mode: wlr_xdg_toplevel_decoration_v1_mode,
}

extern "C" {
  pub fn wlr_xdg_decoration_manager_v1_create(
    display: *mut wl_display,
  ) -> *mut wlr_xdg_decoration_manager_v1;
  pub fn wlr_xdg_toplevel_decoration_v1_set_mode(
    decoration: *mut wlr_xdg_toplevel_decoration_v1,
    mode: wlr_xdg_toplevel_decoration_v1_mode,
  ) -> u32;
}

// ---------------------------------------------------------------------
// Seat / cursor / keyboard
// ---------------------------------------------------------------------

#[repr(C)]
pub struct wlr_seat {
  _private: [u8; 0],
}

#[repr(C)]
pub struct wlr_cursor {
  _private: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct wlr_keyboard_modifiers {
  pub depressed: u32,
  pub latched: u32,
  pub locked: u32,
  pub group: u32,
}

#[repr(C)]
pub struct wlr_keyboard_events {
  pub key: wl_signal,
  pub modifiers: wl_signal,
  pub led_update: wl_signal,
}

/// A standalone, backend-less keyboard: the facade's synthetic input
/// source. Not tied to any physical input device.
#[repr(C)]
pub struct wlr_keyboard {
  pub xkb_state: *mut xkb_state,
  pub keymap: *mut xkb_keymap,
  pub modifiers: wlr_keyboard_modifiers,
  pub repeat_rate: i32,
  pub repeat_delay: i32,
  pub events: wlr_keyboard_events,
}

#[repr(C)]
pub struct wlr_keyboard_key_event {
  pub time_msec: u32,
  pub keycode: u32,
  pub state: u32,
}

extern "C" {
  pub fn wlr_seat_create(display: *mut wl_display, name: *const c_char) -> *mut wlr_seat;
  pub fn wlr_seat_destroy(seat: *mut wlr_seat);
  pub fn wlr_seat_set_capabilities(seat: *mut wlr_seat, capabilities: u32);

  pub fn wlr_seat_keyboard_notify_key(seat: *mut wlr_seat, time_msec: u32, key: u32, state: u32);
  pub fn wlr_seat_keyboard_notify_modifiers(seat: *mut wlr_seat, modifiers: *const wlr_keyboard_modifiers);
  pub fn wlr_seat_keyboard_notify_enter(
    seat: *mut wlr_seat,
    surface: *mut wlr_surface,
    keycodes: *const u32,
    num_keycodes: usize,
    modifiers: *const wlr_keyboard_modifiers,
  );
  pub fn wlr_seat_keyboard_clear_focus(seat: *mut wlr_seat);

  pub fn wlr_seat_pointer_notify_motion(seat: *mut wlr_seat, time_msec: u32, sx: f64, sy: f64);
  pub fn wlr_seat_pointer_notify_button(seat: *mut wlr_seat, time_msec: u32, button: u32, state: u32) -> u32;
  pub fn wlr_seat_pointer_notify_axis(
    seat: *mut wlr_seat,
    time_msec: u32,
    orientation: u32,
    value: f64,
    value_discrete: i32,
    source: u32,
  );
  pub fn wlr_seat_pointer_notify_enter(seat: *mut wlr_seat, surface: *mut wlr_surface, sx: f64, sy: f64);
  pub fn wlr_seat_pointer_clear_focus(seat: *mut wlr_seat);
  pub fn wlr_seat_pointer_notify_frame(seat: *mut wlr_seat);

  pub fn wlr_cursor_create() -> *mut wlr_cursor;
  pub fn wlr_cursor_attach_output_layout(cursor: *mut wlr_cursor, layout: *mut wlr_output_layout);
  pub fn wlr_cursor_destroy(cursor: *mut wlr_cursor);

  pub fn wlr_keyboard_create() -> *mut wlr_keyboard;
  pub fn wlr_keyboard_destroy(keyboard: *mut wlr_keyboard);
  pub fn wlr_keyboard_set_keymap(keyboard: *mut wlr_keyboard, keymap: *mut xkb_keymap) -> bool;
  pub fn wlr_keyboard_set_repeat_info(keyboard: *mut wlr_keyboard, rate: i32, delay: i32);
}
