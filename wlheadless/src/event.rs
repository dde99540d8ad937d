use crate::geometry::Rectangle;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::rc::Rc;

type EventListener<Data> = Box<dyn Fn(&Data)>;

/// A typed publish/subscribe channel, used internally to wire up
/// wlroots signals to Rust callbacks.
pub struct Event<Data> {
  next_id: RefCell<u64>,
  listeners: RefCell<BTreeMap<u64, Rc<EventListener<Data>>>>,
}

impl<T> Debug for Event<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Event")
  }
}

impl<T> Default for Event<T> {
  fn default() -> Self {
    Event {
      next_id: RefCell::new(0),
      listeners: RefCell::new(BTreeMap::new()),
    }
  }
}

impl<T> Event<T> {
  pub fn subscribe(&self, handler: EventListener<T>) -> u64 {
    let id = *self.next_id.borrow();
    *self.next_id.borrow_mut() = id + 1;
    self.listeners.borrow_mut().insert(id, Rc::new(handler));
    id
  }

  pub fn unsubscribe(&self, id: u64) {
    self.listeners.borrow_mut().remove(&id);
  }

  pub fn fire(&self, data: T) {
    for listener in self.listeners.borrow().values() {
      listener(&data);
    }
  }
}

/// A window id. Monotonically increasing for the lifetime of the
/// compositor; never reused even after the window is destroyed.
pub type WindowId = u64;

/// An opaque handle to a native pointer, carried across the public bus
/// boundary without exposing `*mut`/`*const` in a safe API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePtr(pub usize);

impl NativePtr {
  pub fn from_ptr<T>(ptr: *const T) -> NativePtr {
    NativePtr(ptr as usize)
  }

  pub fn is_null(self) -> bool {
    self.0 == 0
  }
}

/// BGRA pixel data for one surface frame, as read back from its GPU
/// texture. `bytes.len() == stride * height` and `stride == 4 * width`.
#[derive(Debug, Clone)]
pub struct PixelImage {
  pub width: u32,
  pub height: u32,
  pub stride: u32,
  pub bpp: u32,
  pub bytes: Vec<u8>,
}

/// Every event the compositor can emit on its public bus.
///
/// This is a tagged enum rather than a family of structs so firing is a
/// single match, but the public API at [`crate::Compositor::add_event_listener`]
/// only ever deals in the string name returned by [`CompositorEvent::name`] —
/// embedders never see the variants directly.
#[derive(Debug, Clone)]
pub enum CompositorEvent {
  NewSurface { native: NativePtr, wid: WindowId, title: String, app_id: String, size: (u32, u32) },
  Map { wid: WindowId, title: String, app_id: String, size: (u32, u32) },
  Unmap { wid: WindowId },
  Destroy { wid: WindowId },
  Commit { wid: WindowId, mapped: bool, rects: Vec<Rectangle> },
  SurfaceImage { wid: WindowId, image: Rc<PixelImage> },
  Move { wid: WindowId, serial: u32 },
  Resize { wid: WindowId, serial: u32 },
  Maximize { wid: WindowId },
  Fullscreen { wid: WindowId },
  Minimize { wid: WindowId },
  SetTitle { wid: WindowId, title: String },
  SetAppId { wid: WindowId, app_id: String },
  Ssd { toplevel: NativePtr, client_requested_ssd: bool },
}

impl CompositorEvent {
  pub fn name(&self) -> &'static str {
    match self {
      CompositorEvent::NewSurface { .. } => "new-surface",
      CompositorEvent::Map { .. } => "map",
      CompositorEvent::Unmap { .. } => "unmap",
      CompositorEvent::Destroy { .. } => "destroy",
      CompositorEvent::Commit { .. } => "commit",
      CompositorEvent::SurfaceImage { .. } => "surface-image",
      CompositorEvent::Move { .. } => "move",
      CompositorEvent::Resize { .. } => "resize",
      CompositorEvent::Maximize { .. } => "maximize",
      CompositorEvent::Fullscreen { .. } => "fullscreen",
      CompositorEvent::Minimize { .. } => "minimize",
      CompositorEvent::SetTitle { .. } => "set-title",
      CompositorEvent::SetAppId { .. } => "set-app-id",
      CompositorEvent::Ssd { .. } => "ssd",
    }
  }
}

type BusListener = Rc<dyn Fn(&CompositorEvent)>;

const EVENT_NAMES: &[&str] = &[
  "new-surface",
  "map",
  "unmap",
  "destroy",
  "commit",
  "surface-image",
  "move",
  "resize",
  "maximize",
  "fullscreen",
  "minimize",
  "set-title",
  "set-app-id",
  "ssd",
];

/// The string-keyed bus exposed to embedders. Internally it's just a
/// map from event name to an ordered list of callbacks; `fire` looks up
/// the variant's name once and dispatches to whoever subscribed to it.
#[derive(Default)]
pub struct EventBus {
  listeners: RefCell<HashMap<&'static str, Vec<BusListener>>>,
}

impl EventBus {
  pub fn new() -> EventBus {
    EventBus::default()
  }

  /// Registers `handler` under `name`, in registration order. The same
  /// `Rc` passed here is the key [`EventBus::remove_event_listener`]
  /// matches against, so callers keep a clone of it to unsubscribe.
  pub fn add_event_listener(&self, name: &str, handler: BusListener) {
    let name = Self::intern(name);
    self.listeners.borrow_mut().entry(name).or_default().push(handler);
  }

  /// Removes the first listener under `name` pointer-equal to `handler`.
  pub fn remove_event_listener(&self, name: &str, handler: &BusListener) {
    if let Some(handlers) = self.listeners.borrow_mut().get_mut(Self::intern(name)) {
      if let Some(pos) = handlers.iter().position(|h| Rc::ptr_eq(h, handler)) {
        handlers.remove(pos);
      }
    }
  }

  pub fn fire(&self, event: CompositorEvent) {
    if let Some(handlers) = self.listeners.borrow().get(event.name()) {
      for handler in handlers.clone() {
        handler(&event);
      }
    }
  }

  /// Maps an arbitrary `&str` to the `&'static str` used as the bus's
  /// hash key, so callers don't need to pass `'static` strings in.
  fn intern(name: &str) -> &'static str {
    EVENT_NAMES.iter().find(|&&n| n == name).copied().unwrap_or("")
  }
}
