use thiserror::Error;

/// Everything that can go wrong while bringing a [`crate::Compositor`] up.
///
/// Each variant names the step that failed rather than wrapping a raw
/// wlroots error code, since wlroots itself mostly signals failure by
/// returning a null pointer with no further detail.
#[derive(Debug, Error)]
pub enum CompositorError {
  #[error("failed to create the wayland display")]
  DisplayCreateFailed,

  #[error("failed to create the headless backend")]
  BackendCreateFailed,

  #[error("failed to add the headless output")]
  OutputCreateFailed,

  #[error("failed to autocreate a renderer for the headless backend")]
  RendererCreateFailed,

  #[error("failed to bind the renderer to the wayland display")]
  RendererBindFailed,

  #[error("failed to autocreate an allocator")]
  AllocatorCreateFailed,

  #[error("failed to create the compositor global")]
  CompositorCreateFailed,

  #[error("failed to create the data device manager")]
  DataDeviceManagerCreateFailed,

  #[error("failed to create the xdg-shell global")]
  XdgShellCreateFailed,

  #[error("failed to create the scene graph")]
  SceneCreateFailed,

  #[error("failed to create the output layout")]
  OutputLayoutCreateFailed,

  #[error("failed to create the cursor")]
  CursorCreateFailed,

  #[error("failed to create the seat")]
  SeatCreateFailed,

  #[error("a seat operation was attempted before the seat was created")]
  NullSeat,

  #[error("failed to allocate a wayland socket")]
  SocketCreateFailed,

  #[error("failed to start the headless backend")]
  BackendStartFailed,

  #[error("xkb keymap compilation failed for layout {layout:?}")]
  KeymapCompileFailed { layout: String },
}

pub type Result<T> = std::result::Result<T, CompositorError>;
