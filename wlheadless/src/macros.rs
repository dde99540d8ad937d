#![macro_use]

/// Gets the offset of a field. Used by container_of!
macro_rules! offset_of(
  ($ty:ty, $field:ident) => {
    &(*(0 as *const $ty)).$field as *const _ as usize
  }
);

/// Gets the parent struct from a pointer.
/// VERY unsafe. The parent struct _must_ be repr(C), and the
/// type passed to this macro _must_ match the type of the parent.
macro_rules! container_of(
  ($ptr: expr, $container: ty, $field: ident) => {
    ($ptr as *mut u8).offset(-(offset_of!($container, $field) as isize)) as *mut $container
  }
);

/// Defines a new struct that contains a variable number of listeners that
/// will trigger unsafe user-defined callbacks.
///
/// The structure that is defined is repr(C), has one `data` field with the
/// given user type, and a field for each `$listener`.
///
/// Each `$listener` has a getter method that lets you bind it to a
/// `wl_signal`. **A listener can only be registered to one signal at a
/// time.**
macro_rules! wayland_listener {
  ($pub: vis $struct_name: ident, $data: ty, $([
      $($listener: ident => $listener_func: ident :
        |$($func_arg:ident: $func_type:ty,)*| unsafe $body: block;)*])+) => {
    #[repr(C)]
    $pub struct $struct_name {
        data: $data,
        $($($listener: Option<$crate::wayland_sys::server::wl_listener>),*)*
    }

    impl $struct_name {
      pub(crate) fn new(data: $data) -> ::std::pin::Pin<Box<$struct_name>> {
        ::std::pin::Pin::new(Box::new($struct_name {
          data,
          $($($listener: None),*)*
        }))
      }

      $($(#[cfg_attr(test, allow(dead_code))] pub(crate) unsafe extern "C" fn $listener(&mut self, signal: *mut $crate::wayland_sys::server::wl_signal) {
          if self.$listener.is_some() {
            self.$listener = None;
            panic!("Listener $listener is already bound");
          }
          self.$listener = Some({
            // Need to pass a pointer to wl_list_init; the listener is
            // written to without dropping any of the (uninitialized) data.
            let mut listener: ::std::mem::MaybeUninit<$crate::wayland_sys::server::wl_listener> = ::std::mem::MaybeUninit::uninit();
            use $crate::wayland_sys::{ffi_dispatch, server::WAYLAND_SERVER_HANDLE};
            ffi_dispatch!(WAYLAND_SERVER_HANDLE,
                          wl_list_init,
                          &mut (*listener.as_mut_ptr()).link as *mut _ as _);
            (*listener.as_mut_ptr()).notify = $struct_name::$listener_func;
            listener.assume_init()
          });
          $crate::wayland_sys::server::signal::wl_signal_add(
            signal,
            self.$listener.as_ref().map_or_else(::std::ptr::null_mut, |x| x as *const _ as *mut _)
          );
      })*)*

      $($(#[cfg_attr(test, allow(dead_code))] pub(crate) unsafe extern "C" fn $listener_func(listener:
                                                *mut $crate::wayland_sys::server::wl_listener,
                                                data: *mut $crate::libc::c_void) {
        let manager: &mut $struct_name = &mut (*container_of!(listener,
                                                              $struct_name,
                                                              $listener));
        #[allow(clippy::redundant_closure_call)]
        (|$($func_arg: $func_type,)*| { $body })(manager, data)
      })*)*
    }

    impl Drop for $struct_name {
      fn drop(&mut self) {
        unsafe {
          use $crate::wayland_sys::{ffi_dispatch, server::WAYLAND_SERVER_HANDLE};
          $($(
            if let Some(listener) = self.$listener.as_ref() {
              ffi_dispatch!(
                WAYLAND_SERVER_HANDLE,
                wl_list_remove,
                &listener.link as *const _ as *mut _
              );
            }
          )*)*
        }
      }
    }
  }
}

/// Makes moving clones into closures more convenient.
macro_rules! listener {
    ($($n:ident),+ => move || $body:expr) => (
        {
            $( let $n = $n.clone(); )+
            Box::new(move |_| $body)
        }
    );
    ($($n:ident),+ => move |$p:pat| $body:expr) => (
        {
            $( let $n = $n.clone(); )+
            Box::new(move |$p| $body)
        }
    );
}

#[cfg(test)]
mod tests {
  use crate::test_util::*;
  use wlheadless_sys::libc;

  wayland_listener!(
    pub EventManager,
    u8,
    [
      map => map_func: |_this: &mut EventManager, _data: *mut libc::c_void,| unsafe {};
      unmap => unmap_func: |_this: &mut EventManager, _data: *mut libc::c_void,| unsafe {};
      destroy => destroy_func: |_this: &mut EventManager, _data: *mut libc::c_void,| unsafe {};
    ]
  );

  #[test]
  fn it_cleans_up_on_drop() {
    let mut event_manager = EventManager::new(0);

    let map_signal = WlSignal::new();
    let unmap_signal = WlSignal::new();
    let destroy_signal = WlSignal::new();

    unsafe {
      event_manager.map(map_signal.ptr());
      event_manager.unmap(unmap_signal.ptr());
      event_manager.destroy(destroy_signal.ptr());
    }

    assert!(map_signal.listener_count() == 1);
    assert!(unmap_signal.listener_count() == 1);
    assert!(destroy_signal.listener_count() == 1);

    drop(event_manager);

    assert!(map_signal.listener_count() == 0);
    assert!(unmap_signal.listener_count() == 0);
    assert!(destroy_signal.listener_count() == 0);
  }

  #[test]
  fn it_does_handle_not_being_bound_on_drop() {
    let mut event_manager = EventManager::new(0);

    let map_signal = WlSignal::new();
    let unmap_signal = WlSignal::new();
    let destroy_signal = WlSignal::new();

    unsafe {
      event_manager.map(map_signal.ptr());
    }

    assert!(map_signal.listener_count() == 1);
    assert!(unmap_signal.listener_count() == 0);
    assert!(destroy_signal.listener_count() == 0);

    drop(event_manager);

    assert!(map_signal.listener_count() == 0);
  }
}
