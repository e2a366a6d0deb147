//! OS thread id of the calling thread.

#[cfg(any(target_os = "linux", target_os = "android"))]
#[inline]
pub fn id() -> i32 {
    #[allow(clippy::unnecessary_cast)]
    unsafe {
        libc::gettid() as i32
    }
}

#[cfg(target_os = "macos")]
#[inline]
pub fn id() -> i32 {
    #[allow(clippy::unnecessary_cast)]
    unsafe {
        libc::pthread_self() as i32
    }
}

#[cfg(windows)]
#[inline]
pub fn id() -> i32 {
    unsafe { winapi::um::processthreadsapi::GetCurrentThreadId() as i32 }
}

/// Platforms without a cheap thread id report 0.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos", windows)))]
#[inline]
pub fn id() -> i32 {
    0
}
