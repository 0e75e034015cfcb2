//! Platform identity queries.

use crate::error::Result;

/// Source of the raw identity strings of the running device
pub trait PlatformInfo {
    /// Hardware model string (e.g., "N102AP")
    fn hw_model(&self) -> Result<String>;

    /// Firmware build string (e.g., "13C75")
    fn os_build(&self) -> Result<String>;
}

impl<T: PlatformInfo + ?Sized> PlatformInfo for Box<T> {
    fn hw_model(&self) -> Result<String> {
        (**self).hw_model()
    }

    fn os_build(&self) -> Result<String> {
        (**self).os_build()
    }
}

/// Identity strings supplied up front instead of queried
#[derive(Debug, Clone)]
pub struct FixedPlatform {
    pub model: String,
    pub build: String,
}

impl FixedPlatform {
    pub fn new(model: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            build: build.into(),
        }
    }
}

impl PlatformInfo for FixedPlatform {
    fn hw_model(&self) -> Result<String> {
        Ok(self.model.clone())
    }

    fn os_build(&self) -> Result<String> {
        Ok(self.build.clone())
    }
}

/// Queries `hw.model` and `kern.osversion` through sysctl
#[cfg(any(target_os = "ios", target_os = "macos"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SysctlPlatform;

#[cfg(any(target_os = "ios", target_os = "macos"))]
impl PlatformInfo for SysctlPlatform {
    fn hw_model(&self) -> Result<String> {
        sysctl_string(c"hw.model", "hw.model")
    }

    fn os_build(&self) -> Result<String> {
        sysctl_string(c"kern.osversion", "kern.osversion")
    }
}

#[cfg(any(target_os = "ios", target_os = "macos"))]
fn sysctl_string(key: &std::ffi::CStr, name: &'static str) -> Result<String> {
    use crate::error::Error;

    let query_failed = || Error::PlatformQuery {
        name,
        source: std::io::Error::last_os_error(),
    };

    let mut len: libc::size_t = 0;
    // SAFETY: a null output buffer asks sysctl for the required length only.
    let rc = unsafe {
        libc::sysctlbyname(
            key.as_ptr(),
            std::ptr::null_mut(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(query_failed());
    }

    let mut buf = vec![0u8; len];
    // SAFETY: `buf` is valid for `len` bytes and sysctl writes at most `len`.
    let rc = unsafe {
        libc::sysctlbyname(
            key.as_ptr(),
            buf.as_mut_ptr().cast(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return Err(query_failed());
    }

    buf.truncate(len);
    if let Some(nul) = buf.iter().position(|&b| b == 0) {
        buf.truncate(nul);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
