//! C-locale precondition checking for ASCII float I/O.
//!
//! `fast_atof`/`write_*_dec` never consult the ambient locale themselves
//! (§9, "Numeric locale coupling"); instead the ASCII reader/writer assert
//! the precondition once via [`check_lc_numeric`] before touching the
//! stream. Callers are responsible for saving/restoring the locale around
//! their own calls; [`LocaleGuard`] is the RAII helper for that.

use crate::error::{Error, ErrorKind};
use std::ffi::{CStr, CString};

/// Returns the current `LC_NUMERIC` category name (e.g. `"C"`, `"POSIX"`,
/// `"fr_FR.UTF-8"`).
#[must_use]
pub fn current_lc_numeric() -> String {
    unsafe {
        // Querying (not setting) the category: pass a null pointer.
        let ptr = libc::setlocale(libc::LC_NUMERIC, core::ptr::null());
        if ptr.is_null() {
            return String::from("C");
        }
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Fails with [`ErrorKind::BadLcNumeric`] unless the process numeric locale
/// is `"C"` or `"POSIX"`. This is the first check the ASCII reader/writer
/// perform, before touching the stream.
pub fn check_lc_numeric() -> Result<(), Error> {
    let name = current_lc_numeric();
    if name == "C" || name == "POSIX" {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::BadLcNumeric))
    }
}

/// RAII helper that forces `LC_NUMERIC` to `"C"` for its lifetime, restoring
/// whatever was previously set when dropped.
///
/// The codec itself never calls `setlocale`; this type exists only for
/// callers who want to bracket their own `stl_read`/`stl_write` calls.
pub struct LocaleGuard {
    previous: CString,
}

impl LocaleGuard {
    /// Saves the current `LC_NUMERIC` locale and forces it to `"C"`.
    #[must_use]
    pub fn force_c() -> Self {
        let previous = CString::new(current_lc_numeric()).unwrap_or_else(|_| {
            CString::new("C").expect("literal C string is always valid")
        });
        let c_locale = CString::new("C").expect("literal C string is always valid");
        unsafe {
            libc::setlocale(libc::LC_NUMERIC, c_locale.as_ptr());
        }
        Self { previous }
    }
}

impl Drop for LocaleGuard {
    fn drop(&mut self) {
        unsafe {
            libc::setlocale(libc::LC_NUMERIC, self.previous.as_ptr());
        }
    }
}
