//! FFI interface for C/C++ callers
//!
//! Templates and results cross the boundary as JSON strings.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;

use crate::directive::parse_directive;
use crate::template::Template;

/// Result struct returned to the caller
/// Both pointers are owned by Rust and must be freed via tagscrape_free_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated), or null on failure
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract a field map from HTML according to a JSON template.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `template_json` - JSON-serialized `Template` (null-terminated)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `template_json` must be a valid null-terminated C string
/// - Caller must free the result via `tagscrape_free_result`
#[no_mangle]
pub unsafe extern "C" fn tagscrape_extract(
    html_ptr: *const c_char,
    html_len: usize,
    template_json: *const c_char,
) -> ExtractionResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        ""
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    let template_str = match c_str_arg(template_json, "template JSON") {
        Ok(s) => s,
        Err(result) => return result,
    };

    let template = match Template::from_json(template_str) {
        Ok(t) => t,
        Err(e) => return make_error_result(&e.to_string()),
    };

    match template.extract_str(html) {
        Ok(map) => make_json_result(&map),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Parse a single field tag and return the directive as JSON.
///
/// # Safety
/// - `tag` must be a valid null-terminated C string
/// - Caller must free the result via `tagscrape_free_result`
#[no_mangle]
pub unsafe extern "C" fn tagscrape_parse_tag(tag: *const c_char) -> ExtractionResultFFI {
    let tag = match c_str_arg(tag, "tag") {
        Ok(s) => s,
        Err(result) => return result,
    };

    match parse_directive(tag) {
        Ok(directive) => make_json_result(&directive),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free an ExtractionResultFFI returned by this library
///
/// # Safety
/// - `result` must have been returned by a `tagscrape_*` function
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn tagscrape_free_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn c_str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, ExtractionResultFFI> {
    if ptr.is_null() {
        return Err(make_error_result(&format!("{what} is null")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| make_error_result(&format!("Invalid UTF-8 in {what}")))
}

fn make_json_result<T: Serialize>(value: &T) -> ExtractionResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
