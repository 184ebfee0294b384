//! FFI bindings for Somnia
//!
//! C-compatible entry points for calling the engine from a host app. All
//! functions use null-terminated C strings and return allocated memory that
//! must be freed by the caller using `somnia_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapters::parse_samples_array;
use crate::aggregator::NightAggregator;
use crate::types::NightlyScore;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Aggregate a JSON array of raw samples into per-night records.
///
/// Input: JSON array of `{start, end, stageValue}` objects.
/// Output: JSON array of aggregated nights, most recent first.
///
/// # Safety
/// - `samples_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `somnia_free_string`.
/// - Returns NULL on error; call `somnia_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn somnia_aggregate_json(samples_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples JSON pointer");
            return ptr::null_mut();
        }
    };

    let samples = match parse_samples_array(&json_str) {
        Ok(samples) => samples,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let nights = NightAggregator::aggregate(&samples);

    match serde_json::to_string(&nights) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Derive the nightly score and rank tier for a total asleep-minutes value.
///
/// Output: JSON object `{"score": <0-100>, "rankTier": "<TIER>"}`.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `somnia_free_string`.
/// - Returns NULL only if JSON encoding fails.
#[no_mangle]
pub unsafe extern "C" fn somnia_score_night(total_minutes: i64) -> *mut c_char {
    clear_last_error();

    let nightly = NightlyScore::for_minutes(total_minutes);
    match serde_json::to_string(&nightly) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the last error message, or NULL if none.
///
/// # Safety
/// - The returned pointer is owned by the library and valid until the next
///   FFI call on this thread. Do not free it.
#[no_mangle]
pub unsafe extern "C" fn somnia_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|msg| msg.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Free a string previously returned by this library.
///
/// # Safety
/// - `ptr` must have been returned by a `somnia_*` function and not freed yet.
#[no_mangle]
pub unsafe extern "C" fn somnia_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
