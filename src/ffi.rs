//! FFI bindings for RedeSegura
//!
//! This module provides C-compatible functions for driving the engine from the
//! mobile host. All strings are null-terminated UTF-8; structured values cross
//! the boundary as JSON. Returned strings are allocated here and must be freed
//! with `redesegura_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::{ConfigUpdate, EngineConfig};
use crate::engine::PsychEngine;

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

fn json_to_cstr<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

unsafe fn engine_ref<'a>(handle: *const EngineHandle) -> Option<&'a PsychEngine> {
    if handle.is_null() {
        set_last_error("Null engine pointer");
        return None;
    }
    Some(&(*handle).engine)
}

// ============================================================================
// Engine Lifecycle
// ============================================================================

/// Opaque handle to a PsychEngine
pub struct EngineHandle {
    engine: PsychEngine,
}

/// Create a new engine.
///
/// # Safety
/// - `config_json` must be NULL (built-in configuration) or a valid
///   null-terminated C string holding a full configuration document.
/// - Returns a pointer that must be freed with `redesegura_engine_free`.
/// - Returns NULL on error; call `redesegura_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_new(config_json: *const c_char) -> *mut EngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid configuration string");
                return ptr::null_mut();
            }
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(EngineHandle {
        engine: PsychEngine::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `handle` must be a pointer returned by `redesegura_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_free(handle: *mut EngineHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Reset stats and journal. Returns 0 on success, -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_reset(handle: *mut EngineHandle) -> i32 {
    clear_last_error();
    match engine_ref(handle) {
        Some(engine) => {
            engine.reset();
            0
        }
        None => -1,
    }
}

/// Drop the journal and mark the engine uninitialized. Returns 0 on
/// success, -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_cleanup(handle: *mut EngineHandle) -> i32 {
    clear_last_error();
    match engine_ref(handle) {
        Some(engine) => {
            engine.cleanup();
            0
        }
        None => -1,
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Score one piece of content and return the assessment as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - `text` and `app_context` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `redesegura_free_string`.
/// - Returns NULL on error; call `redesegura_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_assess(
    handle: *mut EngineHandle,
    text: *const c_char,
    app_context: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(engine) = engine_ref(handle) else {
        return ptr::null_mut();
    };

    let text = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid text string pointer");
            return ptr::null_mut();
        }
    };

    let app = match cstr_to_string(app_context) {
        Some(s) => s,
        None => {
            set_last_error("Invalid app context string pointer");
            return ptr::null_mut();
        }
    };

    match engine.assess(&text, &app) {
        Ok(assessment) => json_to_cstr(&assessment),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

unsafe fn mutate_trigger(
    handle: *mut EngineHandle,
    category: *const c_char,
    phrase: *const c_char,
    apply: fn(&PsychEngine, &str, &str) -> bool,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_ref(handle) else {
        return -1;
    };
    let (Some(category), Some(phrase)) = (cstr_to_string(category), cstr_to_string(phrase)) else {
        set_last_error("Invalid category or phrase string pointer");
        return -1;
    };

    i32::from(apply(engine, &category, &phrase))
}

/// Add a trigger phrase.
///
/// Returns 1 when added, 0 when ignored (duplicate or unknown category),
/// -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - `category` and `phrase` must be valid null-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_add_trigger(
    handle: *mut EngineHandle,
    category: *const c_char,
    phrase: *const c_char,
) -> i32 {
    mutate_trigger(handle, category, phrase, PsychEngine::add_trigger)
}

/// Remove a trigger phrase.
///
/// Returns 1 when removed, 0 when ignored (absent or unknown category),
/// -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - `category` and `phrase` must be valid null-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_remove_trigger(
    handle: *mut EngineHandle,
    category: *const c_char,
    phrase: *const c_char,
) -> i32 {
    mutate_trigger(handle, category, phrase, PsychEngine::remove_trigger)
}

/// Merge a partial configuration document. Returns 0 on success, -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - `json` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_update_configuration(
    handle: *mut EngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    let Some(engine) = engine_ref(handle) else {
        return -1;
    };

    let json = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match ConfigUpdate::from_json(&json) {
        Ok(update) => {
            engine.update_configuration(update);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Current configuration as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - Returns a newly allocated string that must be freed with `redesegura_free_string`.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_configuration(handle: *mut EngineHandle) -> *mut c_char {
    clear_last_error();
    match engine_ref(handle) {
        Some(engine) => json_to_cstr(&engine.configuration()),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Analysis stats as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - Returns a newly allocated string that must be freed with `redesegura_free_string`.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_stats(handle: *mut EngineHandle) -> *mut c_char {
    clear_last_error();
    match engine_ref(handle) {
        Some(engine) => json_to_cstr(&engine.analysis_stats()),
        None => ptr::null_mut(),
    }
}

/// Trigger database summary as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `redesegura_engine_new`.
/// - Returns a newly allocated string that must be freed with `redesegura_free_string`.
#[no_mangle]
pub unsafe extern "C" fn redesegura_engine_database_info(handle: *mut EngineHandle) -> *mut c_char {
    clear_last_error();
    match engine_ref(handle) {
        Some(engine) => json_to_cstr(&engine.database_info()),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by RedeSegura functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a RedeSegura function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn redesegura_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next RedeSegura call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn redesegura_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn redesegura_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    unsafe fn take_json(ptr: *mut c_char) -> Value {
        assert!(!ptr.is_null(), "call failed: {:?}", last_error());
        let json = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        redesegura_free_string(ptr);
        serde_json::from_str(&json).unwrap()
    }

    unsafe fn last_error() -> Option<String> {
        let ptr = redesegura_last_error();
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr).to_str().unwrap().to_string())
        }
    }

    #[test]
    fn test_ffi_assess() {
        let text = CString::new("sou um perdedor").unwrap();
        let app = CString::new("tiktok").unwrap();

        unsafe {
            let handle = redesegura_engine_new(ptr::null());
            assert!(!handle.is_null());

            let assessment =
                take_json(redesegura_engine_assess(handle, text.as_ptr(), app.as_ptr()));
            assert_eq!(assessment["should_block"], Value::Bool(true));
            assert_eq!(assessment["trigger_type"], "depression_risk");
            assert_eq!(assessment["toxicity_score"], 44);

            let stats = take_json(redesegura_engine_stats(handle));
            assert_eq!(stats["totalAnalyzed"], 1);

            redesegura_engine_free(handle);
        }
    }

    #[test]
    fn test_ffi_trigger_mutation() {
        let category = CString::new("comparisonTriggers").unwrap();
        let unknown = CString::new("sarcasm").unwrap();
        let phrase = CString::new("x-test-trigger").unwrap();

        unsafe {
            let handle = redesegura_engine_new(ptr::null());
            let before = take_json(redesegura_engine_database_info(handle));

            let (category, unknown, phrase) =
                (category.as_ptr(), unknown.as_ptr(), phrase.as_ptr());
            assert_eq!(redesegura_engine_add_trigger(handle, category, phrase), 1);
            assert_eq!(redesegura_engine_add_trigger(handle, category, phrase), 0);
            assert_eq!(redesegura_engine_add_trigger(handle, unknown, phrase), 0);
            assert_eq!(redesegura_engine_add_trigger(handle, ptr::null(), phrase), -1);

            let during = take_json(redesegura_engine_database_info(handle));
            assert_eq!(
                during["totalTriggers"].as_u64().unwrap(),
                before["totalTriggers"].as_u64().unwrap() + 1
            );

            assert_eq!(redesegura_engine_remove_trigger(handle, category, phrase), 1);
            let after = take_json(redesegura_engine_database_info(handle));
            assert_eq!(after["totalTriggers"], before["totalTriggers"]);

            redesegura_engine_free(handle);
        }
    }

    #[test]
    fn test_ffi_update_configuration() {
        let update = CString::new(r#"{"sensitivityLevels":{"depression":50}}"#).unwrap();
        let bad = CString::new("{not json").unwrap();

        unsafe {
            let handle = redesegura_engine_new(ptr::null());
            assert_eq!(redesegura_engine_update_configuration(handle, update.as_ptr()), 0);

            let config = take_json(redesegura_engine_configuration(handle));
            assert_eq!(config["sensitivityLevels"]["depression"], 50);
            assert_eq!(config["sensitivityLevels"]["anxiety"], 92);

            assert_eq!(redesegura_engine_update_configuration(handle, bad.as_ptr()), -1);
            assert!(last_error().is_some());

            redesegura_engine_free(handle);
        }
    }

    #[test]
    fn test_ffi_cleanup_blocks_scoring() {
        let text = CString::new("bom dia").unwrap();
        let app = CString::new("instagram").unwrap();

        unsafe {
            let handle = redesegura_engine_new(ptr::null());
            assert_eq!(redesegura_engine_cleanup(handle), 0);

            let result = redesegura_engine_assess(handle, text.as_ptr(), app.as_ptr());
            assert!(result.is_null());
            assert!(last_error().unwrap().contains("not initialized"));

            redesegura_engine_free(handle);
        }
    }

    #[test]
    fn test_ffi_null_handle() {
        unsafe {
            assert!(redesegura_engine_stats(ptr::null_mut()).is_null());
            assert_eq!(last_error().as_deref(), Some("Null engine pointer"));
            assert_eq!(redesegura_engine_reset(ptr::null_mut()), -1);
        }
    }

    #[test]
    fn test_ffi_engine_from_config() {
        let config = CString::new(r#"{"sensitivityLevels":{"comparison":10}}"#).unwrap();
        let invalid = CString::new("42").unwrap();

        unsafe {
            let handle = redesegura_engine_new(config.as_ptr());
            assert!(!handle.is_null());
            let config = take_json(redesegura_engine_configuration(handle));
            assert_eq!(config["sensitivityLevels"]["comparison"], 10);
            redesegura_engine_free(handle);

            assert!(redesegura_engine_new(invalid.as_ptr()).is_null());
            assert!(last_error().is_some());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(redesegura_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
