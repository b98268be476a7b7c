//! FFI bindings for Pulseplan
//!
//! This module provides C-compatible functions for calling Pulseplan from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `pulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::FixedOffset;

use crate::dashboard::DashboardProcessor;
use crate::error::ComputeError;
use crate::input::SampleReader;
use crate::nutrition::BiometricProfile;
use crate::types::{HealthMetric, Sample};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn summarize_json(
    samples_json: &str,
    metric: &str,
    utc_offset_minutes: i32,
) -> Result<String, ComputeError> {
    let metric: HealthMetric = metric.parse()?;
    let tz = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            ComputeError::InvalidConfig(format!(
                "UTC offset out of range: {utc_offset_minutes} min"
            ))
        })?;

    // Records tagged with another metric are skipped
    let samples: Vec<Sample> = SampleReader::parse_auto(samples_json)?
        .iter()
        .filter(|r| r.metric.map_or(true, |m| m == metric))
        .map(|r| r.sample())
        .collect();

    let summary = DashboardProcessor::default().summarize(metric, &samples, None, &tz);
    Ok(serde_json::to_string(&summary)?)
}

fn nutrition_json(profile_json: &str) -> Result<String, ComputeError> {
    let profile: BiometricProfile = serde_json::from_str(profile_json)?;
    let report = DashboardProcessor::default().nutrition(&profile)?;
    Ok(serde_json::to_string(&report)?)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Aggregate samples for one metric and return the summary as JSON.
///
/// `samples_json` is a JSON array or NDJSON of `{timestamp, value[, metric]}`
/// records. Days are bucketed at `utc_offset_minutes` east of UTC.
///
/// # Safety
/// - `samples_json` and `metric` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_summarize(
    samples_json: *const c_char,
    metric: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let metric_str = match cstr_to_string(metric) {
        Some(s) => s,
        None => {
            set_last_error("Invalid metric string pointer");
            return ptr::null_mut();
        }
    };

    finish(summarize_json(&json_str, &metric_str, utc_offset_minutes))
}

/// Compute a nutrition plan from a biometric profile JSON.
///
/// # Safety
/// - `profile_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_nutrition_plan(profile_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(profile_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(nutrition_json(&json_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Pulseplan functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Pulseplan function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Pulseplan function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn pulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Pulseplan library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn pulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_steps_json() -> CString {
        CString::new(
            r#"[
            {"timestamp": "2024-01-15T08:00:00Z", "value": 100},
            {"timestamp": "2024-01-15T18:00:00Z", "value": 200},
            {"metric": "weight", "timestamp": "2024-01-15T18:00:00Z", "value": 70.0},
            {"timestamp": "2024-01-16T08:00:00Z", "value": 50}
        ]"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        pulse_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_summarize() {
        let json = sample_steps_json();
        let metric = CString::new("steps").unwrap();

        unsafe {
            let result = pulse_summarize(json.as_ptr(), metric.as_ptr(), 0);
            assert!(!result.is_null());

            let value: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(value["metric"], "steps");
            assert_eq!(value["series"][0]["value"], 300.0);
            assert_eq!(value["series"].as_array().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_ffi_summarize_offset_shifts_days() {
        let json = sample_steps_json();
        let metric = CString::new("steps").unwrap();

        unsafe {
            // UTC+10: 18:00Z on the 15th is already the 16th locally
            let result = pulse_summarize(json.as_ptr(), metric.as_ptr(), 600);
            let value: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(value["series"][0]["value"], 100.0);
            assert_eq!(value["series"][1]["value"], 250.0);
        }
    }

    #[test]
    fn test_ffi_nutrition_plan() {
        let profile = CString::new(
            r#"{"height_cm": 175, "weight_kg": 70, "age_years": 30, "sex": "male",
                "activity": "lightly_active", "goal": "maintain"}"#,
        )
        .unwrap();

        unsafe {
            let result = pulse_nutrition_plan(profile.as_ptr());
            assert!(!result.is_null());

            let value: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(value["plan"]["bmr"], 1648.75);
            assert_eq!(value["plan"]["goal_applied"], true);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let metric = CString::new("steps").unwrap();

            let result = pulse_summarize(invalid_json.as_ptr(), metric.as_ptr(), 0);
            assert!(result.is_null());

            let error = pulse_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_offset_out_of_range() {
        let json = sample_steps_json();
        let metric = CString::new("steps").unwrap();

        unsafe {
            for offset in [40_000_000, i32::MIN, 24 * 60] {
                let result = pulse_summarize(json.as_ptr(), metric.as_ptr(), offset);
                assert!(result.is_null());

                let error = CStr::from_ptr(pulse_last_error()).to_str().unwrap();
                assert!(error.contains("UTC offset"));
            }
        }
    }

    #[test]
    fn test_ffi_nutrition_plan_numeric_activity() {
        let profile = CString::new(
            r#"{"height_cm": 175, "weight_kg": 70, "age_years": 30, "sex": "male",
                "activity_factor": 1.55}"#,
        )
        .unwrap();

        unsafe {
            let result = pulse_nutrition_plan(profile.as_ptr());
            assert!(!result.is_null());

            let value: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(value["profile"]["activity"], "moderately_active");
        }
    }

    #[test]
    fn test_ffi_nutrition_plan_rejects_unlisted_factor() {
        let profile = CString::new(
            r#"{"height_cm": 175, "weight_kg": 70, "age_years": 30, "sex": "male",
                "activity_factor": 1.4}"#,
        )
        .unwrap();

        unsafe {
            let result = pulse_nutrition_plan(profile.as_ptr());
            assert!(result.is_null());

            let error = CStr::from_ptr(pulse_last_error()).to_str().unwrap();
            assert!(error.contains("Activity factor 1.4"));
        }
    }

    #[test]
    fn test_ffi_unknown_metric() {
        let json = sample_steps_json();
        let metric = CString::new("calories").unwrap();

        unsafe {
            let result = pulse_summarize(json.as_ptr(), metric.as_ptr(), 0);
            assert!(result.is_null());
            assert!(!pulse_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = pulse_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
