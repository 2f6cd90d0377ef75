use crate::bridge::TrackerBridge;
use crate::error::{throw_java_exception, JResult, JniBridgeError};
use jni::objects::{JClass, JObject, JString};
use jni::sys::{
    jboolean, jdouble, jdoubleArray, jint, jlong, jobjectArray, jstring, JNI_FALSE, JNI_TRUE,
};
use jni::JNIEnv;
use log::info;

// Global tracker state - stored as static to persist across JNI calls
lazy_static::lazy_static! {
    static ref BRIDGE: TrackerBridge = TrackerBridge::default();
}

/// Map a command result to the 0 / -1 status convention, throwing on error.
fn status(env: &mut JNIEnv, result: JResult<()>) -> jint {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            -1
        }
    }
}

fn flag(env: &mut JNIEnv, result: JResult<bool>) -> jboolean {
    match result {
        Ok(true) => JNI_TRUE,
        Ok(false) => JNI_FALSE,
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            JNI_FALSE
        }
    }
}

fn java_string(env: &mut JNIEnv, result: JResult<String>) -> jstring {
    match result.and_then(|s| Ok(env.new_string(s)?)) {
        Ok(jstr) => jstr.into_raw(),
        Err(e) => {
            let _ = throw_java_exception(env, &e);
            std::ptr::null_mut()
        }
    }
}

fn init_logging() {
    #[cfg(target_os = "android")]
    {
        // Already installed on repeated init
        let _ = android_log::init("FitnessTracker");
    }
}

/// JNI: Create a fresh session from a config JSON string ("" = defaults)
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_init(
    mut env: JNIEnv,
    _class: JClass,
    config_json: JString,
) -> jint {
    init_logging();
    let result = env
        .get_string(&config_json)
        .map_err(JniBridgeError::from)
        .and_then(|json| BRIDGE.init(&String::from(json)));
    status(&mut env, result)
}

/// JNI: Start a new workout
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_startWorkout(
    mut env: JNIEnv,
    _class: JClass,
    permission_granted: jboolean,
) -> jint {
    let result = BRIDGE.start(permission_granted != JNI_FALSE);
    if result.is_ok() {
        info!("Workout started");
    }
    status(&mut env, result)
}

/// JNI: Pause the running workout
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_pauseWorkout(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = BRIDGE.pause();
    status(&mut env, result)
}

/// JNI: Resume a paused workout
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_resumeWorkout(
    mut env: JNIEnv,
    _class: JClass,
    permission_granted: jboolean,
) -> jint {
    let result = BRIDGE.resume(permission_granted != JNI_FALSE);
    status(&mut env, result)
}

/// JNI: Stop the workout
/// Returns: workout summary JSON, or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_stopWorkout(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = BRIDGE.stop();
    java_string(&mut env, result)
}

/// JNI: Discard the current workout
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_clearWorkout(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = BRIDGE.clear();
    status(&mut env, result)
}

/// JNI: Push a location fix
/// Parameters: latitude, longitude (degrees), accuracy (m), timestamp (ms since epoch)
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_pushFix(
    mut env: JNIEnv,
    _class: JClass,
    latitude: jdouble,
    longitude: jdouble,
    accuracy: jdouble,
    timestamp_ms: jlong,
) -> jint {
    let result = BRIDGE.push_fix(latitude, longitude, accuracy, timestamp_ms);
    status(&mut env, result)
}

/// JNI: Periodic refresh of duration and calories (call about once a second)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_tick(
    mut env: JNIEnv,
    _class: JClass,
) -> jint {
    let result = BRIDGE.tick();
    status(&mut env, result)
}

/// JNI: Update body weight (kg); calories are recomputed immediately
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_updateWeight(
    mut env: JNIEnv,
    _class: JClass,
    weight_kg: jdouble,
) -> jint {
    let result = BRIDGE.update_weight(weight_kg);
    status(&mut env, result)
}

/// JNI: Formatted metrics [duration, distance, calories, pace]
/// Returns: String[4] or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_getDisplayMetrics(
    mut env: JNIEnv,
    _class: JClass,
) -> jobjectArray {
    match display_metrics_impl(&mut env) {
        Ok(array) => array,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            std::ptr::null_mut()
        }
    }
}

fn display_metrics_impl(env: &mut JNIEnv) -> JResult<jobjectArray> {
    let values = BRIDGE.display_metrics()?;
    let array = env.new_object_array(values.len() as i32, "java/lang/String", JObject::null())?;
    for (i, value) in values.iter().enumerate() {
        let jstr = env.new_string(value)?;
        env.set_object_array_element(&array, i as i32, jstr)?;
    }
    Ok(array.into_raw())
}

/// JNI: Plotted route as [lat0, lon0, lat1, lon1, ...]
/// Returns: double[] or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_getRoute(
    mut env: JNIEnv,
    _class: JClass,
) -> jdoubleArray {
    match route_impl(&mut env) {
        Ok(array) => array,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            std::ptr::null_mut()
        }
    }
}

fn route_impl(env: &mut JNIEnv) -> JResult<jdoubleArray> {
    let coords = BRIDGE.route_coordinates()?;
    let array = env.new_double_array(coords.len() as i32)?;
    env.set_double_array_region(&array, 0, &coords)?;
    Ok(array.into_raw())
}

#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_isTracking(
    mut env: JNIEnv,
    _class: JClass,
) -> jboolean {
    let result = BRIDGE.is_tracking();
    flag(&mut env, result)
}

#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_isMoving(
    mut env: JNIEnv,
    _class: JClass,
) -> jboolean {
    let result = BRIDGE.is_moving();
    flag(&mut env, result)
}

/// JNI: Full session snapshot as JSON
/// Returns: JSON string or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_fitnessapp_TrackerBinding_getSnapshotJson(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let result = BRIDGE.snapshot_json();
    java_string(&mut env, result)
}
