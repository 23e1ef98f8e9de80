// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. The host Activity hands its WebView to native
// code through the Java glue class `com.mapbridge.MapBridgeHost`
// (see `android/MapBridgeHost.java` in this crate).
//
// ## Architecture notes
//
// `WebView.evaluateJavascript` must run on the UI thread, and its result
// arrives through a `ValueCallback`. Neither can be expressed from Rust
// alone, so the glue class posts the evaluation with `runOnUiThread` and
// forwards the callback value to `nativeOnScriptResult(token, value)`.
// Pending acknowledgments are parked in a token-keyed table until then.
//
// App classes (the Kakao SDK, the glue class) are resolved through the
// Activity's class loader, because `FindClass` on a natively attached
// thread only sees the system loader.

#![cfg(target_os = "android")]

use std::sync::{LazyLock, Mutex};

use jni::objects::{GlobalRef, JByteArray, JClass, JObject, JObjectArray, JString, JValue};
use jni::sys::jlong;
use jni::{JNIEnv, JavaVM};
use tracing::{debug, error, info, warn};

use mapbridge_core::error::{BridgeError, Result};

use crate::pending::PendingAcks;
use crate::traits::*;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// `PackageManager.GET_SIGNATURES`.
const GET_SIGNATURES: i32 = 0x40;

/// Binary name of the Kakao native SDK entry point.
const KAKAO_SDK_CLASS: &str = "com.kakao.vectormap.KakaoMapSdk";

/// JNI signature of `MapBridgeHost.evaluate`.
const EVALUATE_SIG: &str = "(Landroid/app/Activity;Landroid/webkit/WebView;Ljava/lang/String;J)V";

/// References captured by `MapBridgeHost.attach`.
struct Attachment {
    vm: JavaVM,
    host_class: GlobalRef,
    activity: GlobalRef,
    webview: GlobalRef,
}

static ATTACHMENT: Mutex<Option<Attachment>> = Mutex::new(None);

static PENDING: LazyLock<Mutex<PendingAcks>> = LazyLock::new(|| Mutex::new(PendingAcks::new()));

/// Convenience: map any `jni::errors::Error` into `BridgeError::DispatchFailure`.
fn jni_err(context: &str, e: jni::errors::Error) -> BridgeError {
    BridgeError::DispatchFailure(format!("{context}: {e}"))
}

/// Log and clear a pending Java exception so later JNI calls stay legal.
fn clear_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

fn take_pending(token: jlong) -> Option<ScriptAck> {
    PENDING.lock().expect("pending ack lock poisoned").take(token)
}

/// Run `f` with a JNI env and the hosting Activity.
///
/// Prefers the Activity attached by the glue class; falls back to the
/// `ndk_context` globals set up by `NativeActivity` hosts.
fn with_activity<T>(f: impl FnOnce(&mut JNIEnv, &JObject) -> Result<T>) -> Result<T> {
    let guard = ATTACHMENT.lock().expect("attachment lock poisoned");
    if let Some(attachment) = guard.as_ref() {
        let mut env = attachment
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("attach_current_thread", e))?;
        return f(&mut env, attachment.activity.as_obj());
    }
    drop(guard);

    let ctx = ndk_context::android_context();
    if ctx.context().is_null() {
        return Err(BridgeError::DispatchFailure(
            "no Activity attached and Android context is null".into(),
        ));
    }
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| jni_err("JavaVM::from_raw", e))?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| jni_err("attach_current_thread", e))?;
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    let activity = unsafe { JObject::from_raw(ctx.context().cast()) };
    f(&mut env, &activity)
}

/// Load an application class through the Activity's class loader.
fn load_app_class<'local>(
    env: &mut JNIEnv<'local>,
    activity: &JObject,
    binary_name: &str,
) -> Result<JClass<'local>> {
    let loader = env
        .call_method(activity, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err("getClassLoader", e))?;
    let j_name = env
        .new_string(binary_name)
        .map_err(|e| jni_err("new_string(class name)", e))?;
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&j_name)],
        )
        .and_then(|v| v.l());
    match class {
        Ok(class) => Ok(JClass::from(class)),
        Err(e) => {
            clear_exception(env);
            Err(jni_err(&format!("loadClass({binary_name})"), e))
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the mapbridge platform bridge.
///
/// The struct is zero-sized; the WebView and Activity references live in
/// process-wide statics populated by `MapBridgeHost.attach`.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI; the first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// ScriptHost: WebView.evaluateJavascript via MapBridgeHost.evaluate
// ---------------------------------------------------------------------------

impl ScriptHost for AndroidBridge {
    fn evaluate_script(&self, script: String, ack: ScriptAck) -> Result<()> {
        let guard = ATTACHMENT.lock().expect("attachment lock poisoned");
        let attachment = guard
            .as_ref()
            .ok_or_else(|| BridgeError::DispatchFailure("no WebView attached".into()))?;
        let mut env = attachment
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("attach_current_thread", e))?;

        let j_script: JString = env
            .new_string(&script)
            .map_err(|e| jni_err("new_string(script)", e))?;

        let token = PENDING.lock().expect("pending ack lock poisoned").insert(ack);

        let host_class: &JClass = attachment.host_class.as_obj().into();
        let posted = env.call_static_method(
            host_class,
            "evaluate",
            EVALUATE_SIG,
            &[
                JValue::Object(attachment.activity.as_obj()),
                JValue::Object(attachment.webview.as_obj()),
                JValue::Object(&j_script),
                JValue::Long(token),
            ],
        );

        if let Err(e) = posted {
            clear_exception(&mut env);
            take_pending(token);
            return Err(jni_err("MapBridgeHost.evaluate", e));
        }

        debug!(token, bytes = script.len(), "script posted to UI thread");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeMapSdk: com.kakao.vectormap.KakaoMapSdk.init
// ---------------------------------------------------------------------------

impl NativeMapSdk for AndroidBridge {
    fn init_sdk(&self, native_key: &str) -> Result<()> {
        with_activity(|env, activity| {
            let sdk_class = load_app_class(env, activity, KAKAO_SDK_CLASS)?;
            let app_context = env
                .call_method(
                    activity,
                    "getApplicationContext",
                    "()Landroid/content/Context;",
                    &[],
                )
                .and_then(|v| v.l())
                .map_err(|e| jni_err("getApplicationContext", e))?;
            let j_key = env
                .new_string(native_key)
                .map_err(|e| jni_err("new_string(native key)", e))?;

            let result = env.call_static_method(
                &sdk_class,
                "init",
                "(Landroid/content/Context;Ljava/lang/String;)V",
                &[JValue::Object(&app_context), JValue::Object(&j_key)],
            );
            if let Err(e) = result {
                clear_exception(env);
                return Err(jni_err("KakaoMapSdk.init", e));
            }
            info!("Android: Kakao map SDK initialised");
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// NativePackageSignatures: PackageManager.getPackageInfo(GET_SIGNATURES)
// ---------------------------------------------------------------------------

impl NativePackageSignatures for AndroidBridge {
    fn package_signatures(&self, package: &str) -> Result<Vec<Vec<u8>>> {
        with_activity(|env, activity| {
            let pm = env
                .call_method(
                    activity,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )
                .and_then(|v| v.l())
                .map_err(|e| jni_err("getPackageManager", e))?;
            let j_package = env
                .new_string(package)
                .map_err(|e| jni_err("new_string(package)", e))?;

            let info = env
                .call_method(
                    &pm,
                    "getPackageInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                    &[JValue::Object(&j_package), JValue::Int(GET_SIGNATURES)],
                )
                .and_then(|v| v.l());
            let info = match info {
                Ok(info) => info,
                Err(e) => {
                    // NameNotFoundException
                    clear_exception(env);
                    return Err(jni_err(&format!("getPackageInfo({package})"), e));
                }
            };

            let signatures = env
                .get_field(&info, "signatures", "[Landroid/content/pm/Signature;")
                .and_then(|v| v.l())
                .map_err(|e| jni_err("PackageInfo.signatures", e))?;
            if signatures.is_null() {
                return Ok(Vec::new());
            }
            let signatures = JObjectArray::from(signatures);
            let count = env
                .get_array_length(&signatures)
                .map_err(|e| jni_err("signatures.length", e))?;

            let mut certs = Vec::with_capacity(count.max(0) as usize);
            for index in 0..count {
                let signature = env
                    .get_object_array_element(&signatures, index)
                    .map_err(|e| jni_err("signatures[i]", e))?;
                let bytes = env
                    .call_method(&signature, "toByteArray", "()[B", &[])
                    .and_then(|v| v.l())
                    .map_err(|e| jni_err("Signature.toByteArray", e))?;
                let bytes = JByteArray::from(bytes);
                certs.push(
                    env.convert_byte_array(&bytes)
                        .map_err(|e| jni_err("convert_byte_array", e))?,
                );
            }
            Ok(certs)
        })
    }
}

// ---------------------------------------------------------------------------
// Native entry points called by com.mapbridge.MapBridgeHost
// ---------------------------------------------------------------------------

fn attach(env: &mut JNIEnv, class: &JClass, activity: &JObject, webview: &JObject) -> Result<()> {
    let vm = env.get_java_vm().map_err(|e| jni_err("GetJavaVM", e))?;
    let host_class = env
        .new_global_ref(class)
        .map_err(|e| jni_err("new_global_ref(class)", e))?;
    let activity = env
        .new_global_ref(activity)
        .map_err(|e| jni_err("new_global_ref(activity)", e))?;
    let webview = env
        .new_global_ref(webview)
        .map_err(|e| jni_err("new_global_ref(webview)", e))?;

    *ATTACHMENT.lock().expect("attachment lock poisoned") = Some(Attachment {
        vm,
        host_class,
        activity,
        webview,
    });
    Ok(())
}

/// `MapBridgeHost.nativeAttach(Activity, WebView)`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_mapbridge_MapBridgeHost_nativeAttach<'local>(
    mut env: JNIEnv<'local>,
    class: JClass<'local>,
    activity: JObject<'local>,
    webview: JObject<'local>,
) {
    match attach(&mut env, &class, &activity, &webview) {
        Ok(()) => info!("Android: WebView attached"),
        Err(e) => error!("Android: failed to attach WebView: {e}"),
    }
}

/// `MapBridgeHost.nativeDetach()`: drops the WebView and fails pending acks.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_mapbridge_MapBridgeHost_nativeDetach<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    ATTACHMENT.lock().expect("attachment lock poisoned").take();
    let pending: Vec<ScriptAck> = PENDING
        .lock()
        .expect("pending ack lock poisoned")
        .drain();
    if !pending.is_empty() {
        warn!(count = pending.len(), "Android: WebView detached with scripts in flight");
    }
    for ack in pending {
        ack.fail("WebView detached before the script completed");
    }
}

/// `MapBridgeHost.nativeOnScriptResult(long, String)`: `ValueCallback` result.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_mapbridge_MapBridgeHost_nativeOnScriptResult<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    token: jlong,
    value: JString<'local>,
) {
    let Some(ack) = take_pending(token) else {
        warn!(token, "Android: result for unknown script token");
        return;
    };
    if value.is_null() {
        ack.complete("null");
        return;
    }
    match env.get_string(&value) {
        Ok(raw) => ack.complete(String::from(raw)),
        Err(e) => ack.fail(format!("could not read script result: {e}")),
    }
}

/// `MapBridgeHost.nativeOnScriptError(long, String)`: evaluation never ran.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_mapbridge_MapBridgeHost_nativeOnScriptError<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    token: jlong,
    message: JString<'local>,
) {
    let Some(ack) = take_pending(token) else {
        warn!(token, "Android: error for unknown script token");
        return;
    };
    let reason = env
        .get_string(&message)
        .map(String::from)
        .unwrap_or_else(|_| "unknown WebView error".into());
    ack.fail(reason);
}
