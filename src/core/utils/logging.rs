//! Console logging
//!
//! In the browser messages go straight to the devtools console; native
//! builds (tests, tools) route through the `log` facade instead, since
//! web-sys imports cannot be called off wasm32.

#[doc(hidden)]
pub fn __info(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    log::info!("{}", msg);
}

#[doc(hidden)]
pub fn __warn(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    log::warn!("{}", msg);
}

/// `console_log!("fmt", args..)` - informational message
#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::core::utils::logging::__info(&format!($($arg)*))
    };
}

/// `console_warn!("fmt", args..)` - refused transitions and degraded paths
#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::core::utils::logging::__warn(&format!($($arg)*))
    };
}
