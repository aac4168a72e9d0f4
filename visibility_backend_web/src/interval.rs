// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setInterval` repeating timers.

use alloc::boxed::Box;
use alloc::rc::Rc;

use visibility_core::host::Intervals;
use visibility_core::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Direct global bindings so the same code runs in windows and workers.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

/// The global `setInterval` facility.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebIntervals;

/// An active `setInterval` registration.
///
/// Owns the JS closure. Dropping the handle clears the interval and then
/// releases the closure, so the browser never calls into freed memory.
#[derive(Debug)]
pub struct WebInterval {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl WebInterval {
    /// Returns the browser's interval id.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }
}

impl Intervals for WebIntervals {
    type Handle = WebInterval;

    fn start_repeating(&self, interval: Duration, callback: Rc<dyn Fn()>) -> WebInterval {
        let closure = Closure::wrap(Box::new(move || callback()) as Box<dyn FnMut()>);
        let id = set_interval(closure.as_ref(), timeout_millis(interval));
        WebInterval {
            id,
            _closure: closure,
        }
    }

    fn cancel(&self, handle: WebInterval) {
        drop(handle);
    }
}

impl Drop for WebInterval {
    fn drop(&mut self) {
        clear_interval(self.id);
    }
}

/// Converts a cadence to a `setInterval` delay.
///
/// Browsers store the delay as a signed 32-bit value and treat anything
/// larger as overflow (firing almost immediately), so clamp instead.
fn timeout_millis(interval: Duration) -> i32 {
    i32::try_from(interval.as_millis()).unwrap_or(i32::MAX)
}
