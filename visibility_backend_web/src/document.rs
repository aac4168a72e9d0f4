// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `document` access.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;

use visibility_core::host::Document;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen::closure::Closure;

/// The browser `document`, as a visibility host.
///
/// Properties are read with `Reflect.get` rather than typed `web_sys`
/// accessors, since only the unprefixed names have bindings.
#[derive(Clone, Debug)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    /// Wraps a document.
    #[must_use]
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Returns the wrapped document.
    #[must_use]
    pub fn inner(&self) -> &web_sys::Document {
        &self.document
    }

    fn get(&self, name: &str) -> Option<JsValue> {
        js_sys::Reflect::get(&self.document, &JsValue::from_str(name)).ok()
    }
}

impl Document for WebDocument {
    type Event = web_sys::Event;

    fn has_property(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_undefined())
    }

    fn bool_property(&self, name: &str) -> bool {
        self.get(name).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn string_property(&self, name: &str) -> Option<String> {
        self.get(name)?.as_string()
    }

    fn add_event_listener(&self, event: &str, listener: Rc<dyn Fn(web_sys::Event)>) {
        let forward = move |e: web_sys::Event| listener(e);
        let closure = Closure::wrap(Box::new(forward) as Box<dyn Fn(web_sys::Event)>);
        let _ = self
            .document
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        // Attached for the life of the page; there is no removal path.
        closure.forget();
    }
}
