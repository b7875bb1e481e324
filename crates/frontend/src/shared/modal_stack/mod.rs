use crate::shared::modal_frame::ModalFrame;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::KeyboardEvent;

#[derive(Clone)]
struct ModalEntry {
    id: u64,
    builder: Arc<dyn Fn(ModalHandle) -> AnyView + Send + Sync>,
    modal_style: Option<String>,
    modal_class: Option<String>,
    can_close: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
    on_dismiss: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// A handle returned by `ModalStackService::push_with_frame`.
///
/// Can be cloned and used inside event handlers to close the modal.
#[derive(Clone)]
pub struct ModalHandle {
    id: u64,
    svc: ModalStackService,
}

impl ModalHandle {
    pub fn close(&self) {
        self.svc.close_deferred(self.id);
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Centralized modal stack shared by all CRUD pages.
///
/// - Escape and overlay clicks dismiss only the topmost modal
///   (handled by `ModalHost`), notifying the owner via `on_dismiss`
/// - A close guard keeps the form open while a submit is in flight
#[derive(Clone, Copy)]
pub struct ModalStackService {
    stack: RwSignal<Vec<ModalEntry>>,
    next_id: RwSignal<u64>,
}

impl ModalStackService {
    pub fn new() -> Self {
        Self {
            stack: RwSignal::new(Vec::new()),
            next_id: RwSignal::new(1),
        }
    }

    fn defer(&self, f: impl FnOnce(ModalStackService) + 'static) {
        let svc = *self;
        spawn_local(async move {
            // Defer to next tick to avoid "closure invoked ... after being dropped" when
            // a modal is removed synchronously during the originating DOM event dispatch.
            TimeoutFuture::new(0).await;
            f(svc);
        });
    }

    pub fn is_open(&self) -> bool {
        !self.stack.get().is_empty()
    }

    /// Push a new modal with style/class overrides, an optional close
    /// guard and an optional dismissal hook.
    ///
    /// `builder` receives a `ModalHandle` so the modal can close itself.
    /// If `can_close` returns false, overlay-click and Escape will NOT
    /// close the modal. `on_dismiss` fires on every host-driven
    /// dismissal (Escape, overlay click) but not on `ModalHandle::close`,
    /// so the owner can tell "the user backed out" from "I closed it".
    pub fn push_with_frame<F>(
        &self,
        modal_style: Option<String>,
        modal_class: Option<String>,
        can_close: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
        on_dismiss: Option<Arc<dyn Fn() + Send + Sync>>,
        builder: F,
    ) -> ModalHandle
    where
        F: Fn(ModalHandle) -> AnyView + Send + Sync + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let handle = ModalHandle { id, svc: *self };

        self.stack.update(|s| {
            s.push(ModalEntry {
                id,
                builder: Arc::new(builder),
                modal_style,
                modal_class,
                can_close,
                on_dismiss,
            });
        });

        handle
    }

    pub fn close(&self, id: u64) {
        self.stack.update(|s| {
            s.retain(|e| e.id != id);
        });
    }

    pub fn close_deferred(&self, id: u64) {
        self.defer(move |svc| svc.close(id));
    }

    /// Host-driven dismissal: consult the close guard, notify the owner,
    /// then remove the modal. Returns whether the modal was dismissed.
    pub fn dismiss(&self, id: u64) -> bool {
        let entry = self.stack.with_untracked(|s| {
            s.iter()
                .find(|e| e.id == id)
                .map(|e| (e.can_close.clone(), e.on_dismiss.clone()))
        });
        let Some((can_close, on_dismiss)) = entry else {
            return false;
        };
        if !can_close.map(|f| f()).unwrap_or(true) {
            return false;
        }
        if let Some(notify) = on_dismiss {
            notify();
        }
        self.close(id);
        true
    }

    pub fn dismiss_deferred(&self, id: u64) {
        self.defer(move |svc| {
            svc.dismiss(id);
        });
    }

    fn top_id(&self) -> Option<u64> {
        self.stack.with_untracked(|s| s.last().map(|e| e.id))
    }
}

impl Default for ModalStackService {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the modal stack at the application root.
///
/// Must be mounted exactly once.
#[component]
pub fn ModalHost() -> impl IntoView {
    let svc = use_context::<ModalStackService>()
        .expect("ModalStackService not provided in context (provide it in app root)");

    // Global Escape handler: closes only the topmost modal.
    Effect::new(move |_| {
        let svc = svc;

        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
                if keyboard_event.key() == "Escape" {
                    if let Some(id) = svc.top_id() {
                        svc.dismiss_deferred(id);
                    }
                }
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            // ModalHost is mounted once for the whole app lifetime; keep closure alive.
            closure.forget();
        }
    });

    view! {
        <Show when=move || svc.is_open()>
            <For
                each=move || {
                    svc.stack
                        .get()
                        .into_iter()
                        .enumerate()
                        .collect::<Vec<(usize, ModalEntry)>>()
                }
                key=|(_, entry)| entry.id
                children=move |(idx, entry)| {
                    // z-index based on current stack order
                    let z_index = 1000 + idx as i32;
                    let on_close = {
                        let svc = svc;
                        let id = entry.id;
                        // ModalFrame already defers overlay closes past
                        // the originating event dispatch.
                        Callback::new(move |_| {
                            svc.dismiss(id);
                        })
                    };

                    let handle = ModalHandle { id: entry.id, svc };
                    let view = (entry.builder)(handle);
                    let modal_style = entry.modal_style.clone().unwrap_or_default();
                    let modal_class = entry.modal_class.clone().unwrap_or_default();

                    view! {
                        <ModalFrame
                            z_index=z_index
                            on_close=on_close
                            modal_style=modal_style
                            modal_class=modal_class
                        >
                            {view}
                        </ModalFrame>
                    }
                }
            />
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_dismiss_notifies_owner_and_removes_modal() {
        let svc = ModalStackService::new();
        let dismissed = Arc::new(AtomicBool::new(false));
        let flag = dismissed.clone();
        let handle = svc.push_with_frame(
            None,
            None,
            None,
            Some(Arc::new(move || flag.store(true, Ordering::Relaxed))),
            |_| ().into_any(),
        );
        assert!(svc.dismiss(handle.id()));
        assert!(dismissed.load(Ordering::Relaxed));
        assert!(!svc.is_open());
    }

    #[test]
    fn test_close_guard_blocks_dismissal() {
        let svc = ModalStackService::new();
        let dismissed = Arc::new(AtomicBool::new(false));
        let flag = dismissed.clone();
        let handle = svc.push_with_frame(
            None,
            None,
            Some(Arc::new(|| false)),
            Some(Arc::new(move || flag.store(true, Ordering::Relaxed))),
            |_| ().into_any(),
        );
        assert!(!svc.dismiss(handle.id()));
        assert!(!dismissed.load(Ordering::Relaxed));
        assert!(svc.is_open());
    }

    #[test]
    fn test_handle_close_skips_dismiss_hook() {
        let svc = ModalStackService::new();
        let dismissed = Arc::new(AtomicBool::new(false));
        let flag = dismissed.clone();
        let handle = svc.push_with_frame(
            None,
            None,
            None,
            Some(Arc::new(move || flag.store(true, Ordering::Relaxed))),
            |_| ().into_any(),
        );
        svc.close(handle.id());
        assert!(!dismissed.load(Ordering::Relaxed));
        assert!(!svc.is_open());
    }
}
