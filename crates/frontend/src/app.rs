use leptos::prelude::*;

use crate::domain::certificate::CertificatePage;
use crate::domain::release::ReleasePage;
use crate::shared::modal_stack::{ModalHost, ModalStackService};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Certificates,
    Releases,
}

#[component]
pub fn App() -> impl IntoView {
    // Provide the modal stack for all CRUD pages
    provide_context(ModalStackService::new());

    let screen = RwSignal::new(Screen::Certificates);
    // TODO: read the signed-in role from the session endpoint once it exists
    let role = "Owner".to_string();

    let nav_class = move |target: Screen| {
        if screen.get() == target {
            "nav__item nav__item--active"
        } else {
            "nav__item"
        }
    };

    view! {
        <div class="app">
            <nav class="nav">
                <button
                    class=move || nav_class(Screen::Certificates)
                    on:click=move |_| screen.set(Screen::Certificates)
                >
                    "Certificates"
                </button>
                <button
                    class=move || nav_class(Screen::Releases)
                    on:click=move |_| screen.set(Screen::Releases)
                >
                    "Releases"
                </button>
            </nav>

            {
                let role = role.clone();
                move || match screen.get() {
                    Screen::Certificates => {
                        view! { <CertificatePage role=role.clone() /> }.into_any()
                    }
                    Screen::Releases => {
                        view! { <ReleasePage role=role.clone() /> }.into_any()
                    }
                }
            }

            <ModalHost />
        </div>
    }
}
