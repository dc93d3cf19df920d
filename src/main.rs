//! Calorie Cards entry point
//!
//! On the web this wires the card store to the page: creation form, card
//! list, detail modal and notifications.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement,
    };

    use calorie_cards::platform::web::{BrowserConfirm, LocalStorageSlot};
    use calorie_cards::platform::{now_ms, parse_int};
    use calorie_cards::{
        CARDS_KEY, CardError, CardForm, CardId, CardStore, DeleteOutcome, DetailView, Notice,
        Settings, ValidationError,
    };

    const MODAL_ID: &str = "cardDetailModal";

    /// Page state shared by the event handlers
    struct App {
        store: CardStore<LocalStorageSlot>,
        settings: Settings,
        document: Document,
    }

    type Shared = Rc<RefCell<App>>;

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Calorie Cards starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available");
            return;
        };

        let store = CardStore::load(LocalStorageSlot::new(CARDS_KEY), now_ms() as u64);
        let app = Rc::new(RefCell::new(App {
            store,
            settings: Settings::load(),
            document,
        }));

        setup_form(app.clone());
        setup_card_list(app.clone());
        setup_detail_modal(app.clone());
        render_cards(&app);

        log::info!("Calorie Cards ready");
    }

    // === Rendering ===

    fn render_cards(app: &Shared) {
        let a = app.borrow();
        let Some(list) = a.document.get_element_by_id("cardsList") else {
            return;
        };
        list.set_inner_html("");

        if a.store.list().is_empty() {
            if let Some(msg) = append(&a.document, &list, "p", "no-cards-message") {
                msg.set_text_content(Some("No cards yet. Create a new card to get started."));
            }
            return;
        }

        for card in a.store.list() {
            let Some(el) = append(&a.document, &list, "div", "card") else {
                continue;
            };
            let id = card.id.to_string();
            let _ = el.set_attribute("data-id", &id);
            let _ = el.set_attribute("style", &format!("background-color: {}", card.color));

            if let Some(h) = append(&a.document, &el, "h3", "") {
                h.set_text_content(Some(&card.full_name()));
            }
            if let Some(p) = append(&a.document, &el, "p", "") {
                p.set_text_content(Some(&format!("Date: {}", card.created_on)));
            }
            if let Some(p) = append(&a.document, &el, "p", "calories-remaining") {
                p.set_text_content(Some(&format!(
                    "{} / {} kcal",
                    card.remaining_calories, card.initial_calories
                )));
            }
            if let Some(btn) = append(&a.document, &el, "button", "delete-btn") {
                let _ = btn.set_attribute("data-id", &id);
                btn.set_text_content(Some("Delete"));
            }
        }
    }

    /// Create a child element with an optional class
    fn append(document: &Document, parent: &Element, tag: &str, class: &str) -> Option<Element> {
        let el = document.create_element(tag).ok()?;
        if !class.is_empty() {
            el.set_class_name(class);
        }
        parent.append_child(&el).ok()?;
        Some(el)
    }

    fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
        document.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn show_detail(a: &App, view: &DetailView) {
        if let Some(el) = a.document.get_element_by_id("remainingCalories") {
            el.set_text_content(Some(&view.remaining.to_string()));
        }
        if let Some(bar) = html_element(&a.document, "calorieProgress") {
            let style = bar.style();
            let _ = style.set_property("width", &format!("{}%", view.percent()));
            let _ = style.set_property("background-color", view.level(&a.settings).css_color());
        }
    }

    fn set_modal_visible(document: &Document, visible: bool) {
        if let Some(modal) = html_element(document, MODAL_ID) {
            let display = if visible { "block" } else { "none" };
            let _ = modal.style().set_property("display", display);
        }
    }

    /// Toast that fades out after `notice_ms`
    fn notify(a: &App, notice: &Notice) {
        let Some(body) = a.document.body() else {
            return;
        };
        let Ok(el) = a.document.create_element("div") else {
            return;
        };
        el.set_class_name(&notice.class_name());
        el.set_text_content(Some(&notice.message));
        let _ = body.append_child(&el);

        let fade_ms = a.settings.notice_fade_ms as i32;
        let fade = Closure::once_into_js(move || {
            let _ = el.class_list().add_1("fade-out");
            let remove = Closure::once_into_js(move || el.remove());
            set_timeout(&remove, fade_ms);
        });
        set_timeout(&fade, a.settings.notice_ms as i32);
    }

    fn set_timeout(callback: &JsValue, ms: i32) {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                ms,
            );
        }
    }

    fn report(app: &Shared, err: &CardError) {
        if let Some(notice) = Notice::from_error(err) {
            notify(&app.borrow(), &notice);
        }
    }

    // === Form ===

    fn field_value(document: &Document, id: &str) -> String {
        let Some(el) = document.get_element_by_id(id) else {
            return String::new();
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return input.value();
        }
        if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            return select.value();
        }
        String::new()
    }

    fn read_form(document: &Document) -> CardForm {
        CardForm {
            first_name: field_value(document, "nombre"),
            last_name: field_value(document, "apellidos"),
            age: parse_int(&field_value(document, "edad")).and_then(|n| u32::try_from(n).ok()),
            gender: field_value(document, "genero"),
            initial_calories: parse_int(&field_value(document, "calorias")),
        }
    }

    fn setup_form(app: Shared) {
        let Some(form) = app.borrow().document.get_element_by_id("calorieForm") else {
            log::warn!("calorieForm not found");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            event.prevent_default();

            let result = {
                let mut a = app.borrow_mut();
                let input = read_form(&a.document);
                a.store.create(&input)
            };

            match result {
                Ok(_) => {
                    render_cards(&app);
                    reset_form(&app);
                    notify(&app.borrow(), &Notice::created());
                }
                Err(
                    e @ CardError::Validation(
                        ValidationError::CaloriesTooLow { .. }
                        | ValidationError::CaloriesTooHigh { .. },
                    ),
                ) => {
                    report(&app, &e);
                    if let Some(input) = html_element(&app.borrow().document, "calorias") {
                        let _ = input.focus();
                    }
                }
                Err(e @ CardError::Validation(_)) => report(&app, &e),
                Err(e) => {
                    // Card exists in memory even though it was not saved
                    render_cards(&app);
                    reset_form(&app);
                    report(&app, &e);
                }
            }
        });
        let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn reset_form(app: &Shared) {
        if let Some(form) = app
            .borrow()
            .document
            .get_element_by_id("calorieForm")
            .and_then(|f| f.dyn_into::<HtmlFormElement>().ok())
        {
            form.reset();
        }
    }

    // === Card list ===

    fn data_id(el: &Element) -> Option<CardId> {
        el.get_attribute("data-id")?.parse().ok()
    }

    /// One delegated click handler for every card and delete button
    fn setup_card_list(app: Shared) {
        let Some(list) = app.borrow().document.get_element_by_id("cardsList") else {
            log::warn!("cardsList not found");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if let Ok(Some(btn)) = target.closest(".delete-btn") {
                event.stop_propagation();
                if let Some(id) = data_id(&btn) {
                    delete_card(&app, id);
                }
                return;
            }
            if let Ok(Some(card)) = target.closest(".card") {
                if let Some(id) = data_id(&card) {
                    open_detail(&app, id);
                }
            }
        });
        let _ = list.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn delete_card(app: &Shared, id: CardId) {
        let result = app.borrow_mut().store.delete(id, &BrowserConfirm);

        match result {
            Ok(DeleteOutcome::Removed { closed_detail }) => {
                render_cards(app);
                let a = app.borrow();
                notify(&a, &Notice::deleted());
                if closed_detail {
                    set_modal_visible(&a.document, false);
                }
            }
            Ok(_) => {}
            Err(e) => {
                render_cards(app);
                {
                    let a = app.borrow();
                    if a.store.current().is_none() {
                        set_modal_visible(&a.document, false);
                    }
                }
                report(app, &e);
            }
        }
    }

    fn open_detail(app: &Shared, id: CardId) {
        let Some(view) = app.borrow_mut().store.open_detail(id) else {
            return;
        };
        let a = app.borrow();
        if let Some(title) = a.document.get_element_by_id("modalTitle") {
            title.set_text_content(Some(&view.title));
        }
        clear_subtract_input(&a.document);
        show_detail(&a, &view);
        set_modal_visible(&a.document, true);
    }

    // === Detail modal ===

    fn clear_subtract_input(document: &Document) {
        if let Some(input) = document
            .get_element_by_id("subtractAmount")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value("");
        }
    }

    /// Close without saving: roll back the open card
    fn close_detail(app: &Shared) {
        app.borrow_mut().store.discard();
        set_modal_visible(&app.borrow().document, false);
        render_cards(app);
    }

    fn setup_detail_modal(app: Shared) {
        let document = app.borrow().document.clone();

        // Subtract
        if let Some(btn) = document.get_element_by_id("subtractBtn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                let amount = parse_int(&field_value(&app.borrow().document, "subtractAmount"));
                let result = app.borrow_mut().store.subtract(amount);
                match result {
                    Ok(view) => {
                        let a = app.borrow();
                        show_detail(&a, &view);
                        clear_subtract_input(&a.document);
                        notify(&a, &Notice::subtracted(amount.unwrap_or_default()));
                    }
                    Err(e) => report(&app, &e),
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Save
        if let Some(btn) = document.get_element_by_id("saveBtn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                let result = app.borrow_mut().store.commit();
                render_cards(&app);
                set_modal_visible(&app.borrow().document, false);
                match result {
                    Ok(()) => notify(&app.borrow(), &Notice::saved()),
                    Err(e) => report(&app, &e),
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Close button
        if let Ok(Some(btn)) = document.query_selector(".close") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                close_detail(&app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click on the backdrop
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
                let on_backdrop = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .is_some_and(|el| el.id() == MODAL_ID);
                if on_backdrop {
                    close_detail(&app);
                }
            });
            let _ =
                window.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Calorie Cards (native) starting...");
    log::info!("The card UI runs in the browser - run with `trunk serve` for the web version");

    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session against an in-memory slot
#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use calorie_cards::platform::now_ms;
    use calorie_cards::{CardForm, CardStore, MemorySlot, Notice};

    let slot = MemorySlot::new();
    let mut store = CardStore::load(slot.clone(), now_ms() as u64);

    let form = CardForm {
        first_name: "Ana".into(),
        last_name: "Lopez".into(),
        age: Some(30),
        gender: "F".into(),
        initial_calories: Some(2000),
    };
    let id = match store.create(&form) {
        Ok(card) => card.id,
        Err(e) => {
            log::error!("Could not create demo card: {}", e);
            return;
        }
    };

    // Preview a subtraction, then throw it away
    store.open_detail(id);
    if let Err(e) = store.subtract(Some(300)) {
        log::warn!("{}", e);
    }
    store.discard();

    // Keep this one
    store.open_detail(id);
    if let Err(e) = store.subtract(Some(300)) {
        log::warn!("{}", e);
    }
    if let Err(e) = store.commit() {
        if let Some(notice) = Notice::from_error(&e) {
            println!("{}", notice.message);
        }
    }

    let reloaded = CardStore::load(slot, 0);
    println!("\nCards after reload:");
    for card in reloaded.list() {
        println!(
            "  {:<20} {}  {} / {} kcal",
            card.full_name(),
            card.created_on,
            card.remaining_calories,
            card.initial_calories
        );
    }
}
