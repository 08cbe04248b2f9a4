//! WASM glue for the host page.
//!
//! Wires the DOM controls (ROM dropdown, play/stop button, status display) to
//! the Emscripten runtime module: configures the global `Module` object before
//! instantiation, relays its status callbacks, and drives the `load`, `main`,
//! and `stop` entry points. All state lives in an `Rc<RefCell<_>>` touched only
//! from the page event loop.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Date, Function, Object, Reflect, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    HtmlProgressElement, HtmlSelectElement, Window,
};

use crate::log::{LogCategory, RateLimiter};
use crate::module::{
    CallValue, ENTRY_LOAD, ENTRY_MAIN, ENTRY_STOP, ModuleCallError, ReturnKind, RuntimeModule,
};
use crate::rom::RomPayload;
use crate::session::{SelectionOutcome, Session, SessionError};
use crate::status::{SpinnerEffect, StatusState, StatusUpdate};
use crate::transport::TransportAction;
use crate::{log_info, log_info_limited, log_warn};

const STATUS_LOADING: &str = "Loading...";
const STATUS_FATAL: &str = "An error occurred in the window, reloading the page";

/// Delay before the page reloads after a fatal error.
const ERROR_RELOAD_DELAY_MS: i32 = 1000;

// Progress storms during instantiation would otherwise flood the console.
static STATUS_LOG_LIMIT: RateLimiter = RateLimiter::new(50);

/// Module entry point: installs the panic hook and wires the page.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    bootstrap()
}

/// Host-page controls, looked up once at startup.
struct Ui {
    progress: HtmlProgressElement,
    spinner: HtmlElement,
    play_button: HtmlButtonElement,
    status: Element,
    canvas: HtmlCanvasElement,
    dropdown: HtmlSelectElement,
}

impl Ui {
    fn from_document(document: &Document) -> Result<Ui, JsValue> {
        Ok(Ui {
            progress: lookup(document, "progress")?,
            spinner: lookup(document, "spinner")?,
            play_button: lookup(document, "play-button")?,
            status: lookup(document, "status")?,
            canvas: lookup(document, "canvas")?,
            dropdown: lookup(document, "rom-dropdown")?,
        })
    }
}

fn lookup<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

/// Handle to the Emscripten `Module` object and its `ccall` binding.
pub struct EmscriptenModule {
    object: Object,
    ccall: Function,
}

impl EmscriptenModule {
    /// Bind `ccall` on an initialized module object.
    fn bind(object: Object) -> Result<Self, ModuleCallError> {
        let ccall = Reflect::get(&object, &JsValue::from_str("ccall"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or(ModuleCallError::MissingCcall)?;
        Ok(EmscriptenModule { object, ccall })
    }

    /// Generic foreign call: entry point name, return kind, kind-tagged args.
    fn call(
        &self,
        entry: &str,
        ret: ReturnKind,
        args: &[CallValue],
    ) -> Result<JsValue, ModuleCallError> {
        let kinds = Array::new();
        let values = Array::new();
        for arg in args {
            kinds.push(&JsValue::from_str(arg.kind()));
            values.push(&match arg {
                CallValue::Number(n) => JsValue::from_f64(*n),
                CallValue::Str(s) => JsValue::from_str(s),
                CallValue::Bytes(b) => Uint8Array::from(*b).into(),
            });
        }
        let ret_tag = match ret.as_str() {
            Some(tag) => JsValue::from_str(tag),
            None => JsValue::NULL,
        };

        let call_args = Array::of4(&JsValue::from_str(entry), &ret_tag, &kinds, &values);
        self.ccall
            .apply(&self.object, &call_args)
            .map_err(|err| ModuleCallError::CallFailed {
                entry: entry.to_string(),
                message: describe_js_error(&err),
            })
    }
}

impl RuntimeModule for EmscriptenModule {
    fn load(&self, payload: &RomPayload) -> Result<(), ModuleCallError> {
        self.call(
            ENTRY_LOAD,
            ReturnKind::Void,
            &[CallValue::Bytes(payload.as_bytes())],
        )
        .map(|_| ())
    }

    fn main(&self) -> Result<(), ModuleCallError> {
        self.call(ENTRY_MAIN, ReturnKind::Void, &[]).map(|_| ())
    }

    fn stop(&self) -> Result<(), ModuleCallError> {
        self.call(ENTRY_STOP, ReturnKind::Void, &[]).map(|_| ())
    }
}

fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Bootstrap state shared by the event closures.
struct Bootstrap {
    ui: Ui,
    status: StatusState,
    // Absent until the runtime reports ready.
    session: Option<Session<EmscriptenModule>>,
}

type Shared = Rc<RefCell<Bootstrap>>;

/// Wire the page: status reporting, fatal-error handling, module handshake.
pub fn bootstrap() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let ui = Ui::from_document(&document)?;

    // The play control stays disabled until a payload has been loaded.
    ui.play_button.set_disabled(true);

    // Keep the drawing surface alive if the rendering context is lost.
    let prevent = Closure::wrap(Box::new(move |event: Event| {
        event.prevent_default();
    }) as Box<dyn FnMut(Event)>);
    ui.canvas
        .add_event_listener_with_callback("webglcontextlost", prevent.as_ref().unchecked_ref())?;
    prevent.forget();

    let shared: Shared = Rc::new(RefCell::new(Bootstrap {
        ui,
        status: StatusState::new(),
        session: None,
    }));

    report_status(&mut shared.borrow_mut(), STATUS_LOADING);
    install_error_handler(&shared, &window);
    configure_module(&shared, &window)?;

    Ok(())
}

/// Relay a status message through the reporter and on to the DOM.
fn report_status(boot: &mut Bootstrap, text: &str) {
    let now = Date::now();
    if let Some(update) = boot.status.update(text, now) {
        apply_status(&boot.ui, &update);
        log_info_limited!(LogCategory::Status, &STATUS_LOG_LIMIT, "{}", text);
    }
}

fn apply_status(ui: &Ui, update: &StatusUpdate) {
    match update {
        StatusUpdate::Progress { current, total, .. } => {
            ui.progress.set_value(*current);
            ui.progress.set_max(*total);
            ui.progress.set_hidden(false);
        }
        StatusUpdate::Text(_) => {
            let _ = ui.progress.remove_attribute("value");
            let _ = ui.progress.remove_attribute("max");
            ui.progress.set_hidden(true);
        }
    }

    match update.spinner_effect() {
        SpinnerEffect::Show => ui.spinner.set_hidden(false),
        SpinnerEffect::Hide => ui.spinner.set_hidden(true),
        SpinnerEffect::Leave => {}
    }

    ui.status.set_inner_html(update.display_text());
}

/// Any uncaught page error is fatal to the session: the module's internal
/// state cannot be resumed, so the only recovery is a cold restart.
fn install_error_handler(shared: &Shared, window: &Window) {
    let shared = Rc::clone(shared);
    let win = window.clone();
    let onerror = Closure::wrap(Box::new(move |_event: JsValue| {
        log_warn!(LogCategory::General, "uncaught error; restarting the page");
        fatal_error(&shared, &win);
    }) as Box<dyn FnMut(JsValue)>);
    window.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();
}

fn fatal_error(shared: &Shared, window: &Window) {
    {
        let mut boot = shared.borrow_mut();
        report_status(&mut boot, STATUS_FATAL);
        let _ = boot.ui.spinner.style().set_property("display", "none");
    }
    schedule_reload(window, ERROR_RELOAD_DELAY_MS);
}

/// Fire-and-forget reload timer. There is no cancellation path; a reload
/// supersedes any action that lands before the timer fires.
fn schedule_reload(window: &Window, delay_ms: i32) {
    let win = window.clone();
    let reload = Closure::wrap(Box::new(move || {
        let _ = win.location().reload();
    }) as Box<dyn FnMut()>);
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            reload.as_ref().unchecked_ref(),
            delay_ms,
        )
        .is_err()
    {
        // Timer refused; restart immediately rather than hang.
        let _ = window.location().reload();
    }
    reload.forget();
}

/// Pre-instantiation handshake with the Emscripten runtime: configure the
/// global `Module` object and register the ready callback.
fn configure_module(shared: &Shared, window: &Window) -> Result<(), JsValue> {
    let module = module_object()?;

    Reflect::set(&module, &"noInitialRun".into(), &JsValue::TRUE)?;
    {
        let boot = shared.borrow();
        Reflect::set(&module, &"canvas".into(), boot.ui.canvas.as_ref())?;
    }

    // Status callback invoked by the runtime during instantiation.
    let status_shared = Rc::clone(shared);
    let set_status = Closure::wrap(Box::new(move |text: String| {
        report_status(&mut status_shared.borrow_mut(), &text);
    }) as Box<dyn FnMut(String)>);
    Reflect::set(&module, &"setStatus".into(), set_status.as_ref())?;
    set_status.forget();

    // Ready callback: bind ccall, load the preselected ROM, wire the controls.
    let ready_shared = Rc::clone(shared);
    let win = window.clone();
    let module_for_ready = module.clone();
    let on_ready = Closure::wrap(Box::new(move || {
        on_runtime_initialized(&ready_shared, &win, &module_for_ready);
    }) as Box<dyn FnMut()>);
    Reflect::set(&module, &"onRuntimeInitialized".into(), on_ready.as_ref())?;
    on_ready.forget();

    Ok(())
}

/// The Emscripten `Module` global, created if the page has not defined it yet.
fn module_object() -> Result<Object, JsValue> {
    let global = js_sys::global();
    let existing = Reflect::get(&global, &"Module".into())?;
    match existing.dyn_into::<Object>() {
        Ok(object) => Ok(object),
        Err(_) => {
            let object = Object::new();
            Reflect::set(&global, &"Module".into(), &object)?;
            Ok(object)
        }
    }
}

fn on_runtime_initialized(shared: &Shared, window: &Window, module: &Object) {
    log_info!(LogCategory::General, "runtime initialized");

    let session = match EmscriptenModule::bind(module.clone()) {
        Ok(handle) => Session::new(handle),
        Err(err) => {
            log_warn!(LogCategory::Module, "{err}");
            fatal_error(shared, window);
            return;
        }
    };

    let selected = {
        let mut boot = shared.borrow_mut();
        boot.session = Some(session);
        boot.ui.dropdown.value()
    };
    handle_rom_selection(shared, window, &selected);

    wire_dropdown(shared, window);
    wire_play_button(shared, window);
}

/// Parse-and-load sequence shared by startup and the change handler.
fn handle_rom_selection(shared: &Shared, window: &Window, option_value: &str) {
    let mut boot = shared.borrow_mut();
    let outcome = match boot.session.as_mut() {
        Some(session) => session.select_rom(option_value),
        None => return,
    };

    match outcome {
        Ok(SelectionOutcome::Loaded) => {
            boot.ui.play_button.set_disabled(false);
            if let Some(payload) = boot.session.as_ref().and_then(|s| s.payload()) {
                log_info!(LogCategory::Rom, "loaded {}", payload.path());
            }
        }
        Ok(SelectionOutcome::Sentinel) => {}
        Err(SessionError::Rom(err)) => {
            // A bad option value is recoverable; keep the previous payload.
            log_warn!(LogCategory::Rom, "ignoring selection: {err}");
        }
        Err(err) => {
            log_warn!(LogCategory::Module, "{err}");
            drop(boot);
            fatal_error(shared, window);
        }
    }
}

fn wire_dropdown(shared: &Shared, window: &Window) {
    let dropdown = shared.borrow().ui.dropdown.clone();
    let shared_cb = Rc::clone(shared);
    let win = window.clone();
    let dropdown_cb = dropdown.clone();
    let onchange = Closure::wrap(Box::new(move |_event: Event| {
        let value = dropdown_cb.value();
        log_info!(LogCategory::Rom, "option selected: {}", value);
        handle_rom_selection(&shared_cb, &win, &value);
    }) as Box<dyn FnMut(Event)>);
    dropdown.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
}

fn wire_play_button(shared: &Shared, window: &Window) {
    let button = shared.borrow().ui.play_button.clone();
    let shared_cb = Rc::clone(shared);
    let win = window.clone();
    let onclick = Closure::wrap(Box::new(move || {
        handle_play_clicked(&shared_cb, &win);
    }) as Box<dyn FnMut()>);
    if button
        .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())
        .is_err()
    {
        log_warn!(LogCategory::General, "failed to attach the play handler");
    }
    onclick.forget();
}

fn handle_play_clicked(shared: &Shared, window: &Window) {
    let mut boot = shared.borrow_mut();
    let (result, label) = match boot.session.as_mut() {
        Some(session) => (session.toggle_transport(), session.button_label()),
        None => return,
    };

    match result {
        Ok(TransportAction::Start) => {
            boot.ui.play_button.set_inner_html(label);
            log_info!(LogCategory::General, "emulator started");
        }
        Ok(TransportAction::StopAndReload { delay_ms }) => {
            boot.ui.play_button.set_inner_html(label);
            log_info!(LogCategory::General, "emulator stopped; restarting the page");
            schedule_reload(window, delay_ms);
        }
        Err(SessionError::NoRomLoaded) => {
            // The control is disabled until a payload loads; ignore strays.
            log_warn!(LogCategory::General, "play activated with no ROM loaded");
        }
        Err(err) => {
            log_warn!(LogCategory::Module, "{err}");
            drop(boot);
            fatal_error(shared, window);
        }
    }
}
