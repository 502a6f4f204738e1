//! DOM side of the viewer: renders the stage markup, wires the raw
//! wheel/mouse/touch listeners into the session, and backs the timer port
//! with real browser timeouts. All listener closures share one session via
//! `Rc<RefCell<_>>` and re-apply the snapshot at the end of each turn.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, DomRect, HtmlElement, MouseEvent, TouchEvent, TouchList, WheelEvent};
use yew::prelude::*;

use super::glitch_overlay::GlitchOverlay;
use super::stage::{CORROSION_LAYER_CLASSES, StageBinding};
use crate::config::ViewerConfig;
use crate::state::{Point, TimerHandle, TimerKind, TimerPort, ViewerSession};
use crate::util::clog;

/// Image sources for one object in the rotation; resolving/creating these is
/// the caller's concern.
#[derive(Clone, PartialEq)]
pub struct ObjectAssets {
    pub clean: String,
    pub corrosion: [String; 3],
}

#[derive(Properties, PartialEq, Clone)]
pub struct ViewerProps {
    pub objects: Vec<ObjectAssets>,
    #[prop_or_default]
    pub config: ViewerConfig,
}

type SharedSession = Rc<RefCell<ViewerSession>>;
type SharedTimers = Rc<RefCell<BrowserTimers>>;

/// Browser implementation of the timer port: a single `Timeout` slot whose
/// replacement or drop clears the underlying browser timer. Fired callbacks
/// re-enter the session through weak handles so a torn-down viewer turns
/// late timers into no-ops.
struct BrowserTimers {
    next_handle: TimerHandle,
    active: Option<(TimerHandle, Timeout)>,
    session: Weak<RefCell<ViewerSession>>,
    this: Weak<RefCell<BrowserTimers>>,
    stage: Weak<StageBinding>,
    glitch_ui: UseStateHandle<bool>,
}

impl BrowserTimers {
    fn new(
        session: Weak<RefCell<ViewerSession>>,
        stage: Weak<StageBinding>,
        glitch_ui: UseStateHandle<bool>,
    ) -> SharedTimers {
        let timers = Rc::new(RefCell::new(Self {
            next_handle: 1,
            active: None,
            session,
            this: Weak::new(),
            stage,
            glitch_ui,
        }));
        timers.borrow_mut().this = Rc::downgrade(&timers);
        timers
    }
}

impl TimerPort for BrowserTimers {
    fn schedule(&mut self, delay_ms: u32, kind: TimerKind) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);

        let session = self.session.clone();
        let timers = self.this.clone();
        let stage = self.stage.clone();
        let glitch_ui = self.glitch_ui.clone();
        let timeout = Timeout::new(delay_ms, move || {
            let (Some(session), Some(timers)) = (session.upgrade(), timers.upgrade()) else {
                return;
            };
            {
                let mut state = session.borrow_mut();
                let mut port = timers.borrow_mut();
                port.active = None;
                match kind {
                    TimerKind::Hold => state.on_hold_elapsed(&mut *port),
                    TimerKind::Glitch => state.on_glitch_elapsed(&mut *port),
                }
            }
            if let Some(stage) = stage.upgrade() {
                let state = session.borrow();
                stage.apply(&state.snapshot());
                glitch_ui.set(state.glitch_active());
            }
        });
        // Replacing the slot drops (= clears) whatever was pending.
        self.active = Some((handle, timeout));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.active.as_ref().is_some_and(|(h, _)| *h == handle) {
            self.active = None;
        }
    }
}

/// Run one session operation, then push the resulting snapshot to the DOM.
fn dispatch(
    session: &SharedSession,
    timers: &SharedTimers,
    stage: &Rc<StageBinding>,
    glitch_ui: &UseStateHandle<bool>,
    op: impl FnOnce(&mut ViewerSession, &mut BrowserTimers),
) {
    {
        let mut state = session.borrow_mut();
        let mut port = timers.borrow_mut();
        op(&mut state, &mut port);
    }
    let state = session.borrow();
    stage.apply(&state.snapshot());
    if **glitch_ui != state.glitch_active() {
        glitch_ui.set(state.glitch_active());
    }
}

fn touch_points(list: &TouchList, origin: &DomRect) -> Vec<Point> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|touch| Point {
            x: touch.client_x() as f64 - origin.left(),
            y: touch.client_y() as f64 - origin.top(),
        })
        .collect()
}

#[function_component(Viewer)]
pub fn viewer(props: &ViewerProps) -> Html {
    let stage_ref = use_node_ref();
    let container_ref = use_node_ref();
    let glitch_active = use_state(|| false);

    {
        let stage_ref = stage_ref.clone();
        let container_ref = container_ref.clone();
        let glitch_handle = glitch_active.clone();
        let config = props.config.clone();
        let object_count = props.objects.len();
        use_effect_with((), move |_| {
            let stage: HtmlElement = stage_ref.cast().expect("stage element");
            let container: HtmlElement = container_ref.cast().expect("image container");
            let window = web_sys::window().expect("window");

            // Both failures mean the viewer cannot establish its invariants;
            // refuse to start rather than run half-initialized.
            let session = ViewerSession::new(config, object_count)
                .unwrap_or_else(|err| panic!("viewer refused to start: {err}"));
            let session = Rc::new(RefCell::new(session));
            let stage_binding = Rc::new(
                StageBinding::bind(&container, object_count)
                    .unwrap_or_else(|err| panic!("viewer refused to start: {err}")),
            );
            let timers = BrowserTimers::new(
                Rc::downgrade(&session),
                Rc::downgrade(&stage_binding),
                glitch_handle.clone(),
            );
            stage_binding.apply(&session.borrow().snapshot());
            clog("corrosion viewer initialized");

            let nonpassive = AddEventListenerOptions::new();
            nonpassive.set_passive(false);

            // Wheel zoom
            let wheel_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                Closure::wrap(Box::new(move |e: WheelEvent| {
                    e.prevent_default();
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_wheel(e.delta_y(), t)
                    });
                }) as Box<dyn FnMut(_)>)
            };
            stage
                .add_event_listener_with_callback_and_add_event_listener_options(
                    "wheel",
                    wheel_cb.as_ref().unchecked_ref(),
                    &nonpassive,
                )
                .expect("wheel listener");

            // Mouse drag
            let mousedown_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                let stage_el = stage.clone();
                Closure::wrap(Box::new(move |e: MouseEvent| {
                    let rect = stage_el.get_bounding_client_rect();
                    let point = Point {
                        x: e.client_x() as f64 - rect.left(),
                        y: e.client_y() as f64 - rect.top(),
                    };
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_pointer_down(point, e.button() == 0, t)
                    });
                    if session.borrow().is_dragging() {
                        let _ = stage_el.style().set_property("cursor", "grabbing");
                    }
                }) as Box<dyn FnMut(_)>)
            };
            stage
                .add_event_listener_with_callback("mousedown", mousedown_cb.as_ref().unchecked_ref())
                .expect("mousedown listener");

            let mousemove_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                let stage_el = stage.clone();
                Closure::wrap(Box::new(move |e: MouseEvent| {
                    if !session.borrow().is_dragging() {
                        return;
                    }
                    let rect = stage_el.get_bounding_client_rect();
                    let point = Point {
                        x: e.client_x() as f64 - rect.left(),
                        y: e.client_y() as f64 - rect.top(),
                    };
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, _t| {
                        s.on_pointer_move(point)
                    });
                }) as Box<dyn FnMut(_)>)
            };
            // Move/up attach at window level so a drag released outside the
            // viewport still commits instead of leaving the session dragging.
            window
                .add_event_listener_with_callback("mousemove", mousemove_cb.as_ref().unchecked_ref())
                .expect("mousemove listener");

            let mouseup_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                let stage_el = stage.clone();
                Closure::wrap(Box::new(move |_e: MouseEvent| {
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_pointer_up(t)
                    });
                    let _ = stage_el.style().set_property("cursor", "grab");
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("mouseup", mouseup_cb.as_ref().unchecked_ref())
                .expect("mouseup listener");

            // Touch drag + pinch
            let touchstart_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                let stage_el = stage.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let rect = stage_el.get_bounding_client_rect();
                    let points = touch_points(&e.touches(), &rect);
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_touch_start(&points, t)
                    });
                }) as Box<dyn FnMut(_)>)
            };
            stage
                .add_event_listener_with_callback(
                    "touchstart",
                    touchstart_cb.as_ref().unchecked_ref(),
                )
                .expect("touchstart listener");

            let touchmove_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                let stage_el = stage.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    // Suppress native scrolling while a gesture is active.
                    if session.borrow().gesture_active() {
                        e.prevent_default();
                    }
                    let rect = stage_el.get_bounding_client_rect();
                    let points = touch_points(&e.touches(), &rect);
                    let center = Point {
                        x: rect.width() / 2.0,
                        y: rect.height() / 2.0,
                    };
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_touch_move(&points, center, t)
                    });
                }) as Box<dyn FnMut(_)>)
            };
            stage
                .add_event_listener_with_callback_and_add_event_listener_options(
                    "touchmove",
                    touchmove_cb.as_ref().unchecked_ref(),
                    &nonpassive,
                )
                .expect("touchmove listener");

            let touchend_cb = {
                let session = session.clone();
                let timers = timers.clone();
                let stage_binding = stage_binding.clone();
                let glitch_ui = glitch_handle.clone();
                Closure::wrap(Box::new(move |_e: TouchEvent| {
                    dispatch(&session, &timers, &stage_binding, &glitch_ui, |s, t| {
                        s.on_touch_end(t)
                    });
                }) as Box<dyn FnMut(_)>)
            };
            stage
                .add_event_listener_with_callback("touchend", touchend_cb.as_ref().unchecked_ref())
                .expect("touchend listener");
            stage
                .add_event_listener_with_callback(
                    "touchcancel",
                    touchend_cb.as_ref().unchecked_ref(),
                )
                .expect("touchcancel listener");

            // Cleanup: detach everything and drop the closures.
            move || {
                let _ = stage.remove_event_listener_with_callback(
                    "wheel",
                    wheel_cb.as_ref().unchecked_ref(),
                );
                let _ = stage.remove_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                );
                let _ = window.remove_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                );
                let _ = window.remove_event_listener_with_callback(
                    "mouseup",
                    mouseup_cb.as_ref().unchecked_ref(),
                );
                let _ = stage.remove_event_listener_with_callback(
                    "touchstart",
                    touchstart_cb.as_ref().unchecked_ref(),
                );
                let _ = stage.remove_event_listener_with_callback(
                    "touchmove",
                    touchmove_cb.as_ref().unchecked_ref(),
                );
                let _ = stage.remove_event_listener_with_callback(
                    "touchend",
                    touchend_cb.as_ref().unchecked_ref(),
                );
                let _ = stage.remove_event_listener_with_callback(
                    "touchcancel",
                    touchend_cb.as_ref().unchecked_ref(),
                );
                drop(timers);
            }
        });
    }

    let layer_style = "position:absolute; inset:0; width:100%; height:100%; object-fit:contain; opacity:0;";
    let groups = props.objects.iter().map(|object| {
        html! {
            <div class="object-group" style="position:absolute; inset:0;">
                <img class="clean" src={object.clean.clone()} draggable="false" style={layer_style} />
                {
                    for object.corrosion.iter().zip(CORROSION_LAYER_CLASSES).map(|(src, class)| html! {
                        <img {class} src={src.clone()} draggable="false" style={layer_style} />
                    })
                }
            </div>
        }
    });

    html! {
        <div
            ref={stage_ref}
            class="viewer-stage"
            style="position:relative; width:100vw; height:100vh; overflow:hidden; background:#000; cursor:grab; touch-action:none;"
        >
            <div ref={container_ref} class="image-container" style="position:absolute; inset:0;">
                { for groups }
            </div>
            <GlitchOverlay active={*glitch_active} />
        </div>
    }
}
