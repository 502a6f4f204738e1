use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct GlitchOverlayProps {
    pub active: bool,
}

/// Full-stage overlay toggled for the duration of a glitch transition. Its
/// actual look lives in the host page's stylesheet; this component only
/// drives the `glitching` class.
#[function_component(GlitchOverlay)]
pub fn glitch_overlay(props: &GlitchOverlayProps) -> Html {
    let class = classes!("glitch-overlay", props.active.then_some("glitching"));
    html! {
        <div {class} style="position:absolute; inset:0; pointer-events:none;"></div>
    }
}
