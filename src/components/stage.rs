//! Imperative bridge from the session's snapshot to the mounted DOM. All
//! layer elements are resolved once at mount; a missing one means the stage
//! cannot establish its invariants and the viewer refuses to start.

use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::state::{CORROSION_LAYERS, ViewSnapshot};

pub const CORROSION_LAYER_CLASSES: [&str; CORROSION_LAYERS] =
    ["corrosion-1", "corrosion-2", "corrosion-3"];

#[derive(Debug, Error)]
pub enum StageError {
    #[error("expected {expected} object groups in the stage, found {found}")]
    MissingGroups { expected: usize, found: usize },
    #[error("object group {group} is missing its `{layer}` layer")]
    MissingLayer { group: usize, layer: &'static str },
}

struct GroupBinding {
    root: HtmlElement,
    clean: HtmlElement,
    corrosion: [HtmlElement; CORROSION_LAYERS],
}

pub struct StageBinding {
    /// The transformed element; the object groups live inside it.
    container: HtmlElement,
    groups: Vec<GroupBinding>,
}

impl StageBinding {
    pub fn bind(container: &HtmlElement, object_count: usize) -> Result<Self, StageError> {
        let found = container.get_elements_by_class_name("object-group");
        if (found.length() as usize) < object_count {
            return Err(StageError::MissingGroups {
                expected: object_count,
                found: found.length() as usize,
            });
        }
        let mut groups = Vec::with_capacity(object_count);
        for index in 0..object_count {
            let root: HtmlElement = found
                .item(index as u32)
                .and_then(|el| el.dyn_into().ok())
                .ok_or(StageError::MissingGroups {
                    expected: object_count,
                    found: index,
                })?;
            let clean = layer(&root, index, "clean")?;
            let corrosion = [
                layer(&root, index, CORROSION_LAYER_CLASSES[0])?,
                layer(&root, index, CORROSION_LAYER_CLASSES[1])?,
                layer(&root, index, CORROSION_LAYER_CLASSES[2])?,
            ];
            groups.push(GroupBinding {
                root,
                clean,
                corrosion,
            });
        }
        Ok(Self {
            container: container.clone(),
            groups,
        })
    }

    /// Write one snapshot out: transform string, active-group class, and the
    /// per-layer opacity vector.
    pub fn apply(&self, snapshot: &ViewSnapshot<'_>) {
        let style = self.container.style();
        let _ = style.set_property("transform-origin", "50% 50%");
        let _ = style.set_property(
            "transform",
            &format!(
                "translate({}px, {}px) scale({})",
                snapshot.transform.translate_x, snapshot.transform.translate_y,
                snapshot.transform.zoom
            ),
        );
        for (index, group) in self.groups.iter().enumerate() {
            let classes = group.root.class_list();
            if index == snapshot.active_index {
                let _ = classes.add_1("active");
            } else {
                let _ = classes.remove_1("active");
            }
            let visibility = &snapshot.layers[index];
            set_opacity(&group.clean, visibility.clean);
            for (element, visible) in group.corrosion.iter().zip(visibility.corrosion) {
                set_opacity(element, visible);
            }
        }
    }
}

fn layer(root: &HtmlElement, group: usize, class: &'static str) -> Result<HtmlElement, StageError> {
    root.query_selector(&format!(".{class}"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into().ok())
        .ok_or(StageError::MissingLayer { group, layer: class })
}

fn set_opacity(element: &HtmlElement, visible: bool) {
    let _ = element
        .style()
        .set_property("opacity", if visible { "1" } else { "0" });
}
