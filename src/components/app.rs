use yew::prelude::*;

use super::viewer::{ObjectAssets, Viewer};

const NUM_OBJECTS: usize = 4;

fn default_objects() -> Vec<ObjectAssets> {
    (1..=NUM_OBJECTS)
        .map(|i| ObjectAssets {
            clean: format!("assets/object{i}/clean.png"),
            corrosion: [
                format!("assets/object{i}/corrosion1.png"),
                format!("assets/object{i}/corrosion2.png"),
                format!("assets/object{i}/corrosion3.png"),
            ],
        })
        .collect()
}

#[function_component(App)]
pub fn app() -> Html {
    html! {
        <Viewer objects={default_objects()} />
    }
}
