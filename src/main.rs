mod components;
mod config;
mod state;
mod util;

use components::App;

fn main() {
    yew::Renderer::<App>::new().render();
}
