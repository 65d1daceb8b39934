use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-magnifying-glass"></i> {" AI Image Classifier"}</h1>
            <p class="subtitle">
                {"Check an image for AI tampering and AI generation"}
            </p>
        </header>
    }
}
