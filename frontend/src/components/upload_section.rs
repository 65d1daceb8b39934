use crate::components::utils::{debounce, first_supported_image, ACCEPT_ATTR};
use crate::{Model, Msg};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    html! {
        <div class="upload-section">
            { render_file_input_area(model, ctx) }
            { render_preview(model) }
            { render_analyze_button(model, ctx) }
        </div>
    }
}

fn trigger_file_input() {
    let input = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("file-input"))
        .and_then(|element| element.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(input) = input {
        input.click();
    }
}

fn render_file_input_area(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let handle_change = link.callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input.files().as_ref().and_then(first_supported_image);
        input.set_value("");

        match file {
            Some(file) => Msg::FileSelected(file),
            None => Msg::SetError(Some("Please choose a JPG or PNG image.".into())),
        }
    });

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    html! {
        <>
            <input
                type="file"
                id="file-input"
                accept={ACCEPT_ATTR}
                style="display: none;"
                onchange={handle_change}
            />

            <button
                id="upload-button"
                class="analyze-btn"
                disabled={model.session.is_analyzing()}
                onclick={debounce(300, trigger_file_input)}
            >
                <i class="fa-solid fa-upload"></i> {" Choose an image"}
            </button>

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={link.callback(Msg::HandleDrop)}
                onclick={debounce(300, trigger_file_input)}
            >
                <div class="upload-placeholder">
                    <i class="fa-solid fa-cloud-arrow-up"></i>
                    <p>{"Drag & drop an image here, or click"}</p>
                    <p class="file-types">{"Supported formats: JPG, JPEG, PNG"}</p>
                </div>
            </div>
        </>
    }
}

fn render_preview(model: &Model) -> Html {
    match &model.file {
        Some(selected) => html! {
            <div class="selected-image-preview">
                <img
                    src={selected.preview_url.to_string()}
                    alt={selected.file.name()}
                    class="image-preview"
                />
                <p class="caption">{"Uploaded Image"}</p>
            </div>
        },
        None => html! {},
    }
}

fn render_analyze_button(model: &Model, ctx: &Context<Model>) -> Html {
    let analyzing = model.session.is_analyzing();
    let content = if analyzing {
        html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</> }
    } else {
        html! { <><i class="fa-solid fa-magnifying-glass"></i>{" Analyze"}</> }
    };

    html! {
        <button
            class="analyze-btn"
            disabled={analyzing || model.file.is_none()}
            onclick={ctx.link().callback(|_| Msg::Analyze)}
        >
            { content }
        </button>
    }
}
