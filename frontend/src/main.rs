mod api;
mod components;

use components::handlers;
use components::header::render_header;
use components::mode_selector::render_mode_selector;
use components::results::render_results;
use components::upload_section::render_upload_section;
use components::utils::render_error_message;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{AnalysisMode, ManualSelection, ResultBundle, SessionState};
use web_sys::DragEvent;
use yew::prelude::*;

// Models
struct SelectedFile {
    file: GlooFile,
    preview_url: ObjectUrl,
}

// Yew msg components
pub enum Msg {
    // File operations
    FileSelected(GlooFile),

    // Mode selection
    SetManual(bool),
    SetSelection(ManualSelection),

    // Analysis operations
    Analyze,
    AnalysisComplete(ResultBundle),
    AnalysisFailed(String),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),

    // Input events
    HandleDrop(DragEvent),
}

// Main component
pub struct Model {
    session: SessionState,
    file: Option<SelectedFile>,
    manual: bool,
    selection: ManualSelection,
    error: Option<String>,
    is_dragging: bool,
}

impl Model {
    fn analysis_mode(&self) -> AnalysisMode {
        if self.manual {
            AnalysisMode::Manual(self.selection)
        } else {
            AnalysisMode::Auto
        }
    }
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            session: SessionState::new(),
            file: None,
            manual: false,
            selection: ManualSelection::default(),
            error: None,
            is_dragging: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, file),

            Msg::SetManual(manual) => {
                self.manual = manual;
                true
            }
            Msg::SetSelection(selection) => {
                self.selection = selection;
                true
            }

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::AnalysisComplete(bundle) => handlers::handle_analysis_complete(self, bundle),
            Msg::AnalysisFailed(message) => handlers::handle_analysis_failed(self, message),

            Msg::SetError(error) => {
                self.error = error;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                { render_error_message(self) }

                <main class="main-content">
                    <section class="input-column">
                        { render_mode_selector(self, ctx) }
                        { render_upload_section(self, ctx) }
                    </section>
                    <section class="results-column">
                        { render_results(self) }
                    </section>
                </main>

                <footer class="app-footer">
                    <p>{"AI Image Classifier | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
