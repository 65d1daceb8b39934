use crate::api::send_analysis_request;
use crate::components::utils::{first_supported_image, is_supported_image};
use crate::{Model, Msg, SelectedFile};
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{ResultBundle, SessionError};
use web_sys::DragEvent;
use yew::prelude::*;

pub fn handle_file_selected(model: &mut Model, file: GlooFile) -> bool {
    let name = file.name();
    if !is_supported_image(&name) {
        model.error = Some(format!("Unsupported file type: {}. Use JPG or PNG.", name));
        return true;
    }

    if model.session.on_file_selected(&name) {
        log::info!("Selected new file {}", name);
    }
    model.error = None;

    let preview_url = ObjectUrl::from(file.clone());
    model.file = Some(SelectedFile { file, preview_url });
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(selected) = &model.file else {
        model.error = Some(SessionError::NoFile.to_string());
        return true;
    };

    match model.session.begin_analysis() {
        Ok(()) => {
            model.error = None;
            let mode = model.analysis_mode();
            log::info!("Analyzing {} in {:?}", selected.file.name(), mode);
            send_analysis_request(ctx.link().clone(), selected.file.clone(), mode);
            true
        }
        Err(SessionError::AnalysisInProgress) => false,
        Err(e) => {
            model.error = Some(e.to_string());
            true
        }
    }
}

pub fn handle_analysis_complete(model: &mut Model, bundle: ResultBundle) -> bool {
    let file_name = bundle.file_name.clone();
    if !model.session.on_analysis_complete(bundle) {
        log::warn!("Discarded results for {}; a different file is selected", file_name);
    }
    true
}

pub fn handle_analysis_failed(model: &mut Model, message: String) -> bool {
    model.session.on_analysis_failed();
    model.error = Some(message);
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    let file_list = event.data_transfer().and_then(|dt| dt.files());
    match file_list.as_ref().and_then(first_supported_image) {
        Some(file) => ctx.link().send_message(Msg::FileSelected(file)),
        None => ctx
            .link()
            .send_message(Msg::SetError(Some("No JPG or PNG image was dropped.".into()))),
    }

    true
}
