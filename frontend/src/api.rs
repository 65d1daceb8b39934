use crate::{Model, Msg};
use gloo_file::File as GlooFile;
use gloo_net::http::Request;
use shared::{AnalysisMode, ResultBundle};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::FormData;
use yew::html::Scope;

const ANALYZE_URL: &str = "/api/analyze";

fn js_error(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

fn build_form(file: &GlooFile, mode: AnalysisMode) -> Result<FormData, String> {
    let form_data = FormData::new().map_err(js_error)?;
    form_data
        .append_with_blob_and_filename("file", file.as_ref(), &file.name())
        .map_err(js_error)?;
    form_data
        .append_with_str("mode", mode.form_value())
        .map_err(js_error)?;
    if let Some(selection) = mode.selection() {
        form_data
            .append_with_str("selection", &selection.to_string())
            .map_err(js_error)?;
    }
    Ok(form_data)
}

async fn analyze(file: GlooFile, mode: AnalysisMode) -> Result<ResultBundle, String> {
    let form_data = build_form(&file, mode)?;
    let request = Request::post(ANALYZE_URL)
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?;

    let response = request
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Server error: {} - {}", status, body));
    }

    response
        .json::<ResultBundle>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

/// Posts the file to the backend and reports the outcome back to the component.
pub fn send_analysis_request(link: Scope<Model>, file: GlooFile, mode: AnalysisMode) {
    spawn_local(async move {
        match analyze(file, mode).await {
            Ok(bundle) => link.send_message(Msg::AnalysisComplete(bundle)),
            Err(message) => {
                log::error!("{}", message);
                link.send_message(Msg::AnalysisFailed(message));
            }
        }
    });
}
