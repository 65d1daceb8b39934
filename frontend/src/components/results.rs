use crate::Model;
use shared::report::meter;
use shared::{
    consolidate, DetectorKind, DetectorPayload, DetectorResult, GeneratedReport, ResultBundle,
    TamperedReport,
};
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    match model.session.current_bundle() {
        Some(bundle) if bundle.mode.is_auto() => render_auto(bundle),
        Some(bundle) => render_manual(bundle),
        None if model.session.is_analyzing() => html! {
            <p class="caption">{"Waiting for the detectors..."}</p>
        },
        None => html! {},
    }
}

fn render_meter(value: f64) -> Html {
    let percent = meter(value) * 100.0;
    html! {
        <div class="meter" title={format!("{:.1}%", percent)}>
            <div class="meter-fill" style={format!("width: {}%", percent)}></div>
        </div>
    }
}

fn render_auto(bundle: &ResultBundle) -> Html {
    let verdict = consolidate(bundle);
    let banner = if verdict.is_tampered_or_generated {
        html! { <div class="verdict ai">{"AI-TAMPERED / AI-GENERATED"}</div> }
    } else {
        html! { <div class="verdict real">{"REAL IMAGE"}</div> }
    };

    html! {
        <>
            <div class="auto-result-card">
                <h2>{"Result:"}</h2>
                { banner }
                { render_meter(verdict.confidence) }
                {
                    if verdict.reasons.is_empty() {
                        html! {}
                    } else {
                        html! {
                            <>
                                <strong>{"Reasons:"}</strong>
                                <ul>
                                    { for verdict.reasons.iter().map(|reason| html! { <li>{ reason }</li> }) }
                                </ul>
                            </>
                        }
                    }
                }
            </div>

            <details>
                <summary>{"View Detailed Breakdown"}</summary>
                <div class="result-columns">
                    <div>
                        <h4>{ DetectorKind::Tampered.label() }</h4>
                        {
                            match success(bundle, DetectorKind::Tampered) {
                                Some(payload) => render_tampered_summary(payload, false),
                                None => html! { <p class="detector-error">{"Error in tampered detection"}</p> },
                            }
                        }
                    </div>
                    <div>
                        <h4>{ DetectorKind::Generated.label() }</h4>
                        {
                            match success(bundle, DetectorKind::Generated) {
                                Some(payload) => render_generated_summary(payload, false),
                                None => html! { <p class="detector-error">{"Error in generated detection"}</p> },
                            }
                        }
                    </div>
                </div>
            </details>
        </>
    }
}

fn success(bundle: &ResultBundle, kind: DetectorKind) -> Option<&DetectorPayload> {
    bundle.result(kind).and_then(DetectorResult::payload)
}

fn render_tampered_summary(payload: &DetectorPayload, with_probability: bool) -> Html {
    let report = TamperedReport::from(payload);
    html! {
        <>
            {
                match report.forged_label() {
                    Some(label) => html! { <p><strong>{"Forged: "}</strong>{ label }</p> },
                    None => html! {},
                }
            }
            {
                match report.probability {
                    Some(probability) => html! {
                        <>
                            { if with_probability {
                                html! { <p><strong>{"Probability: "}</strong>{ format!("{:.4}", probability) }</p> }
                            } else {
                                html! {}
                            } }
                            { render_meter(probability) }
                        </>
                    },
                    None => html! {},
                }
            }
            <p class="caption">{ format!("Model: {}", report.model) }</p>
        </>
    }
}

fn render_generated_summary(payload: &DetectorPayload, with_sources: bool) -> Html {
    let report = GeneratedReport::from(payload);
    html! {
        <>
            <p><strong>{"Prediction: "}</strong><code>{ &report.final_prediction }</code></p>
            {
                match report.p_synth {
                    Some(p_synth) => html! {
                        <>
                            { if with_sources {
                                html! { <p><strong>{"Synthetic Probability: "}</strong>{ format!("{:.4}", p_synth) }</p> }
                            } else {
                                html! {}
                            } }
                            { render_meter(p_synth) }
                        </>
                    },
                    None => html! {},
                }
            }
            {
                if with_sources {
                    html! {
                        <>
                            <p class="caption">{ format!("AI by Model: {}", report.ai_by_model) }</p>
                            <p class="caption">{ format!("AI by EXIF: {}", report.ai_by_exif) }</p>
                            <p class="caption">{ format!("AI by C2PA: {}", report.ai_by_c2pa) }</p>
                        </>
                    }
                } else {
                    html! {}
                }
            }
        </>
    }
}

fn render_manual(bundle: &ResultBundle) -> Html {
    let cards: Vec<(DetectorKind, &DetectorResult)> = [DetectorKind::Tampered, DetectorKind::Generated]
        .into_iter()
        .filter_map(|kind| bundle.result(kind).map(|result| (kind, result)))
        .collect();

    html! {
        <div class="manual-results">
            <h3>{"Analysis Results"}</h3>
            <div class={classes!((cards.len() > 1).then_some("result-columns"))}>
                { for cards.into_iter().map(|(kind, result)| render_detector_card(kind, result)) }
            </div>
        </div>
    }
}

fn render_detector_card(kind: DetectorKind, result: &DetectorResult) -> Html {
    let body = match result {
        DetectorResult::Success(payload) => {
            let summary = match kind {
                DetectorKind::Tampered => render_tampered_summary(payload, true),
                DetectorKind::Generated => render_generated_summary(payload, true),
            };
            let raw = serde_json::to_string_pretty(payload).unwrap_or_default();
            html! {
                <>
                    { summary }
                    <details>
                        <summary>{"View Raw JSON"}</summary>
                        <pre class="raw-json">{ raw }</pre>
                    </details>
                </>
            }
        }
        DetectorResult::Failure(message) => html! {
            <p class="detector-error">{ format!("Error: {}", message) }</p>
        },
    };

    html! {
        <div class="result-card">
            <h4>{ kind.label() }</h4>
            { body }
        </div>
    }
}
