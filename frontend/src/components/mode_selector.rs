use crate::{Model, Msg};
use shared::ManualSelection;
use yew::prelude::*;

pub fn render_mode_selector(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let disabled = model.session.is_analyzing();

    html! {
        <div class="mode-selector">
            <fieldset>
                <legend>{"Analysis Mode"}</legend>
                <label>
                    <input
                        type="radio"
                        name="mode"
                        checked={!model.manual}
                        {disabled}
                        onchange={link.callback(|_| Msg::SetManual(false))}
                    />
                    {" Auto"}
                </label>
                <label>
                    <input
                        type="radio"
                        name="mode"
                        checked={model.manual}
                        {disabled}
                        onchange={link.callback(|_| Msg::SetManual(true))}
                    />
                    {" Manual"}
                </label>
            </fieldset>
            {
                if model.manual {
                    render_selection(model, ctx, disabled)
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn render_selection(model: &Model, ctx: &Context<Model>, disabled: bool) -> Html {
    html! {
        <fieldset>
            <legend>{"Choose detection type"}</legend>
            { for ManualSelection::all().map(|selection| html! {
                <label>
                    <input
                        type="radio"
                        name="selection"
                        value={selection.to_string()}
                        checked={model.selection == selection}
                        {disabled}
                        onchange={ctx.link().callback(move |_| Msg::SetSelection(selection))}
                    />
                    { format!(" {}", selection.label()) }
                </label>
            }) }
        </fieldset>
    }
}
