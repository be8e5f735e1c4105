use axum::extract::{Query, State};
use axum::response::Html;

use crate::flash::FlashQuery;
use crate::page;
use crate::state::AppState;

/// GET / - the upload form.
pub async fn index(State(state): State<AppState>, Query(query): Query<FlashQuery>) -> Html<String> {
    let flash = query.into_flash();
    Html(page::index(
        &state.config().ocr.default_language,
        flash.as_ref(),
    ))
}
