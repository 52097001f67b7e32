use crate::errors::AppError;
use crate::models::{Dashboard, FilterOptions, FilterSelection};
use crate::state::AppState;
use crate::stats::build_dashboard;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use tracing::debug;

type QueryPairs = Query<Vec<(String, String)>>;

pub async fn index(State(state): State<AppState>, Query(pairs): QueryPairs) -> Html<String> {
    let selection = FilterSelection::from_query_pairs(pairs);
    Html(render_index(&dashboard_for(&state, &selection)))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Json<Dashboard> {
    let selection = FilterSelection::from_query_pairs(pairs);
    Json(dashboard_for(&state, &selection))
}

pub async fn post_dashboard(
    State(state): State<AppState>,
    Json(selection): Json<FilterSelection>,
) -> Result<Json<Dashboard>, AppError> {
    let options = FilterOptions::from_records(&state.dataset.records);
    check_known("city", &selection.cities, &options.cities)?;
    check_known("customer_type", &selection.customer_types, &options.customer_types)?;
    check_known("gender", &selection.genders, &options.genders)?;

    Ok(Json(dashboard_for(&state, &selection)))
}

pub async fn get_options(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(FilterOptions::from_records(&state.dataset.records))
}

fn dashboard_for(state: &AppState, selection: &FilterSelection) -> Dashboard {
    debug!(?selection, "building dashboard");
    build_dashboard(&state.dataset, selection, state.hour_window)
}

fn check_known(field: &str, selected: &[String], known: &[String]) -> Result<(), AppError> {
    match selected.iter().find(|value| !known.contains(value)) {
        Some(value) => Err(AppError::bad_request(format!(
            "unknown {field} '{value}'"
        ))),
        None => Ok(()),
    }
}
