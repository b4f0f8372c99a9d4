//! SEO checklist scoring.

use axum::{Json, Router, routing::post};

use crate::middleware::auth::RequireTenant;
use crate::seo::checklist::{self, Checklist, ChecklistInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/seo/checklist", post(evaluate))
}

async fn evaluate(
    RequireTenant(_tenant): RequireTenant,
    Json(input): Json<ChecklistInput>,
) -> Json<Checklist> {
    Json(checklist::evaluate(&input))
}
