//! Data-table configuration.

use axum::{Json, Router, extract::Path, routing::get};

use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::state::AppState;
use crate::tables::{DataTableConfig, table_config};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/tables/{table_id}", get(show))
}

async fn show(
    RequireTenant(_tenant): RequireTenant,
    Path(table_id): Path<String>,
) -> Result<Json<DataTableConfig>, AppError> {
    table_config(&table_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("table {table_id}")))
}
