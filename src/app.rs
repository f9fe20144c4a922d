use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::engine;
use crate::error::GridError;
use crate::registry::TableRegistry;
use crate::request::RequestData;

pub struct AppState {
    registry: &'static TableRegistry,
    config: ServerConfig,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct TableInfo {
    id: String,
    rows: usize,
    columns: usize,
}

/// Build the router serving grid requests out of `registry`
pub fn router(registry: &'static TableRegistry, config: ServerConfig) -> Router {
    let app_state = Arc::new(AppState { registry, config });

    Router::new()
        .route("/", get(serve_grid_page))
        .route("/ajax/datatables", get(grid_query).post(grid_json))
        .route("/api/tables", get(list_tables))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Serve grid requests until the process is stopped
///
/// # Arguments
/// * `config` - Bind address and request settings
/// * `registry` - Tables to serve
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
pub async fn run(config: ServerConfig, registry: &'static TableRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind.clone();
    let app = router(registry, config);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_grid_page() -> Html<&'static str> {
    Html(include_str!("./static/grid.html"))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}

fn grid_error_response(err: GridError) -> Response {
    let status = match err {
        GridError::TableNotFound(_) => StatusCode::NOT_FOUND,
        GridError::InvalidParameter { .. } | GridError::InvalidSearchPattern { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

/// Run the engine on the blocking pool; sorting a large table must not
/// stall the runtime's worker threads
async fn answer(state: Arc<AppState>, table_id: Option<String>, request: RequestData) -> Response {
    let Some(table_id) = table_id.filter(|id| !id.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("missing parameter {}", state.config.object_param),
        );
    };

    let outcome = tokio::task::spawn_blocking(move || {
        engine::handle_request(state.registry, &table_id, &request)
    })
    .await;

    match outcome {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(err)) => grid_error_response(err),
        Err(err) => {
            log::error!("Grid request task failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn table_id_of(value: Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

async fn grid_query(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = match RequestData::from_params(&params) {
        Ok(request) => request,
        Err(err) => return grid_error_response(err),
    };
    let table_id = params.get(&state.config.object_param).cloned();
    answer(state, table_id, request).await
}

/// The JSON body carries the table id under the configured parameter
/// name, next to the usual request fields
async fn grid_json(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<Map<String, Value>>,
) -> Response {
    let table_id = body
        .remove(&state.config.object_param)
        .and_then(table_id_of)
        .or_else(|| params.get(&state.config.object_param).cloned());
    let request = match serde_json::from_value::<RequestData>(Value::Object(body)) {
        Ok(request) => request,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };
    answer(state, table_id, request).await
}

async fn list_tables(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tables: Vec<TableInfo> = state
        .registry
        .ids()
        .into_iter()
        .filter_map(|id| {
            let table = state.registry.get(&id)?;
            Some(TableInfo {
                id,
                rows: table.row_count(),
                columns: table.column_count(),
            })
        })
        .collect();

    Json(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Node;
    use crate::row::RowSpec;
    use crate::server_data::ServerData;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_registry() -> &'static TableRegistry {
        let registry: &'static TableRegistry = Box::leak(Box::new(TableRegistry::new()));
        let fruit = ServerData::builder(2)
            .rows([
                RowSpec::from_texts(["red", "apple"]).with_id("R1"),
                RowSpec::from_texts(["red", "car"]).with_id("R2"),
                RowSpec::from_texts(["blue", "apple"]).with_id("R3"),
            ])
            .build()
            .unwrap();
        registry.register("fruit", fruit);
        let broken = ServerData::builder(1)
            .row(RowSpec::new(vec![vec![Node::element("not a tag")]]))
            .build()
            .unwrap();
        registry.register("broken", broken);
        registry
    }

    fn test_app(config: ServerConfig) -> Router {
        router(test_registry(), config)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let uri = "/ajax/datatables?object=fruit&draw=5&start=0&length=2&search%5Bvalue%5D=red\
                   &order%5B0%5D%5Bcolumn%5D=1&order%5B0%5D%5Bdir%5D=desc";
        let (status, json) = send(test_app(ServerConfig::default()), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["draw"], 5);
        assert_eq!(json["recordsTotal"], 3);
        assert_eq!(json["recordsFiltered"], 2);
        assert_eq!(json["data"][0]["DT_RowId"], "R2");
        assert_eq!(json["data"][1]["DT_RowId"], "R1");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (status, json) = send(test_app(ServerConfig::default()), get("/ajax/datatables?object=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");

        let (status, _) = send(test_app(ServerConfig::default()), get("/ajax/datatables?draw=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(test_app(ServerConfig::default()), get("/ajax/datatables?object=fruit&draw=x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(test_app(ServerConfig::default()), get("/ajax/datatables?object=broken")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn test_json_body() {
        let body = serde_json::json!({
            "object": "fruit",
            "draw": 8,
            "start": -4,
            "length": 10,
            "search": { "value": "apple", "regex": false }
        });
        let (status, json) = send(test_app(ServerConfig::default()), post_json("/ajax/datatables", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["draw"], 8);
        assert_eq!(json["recordsFiltered"], 2);

        let (status, _) = send(
            test_app(ServerConfig::default()),
            post_json("/ajax/datatables?object=fruit", serde_json::json!({ "draw": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            test_app(ServerConfig::default()),
            post_json("/ajax/datatables", serde_json::json!({ "object": "fruit", "draw": "many" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_renamed_table_parameter() {
        let config = ServerConfig {
            object_param: "table".to_string(),
            ..Default::default()
        };
        let (status, json) = send(test_app(config.clone()), get("/ajax/datatables?table=fruit")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recordsTotal"], 3);

        let body = serde_json::json!({ "table": "fruit", "draw": 2 });
        let (status, json) = send(test_app(config.clone()), post_json("/ajax/datatables", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["draw"], 2);

        let (status, _) = send(test_app(config), get("/ajax/datatables?object=fruit")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_tables() {
        let (status, json) = send(test_app(ServerConfig::default()), get("/api/tables")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], "broken");
        assert_eq!(json[1]["id"], "fruit");
        assert_eq!(json[1]["rows"], 3);
        assert_eq!(json[1]["columns"], 2);
    }
}
