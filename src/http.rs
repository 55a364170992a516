use axum::{
    extract::{RawQuery, State},
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::model::{round1, SnapshotCell};

#[derive(Clone)]
struct AppState {
    snapshot: SnapshotCell,
}

/// Routes mirror the device firmware's web surface. Serving is fully
/// decoupled from the acquisition cadence: a request arriving between
/// cycles is answered from the last published snapshot.
pub fn create_router(snapshot: SnapshotCell, has_humidity: bool) -> Router {
    let state = AppState { snapshot };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(index))
        .route("/temperature", get(temperature))
        .route("/json", get(json_view));
    if has_humidity {
        router = router.route("/humidity", get(humidity));
    }

    router.fallback(not_found).layer(cors).with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot.read().await;
    if !snapshot.ready {
        return warming_up();
    }

    let humidity_block = match snapshot.humidity {
        Some(humidity) => format!(
            "<div class=\"item\"><div class=\"value\">{:.1}<span class=\"unit\">%</span></div>\
             <div class=\"label\">Humidity</div></div>",
            humidity
        ),
        None => String::new(),
    };

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <meta http-equiv=\"refresh\" content=\"3\">\n\
         <title>Environmental Station</title>\n<style>\n\
         body {{ font-family: Arial, sans-serif; text-align: center; padding: 20px; }}\n\
         .row {{ display: flex; justify-content: space-around; margin: 20px 0; }}\n\
         .value {{ font-size: 48px; font-weight: bold; }}\n\
         .unit {{ font-size: 24px; }}\n\
         .label {{ font-size: 14px; color: #888; }}\n\
         .time {{ font-size: 24px; color: #666; }}\n\
         .date {{ font-size: 18px; color: #888; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>Environmental Station</h1>\n\
         <div class=\"date\">{}</div>\n<div class=\"time\">{}</div>\n\
         <div class=\"row\">\n\
         <div class=\"item\"><div class=\"value\">{:.1}<span class=\"unit\">&deg;C</span></div>\
         <div class=\"label\">Temperature</div></div>\n{}\n</div>\n\
         <div class=\"label\">Page refreshes every 3 seconds</div>\n\
         </body>\n</html>\n",
        snapshot.date, snapshot.time, snapshot.temperature, humidity_block
    ))
    .into_response()
}

async fn temperature(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot.read().await;
    if !snapshot.ready {
        return warming_up();
    }
    format!("{:.1}°C", snapshot.temperature).into_response()
}

async fn humidity(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot.read().await;
    if !snapshot.ready {
        return warming_up();
    }
    match snapshot.humidity {
        Some(humidity) => format!("{:.1}%", humidity).into_response(),
        None => (StatusCode::NOT_FOUND, "humidity not available").into_response(),
    }
}

async fn json_view(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot.read().await;
    if !snapshot.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "warming_up" })),
        )
            .into_response();
    }

    let mut body = json!({
        "temperature": round1(snapshot.temperature),
        "time": snapshot.time,
        "date": snapshot.date,
        "status": "ok",
    });
    if let Some(humidity) = snapshot.humidity {
        body["humidity"] = json!(round1(humidity));
    }
    Json(body).into_response()
}

/// Diagnostic 404 echoing what was asked, like the firmware's handler.
async fn not_found(method: Method, uri: Uri, RawQuery(query): RawQuery) -> Response {
    let mut message = format!("404 Not Found\n\nURI: {}\nMethod: {}\n", uri.path(), method);
    if let Some(query) = query {
        message.push_str(&format!("Arguments: {}\n", query));
    }
    (StatusCode::NOT_FOUND, message).into_response()
}

fn warming_up() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "warming up: no reading published yet",
    )
        .into_response()
}
