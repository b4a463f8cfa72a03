use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use crate::room_manager::RoomManager;
use crate::websocket::ConnectionManager;
use battle_core::ScoringEngine;
use battle_types::{DifficultyMetadata, DifficultyTier, RoomSettings};

pub mod config;
pub mod dataset;
pub mod room_manager;
pub mod websocket;

#[derive(Deserialize)]
struct CreateRoomRequest {
    settings: Option<RoomSettings>,
}

#[derive(Deserialize)]
struct ScoreRequest {
    target: String,
    attempt: String,
    difficulty: Option<DifficultyTier>,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    room_manager: Arc<RoomManager>,
    images_dir: String,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let room_manager_filter = warp::any().map({
        let room_manager = room_manager.clone();
        move || room_manager.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(room_manager_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, room_mgr| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, room_mgr))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Room creation; joining happens over the socket
    let create_room = warp::path!("api" / "rooms")
        .and(warp::post())
        .and(warp::body::json())
        .and(room_manager_filter.clone())
        .and_then(handle_create_room);

    // Room snapshot for reconnecting clients
    let get_room = warp::path!("api" / "rooms" / String)
        .and(warp::get())
        .and(room_manager_filter.clone())
        .and_then(handle_get_room);

    // Ad-hoc scoring, used by the solo practice view
    let score = warp::path!("api" / "score")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(handle_score);

    // Challenge images from the dataset directory
    let images = warp::path("api")
        .and(warp::path("images"))
        .and(warp::fs::dir(images_dir));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    websocket
        .or(health)
        .or(create_room)
        .or(get_room)
        .or(score)
        .or(images)
        .with(cors)
        .with(warp::log("prompt_battle"))
}

async fn handle_create_room(
    request: CreateRoomRequest,
    room_manager: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match room_manager.create_room(request.settings).await {
        Ok(code) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "success": true,
                "code": code
            })),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!("Failed to create room: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": err.client_message()
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_get_room(
    code: String,
    room_manager: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !room_manager::is_valid_room_code(&code) {
        return Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Invalid room code format"
            })),
            warp::http::StatusCode::BAD_REQUEST,
        ));
    }

    match room_manager.room_snapshot(&code).await {
        Some(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&snapshot),
            warp::http::StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}

async fn handle_score(request: ScoreRequest) -> Result<impl warp::Reply, warp::Rejection> {
    let result = ScoringEngine::score(
        &request.target,
        &request.attempt,
        request.difficulty.unwrap_or(DifficultyTier::Easy),
        &DifficultyMetadata::default(),
    );
    Ok(warp::reply::json(&result))
}
