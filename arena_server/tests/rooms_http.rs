mod support;

use serde_json::{Value, json};

#[tokio::test]
async fn when_health_is_requested_then_server_reports_ok() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn when_room_is_unknown_then_lookup_returns_json_not_found() {
    let base_url = support::ensure_server();

    let res = reqwest::get(format!("{base_url}/rooms/ZZZZZZ"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["error"], "room not found");
}

#[tokio::test]
async fn when_public_room_is_created_over_ws_then_http_directory_lists_it() {
    let base_url = support::ensure_server();
    let mut ws = support::connect(base_url).await;

    support::send_json(
        &mut ws,
        json!({
            "type": "CreateRoom",
            "data": { "name": "Listed", "player_name": "host", "is_private": false }
        }),
    )
    .await;
    let created = support::recv_type(&mut ws, "RoomCreated").await;
    let room_id = created["data"]["room_id"]
        .as_str()
        .expect("room id")
        .to_string();
    support::recv_type(&mut ws, "RoomJoined").await;

    let rooms: Vec<Value> = reqwest::get(format!("{base_url}/rooms"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    let listed = rooms
        .iter()
        .find(|r| r["room_id"] == room_id.as_str())
        .expect("room listed");
    assert_eq!(listed["name"], "Listed");
    assert_eq!(listed["phase"], "lobby");

    let res = reqwest::get(format!("{base_url}/rooms/{}", room_id.to_lowercase()))
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn when_room_is_private_then_directory_hides_it() {
    let base_url = support::ensure_server();
    let mut ws = support::connect(base_url).await;

    support::send_json(
        &mut ws,
        json!({
            "type": "CreateRoom",
            "data": { "name": "Hidden", "player_name": "host", "is_private": true }
        }),
    )
    .await;
    let created = support::recv_type(&mut ws, "RoomCreated").await;
    let room_id = created["data"]["room_id"].as_str().expect("room id").to_string();

    let rooms: Vec<Value> = reqwest::get(format!("{base_url}/rooms"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert!(rooms.iter().all(|r| r["room_id"] != room_id.as_str()));
}
