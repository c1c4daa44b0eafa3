//! End-to-end tests: a real server on an OS-assigned port, driven by
//! `tokio-tungstenite` clients speaking the JSON wire format.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizforge::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn bank() -> InMemoryBank {
    InMemoryBank::from_json_str(
        r#"[
            {"id": "q1", "questionText": "2 + 2?", "options": ["3", "4"], "correctIndex": 1},
            {"id": "q2", "questionText": "Capital of France?", "options": ["Paris", "Rome"], "correctIndex": 0}
        ]"#,
    )
    .expect("bank should load")
}

/// Short timings so a whole game fits in a test.
fn fast_config() -> QuizConfig {
    QuizConfig {
        countdown_from: 1,
        countdown_interval: Duration::from_millis(10),
        question_time: Duration::from_secs(5),
        reveal_grace: Duration::from_millis(10),
        post_game_linger: Duration::from_millis(10),
        ..QuizConfig::default()
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = QuizforgeServerBuilder::new()
        .bind("127.0.0.1:0")
        .quiz_config(fast_config())
        .build(bank())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str, name: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/?name={name}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, json: &str) {
    ws.send(Message::text(json)).await.expect("send");
}

/// Reads the next event, or `None` once the server closes the socket.
async fn next_event(ws: &mut ClientWs) -> Option<ServerEvent> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame");
        match msg {
            Some(Ok(Message::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).expect("decode event"));
            }
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Waits for the next event of type `kind`, skipping anything else.
async fn expect(ws: &mut ClientWs, kind: &str) -> ServerEvent {
    loop {
        match next_event(ws).await {
            Some(event) if event.kind() == kind => return event,
            Some(_) => continue,
            None => panic!("connection closed while waiting for {kind}"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_onboards_player() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "ann").await;

    assert_eq!(
        next_event(&mut ws).await,
        Some(ServerEvent::ConnectionSuccess {
            player_name: "ann".into()
        })
    );
    assert_eq!(
        next_event(&mut ws).await,
        Some(ServerEvent::GameListUpdate(vec![]))
    );
    assert_eq!(
        next_event(&mut ws).await,
        Some(ServerEvent::PlayerConnected {
            connected_players: vec!["ann".into()]
        })
    );
}

#[tokio::test]
async fn test_taken_name_gets_name_taken_then_close() {
    let addr = start_server().await;
    let mut ann = connect(&addr, "ann").await;
    expect(&mut ann, "connection_success").await;

    let mut imposter = connect(&addr, "ann").await;

    assert_eq!(
        next_event(&mut imposter).await,
        Some(ServerEvent::NameTaken {
            message: NAME_TAKEN_MESSAGE.into()
        })
    );
    assert_eq!(next_event(&mut imposter).await, None);
}

#[tokio::test]
async fn test_missing_name_gets_error_then_close() {
    let addr = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
        .await
        .expect("should connect");

    assert!(matches!(
        next_event(&mut ws).await,
        Some(ServerEvent::Error { .. })
    ));
    assert_eq!(next_event(&mut ws).await, None);
}

#[tokio::test]
async fn test_create_room_over_websocket() {
    let addr = start_server().await;
    let mut ann = connect(&addr, "ann").await;
    let mut bob = connect(&addr, "bob").await;
    expect(&mut bob, "connection_success").await;

    send(
        &mut ann,
        r#"{"type":"create","payload":{"name":"Quiz","questionCount":2}}"#,
    )
    .await;

    let ServerEvent::GameJoined(joined) = expect(&mut ann, "game_joined").await else {
        unreachable!()
    };
    assert_eq!(joined.name, "Quiz");
    assert_eq!(joined.players, vec!["ann"]);

    let ServerEvent::GameCreate(summary) = expect(&mut bob, "game_create").await else {
        unreachable!()
    };
    assert_eq!(summary.id, joined.id);
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let addr = start_server().await;
    let mut ann = connect(&addr, "ann").await;
    expect(&mut ann, "connection_success").await;

    send(&mut ann, "this is not json").await;
    let ServerEvent::Error { message } = expect(&mut ann, "error").await else {
        unreachable!()
    };
    assert!(message.starts_with("Invalid message"));

    send(
        &mut ann,
        r#"{"type":"create","payload":{"name":"Quiz","question_count":1}}"#,
    )
    .await;
    expect(&mut ann, "game_joined").await;
}

#[tokio::test]
async fn test_closing_socket_releases_player() {
    let addr = start_server().await;
    let mut ann = connect(&addr, "ann").await;
    let mut bob = connect(&addr, "bob").await;
    expect(&mut bob, "connection_success").await;

    ann.close(None).await.expect("close");

    loop {
        let ServerEvent::PlayerConnected { connected_players } =
            expect(&mut bob, "player_connected").await
        else {
            unreachable!()
        };
        if connected_players == vec!["bob".to_string()] {
            break;
        }
    }
}

#[tokio::test]
async fn test_full_game_over_websocket() {
    let addr = start_server().await;
    let mut ann = connect(&addr, "ann").await;
    let mut bob = connect(&addr, "bob").await;

    send(
        &mut ann,
        r#"{"type":"create","payload":{"name":"Quiz","questionCount":1}}"#,
    )
    .await;
    let ServerEvent::GameJoined(joined) = expect(&mut ann, "game_joined").await else {
        unreachable!()
    };
    let game_id = joined.id;

    send(
        &mut bob,
        &format!(r#"{{"type":"join","payload":{{"gameId":"{game_id}"}}}}"#),
    )
    .await;
    expect(&mut bob, "game_joined").await;
    expect(&mut ann, "player_joined").await;

    send(
        &mut ann,
        &format!(r#"{{"type":"start","payload":{{"gameId":"{game_id}"}}}}"#),
    )
    .await;
    expect(&mut bob, "game_start").await;

    let ServerEvent::Question { options, .. } = expect(&mut ann, "question").await else {
        unreachable!()
    };
    // Either question may be drawn; each has exactly one right option.
    let right = if options.contains(&"4".to_string()) { "4" } else { "Paris" };
    send(
        &mut ann,
        &format!(r#"{{"type":"answer","payload":{{"gameId":"{game_id}","answer":"{right}"}}}}"#),
    )
    .await;

    let ServerEvent::CorrectAnswer { player_name, .. } = expect(&mut bob, "correct_answer").await
    else {
        unreachable!()
    };
    assert_eq!(player_name, "ann");

    let ServerEvent::GameEnd { winner, scores, .. } = expect(&mut bob, "game_end").await else {
        unreachable!()
    };
    assert_eq!(winner.as_deref(), Some("ann"));
    assert_eq!(scores[0].score, 1);
}
