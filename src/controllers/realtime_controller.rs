use std::{convert::Infallible, time::Duration as StdDuration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration as TokioDuration, interval};

use crate::{AppState, events::PRICES_UPDATED};

// GET /ws/prices
pub async fn ws_prices(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_prices_socket(socket, state))
}

fn prices_frame(state: &AppState) -> String {
    serde_json::json!({ "type": "prices", "prices": state.prices.snapshot() }).to_string()
}

/// Push a full price snapshot to the browser on connect and after every
/// store change.
async fn handle_prices_socket(client_ws: WebSocket, state: AppState) {
    let mut rx = state.events_tx.subscribe();
    let (mut tx_ws, mut rx_ws) = client_ws.split();

    tracing::info!("WS price client connected");

    if tx_ws.send(Message::Text(prices_frame(&state))).await.is_err() {
        return;
    }

    // Ping browser to keep alive
    let mut ping = interval(TokioDuration::from_secs(25));

    loop {
        tokio::select! {
            _ = ping.tick() => {
                if tx_ws.send(Message::Ping(b"ping".to_vec())).await.is_err() {
                    break;
                }
            }

            evt = rx.recv() => {
                match evt {
                    Ok(name) if name == PRICES_UPDATED => {
                        if tx_ws.send(Message::Text(prices_frame(&state))).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    // missed some updates; the next snapshot is complete anyway
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }

            client_msg = rx_ws.next() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = tx_ws.close().await;
    tracing::info!("WS price client disconnected");
}

// GET /events  (SSE)
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let stream = futures_util::stream::unfold(rx, |mut rx| async {
        let evt = match rx.recv().await {
            Ok(name) => Event::default().event(name).data("1"),
            Err(RecvError::Lagged(_)) => Event::default().event("ping").data("lagged"),
            Err(RecvError::Closed) => return None,
        };

        Some((Ok(evt), rx))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(StdDuration::from_secs(20))
            .text("keep-alive"),
    )
}
