/// WebSocket session actor.
///
/// Each connection is auto-subscribed to the `feed` topic and can manage
/// further topic subscriptions with
/// `{"action":"subscribe","topic":"post:<id>"}` /
/// `{"action":"unsubscribe","topic":...}` frames.
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use crate::state::AppState;
use crate::websocket::{events::FEED_TOPIC, BroadcastRegistry, SubscriberId};

/// Ping cadence.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// A connection silent for this long is dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Broadcast payload forwarded from the registry to this connection.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Forward(String);

/// Registration confirmation carrying the cleanup handle.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Subscribed {
    topic: String,
    id: SubscriberId,
}

/// Inbound frames from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientCommand {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

pub struct WsSession {
    registry: BroadcastRegistry,
    subscriptions: Vec<(String, SubscriberId)>,
    hb: Instant,
}

impl WsSession {
    fn new(registry: BroadcastRegistry) -> Self {
        Self {
            registry,
            subscriptions: Vec::new(),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!("WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    /// Register with the broadcast registry and pump received payloads back
    /// into this actor.
    fn subscribe(&self, topic: String, ctx: &mut ws::WebsocketContext<Self>) {
        let registry = self.registry.clone();
        let addr = ctx.address();
        actix::spawn(async move {
            let (id, mut rx) = registry.add_subscriber(&topic).await;
            addr.do_send(Subscribed {
                topic: topic.clone(),
                id,
            });
            while let Some(payload) = rx.recv().await {
                addr.do_send(Forward(payload));
            }
        });
    }

    fn unsubscribe(&mut self, topic: &str) {
        let registry = self.registry.clone();
        for (topic, id) in self
            .subscriptions
            .iter()
            .filter(|(t, _)| t == topic)
            .cloned()
            .collect::<Vec<_>>()
        {
            let registry = registry.clone();
            actix::spawn(async move {
                registry.remove_subscriber(&topic, id).await;
            });
        }
        self.subscriptions.retain(|(t, _)| t != topic);
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("WebSocket session started");
        self.hb(ctx);
        self.subscribe(FEED_TOPIC.to_string(), ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            subscriptions = self.subscriptions.len(),
            "WebSocket session stopped"
        );
        let registry = self.registry.clone();
        for (topic, id) in std::mem::take(&mut self.subscriptions) {
            let registry = registry.clone();
            actix::spawn(async move {
                registry.remove_subscriber(&topic, id).await;
            });
        }
    }
}

impl Handler<Forward> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Forward, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Handler<Subscribed> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Subscribed, _ctx: &mut Self::Context) {
        self.subscriptions.push((msg.topic, msg.id));
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(ClientCommand::Subscribe { topic }) => {
                    if self.subscriptions.iter().any(|(t, _)| *t == topic) {
                        return;
                    }
                    self.subscribe(topic, ctx);
                }
                Ok(ClientCommand::Unsubscribe { topic }) => {
                    self.unsubscribe(&topic);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to parse WebSocket frame");
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(?reason, "WebSocket close received");
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// HTTP handler upgrading to the WebSocket session.
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    ws::start(WsSession::new(state.registry.clone()), &req, stream)
}
