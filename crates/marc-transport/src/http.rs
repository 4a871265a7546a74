//! HTTP + SSE routes over the relay engine.
//!
//! Handlers only validate the body and forward to [`Relay`]; results are
//! returned verbatim as JSON.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{
        IntoResponse,
        sse::{KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use marc_core::{
    Briefing, ChannelSummary, LiveAgent, Message, MessageId, PresenceEntry, Topic,
    traits::StateStorage,
};
use marc_store::{Relay, RenameOutcome, SyncBatch, Welcome, log::DEFAULT_CONTEXT_WINDOW};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{TransportError, required},
    protocol::{
        Ack, BriefingRequest, BriefingResponse, ContextParams, ErrataRequest, JoinResponse,
        MembershipRequest, NameRequest, OPERATOR_NAME, PostRequest, PostResponse, RenameRequest,
        SearchParams, TopicRequest, TopicResponse, WhoAmI,
    },
};

type Shared<S> = State<Arc<Relay<S>>>;
type ApiResult<T> = Result<Json<T>, TransportError>;

/// Create the relay's HTTP router.
///
/// # Example
/// ```ignore
/// let relay = Arc::new(Relay::open(config, JsonFileStorage::new(dir)).await);
/// let app = create_router(relay);
/// axum::serve(listener, app).await?;
/// ```
#[must_use]
pub fn create_router<S>(relay: Arc<Relay<S>>) -> Router
where
    S: StateStorage + 'static,
{
    Router::new()
        .route("/api/welcome", post(welcome::<S>))
        .route("/api/rename", post(rename::<S>))
        .route("/api/whoami/{agent_id}", get(whoami::<S>))
        .route("/api/agents", get(agents::<S>))
        .route("/api/agents/{agent_id}", delete(forget_agent::<S>))
        .route("/api/briefing", get(get_briefing::<S>).post(set_briefing::<S>))
        .route("/api/post", post(post_message::<S>))
        .route("/api/errata", post(errata::<S>))
        .route("/api/join", post(join::<S>))
        .route("/api/part", post(part::<S>))
        .route("/api/dismiss", post(dismiss::<S>))
        .route("/api/messages", get(all_messages::<S>))
        .route("/api/messages/{target}", get(messages_for_target::<S>))
        .route("/api/context/{id}", get(context::<S>))
        .route("/api/search", get(search::<S>))
        .route("/api/sync/{name}", get(sync::<S>))
        .route("/api/topic", post(set_topic::<S>))
        .route("/api/topic/{target}", get(get_topic::<S>))
        .route("/api/users/{target}", get(users::<S>))
        .route("/api/channels", get(channels::<S>))
        .route("/api/channels/delete", post(delete_channel::<S>))
        .route("/api/stream", get(stream::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(relay)
}

// --- Identity ---

async fn welcome<S: StateStorage>(State(relay): Shared<S>) -> Json<Welcome> {
    Json(relay.issue_identity().await)
}

async fn rename<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<RenameOutcome> {
    let agent_id = required(req.agent_id, "agentId")?;
    let name = required(req.name, "name")?;
    Ok(Json(relay.rename(&agent_id, &name).await))
}

async fn whoami<S: StateStorage>(
    State(relay): Shared<S>,
    Path(agent_id): Path<String>,
) -> ApiResult<WhoAmI> {
    relay
        .resolve(&agent_id)
        .await
        .map(|name| Json(WhoAmI { name }))
        .ok_or(TransportError::UnknownSession(agent_id))
}

async fn agents<S: StateStorage>(State(relay): Shared<S>) -> Json<Vec<LiveAgent>> {
    Json(relay.live_agents().await)
}

async fn forget_agent<S: StateStorage>(
    State(relay): Shared<S>,
    Path(agent_id): Path<String>,
) -> ApiResult<Ack> {
    if relay.remove_identity(&agent_id).await {
        Ok(Json(Ack::OK))
    } else {
        Err(TransportError::UnknownSession(agent_id))
    }
}

// --- Briefing ---

async fn get_briefing<S: StateStorage>(State(relay): Shared<S>) -> Json<Option<Briefing>> {
    Json(relay.get_briefing().await)
}

async fn set_briefing<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<BriefingRequest>,
) -> ApiResult<BriefingResponse> {
    let text = req.text.ok_or(TransportError::Missing("text"))?;
    let briefing = relay.set_briefing(&text).await;
    Ok(Json(BriefingResponse { ok: true, briefing }))
}

// --- Messages ---

async fn post_message<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<PostRequest>,
) -> ApiResult<PostResponse> {
    let name = required(req.name, "name")?;
    let target = required(req.target, "target")?;
    let message = required(req.message, "message")?;
    let id = relay
        .post(&name, &target, &message, req.kind.unwrap_or_default())
        .await;
    Ok(Json(PostResponse { ok: true, id }))
}

async fn errata<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<ErrataRequest>,
) -> ApiResult<Ack> {
    let id = req.message_id.ok_or(TransportError::Missing("messageId"))?;
    let text = required(req.new_message, "newMessage")?;
    let ok = relay.errata(id, &text).await;
    Ok(Json(Ack { ok }))
}

async fn all_messages<S: StateStorage>(State(relay): Shared<S>) -> Json<Vec<Message>> {
    Json(relay.all_messages().await)
}

async fn messages_for_target<S: StateStorage>(
    State(relay): Shared<S>,
    Path(target): Path<String>,
) -> Json<Vec<Message>> {
    Json(relay.messages_for_target(&target).await)
}

async fn context<S: StateStorage>(
    State(relay): Shared<S>,
    Path(id): Path<MessageId>,
    Query(params): Query<ContextParams>,
) -> Json<Vec<Message>> {
    let before = params.before.unwrap_or(DEFAULT_CONTEXT_WINDOW);
    let after = params.after.unwrap_or(DEFAULT_CONTEXT_WINDOW);
    Json(relay.context(id, before, after).await)
}

async fn search<S: StateStorage>(
    State(relay): Shared<S>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Message>> {
    Json(relay.search(&params.into()).await)
}

async fn sync<S: StateStorage>(
    State(relay): Shared<S>,
    Path(name): Path<String>,
) -> Json<SyncBatch> {
    Json(relay.sync(&name).await)
}

// --- Membership & topics ---

async fn join<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<MembershipRequest>,
) -> ApiResult<JoinResponse> {
    let name = required(req.name, "name")?;
    let target = required(req.target, "target")?;
    let outcome = relay.join(&name, &target).await;
    Ok(Json(JoinResponse {
        ok: true,
        history: outcome.history,
        topic: outcome.topic,
    }))
}

async fn part<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<MembershipRequest>,
) -> ApiResult<Ack> {
    let name = required(req.name, "name")?;
    let target = required(req.target, "target")?;
    relay.part(&name, &target).await;
    Ok(Json(Ack::OK))
}

async fn dismiss<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<NameRequest>,
) -> ApiResult<Ack> {
    let name = required(req.name, "name")?;
    relay.dismiss(&name).await;
    Ok(Json(Ack::OK))
}

async fn set_topic<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<TopicRequest>,
) -> ApiResult<TopicResponse> {
    let target = required(req.target, "target")?;
    let text = req.topic.ok_or(TransportError::Missing("topic"))?;
    let setter = req
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| OPERATOR_NAME.to_string());
    let topic = relay.set_topic(&setter, &target, &text).await;
    Ok(Json(TopicResponse { ok: true, topic }))
}

async fn get_topic<S: StateStorage>(
    State(relay): Shared<S>,
    Path(target): Path<String>,
) -> Json<Option<Topic>> {
    Json(relay.get_topic(&target).await)
}

async fn users<S: StateStorage>(
    State(relay): Shared<S>,
    Path(target): Path<String>,
) -> Json<Vec<PresenceEntry>> {
    Json(relay.get_users(&target).await)
}

async fn channels<S: StateStorage>(State(relay): Shared<S>) -> Json<Vec<ChannelSummary>> {
    Json(relay.get_all_channels().await)
}

async fn delete_channel<S: StateStorage>(
    State(relay): Shared<S>,
    Json(req): Json<NameRequest>,
) -> ApiResult<Ack> {
    let name = required(req.name, "name")?;
    relay.delete_channel(&name).await;
    Ok(Json(Ack::OK))
}

// --- Streaming ---

async fn stream<S: StateStorage>(State(relay): Shared<S>) -> impl IntoResponse {
    let (subscription, initial) = relay.open_stream().await;
    tracing::debug!(subscriber = subscription.id(), "stream opened");
    Sse::new(subscription.sse_stream(initial)).keep_alive(KeepAlive::default())
}
