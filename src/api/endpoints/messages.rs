//! Message endpoints.
//!
//! - `POST /api/messages` — practitioners and admins
//! - `GET /api/messages/inbox`
//! - `PUT /api/messages/:id/read` — recipient only

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::{parse_id, ApiContext};
use crate::authorization::CallerContext;
use crate::messaging::{self, SendMessageInput};
use crate::models::{Message, MessageWithSender};

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: Message,
}

/// `POST /api/messages`
pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(input): ApiJson<SendMessageInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let message = messaging::send(&conn, &caller, input)?;
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

#[derive(Serialize)]
pub struct InboxResponse {
    pub success: bool,
    pub unread: usize,
    pub messages: Vec<MessageWithSender>,
}

/// `GET /api/messages/inbox`
pub async fn inbox(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<InboxResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let inbox = messaging::inbox(&conn, &caller)?;
    Ok(Json(InboxResponse {
        success: true,
        unread: inbox.unread,
        messages: inbox.messages,
    }))
}

/// `PUT /api/messages/:id/read`
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let message = messaging::mark_read(&conn, &caller, &id)?;
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}
