//! Request handlers

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
};
use chrono::Local;
use futures_util::{
    StreamExt,
    stream::{self, BoxStream},
};
use mailsift_common::{incoming, parse_address_list};
use mailsift_report::{csv, stamped_filename};
use mailsift_verify::{BatchStatus, NoProgress, ProgressUpdate, ResultAggregator, Summary};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{error::ApiError, state::AppState};

/// Body of both validation endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    /// Newline separated addresses
    #[serde(default)]
    pub emails: String,
}

/// Outcome of one batch as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Summary,
    pub deliverable_count: usize,
    pub undeliverable_count: usize,
    pub total_processed: usize,
}

impl BatchResponse {
    #[must_use]
    pub fn from_summary(summary: Summary) -> Self {
        let error = match &summary.status {
            BatchStatus::Complete => None,
            BatchStatus::Aborted {
                reason,
                unprocessed,
            } => Some(format!(
                "Batch aborted: {reason} ({unprocessed} emails not processed)"
            )),
            BatchStatus::Cancelled { unprocessed } => Some(format!(
                "Batch cancelled ({unprocessed} emails not processed)"
            )),
        };

        Self {
            success: error.is_none(),
            error,
            deliverable_count: summary.deliverable_count,
            undeliverable_count: summary.undeliverable_count,
            total_processed: summary.total,
            results: summary,
        }
    }

    /// 200 when complete, 502 when the verification service failed the
    /// batch, 503 when the server cancelled it
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.results.status {
            BatchStatus::Complete => StatusCode::OK,
            BatchStatus::Aborted { .. } => StatusCode::BAD_GATEWAY,
            BatchStatus::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// One server-sent event on `/validate/stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress {
        current: usize,
        total: usize,
        percentage: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_email: Option<String>,
    },
    Complete(Box<BatchResponse>),
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        results: Option<Box<Summary>>,
    },
}

impl StreamEvent {
    const fn started(total: usize) -> Self {
        Self::Progress {
            current: 0,
            total,
            percentage: 0,
            current_email: None,
        }
    }

    fn finished(summary: Summary) -> Self {
        let response = BatchResponse::from_summary(summary);
        match response.error {
            None => Self::Complete(Box::new(response)),
            Some(error) => Self::Error {
                error,
                results: Some(Box::new(response.results)),
            },
        }
    }

    fn into_event(self) -> Event {
        Event::default().json_data(&self).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to serialise stream event");
            Event::default().data(r#"{"type":"error","error":"internal error"}"#)
        })
    }
}

impl From<ProgressUpdate> for StreamEvent {
    fn from(update: ProgressUpdate) -> Self {
        Self::Progress {
            current: update.progress.processed,
            total: update.progress.total,
            percentage: update.progress.percentage(),
            current_email: Some(update.address),
        }
    }
}

fn addresses_from(request: &ValidateRequest) -> Result<Vec<String>, ApiError> {
    let addresses = parse_address_list(&request.emails);
    if addresses.is_empty() {
        return Err(ApiError::bad_request("No emails provided"));
    }
    Ok(addresses)
}

/// `POST /validate`
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Response, ApiError> {
    let addresses = addresses_from(&request)?;
    incoming!(level = INFO, count = addresses.len(), "Validation requested");

    let cancel = state.batch_token();
    let result = state
        .processor()
        .process(&addresses, &NoProgress, &cancel)
        .await;

    let summary = ResultAggregator::aggregate(&result);
    state.record(&summary);

    let response = BatchResponse::from_summary(summary);
    Ok((response.status_code(), Json(response)).into_response())
}

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

fn sse(events: BoxStream<'static, StreamEvent>) -> Sse<KeepAliveStream<EventStream>> {
    Sse::new(events.map(|event| Ok(event.into_event())).boxed()).keep_alive(KeepAlive::default())
}

/// `POST /validate/stream`
///
/// The batch runs on its own task. Dropping the response stream (the client
/// went away) cancels it.
pub async fn validate_stream(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Sse<KeepAliveStream<EventStream>> {
    let addresses = match addresses_from(&request) {
        Ok(addresses) => addresses,
        Err(e) => {
            return sse(stream::iter([StreamEvent::Error {
                error: e.message,
                results: None,
            }])
            .boxed());
        }
    };

    let total = addresses.len();
    incoming!(level = INFO, count = total, "Streaming validation requested");

    let cancel = state.batch_token();
    let guard = cancel.clone().drop_guard();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();
    let (done_tx, done_rx) = oneshot::channel::<Summary>();

    tokio::spawn(async move {
        let result = state
            .processor()
            .process(&addresses, &progress_tx, &cancel)
            .await;
        drop(progress_tx);

        let summary = ResultAggregator::aggregate(&result);
        state.record(&summary);
        let _ = done_tx.send(summary);
    });

    // The guard lives as long as the progress stream, which ends only after
    // the batch has finished.
    let progress = stream::unfold((progress_rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|update| (StreamEvent::from(update), (rx, guard)))
    });

    let finished = stream::once(async move {
        done_rx.await.map_or_else(
            |_| StreamEvent::Error {
                error: "Batch did not finish".to_string(),
                results: None,
            },
            StreamEvent::finished,
        )
    });

    sse(stream::iter([StreamEvent::started(total)])
        .chain(progress)
        .chain(finished)
        .boxed())
}

fn csv_attachment(prefix: &str, body: String) -> Response {
    let filename = stamped_filename(prefix, "csv", &Local::now());

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn last_completed(state: &AppState) -> Result<std::sync::Arc<Summary>, ApiError> {
    state
        .last_completed()
        .ok_or_else(|| ApiError::not_found("No completed batch to download"))
}

/// `GET /download/deliverable`
pub async fn download_deliverable(State(state): State<AppState>) -> Result<Response, ApiError> {
    let summary = last_completed(&state)?;
    Ok(csv_attachment(
        "deliverable_emails",
        csv::deliverable_csv(&summary),
    ))
}

/// `GET /download/undeliverable`
pub async fn download_undeliverable(State(state): State<AppState>) -> Result<Response, ApiError> {
    let summary = last_completed(&state)?;
    Ok(csv_attachment(
        "undeliverable_emails",
        csv::undeliverable_csv(&summary),
    ))
}

/// `GET /health/live`
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
