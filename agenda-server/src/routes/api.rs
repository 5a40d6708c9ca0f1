//! JSON API used by external frontends.
//!
//! Both endpoints pass data straight through to the calendar. Nothing is
//! validated, and every failure is the same 500.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use agenda_core::{BookingRequest, CalendarEvent};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/create-event", post(create_event))
        .route("/api/get-events", get(get_events))
}

#[derive(Serialize)]
pub struct CreateEventResponse {
    pub success: bool,
}

/// POST /api/create-event - Create an event on the booking calendar
async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<CreateEventResponse>, AppError> {
    let created = state
        .calendar
        .create_event(&req)
        .await
        .map_err(|e| AppError::new("Erro ao criar evento", e))?;

    if created.is_none() {
        tracing::warn!(summary = %req.summary, "Calendar unavailable, no event created");
    }

    Ok(Json(CreateEventResponse { success: true }))
}

/// GET /api/get-events - List upcoming events
///
/// `null` when the calendar is unavailable.
async fn get_events(
    State(state): State<AppState>,
) -> Result<Json<Option<Vec<CalendarEvent>>>, AppError> {
    let events = state
        .calendar
        .list_events()
        .await
        .map_err(|e| AppError::new("Erro ao buscar eventos", e))?;

    Ok(Json(events))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::testing::MemoryCalendar;
    use crate::routes::test_support::{body_string, test_app};

    fn create_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/create-event")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_events_returns_calendar_events() {
        let calendar = Arc::new(MemoryCalendar::with_events(vec![CalendarEvent::new(
            "2025-03-20T12:00:00.000Z",
            "2025-03-20T13:00:00.000Z",
        )]));

        let response = test_app(calendar)
            .oneshot(Request::get("/api/get-events").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let events: Vec<CalendarEvent> = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, "2025-03-20T12:00:00.000Z");
    }

    #[tokio::test]
    async fn test_get_events_is_null_without_calendar() {
        let response = test_app(Arc::new(MemoryCalendar::missing()))
            .oneshot(Request::get("/api/get-events").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "null");
    }

    #[tokio::test]
    async fn test_get_events_failure_is_generic_500() {
        let response = test_app(Arc::new(MemoryCalendar::failing()))
            .oneshot(Request::get("/api/get-events").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert_eq!(body, r#"{"error":"Erro ao buscar eventos"}"#);
    }

    #[tokio::test]
    async fn test_create_event_passes_fields_through() {
        let calendar = Arc::new(MemoryCalendar::default());

        let response = test_app(calendar.clone())
            .oneshot(create_request(
                r#"{"summary":"Orçamento Ana","description":"Celular: 1199. Agendado Online","start":"não é data","end":"2025-03-20T13:00:00.000Z"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"success":true}"#);

        let created = calendar.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].summary, "Orçamento Ana");
        assert_eq!(created[0].start, "não é data");
    }

    #[tokio::test]
    async fn test_create_event_failure_is_generic_500() {
        let response = test_app(Arc::new(MemoryCalendar::failing()))
            .oneshot(create_request(
                r#"{"summary":"x","description":"y","start":"2025-03-20T12:00:00.000Z","end":"2025-03-20T13:00:00.000Z"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, r#"{"error":"Erro ao criar evento"}"#);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let response = test_app(Arc::new(MemoryCalendar::default()))
            .oneshot(
                Request::get("/api/get-events")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }
}
