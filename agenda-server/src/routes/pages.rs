//! Booking pages: agenda, form submission and confirmation.

use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use agenda_core::booking::{Booking, BookingForm, BookingRecord, FormField, RECORD_KEY, whatsapp_link};
use agenda_core::slots::{
    Slot, available_slots, carousel_days, default_slots, is_bookable, last_bookable_day,
    not_started, partition_by_period, today_in,
};

use crate::html::{self, AgendaView, FormView};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(agenda))
        .route("/agendar", post(book))
        .route("/confirmacao", get(confirmation))
}

#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    data: Option<String>,
    horario: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookingSubmission {
    data: String,
    horario: String,
    servico: String,
    nome: String,
    telefone: String,
}

impl BookingSubmission {
    fn form(&self) -> BookingForm {
        BookingForm {
            service: self.servico.clone(),
            name: self.nome.clone(),
            phone: self.telefone.clone(),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// A form to draw over the agenda.
struct OpenForm {
    slot: Slot,
    values: BookingForm,
    errors: Vec<FormField>,
    failed: bool,
}

/// Free slots on `date` that have not started yet. A calendar failure
/// leaves every slot free.
async fn free_slots(state: &AppState, date: NaiveDate) -> Vec<Slot> {
    let policy = state.slot_policy();
    let candidates = not_started(
        default_slots(&state.config.schedule.hours),
        date,
        Utc::now(),
        policy.timezone,
    );

    let events = match state.calendar.list_events().await {
        Ok(events) => events.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch events, showing all slots");
            Vec::new()
        }
    };

    available_slots(&candidates, &events, date, &policy)
}

fn render_day(state: &AppState, date: NaiveDate, free: &[Slot], form: Option<&OpenForm>) -> String {
    let today = today_in(state.config.calendar.timezone);
    let grouped = partition_by_period(free);
    let days = carousel_days(today, state.config.schedule.days_shown);

    html::render_agenda(&AgendaView {
        today,
        selected: date,
        days: &days,
        slots: &grouped,
        services: &state.config.booking.services,
        form: form.map(|f| FormView {
            slot: &f.slot,
            values: &f.values,
            errors: &f.errors,
            failed: f.failed,
        }),
    })
}

/// GET / - Agenda for a day, with the booking form when a slot is chosen
async fn agenda(State(state): State<AppState>, Query(query): Query<AgendaQuery>) -> Html<String> {
    let today = today_in(state.config.calendar.timezone);
    let last = last_bookable_day(today, state.config.schedule.days_shown);
    let date = query
        .data
        .as_deref()
        .and_then(parse_date)
        .map_or(today, |d| d.clamp(today, last));

    let free = free_slots(&state, date).await;

    // The form only opens on a slot that is still free
    let form = query
        .horario
        .as_deref()
        .and_then(|h| Slot::parse(h).ok())
        .filter(|slot| free.contains(slot))
        .map(|slot| OpenForm {
            slot,
            values: BookingForm::default(),
            errors: Vec::new(),
            failed: false,
        });

    Html(render_day(&state, date, &free, form.as_ref()))
}

/// POST /agendar - Validate the form and book the slot
async fn book(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(submission): Form<BookingSubmission>,
) -> Response {
    let policy = state.slot_policy();
    let today = today_in(policy.timezone);

    let date = parse_date(&submission.data)
        .filter(|d| is_bookable(*d, today, state.config.schedule.days_shown));
    let slot = Slot::parse(&submission.horario)
        .ok()
        .filter(|s| default_slots(&state.config.schedule.hours).contains(s));
    let (Some(date), Some(slot)) = (date, slot) else {
        return Redirect::to("/").into_response();
    };
    if not_started(vec![slot.clone()], date, Utc::now(), policy.timezone).is_empty() {
        return Redirect::to("/").into_response();
    }

    let form = submission.form();
    if let Err(errors) = form.validate(&state.config.booking.services) {
        let open = OpenForm {
            slot,
            values: form,
            errors,
            failed: false,
        };
        let free = free_slots(&state, date).await;
        let page = render_day(&state, date, &free, Some(&open));
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
    }

    let booking = match Booking::new(&form, date, &slot, &policy) {
        Ok(booking) => booking,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected booking");
            return Redirect::to("/").into_response();
        }
    };

    match state.calendar.create_event(&booking.request()).await {
        Ok(Some(created)) => {
            tracing::info!(uid = %created.uid, start = %booking.start, "Booked");
            match booking.record().to_cookie_value() {
                Ok(value) => {
                    let cookie = Cookie::build((RECORD_KEY, value)).path("/").build();
                    (jar.add(cookie), Redirect::to("/confirmacao")).into_response()
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store booking record");
                    Redirect::to("/confirmacao").into_response()
                }
            }
        }
        Ok(None) => {
            tracing::warn!("Calendar unavailable, booking not created");
            render_failed(&state, date, slot, form).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create event");
            render_failed(&state, date, slot, form).await
        }
    }
}

async fn render_failed(state: &AppState, date: NaiveDate, slot: Slot, values: BookingForm) -> Response {
    let open = OpenForm {
        slot,
        values,
        errors: Vec::new(),
        failed: true,
    };
    let free = free_slots(state, date).await;
    Html(render_day(state, date, &free, Some(&open))).into_response()
}

/// GET /confirmacao - Show the last booking, then hand off to WhatsApp
async fn confirmation(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let tz = state.config.calendar.timezone;
    let record = jar
        .get(RECORD_KEY)
        .and_then(|cookie| BookingRecord::from_cookie_value(cookie.value()).ok());

    let Some(record) = record else {
        return Html(html::render_no_booking());
    };

    let (when, message) = match (record.when(tz), record.whatsapp_message(tz)) {
        (Ok(when), Ok(message)) => (when, message),
        _ => {
            tracing::warn!(start = %record.start, "Booking record has an invalid start");
            return Html(html::render_no_booking());
        }
    };

    let link = whatsapp_link(&state.config.booking.whatsapp_number, &message);
    Html(html::render_confirmation(
        &when,
        &link,
        state.config.booking.redirect_delay_secs,
    ))
}
