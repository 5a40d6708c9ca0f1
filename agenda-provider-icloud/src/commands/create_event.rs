//! Create a booking on the calendar.
//!
//! Uses libdav PutResource to create a new .ics resource.

use agenda_core::ics::generate_ics;
use agenda_core::{BookingRequest, CreatedEvent, NewEvent};
use anyhow::{Context, Result};
use libdav::dav::{PutResource, mime_types};

use crate::ICloudCalendar;
use crate::caldav::{create_caldav_client, event_href};
use crate::discover::find_calendar;

pub async fn handle(calendar: &ICloudCalendar, request: &BookingRequest) -> Result<Option<CreatedEvent>> {
    let Some(credentials) = calendar.credentials() else {
        tracing::warn!("No calendar credentials configured, not creating event");
        return Ok(None);
    };
    let config = calendar.config();

    let event = NewEvent::from_request(request, config.timezone)
        .context("Invalid event times")?;
    let ics_content = generate_ics(&event);

    let caldav = create_caldav_client(&config.caldav_url, credentials)?;

    let Some(found) = find_calendar(&caldav, &config.name).await? else {
        return Ok(None);
    };

    let href = event_href(&found.href, &event.uid);

    // Create the resource using PUT with If-None-Match: * (fails if exists)
    caldav
        .request(PutResource::new(&href).create(&ics_content, mime_types::CALENDAR))
        .await
        .context("Failed to create event")?;

    tracing::info!(uid = %event.uid, href = %href, "Created event");

    Ok(Some(CreatedEvent {
        uid: event.uid,
        href,
    }))
}
