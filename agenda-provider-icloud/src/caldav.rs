//! CalDAV client helpers for iCloud using libdav.
//!
//! Builds the authenticated libdav client and the two requests libdav does
//! not ship: a time-range `calendar-query` REPORT and a `PROPFIND` listing
//! calendar collections with their display names.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use http::{Method, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};

use crate::credentials::Credentials;

/// Hyper client with basic auth, following redirects.
type HttpClient = FollowRedirect<
    AddAuthorization<
        Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, String>,
    >,
>;

pub type ICloudCalDavClient = CalDavClient<HttpClient>;

/// Create a libdav CalDavClient for `base_url` with basic auth.
///
/// Redirects are followed: iCloud answers on caldav.icloud.com and redirects
/// to the account's pXX-caldav.icloud.com server.
pub fn create_caldav_client(base_url: &str, credentials: &Credentials) -> Result<ICloudCalDavClient> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid CalDAV URL: {base_url}"))?;

    let connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let (username, password) = credentials.basic_auth();
    let authorized = AddAuthorization::basic(
        Client::builder(TokioExecutor::new()).build(connector),
        username,
        password,
    );

    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(authorized);

    Ok(CalDavClient::new(WebDavClient::new(uri, client)))
}

/// Absolute URL for a path on the client's server.
pub fn absolute_url(caldav: &ICloudCalDavClient, path: &str) -> String {
    let base = caldav.base_url();
    format!(
        "{}://{}{}",
        base.scheme_str().unwrap_or("https"),
        base.authority().map(|a| a.as_str()).unwrap_or("caldav.icloud.com"),
        path
    )
}

/// `<calendar>/<uid>.ics`
pub fn event_href(calendar_href: &str, uid: &str) -> String {
    format!("{}/{uid}.ics", calendar_href.trim_end_matches('/'))
}

/// `YYYYMMDDTHHMMSSZ`, as used in `time-range` filters.
pub fn caldav_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn depth_one() -> Vec<(String, String)> {
    vec![("Depth".to_string(), "1".to_string())]
}

fn ensure_success(parts: &http::response::Parts) -> std::result::Result<(), ParseResponseError> {
    if parts.status.is_success() {
        Ok(())
    } else {
        Err(ParseResponseError::BadStatusCode(parts.status))
    }
}

/// Run `f` over every `<response>` element of a multistatus body.
fn each_response<T>(
    body: &[u8],
    f: impl FnMut(roxmltree::Node) -> Option<T>,
) -> std::result::Result<Vec<T>, ParseResponseError> {
    let doc = roxmltree::Document::parse(std::str::from_utf8(body)?)?;
    Ok(doc
        .root_element()
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
        .filter_map(f)
        .collect())
}

/// `REPORT calendar-query` for the VEVENTs overlapping `[start, end)`.
pub struct EventsInRange<'a> {
    calendar_href: &'a str,
    start: String,
    end: String,
}

impl<'a> EventsInRange<'a> {
    pub fn new(calendar_href: &'a str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventsInRange {
            calendar_href,
            start: caldav_datetime(start),
            end: caldav_datetime(end),
        }
    }
}

/// One `.ics` resource returned by [`EventsInRange`].
#[derive(Debug)]
pub struct EventResource {
    pub href: String,
    pub data: String,
}

#[derive(Debug)]
pub struct EventsInRangeResponse {
    pub resources: Vec<EventResource>,
}

impl DavRequest for EventsInRange<'_> {
    type Response = EventsInRangeResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <c:calendar-data/>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT">
        <c:time-range start="{}" end="{}"/>
      </c:comp-filter>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#,
            self.start, self.end
        );

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.calendar_href.to_string(),
            body,
            headers: depth_one(),
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        ensure_success(parts)?;
        Ok(EventsInRangeResponse {
            resources: parse_event_resources(body)?,
        })
    }
}

/// Responses without `calendar-data` (deleted or forbidden) are dropped.
fn parse_event_resources(body: &[u8]) -> std::result::Result<Vec<EventResource>, ParseResponseError> {
    each_response(body, |response| {
        Some(EventResource {
            href: child_text(response, "href")?,
            data: child_text(response, "calendar-data")?,
        })
    })
}

/// `PROPFIND Depth: 1` on a calendar home set, asking for display names.
pub struct ListCalendarCollections<'a> {
    home_href: &'a str,
}

impl<'a> ListCalendarCollections<'a> {
    pub fn new(home_href: &'a str) -> Self {
        ListCalendarCollections { home_href }
    }
}

/// A calendar collection under the home set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCollection {
    pub href: String,
    pub display_name: Option<String>,
}

#[derive(Debug)]
pub struct ListCalendarCollectionsResponse {
    pub calendars: Vec<CalendarCollection>,
}

impl ListCalendarCollectionsResponse {
    /// The calendar whose display name is exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&CalendarCollection> {
        self.calendars
            .iter()
            .find(|c| c.display_name.as_deref() == Some(name))
    }
}

impl DavRequest for ListCalendarCollections<'_> {
    type Response = ListCalendarCollectionsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_href.to_string(),
            body: body.to_string(),
            headers: depth_one(),
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        ensure_success(parts)?;
        Ok(ListCalendarCollectionsResponse {
            calendars: parse_calendar_collections(body)?,
        })
    }
}

/// Only collections whose `resourcetype` holds a CalDAV `calendar` element
/// are kept; the home set itself and the scheduling inbox/outbox are not.
fn parse_calendar_collections(body: &[u8]) -> std::result::Result<Vec<CalendarCollection>, ParseResponseError> {
    each_response(body, |response| {
        let is_calendar = response
            .descendants()
            .find(|n| n.tag_name().name() == "resourcetype")
            .is_some_and(|rt| rt.children().any(|c| c.tag_name().name() == "calendar"));
        if !is_calendar {
            return None;
        }

        Some(CalendarCollection {
            href: child_text(response, "href")?,
            display_name: child_text(response, "displayname"),
        })
    })
}

/// Trimmed text of the first descendant named `name`, if non-empty.
fn child_text(node: roxmltree::Node, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
