//! Locate a calendar collection by display name.
//!
//! iCloud discovery flow:
//! 1. current-user-principal on caldav.icloud.com
//! 2. calendar-home-set on the principal
//! 3. PROPFIND the home set and match `displayname`

use anyhow::{Context, Result};
use libdav::caldav::FindCalendarHomeSet;

use crate::caldav::{ICloudCalDavClient, ListCalendarCollections, absolute_url};

/// A calendar collection found on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundCalendar {
    pub href: String,
    pub url: String,
}

/// Find the calendar named `name`, or `None` if the account has no such
/// calendar.
pub async fn find_calendar(caldav: &ICloudCalDavClient, name: &str) -> Result<Option<FoundCalendar>> {
    let principal = caldav
        .find_current_user_principal()
        .await
        .context("Failed to find current user principal")?
        .ok_or_else(|| anyhow::anyhow!(
            "iCloud authentication failed. Check the username and app-specific password."
        ))?;

    let home_set_response = caldav
        .request(FindCalendarHomeSet::new(&principal))
        .await
        .context("Failed to find calendar home set")?;

    let calendar_home = home_set_response
        .home_sets
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No calendar home set found for this account"))?;

    let listing = caldav
        .request(ListCalendarCollections::new(calendar_home.path()))
        .await
        .context("Failed to list calendars")?;

    let found = listing.find_by_name(name).map(|collection| FoundCalendar {
        href: collection.href.clone(),
        url: absolute_url(caldav, &collection.href),
    });

    if found.is_none() {
        tracing::debug!(
            calendar = name,
            available = ?listing
                .calendars
                .iter()
                .filter_map(|c| c.display_name.as_deref())
                .collect::<Vec<_>>(),
            "Calendar not found"
        );
    }

    Ok(found)
}
