//! Outlook calendar operations: availability lookup and meeting creation.
//!
//! Graph expects event times as offset-less local datetimes paired with an
//! explicit `timeZone` field, so these operations take [`NaiveDateTime`]
//! plus a timezone name rather than instants.

use chrono::NaiveDateTime;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{GraphClient, GraphError};

/// Conferencing provider stamped on online meetings.
const ONLINE_MEETING_PROVIDER: &str = "teamsForBusiness";

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Parameters for a scheduling-assistant availability lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// Attendee email addresses whose schedules are inspected
    pub attendees: Vec<String>,
    /// Meeting duration in minutes; also the availability-view granularity
    pub duration_minutes: u32,
    /// Start of the window to search
    pub start: NaiveDateTime,
    /// End of the window to search
    pub end: NaiveDateTime,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Parameters for creating a calendar event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub subject: String,
    /// Attendee email addresses, each invited as required
    pub attendees: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: Option<String>,
    /// Optional HTML meeting description
    #[serde(default)]
    pub body: Option<String>,
    /// When set, the event is created as an online meeting
    #[serde(default)]
    pub is_online: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Formats a datetime the way Graph event payloads expect: no offset,
/// the timezone travels in its own field.
fn format_graph_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

impl GraphClient {
    /// Queries attendee availability over a time window via the
    /// scheduling assistant.
    pub async fn check_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Value, GraphError> {
        let data = json!({
            "schedules": query.attendees,
            "startTime": {
                "dateTime": format_graph_datetime(query.start),
                "timeZone": query.timezone,
            },
            "endTime": {
                "dateTime": format_graph_datetime(query.end),
                "timeZone": query.timezone,
            },
            "availabilityViewInterval": query.duration_minutes,
        });

        let result = self
            .request(Method::POST, "/me/calendar/getSchedule", Some(&data), None)
            .await?;

        info!(
            attendees = query.attendees.len(),
            "retrieved attendee schedules"
        );
        Ok(result)
    }

    /// Creates a calendar event and returns the created event object.
    pub async fn schedule_meeting(&self, meeting: &MeetingRequest) -> Result<Value, GraphError> {
        let attendees: Vec<Value> = meeting
            .attendees
            .iter()
            .map(|addr| {
                json!({
                    "emailAddress": {"address": addr},
                    "type": "required",
                })
            })
            .collect();

        let mut event = json!({
            "subject": meeting.subject,
            "start": {
                "dateTime": format_graph_datetime(meeting.start),
                "timeZone": meeting.timezone,
            },
            "end": {
                "dateTime": format_graph_datetime(meeting.end),
                "timeZone": meeting.timezone,
            },
            "attendees": attendees,
        });

        if let Some(location) = &meeting.location {
            event["location"] = json!({"displayName": location});
        }

        if let Some(body) = &meeting.body {
            event["body"] = json!({
                "contentType": "HTML",
                "content": body,
            });
        }

        if meeting.is_online {
            event["isOnlineMeeting"] = json!(true);
            event["onlineMeetingProvider"] = json!(ONLINE_MEETING_PROVIDER);
        }

        let result = self
            .request(Method::POST, "/me/events", Some(&event), None)
            .await?;

        info!(
            event_id = result["id"].as_str().unwrap_or_default(),
            subject = %meeting.subject,
            "created meeting"
        );
        Ok(result)
    }
}
