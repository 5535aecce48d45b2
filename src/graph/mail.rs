//! Outlook email operations: draft, send, search, read.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{GraphClient, GraphError};

/// Search results are capped at this page size regardless of caller input.
const MAX_SEARCH_RESULTS: u32 = 1000;

/// Email importance level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

fn default_body_type() -> String {
    "HTML".to_string()
}

fn default_folder() -> String {
    "inbox".to_string()
}

fn default_top() -> u32 {
    10
}

/// A fully-specified outgoing message, used to create a draft.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftMessage {
    /// Recipient email addresses
    pub to: Vec<String>,
    pub subject: String,
    /// Body content, interpreted according to `body_type`
    pub body: String,
    /// CC recipients; omitted from the payload when empty
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub importance: Importance,
    /// Graph content type: "HTML" or "Text"
    #[serde(default = "default_body_type")]
    pub body_type: String,
}

/// Arguments for a send operation.
///
/// Either `draft_id` references an existing draft (all other fields are
/// ignored), or `to`, `subject`, and `body` must all be present for a
/// compose-and-send in one request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendMail {
    #[serde(default)]
    pub draft_id: Option<String>,
    #[serde(default)]
    pub to: Option<Vec<String>>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default = "default_body_type")]
    pub body_type: String,
}

impl Default for SendMail {
    fn default() -> Self {
        Self {
            draft_id: None,
            to: None,
            subject: None,
            body: None,
            cc: Vec::new(),
            importance: Importance::default(),
            body_type: default_body_type(),
        }
    }
}

/// Mailbox search parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query in KQL syntax, e.g. `from:boss@company.com`
    #[serde(default)]
    pub query: Option<String>,
    /// Folder to search: inbox, sentitems, drafts, ...
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Maximum number of results; capped at 1000 server-side page limit
    #[serde(default = "default_top")]
    pub top: u32,
    /// Only return messages received at or after this instant
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            folder: default_folder(),
            top: default_top(),
            from_date: None,
        }
    }
}

/// Builds the Graph message object shared by draft and compose-and-send.
fn build_message(
    to: &[String],
    subject: &str,
    body: &str,
    cc: &[String],
    importance: Importance,
    body_type: &str,
) -> Value {
    let mut message = json!({
        "subject": subject,
        "importance": importance,
        "body": {
            "contentType": body_type,
            "content": body,
        },
        "toRecipients": recipients(to),
    });

    if !cc.is_empty() {
        message["ccRecipients"] = recipients(cc);
    }

    message
}

/// Wraps addresses in the Graph recipient shape.
fn recipients(addresses: &[String]) -> Value {
    Value::Array(
        addresses
            .iter()
            .map(|addr| json!({"emailAddress": {"address": addr}}))
            .collect(),
    )
}

impl GraphClient {
    /// Creates a draft email in the user's mailbox and returns the draft
    /// object (including its id).
    pub async fn create_draft(&self, draft: &DraftMessage) -> Result<Value, GraphError> {
        let message = build_message(
            &draft.to,
            &draft.subject,
            &draft.body,
            &draft.cc,
            draft.importance,
            &draft.body_type,
        );

        let result = self
            .request(Method::POST, "/me/messages", Some(&message), None)
            .await?;

        info!(
            draft_id = result["id"].as_str().unwrap_or_default(),
            "created draft email"
        );
        Ok(result)
    }

    /// Sends an email: an existing draft when `draft_id` is set, otherwise
    /// a compose-and-send requiring `to`, `subject`, and `body`.
    ///
    /// Missing required fields fail with [`GraphError::InvalidRequest`]
    /// before any request is issued.
    pub async fn send_email(&self, send: &SendMail) -> Result<(), GraphError> {
        if let Some(draft_id) = &send.draft_id {
            let path = format!("/me/messages/{}/send", draft_id);
            self.request(Method::POST, &path, None, None).await?;
            info!(draft_id = %draft_id, "sent draft email");
            return Ok(());
        }

        let (to, subject, body) = match (&send.to, &send.subject, &send.body) {
            (Some(to), Some(subject), Some(body))
                if !to.is_empty() && !subject.is_empty() && !body.is_empty() =>
            {
                (to, subject, body)
            }
            _ => {
                return Err(GraphError::InvalidRequest(
                    "to, subject, and body are required when draft_id is not provided".to_string(),
                ))
            }
        };

        let message = build_message(to, subject, body, &send.cc, send.importance, &send.body_type);
        self.request(
            Method::POST,
            "/me/sendMail",
            Some(&json!({"message": message})),
            None,
        )
        .await?;

        info!(recipients = to.len(), "sent new email");
        Ok(())
    }

    /// Searches a mail folder, newest first, and returns the matching
    /// message objects.
    pub async fn search_emails(&self, search: &SearchQuery) -> Result<Vec<Value>, GraphError> {
        let path = format!("/me/mailFolders/{}/messages", search.folder);

        let mut params = vec![
            (
                "$top".to_string(),
                search.top.min(MAX_SEARCH_RESULTS).to_string(),
            ),
            ("$orderby".to_string(), "receivedDateTime DESC".to_string()),
        ];

        if let Some(from_date) = search.from_date {
            params.push((
                "$filter".to_string(),
                format!(
                    "receivedDateTime ge {}",
                    from_date.format("%Y-%m-%dT%H:%M:%SZ")
                ),
            ));
        }

        if let Some(query) = &search.query {
            params.push(("$search".to_string(), format!("\"{}\"", query)));
        }

        let result = self
            .request(Method::GET, &path, None, Some(&params))
            .await?;
        let messages = result["value"].as_array().cloned().unwrap_or_default();

        info!(count = messages.len(), folder = %search.folder, "email search completed");
        Ok(messages)
    }

    /// Retrieves one message by id, verbatim.
    pub async fn read_email(&self, message_id: &str) -> Result<Value, GraphError> {
        let path = format!("/me/messages/{}", message_id);
        let result = self.request(Method::GET, &path, None, None).await?;

        info!(message_id = %message_id, "retrieved email");
        Ok(result)
    }
}
