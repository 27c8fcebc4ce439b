use serde::{Deserialize, Serialize};

/// Notification channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    /// Every channel kind, in the order the directory registers them.
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Sms, Channel::Push];
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
            Channel::Push => write!(f, "push"),
        }
    }
}

/// One notification request, routed as-is to the actors of its channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub channel: Channel,
    pub to: String,
    pub from: String,
    pub payload: String,
    pub title: String,
}

impl Action {
    pub fn new(
        channel: Channel,
        to: impl Into<String>,
        from: impl Into<String>,
        payload: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            to: to.into(),
            from: from.into(),
            payload: payload.into(),
            title: title.into(),
        }
    }
}

/// Request body for `POST /comms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub channel: Channel,
    pub to: String,
    pub from: String,
    pub payload: String,
    pub title: String,
}

impl From<SendRequest> for Action {
    fn from(req: SendRequest) -> Self {
        Action {
            channel: req.channel,
            to: req.to,
            from: req.from,
            payload: req.payload,
            title: req.title,
        }
    }
}

/// Acceptance response for `POST /comms`.
///
/// `status` is `"true"` once the request sits in the ingress queue; it says
/// nothing about delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: String,
}

impl SendResponse {
    pub fn accepted(accepted: bool) -> Self {
        Self {
            status: accepted.to_string(),
        }
    }
}
