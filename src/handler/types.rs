use serde::{Deserialize, Serialize};

/// Slash command payload as posted by Slack (`application/x-www-form-urlencoded`).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SlackCommand {
    pub team_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
}

impl SlackCommand {
    /// Decode the raw form body. Repeated `text` values are joined with a
    /// single space; every other field keeps its first value. Fields this
    /// handler has no use for (token, response_url, ...) are skipped.
    pub fn from_form(raw_body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw_body)?;

        let mut command = SlackCommand::default();
        let mut text = Vec::new();

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "text" => {
                    text.push(value);
                    continue;
                }
                "team_id" => &mut command.team_id,
                "channel_id" => &mut command.channel_id,
                "user_id" => &mut command.user_id,
                "user_name" => &mut command.user_name,
                "command" => &mut command.command,
                _ => continue,
            };
            if slot.is_empty() {
                *slot = value;
            }
        }

        command.text = text.join(" ");
        Ok(command)
    }
}

/// Message returned to Slack as the synchronous slash command response.
#[derive(Debug, Serialize, PartialEq)]
pub struct SlackMessage {
    pub response_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
}

// Custom Search JSON API
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub link: String,
    #[serde(default)]
    pub title: String,
}
