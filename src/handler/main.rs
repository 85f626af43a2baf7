use std::sync::Arc;

use lambda_http::http::{Method, StatusCode};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::{error, info, warn};

mod config;
mod search;
mod slack;
mod types;

use config::Config;
use search::{CustomSearchClient, SearchError, SearchProvider};
use slack::{SlackVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use types::SlackCommand;

/// Everything a request needs, built once at cold start.
struct AppState {
    config: Config,
    verifier: SlackVerifier,
    search: Arc<dyn SearchProvider>,
}

impl AppState {
    fn new(config: Config, search: Arc<dyn SearchProvider>) -> Self {
        let verifier = SlackVerifier::new(&config.slack_signing_secret);
        Self {
            config,
            verifier,
            search,
        }
    }
}

async fn function_handler(state: &AppState, event: Request) -> Result<Response<Body>, Error> {
    if *event.method() != Method::POST {
        return text_response(StatusCode::METHOD_NOT_ALLOWED, "Only POST requests are accepted");
    }

    // Captured once; both the verifier and the form decoder read these bytes
    let raw_body: &[u8] = event.body();

    let slack_timestamp = header_str(&event, TIMESTAMP_HEADER);
    let slack_signature = header_str(&event, SIGNATURE_HEADER);

    if let Err(reason) = state.verifier.verify(slack_timestamp, slack_signature, raw_body) {
        warn!(reason = %reason, "slack_verification_failed");
        return text_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let command = match SlackCommand::from_form(raw_body) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "form_parse_failed");
            return text_response(StatusCode::BAD_REQUEST, "Couldn't parse form");
        }
    };

    let query = command.text.trim();
    if query.is_empty() {
        warn!(user_id = %command.user_id, "empty_text_in_form");
        return text_response(StatusCode::BAD_REQUEST, "Empty text in form");
    }

    info!(
        team_id = %command.team_id,
        channel_id = %command.channel_id,
        user_id = %command.user_id,
        user_name = %command.user_name,
        command = %command.command,
        query = %query,
        "slash_command_received"
    );

    let text = match state.search.search_first_link(query).await {
        Ok(link) => link,
        Err(SearchError::NotFound) => {
            info!(query = %query, "search_not_found");
            format!("「{}」に関する情報は見つかりませんでした", query)
        }
        Err(e) => {
            error!(error = %e, "search_failed");
            return text_response(StatusCode::BAD_GATEWAY, "Search request failed");
        }
    };

    let message = slack::format_slack_message(text, &state.config);
    info!(text = %message.text, "slack_message_sent");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&message)?))?)
}

/// Header value as text; absent or non-ASCII headers read as empty.
fn header_str<'a>(event: &'a Request, name: &str) -> &'a str {
    event
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn text_response(status: StatusCode, text: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Body::from(text.to_string()))?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let state = match Config::from_env() {
        Ok(config) => {
            info!(config = ?config, "config_loaded");
            match CustomSearchClient::new(&config) {
                Ok(client) => Some(Arc::new(AppState::new(config, Arc::new(client)))),
                Err(e) => {
                    error!(error = %e, "search_client_init_failed");
                    None
                }
            }
        }
        Err(e) => {
            error!(error = %e, "config_load_failed");
            None
        }
    };

    // A broken configuration fails each request instead of the whole function
    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move {
            match state {
                Some(state) => function_handler(&state, event).await,
                None => text_response(StatusCode::INTERNAL_SERVER_ERROR, "Service misconfigured"),
            }
        }
    }))
    .await
}
