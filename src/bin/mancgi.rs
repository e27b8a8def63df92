//! CGI entry point for provider callbacks and redirect pages.
//!
//! Installed once and linked under each endpoint name in the `mancgi`
//! directory; `SCRIPT_NAME` selects the endpoint.

use std::io::{self, Read};
use std::process::ExitCode;

use billmgr_plugins::adapters::cgi::{write_response, CgiRequest};
use billmgr_plugins::application::callback::Endpoint;
use billmgr_plugins::application::EndpointResponse;
use billmgr_plugins::domain::foundation::BillingError;
use billmgr_plugins::logging::LogSession;
use billmgr_plugins::plugin::{block_on, PluginContext};

fn read_body() -> String {
    let length = std::env::var("CONTENT_LENGTH")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let mut body = String::new();
    if length > 0 {
        if let Err(e) = io::stdin().take(length).read_to_string(&mut body) {
            tracing::warn!(error = %e, "Request body not read");
        }
    }
    body
}

fn serve(request: CgiRequest, context: PluginContext) -> Result<EndpointResponse, BillingError> {
    let endpoint = Endpoint::from_name(&request.script)?;
    let router = context.callback_router();
    block_on(async { Ok(router.dispatch(endpoint, &request.envelope).await) })
}

fn main() -> ExitCode {
    let request = CgiRequest::from_env(std::env::vars(), &read_body());
    let response = PluginContext::load_config().and_then(|config| {
        let module = request
            .as_ref()
            .map(|r| r.script.trim_end_matches(".php").to_string())
            .unwrap_or_else(|_| "mancgi".to_string());
        let _log = LogSession::open(&config.logging, &module);
        let context = PluginContext::production(config)?;
        serve(request?, context)
    });

    let response = response.unwrap_or_else(|e| EndpointResponse::error(&e));
    match write_response(&mut io::stdout().lock(), &response) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
