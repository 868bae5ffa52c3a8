use crate::error::{authorization_error, load_error, AppResult};
use tracing::{debug, info};
use url::Url;

const SUCCESS_PAGE: &str = "Authorization successful! You can close this window.";
const FAILURE_PAGE: &str = "Authorization failed. You can close this window.";

/// What the provider sent to the loopback redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Error(String),
}

/// Parse a callback request path such as `/?code=...&state=...`
///
/// Returns `None` for requests that are not the provider's redirect
/// (favicon fetches, or a `state` that does not match ours).
pub fn parse_callback(request_path: &str, expected_state: &str) -> Option<CallbackOutcome> {
    let url = Url::parse(&format!("http://localhost{}", request_path)).ok()?;

    let mut code = None;
    let mut error = None;
    let mut error_description = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return None;
    }

    if let Some(error) = error {
        let message = match error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        };
        return Some(CallbackOutcome::Error(message));
    }

    code.map(CallbackOutcome::Code)
}

/// Listens on the loopback port for the provider's redirect
pub struct CallbackListener {
    server: tiny_http::Server,
    port: u16,
}

impl CallbackListener {
    pub fn bind(port: u16) -> AppResult<Self> {
        let server = tiny_http::Server::http(("127.0.0.1", port)).map_err(|e| {
            load_error(&format!(
                "Failed to start OAuth callback listener on port {}: {}",
                port, e
            ))
        })?;
        // Port 0 asks the OS for a free port
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(port);
        Ok(Self { server, port })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Block until the provider redirects back with a code or an error
    pub fn wait(self, expected_state: &str) -> AppResult<CallbackOutcome> {
        info!("Waiting for authorization callback on port {}", self.port);

        loop {
            let request = self
                .server
                .recv()
                .map_err(|e| authorization_error(&format!("Callback listener failed: {}", e)))?;

            match parse_callback(request.url(), expected_state) {
                Some(outcome) => {
                    let page = match outcome {
                        CallbackOutcome::Code(_) => SUCCESS_PAGE,
                        CallbackOutcome::Error(_) => FAILURE_PAGE,
                    };
                    if let Err(e) = request.respond(tiny_http::Response::from_string(page)) {
                        debug!("Failed to answer callback request: {}", e);
                    }
                    return Ok(outcome);
                }
                None => {
                    debug!("Ignoring unrelated request to {}", request.url());
                    let not_found = tiny_http::Response::empty(tiny_http::StatusCode(404));
                    if let Err(e) = request.respond(not_found) {
                        debug!("Failed to answer unrelated request: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn get(port: u16, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(
            stream,
            "GET {} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n",
            path
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn parses_code() {
        let outcome = parse_callback("/?state=s1&code=4%2F0abc&scope=x", "s1");
        assert_eq!(outcome, Some(CallbackOutcome::Code("4/0abc".to_string())));
    }

    #[test]
    fn parses_provider_error() {
        let outcome = parse_callback("/?error=access_denied&state=s1", "s1");
        assert_eq!(
            outcome,
            Some(CallbackOutcome::Error("access_denied".to_string()))
        );

        let outcome = parse_callback(
            "/?error=invalid_scope&error_description=Bad+scope&state=s1",
            "s1",
        );
        assert_eq!(
            outcome,
            Some(CallbackOutcome::Error("invalid_scope: Bad scope".to_string()))
        );
    }

    #[test]
    fn ignores_unrelated_requests() {
        assert_eq!(parse_callback("/favicon.ico", "s1"), None);
        assert_eq!(parse_callback("/?code=abc&state=other", "s1"), None);
        assert_eq!(parse_callback("/?code=abc", "s1"), None);
    }

    #[test]
    fn wait_answers_unrelated_requests_until_callback() {
        let listener = CallbackListener::bind(0).unwrap();
        let port = listener.port;
        assert_ne!(port, 0);

        let browser = std::thread::spawn(move || {
            let favicon = get(port, "/favicon.ico");
            let callback = get(port, "/?code=abc&state=s1");
            (favicon, callback)
        });

        let outcome = listener.wait("s1").unwrap();
        let (favicon, callback) = browser.join().unwrap();

        assert_eq!(outcome, CallbackOutcome::Code("abc".to_string()));
        assert!(favicon.starts_with("HTTP/1.1 404"));
        assert!(callback.contains(SUCCESS_PAGE));
    }
}
