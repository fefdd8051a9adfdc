//! Receiving the authorization redirect
//!
//! Either a local HTTP listener bound to the redirect URI's port, or a
//! redirect URL the user pastes back from the browser.

use anyhow::{Context, Result, bail};
use log::debug;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

/// Code and state echoed back by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Parse the provider redirect.
///
/// Accepts a full redirect URL or just the request target (`/callback?code=...`).
/// An `error` parameter from the provider is turned into an error.
pub fn parse_callback(input: &str) -> Result<CallbackParams> {
    let input = input.trim();
    let url = if input.starts_with('/') {
        url::Url::parse(&format!("http://localhost{input}"))
    } else {
        url::Url::parse(input)
    }
    .with_context(|| format!("Invalid redirect URL: {input}"))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(err) = error {
        match description {
            Some(description) => bail!("OAuth error: {} ({})", err, description),
            None => bail!("OAuth error: {}", err),
        }
    }

    Ok(CallbackParams {
        code: code.context("No authorization code received")?,
        state: state.context("No state parameter received")?,
    })
}

/// Bind a listener for the redirect URI when it points at this machine.
///
/// Returns `Ok(None)` for non-local redirect hosts; the caller then asks the
/// user to paste the redirect URL instead.
pub fn bind_redirect_listener(redirect_uri: &str) -> Result<Option<TcpListener>> {
    let url = url::Url::parse(redirect_uri)
        .with_context(|| format!("Invalid redirect URI: {redirect_uri}"))?;

    let host = url.host_str().unwrap_or_default();
    if host != "localhost" && host != "127.0.0.1" {
        return Ok(None);
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let listener = TcpListener::bind(("127.0.0.1", port))
        .with_context(|| format!("Could not bind callback listener on port {port}"))?;
    Ok(Some(listener))
}

/// Wait for the OAuth redirect on `listener` and extract the callback parameters
pub fn wait_for_callback(listener: &TcpListener) -> Result<CallbackParams> {
    loop {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        // Format: GET /callback?code=AUTH_CODE&state=... HTTP/1.1
        let target = request_line.split_whitespace().nth(1).unwrap_or_default();
        if !target.contains('?') {
            // Browsers also ask for /favicon.ico and the like
            debug!("Ignoring callback request without query: {}", target);
            let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
            stream.write_all(response.as_bytes()).ok();
            continue;
        }

        let result = parse_callback(target);

        let (status, body) = if result.is_ok() {
            ("200 OK", "Authentication successful! You can close this window.")
        } else {
            ("400 Bad Request", "Authentication failed. Please try again.")
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        return result;
    }
}
