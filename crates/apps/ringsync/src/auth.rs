//! `ringsync auth`: OAuth2 authorization code flow
//!
//! Uses a local HTTP listener to receive the callback when the redirect URI
//! points at this machine, otherwise asks for the redirect URL to be pasted.

use anyhow::{Context, Result};
use log::{info, warn};
use oura::oauth::{CallbackParams, bind_redirect_listener, parse_callback, wait_for_callback};
use oura::{OAuthManager, OuraClient};
use std::io::{self, BufRead, Write};
use std::net::TcpListener;
use std::sync::Arc;

pub fn run(oauth: Arc<OAuthManager>, args: &crate::cli::AuthArgs) -> Result<()> {
    let request = oauth.build_authorization_request()?;

    // Bind before the browser opens so a fast redirect isn't missed
    let listener = match bind_redirect_listener(&oauth.settings().redirect_uri) {
        Ok(listener) => listener,
        Err(e) => {
            warn!("{:#}; falling back to pasting the redirect URL", e);
            None
        }
    };

    println!("\n=== Oura Authentication Required ===");
    if args.no_browser {
        println!("Visit this URL to authorize ringsync:\n{}", request.url);
    } else {
        println!("Opening browser for authentication...");
        println!("If the browser doesn't open, visit: {}", request.url);
        if let Err(e) = open::that(&request.url) {
            eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
        }
    }

    let params = receive_callback(listener.as_ref())?;

    println!("Exchanging authorization code for tokens...");
    let token = oauth.exchange_code(&params.code, &params.state, &request.state)?;

    // No credential is stored yet, so identify with the fresh token directly
    let client = OuraClient::new(oauth.clone(), String::new());
    let account_id = client
        .identify(&token.access_token)
        .context("Failed to look up the authorized account")?;

    let credential = oauth.save(&account_id, &token)?;
    info!("Stored credentials for {}", account_id);

    println!("Authentication successful!");
    println!("  Account: {}", credential.account_id);
    println!("  Scopes:  {}", credential.granted_scopes);
    Ok(())
}

fn receive_callback(listener: Option<&TcpListener>) -> Result<CallbackParams> {
    match listener {
        Some(listener) => {
            println!("Waiting for authorization...");
            wait_for_callback(listener)
        }
        None => {
            print!("Paste the full URL you were redirected to: ");
            io::stdout().flush().ok();

            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read redirect URL")?;
            parse_callback(&line)
        }
    }
}
