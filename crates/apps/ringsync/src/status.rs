//! `ringsync status`: stored accounts, token state and record counts

use anyhow::{Result, bail};
use oura::models::{Credential, RecordKind};
use oura::storage::{RecordStore, TokenStore};

use crate::cli::StatusArgs;

pub fn run<S: TokenStore + RecordStore>(store: &S, args: &StatusArgs) -> Result<()> {
    let accounts = match &args.account {
        Some(account_id) => vec![account_id.clone()],
        None => store.list_accounts()?,
    };

    if accounts.is_empty() {
        println!("No authorized accounts. Run `ringsync auth` to connect one.");
    }

    for account_id in &accounts {
        let Some(credential) = store.load_credential(account_id)? else {
            bail!("No credentials stored for account {account_id}");
        };
        println!("{}", describe_credential(&credential));
    }

    println!("\nStored records:");
    for kind in RecordKind::ALL {
        println!("  {:<16} {}", kind.table(), store.count_records(kind)?);
    }
    Ok(())
}

fn describe_credential(credential: &Credential) -> String {
    let expiry = match credential.expires_at {
        Some(at) if credential.is_expired() => format!("{} (expired)", at.to_rfc3339()),
        Some(at) => at.to_rfc3339(),
        None => "never".to_string(),
    };
    let scopes = if credential.granted_scopes.is_empty() {
        "-"
    } else {
        credential.granted_scopes.as_str()
    };

    format!(
        "Account {}\n  Token expires: {}\n  Scopes:        {}\n  Updated:       {}",
        credential.account_id,
        expiry,
        scopes,
        credential.updated_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_describe_expired_credential() {
        let credential = Credential::new("user-1", "a", "r")
            .with_expires_at(Utc::now() - Duration::hours(1))
            .with_scopes("daily heartrate");
        let text = describe_credential(&credential);
        assert!(text.starts_with("Account user-1"));
        assert!(text.contains("(expired)"));
        assert!(text.contains("daily heartrate"));
    }

    #[test]
    fn test_describe_credential_without_expiry() {
        let credential = Credential::new("user-1", "a", "r");
        let text = describe_credential(&credential);
        assert!(text.contains("Token expires: never"));
        assert!(text.contains("Scopes:        -"));
    }
}
