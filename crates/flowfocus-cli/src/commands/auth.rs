use clap::Subcommand;
use flowfocus_core::integrations::{google_token, keyring_store, TokenSource, GOOGLE_TOKEN_KEY};

use super::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Google Calendar: login / logout / status
    Google {
        #[command(subcommand)]
        action: AuthOp,
    },
}

#[derive(Subcommand)]
pub enum AuthOp {
    /// Store an access token in the OS keyring
    Login {
        /// OAuth access token with calendar read scope
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Google { action: op } => handle_google(op),
    }
}

fn handle_google(op: AuthOp) -> CliResult {
    match op {
        AuthOp::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("--token must not be empty".into());
            }
            keyring_store::set(GOOGLE_TOKEN_KEY, token)?;
            println!("Google authenticated");
        }
        AuthOp::Logout => {
            keyring_store::delete(GOOGLE_TOKEN_KEY)?;
            println!("Google disconnected");
        }
        AuthOp::Status => {
            let status = match google_token()? {
                Some((_, TokenSource::Environment)) => "authenticated (environment)",
                Some((_, TokenSource::Keyring)) => "authenticated",
                None => "not authenticated",
            };
            println!("{status}");
        }
    }
    Ok(())
}
