//! Account command handlers

use colored::Colorize;

use crate::auth::{LoginRequest, RegisterRequest};
use crate::commands::{prompt_line, App};
use crate::error::{ParleyError, Result};

/// `parley login`
pub async fn login(app: &App, email: String, password: Option<String>) -> Result<bool> {
    let password = resolve_password(password)?;
    let session = app.auth.login(&LoginRequest { email, password }).await?;

    let name = session.username.unwrap_or_else(|| "you".to_string());
    println!("{}", format!("Welcome back, {}!", name).green());
    Ok(true)
}

/// `parley register`, followed by an automatic login.
pub async fn register(app: &App, mut request: RegisterRequest) -> Result<bool> {
    if request.password.is_empty() {
        request.password = resolve_password(None)?;
    }

    let user = app.auth.register(&request).await?;
    println!(
        "{}",
        format!("Registration successful. Welcome, {}!", user.username).green()
    );

    app.auth
        .login(&LoginRequest {
            email: request.email,
            password: request.password,
        })
        .await?;
    println!("Logged in as {}", user.username.cyan());
    Ok(true)
}

/// `parley logout`
pub fn logout(app: &App) -> Result<bool> {
    app.auth.logout()?;
    println!("{}", "Logged out.".green());
    Ok(true)
}

/// `parley whoami`
pub fn whoami(app: &App) -> Result<bool> {
    match app.auth.current_user()? {
        Some(name) => {
            println!("Logged in as {}", name.cyan());
            Ok(true)
        }
        None => {
            println!(
                "{} Use {} to sign in.",
                "Not logged in.".yellow(),
                "parley login --email <EMAIL>".cyan()
            );
            Ok(false)
        }
    }
}

fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        return Ok(password);
    }
    match prompt_line("Password: ")? {
        Some(line) if !line.is_empty() => Ok(line),
        _ => Err(ParleyError::Auth("a password is required".into()).into()),
    }
}
