use subtrack::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;
    let authorization = startup::build_authorization(&config)?;

    // Load the identity provider, then ask the user for consent
    authorization.initialize().await?;

    println!("Opening browser for Google Calendar authorization...");
    let token = authorization.request_token().await?;

    let expires = chrono::DateTime::from_timestamp_millis(token.expires_at)
        .map(|dt| dt.with_timezone(&config.timezone).to_rfc3339())
        .unwrap_or_else(|| token.expires_at.to_string());
    println!("Token successfully cached until {}", expires);

    Ok(())
}
