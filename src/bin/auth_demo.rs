// Example demonstrating the full session lifecycle against the fake
// backends: sign in, reconcile, inspect the session, sign out.
//
// $ cargo run --bin auth_demo -- --settings=settings/dev.toml

use checkpoint::application_port::*;
use checkpoint::bootstrap::build_auth_service;
use checkpoint::logger::*;
use checkpoint::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();

    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig {
        filter: project_settings.log.filter.clone(),
    })?;

    let auth = build_auth_service(&project_settings)?;

    let user = auth
        .sign_in(SignInInput {
            email: "demo@checkpoint.test".to_string(),
            password: "demo-password".to_string(),
        })
        .await?;
    println!("signed in as {} ({})", user.email, user.id);

    match auth.current_user().await {
        Some(user) => println!("reconciled user: {}", user.email),
        None => println!("reconciled to signed-out"),
    }

    match auth.current_session().await {
        Some(handle) => println!("access token present: {} chars", handle.access_token.len()),
        None => println!("no session handle"),
    }

    auth.sign_out().await;
    println!("signed out, current_user = {:?}", auth.current_user().await);

    Ok(())
}
