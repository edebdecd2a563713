//! Sign-in, registration and sign-out commands.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, Password};

use crate::api::Credentials;
use crate::cli::args::{LoginCliArgs, RegisterCliArgs};
use crate::cli::CliContext;
use crate::session::RegistrationProfile;

pub async fn handle_login_command(context: &mut CliContext, args: LoginCliArgs) -> Result<()> {
    let theme = ColorfulTheme::default();
    let email = match args.email {
        Some(email) => email,
        None => prompt_text(&theme, "Email")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()?,
    };

    let result = context
        .client()
        .session()
        .authenticate(Credentials { email, password })
        .await;
    let session = context.check(result)?;

    context
        .notices()
        .success(format!("Signed in as {}", session.user.name));
    Ok(())
}

pub async fn handle_register_command(
    context: &mut CliContext,
    args: RegisterCliArgs,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let name = match args.name {
        Some(name) => name,
        None => prompt_text(&theme, "Full name")?,
    };
    let email = match args.email {
        Some(email) => email,
        None => prompt_text(&theme, "Email")?,
    };
    let (password, confirm_password) = match args.password {
        Some(password) => (password.clone(), password),
        None => {
            let password = Password::with_theme(&theme)
                .with_prompt("Password")
                .interact()?;
            let confirm = Password::with_theme(&theme)
                .with_prompt("Confirm password")
                .interact()?;
            (password, confirm)
        }
    };

    let result = context
        .client()
        .session()
        .register(RegistrationProfile {
            name,
            email,
            password,
            confirm_password,
        })
        .await;
    let session = context.check(result)?;

    context.notices().success(format!(
        "Account created, signed in as {}",
        session.user.email
    ));
    Ok(())
}

pub async fn handle_logout_command(context: &mut CliContext) -> Result<()> {
    if context.client().session().invalidate().await {
        context.notices().success("Signed out");
    } else {
        context.notices().info("Not signed in");
    }
    Ok(())
}

pub async fn handle_whoami_command(context: &mut CliContext) -> Result<()> {
    let session = context.require_session().await?;
    println!("{} <{}>", session.user.name, session.user.email);
    println!("Backend: {}", context.client().config().api.base_url);
    Ok(())
}

fn prompt_text(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .interact_text()?;
    Ok(value.trim().to_string())
}
