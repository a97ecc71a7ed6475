//! Auth commands: login, register, password recovery, whoami, logout.

use super::{Context, Globals, block_on, print_json, prompt_line};
use crate::cli::AuthCommands;
use crate::error::{Error, Result};
use crate::model::User;
use crate::view::session;
use serde::Serialize;

#[derive(Serialize)]
struct UserOutput<'a> {
    id: i64,
    email: &'a str,
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

impl<'a> From<&'a User> for UserOutput<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id,
            email: &user.email,
            display_name: user.display_name(),
            role: user.role.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    message: &'a str,
}

/// Execute an auth command.
///
/// # Errors
///
/// Validation, backend or store errors.
pub fn execute(command: &AuthCommands, globals: &Globals<'_>) -> Result<()> {
    let ctx = Context::open(globals)?;
    let json = globals.json;

    match command {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_line("Password: ")?,
            };
            let user = block_on(session::login(&ctx.api, email, &password))??;
            if json {
                print_json(&UserOutput::from(&user))
            } else {
                println!("Logged in as {} (#{})", user.display_name(), user.id);
                Ok(())
            }
        }
        AuthCommands::Register(args) => {
            let response = block_on(ctx.api.auth().register(&args.email, &args.password, &args.confirm))??;
            print_message(&response.message, "Account created. You can log in now.", json)
        }
        AuthCommands::ForgotPassword { email } => {
            let response = block_on(ctx.api.auth().forgot_password(email))??;
            print_message(
                &response.message,
                "If that address is registered, a reset link is on its way.",
                json,
            )
        }
        AuthCommands::ResetPassword(args) => {
            let response =
                block_on(ctx.api.auth().reset_password(&args.token, &args.password, &args.confirm))??;
            print_message(&response.message, "Password updated.", json)
        }
        AuthCommands::Whoami => {
            let user = block_on(session::restore(&ctx.api))??.ok_or(Error::NotAuthenticated)?;
            if json {
                print_json(&UserOutput::from(&user))
            } else {
                println!("{} <{}>", user.display_name(), user.email);
                println!("  ID:   {}", user.id);
                if let Some(role) = &user.role {
                    println!("  Role: {role}");
                }
                Ok(())
            }
        }
        AuthCommands::Logout => {
            session::logout(ctx.api.session())?;
            print_message("", "Logged out.", json)
        }
    }
}

fn print_message(message: &str, fallback: &str, json: bool) -> Result<()> {
    let message = if message.trim().is_empty() { fallback } else { message };
    if json {
        print_json(&MessageOutput { message })
    } else {
        println!("{message}");
        Ok(())
    }
}
