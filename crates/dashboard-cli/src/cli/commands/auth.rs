//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use dashboard_core::login::{LoginForm, LoginOutcome};
use dashboard_core::validation::Field;

use super::load_session;

/// Values given on the command line; missing ones are prompted for.
#[derive(Debug, Default)]
pub struct LoginArgs {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl LoginArgs {
    fn take(&mut self, field: Field) -> Option<String> {
        match field {
            Field::FirstName => self.first_name.take(),
            Field::LastName => self.last_name.take(),
            Field::Email => self.email.take(),
            Field::PhoneNumber => self.phone.take(),
        }
    }
}

fn prompt(label: &str, hint: Option<&str>) -> Result<String> {
    match hint {
        Some(hint) => print!("{label} ({hint}): "),
        None => print!("{label}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .with_context(|| format!("read {label}"))?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub fn login(mut args: LoginArgs) -> Result<()> {
    let mut session = load_session()?;

    if let Some(current) = session.user() {
        println!(
            "Already logged in as {} ({}).",
            current.display_name(),
            current.email
        );
        println!("Run `dashboard logout` first to switch accounts.");
        return Ok(());
    }

    let mut form = LoginForm::new();
    for &field in Field::all() {
        let value = match args.take(field) {
            Some(value) => value,
            None => {
                let hint = (field == Field::PhoneNumber).then_some("e.g. +254712345678");
                prompt(field.label(), hint)?
            }
        };
        form.set(field, value);
    }

    match form.submit(&mut session) {
        LoginOutcome::Authenticated(record) => {
            println!("✓ Logged in as {}", record.display_name());
            println!("  Session saved to: {}", session.store().path().display());
            Ok(())
        }
        LoginOutcome::InvalidFields(errors) => {
            for (field, field_errors) in &errors {
                eprintln!("{}:", field.label());
                for error in field_errors {
                    eprintln!("  - {error}");
                }
            }
            anyhow::bail!("Login failed: please fix the errors above")
        }
        LoginOutcome::Rejected(message) => {
            anyhow::bail!("Login failed: {message}")
        }
    }
}

pub fn logout() -> Result<()> {
    let mut session = load_session()?;
    let path = session.store().path().to_path_buf();
    let was_logged_in = session
        .logout()
        .with_context(|| format!("clear session at {}", path.display()))?;

    if was_logged_in {
        println!("✓ Logged out");
        println!("  Session removed from: {}", path.display());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn whoami() -> Result<()> {
    let session = load_session()?;
    match session.user() {
        Some(user) => {
            println!("{}", user.display_name());
            println!("  Email: {}", user.email);
            println!("  Phone: {}", user.phone_number);
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
