//! Line commands typed at the prompt.

use anyhow::{anyhow, bail, Context, Result};
use client_core::{ProfileUpdate, Registration};
use shared::domain::{ProfileAction, ServiceKind};

pub const HELP: &str = "\
navigation:  home | signin | signup | forgot | cancel | open <service> | close | profile <action>
auth:        login <email> <password>
             register <email> <password> <first> <last> <phone> [--agree]
             request-otp <email> | otp <code> | reset <new> <confirm>
services:    set <field>=<value>... | submit | feedback <text>
profile:     edit-profile <first> <last> <phone>
             change-password <current> <new> <confirm>
             confirm | logout
other:       dismiss | help | quit
services are airtime, data, electricity, cable-tv, fund-wallet, feedback
profile actions are edit-profile, change-password, logout, delete-account";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    SignIn,
    SignUp,
    Login {
        email: String,
        password: String,
    },
    Register(Registration),
    Forgot,
    RequestOtp {
        email: String,
    },
    Otp {
        code: String,
    },
    Reset {
        new_password: String,
        confirm_password: String,
    },
    Cancel,
    Open(ServiceKind),
    Set(Vec<(String, String)>),
    Submit,
    Close,
    Feedback(String),
    Profile(ProfileAction),
    EditProfile(ProfileUpdate),
    ChangePassword {
        current_password: String,
        new_password: String,
        confirm_password: String,
    },
    Confirm,
    Logout,
    Dismiss,
    Help,
    Quit,
}

impl Command {
    /// Commands accepted while a modal alert waits for dismissal.
    pub fn passes_modal_alert(&self) -> bool {
        matches!(self, Command::Dismiss | Command::Help | Command::Quit)
    }
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "home" => bare(Command::Home, &args, "home")?,
        "signin" => bare(Command::SignIn, &args, "signin")?,
        "signup" => bare(Command::SignUp, &args, "signup")?,
        "login" => {
            let [email, password] = exact::<2>(&args, "login <email> <password>")?;
            Command::Login { email, password }
        }
        "register" => parse_register(&args)?,
        "forgot" => bare(Command::Forgot, &args, "forgot")?,
        "request-otp" => {
            let [email] = exact::<1>(&args, "request-otp <email>")?;
            Command::RequestOtp { email }
        }
        "otp" => {
            let [code] = exact::<1>(&args, "otp <code>")?;
            Command::Otp { code }
        }
        "reset" => {
            let [new_password, confirm_password] = exact::<2>(&args, "reset <new> <confirm>")?;
            Command::Reset {
                new_password,
                confirm_password,
            }
        }
        "cancel" => bare(Command::Cancel, &args, "cancel")?,
        "open" => {
            if args.is_empty() {
                bail!("usage: open <service>");
            }
            Command::Open(args.join(" ").parse()?)
        }
        "set" => Command::Set(parse_assignments(&args)?),
        "submit" => bare(Command::Submit, &args, "submit")?,
        "close" => bare(Command::Close, &args, "close")?,
        "feedback" => {
            if args.is_empty() {
                bail!("usage: feedback <text>");
            }
            Command::Feedback(args.join(" "))
        }
        "profile" => {
            let [action] = exact::<1>(&args, "profile <action>")?;
            Command::Profile(action.parse()?)
        }
        "edit-profile" => {
            let [first_name, last_name, phone] =
                exact::<3>(&args, "edit-profile <first> <last> <phone>")?;
            Command::EditProfile(ProfileUpdate {
                first_name,
                last_name,
                phone,
            })
        }
        "change-password" => {
            let [current_password, new_password, confirm_password] =
                exact::<3>(&args, "change-password <current> <new> <confirm>")?;
            Command::ChangePassword {
                current_password,
                new_password,
                confirm_password,
            }
        }
        "confirm" => bare(Command::Confirm, &args, "confirm")?,
        "logout" => bare(Command::Logout, &args, "logout")?,
        "dismiss" => bare(Command::Dismiss, &args, "dismiss")?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}'; type 'help' for the list"),
    };
    Ok(Some(command))
}

fn bare(command: Command, args: &[&str], usage: &str) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(anyhow!("usage: {usage}"))
    }
}

fn exact<const N: usize>(args: &[&str], usage: &str) -> Result<[String; N]> {
    let owned: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    owned.try_into().map_err(|_| anyhow!("usage: {usage}"))
}

fn parse_register(args: &[&str]) -> Result<Command> {
    const USAGE: &str = "register <email> <password> <first> <last> <phone> [--agree]";
    let agreed_to_terms = args.contains(&"--agree");
    let positional: Vec<&str> = args
        .iter()
        .copied()
        .filter(|arg| *arg != "--agree")
        .collect();
    let [email, password, first_name, last_name, phone] = exact::<5>(&positional, USAGE)?;
    Ok(Command::Register(Registration {
        email,
        password,
        first_name,
        last_name,
        phone,
        agreed_to_terms,
    }))
}

/// `key=value` pairs; words without `=` continue the previous value.
fn parse_assignments(args: &[&str]) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => {
                let (_, value) = pairs
                    .last_mut()
                    .with_context(|| format!("expected <field>=<value>, got '{arg}'"))?;
                value.push(' ');
                value.push_str(arg);
            }
        }
    }
    if pairs.is_empty() {
        bail!("usage: set <field>=<value>...");
    }
    Ok(pairs)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
