//! Command-line parsing and dispatch.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use readycash_core::auth::Secrets;
use readycash_core::models::TransactionQuery;
use readycash_core::{Account, AccountSecrets, ApiClient, FileStore};

use crate::config::{Config, ENV_PASSWORD, ENV_PIN};

pub const USAGE: &str = "\
Usage: readycash <command> [args]

Commands:
  login [--save]                          Log in and cache the session (--save stores secrets in the keychain)
  balance                                 Show the agent wallet balance
  ussd <reference> <amount> <bank-code>   Generate a USSD cash-out code
  ussd-status <reference>                 Check a USSD transaction
  transactions [--type T] [--after N] [--start N] [--end N]
                                          List wallet transactions
  summary                                 Balance and transactions together
  forget                                  Remove stored secrets from the keychain

Environment:
  READYCASH_BASE_URL, READYCASH_USERNAME, READYCASH_PASSWORD, READYCASH_PIN
  RUST_LOG            log filter (default: warn)
  READYCASH_LOG_DIR   also write logs to a daily file in this directory";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { save: bool },
    Balance,
    Ussd { reference: String, amount: f64, bank_code: String },
    UssdStatus { reference: String },
    Transactions(TransactionQuery),
    Summary,
    Forget,
    Help,
}

impl Command {
    /// Parse the arguments following the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "login" => match rest {
                [] => Command::Login { save: false },
                [flag] if flag == "--save" => Command::Login { save: true },
                _ => bail!("Usage: readycash login [--save]"),
            },
            "balance" => {
                no_args(name, rest)?;
                Command::Balance
            }
            "ussd" => match rest {
                [reference, amount, bank_code] => Command::Ussd {
                    reference: reference.clone(),
                    amount: amount
                        .parse()
                        .with_context(|| format!("Invalid amount: {}", amount))?,
                    bank_code: bank_code.clone(),
                },
                _ => bail!("Usage: readycash ussd <reference> <amount> <bank-code>"),
            },
            "ussd-status" => match rest {
                [reference] => Command::UssdStatus {
                    reference: reference.clone(),
                },
                _ => bail!("Usage: readycash ussd-status <reference>"),
            },
            "transactions" => Command::Transactions(parse_transaction_query(rest)?),
            "summary" => {
                no_args(name, rest)?;
                Command::Summary
            }
            "forget" => {
                no_args(name, rest)?;
                Command::Forget
            }
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command: {}\n\n{}", other, USAGE),
        };
        Ok(command)
    }
}

fn no_args(name: &str, rest: &[String]) -> Result<()> {
    if !rest.is_empty() {
        bail!("{} takes no arguments", name);
    }
    Ok(())
}

fn parse_transaction_query(args: &[String]) -> Result<TransactionQuery> {
    let mut query = TransactionQuery::default();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("Missing value for {}", flag))?;
        let number = || -> Result<i64> {
            value
                .parse()
                .with_context(|| format!("Invalid value for {}: {}", flag, value))
        };
        match flag.as_str() {
            "--type" => query.tran_type = Some(value.clone()),
            "--after" => query.after = Some(number()?),
            "--start" => query.start_date = Some(number()?),
            "--end" => query.end_date = Some(number()?),
            other => bail!("Unknown option for transactions: {}", other),
        }
    }
    Ok(query)
}

// ============================================================================
// Execution
// ============================================================================

type Client = ApiClient<FileStore>;

#[derive(Serialize)]
struct LoginReport {
    username: String,
    expires_at: Option<String>,
    minutes_remaining: i64,
}

pub async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Forget => {
            let username = require_username(&config)?;
            AccountSecrets::delete(&username)?;
            info!(username = %username, "Removed stored secrets");
            eprintln!("Removed stored secrets for {}", username);
            Ok(())
        }
        Command::Login { save } => {
            let account = resolve_account(&config)?;
            let client = build_client(&config, account.clone())?;
            client.ensure_authenticated().await?;

            if save {
                let secrets = Secrets {
                    password: account.password.clone(),
                    pin: account.pin.clone(),
                };
                AccountSecrets::store(&account.username, &secrets)?;
                let mut saved = config.clone();
                saved.username = Some(account.username.clone());
                if let Err(e) = saved.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }

            let session = client.session().await;
            print_json(&LoginReport {
                username: account.username,
                expires_at: session.expires_at.map(|t| t.to_rfc3339()),
                minutes_remaining: session.minutes_until_expiry(),
            })
        }
        Command::Balance => {
            let client = connect(&config)?;
            print_json(&client.balance().await?)
        }
        Command::Ussd {
            reference,
            amount,
            bank_code,
        } => {
            let client = connect(&config)?;
            print_json(&client.generate_ussd(&reference, amount, &bank_code).await?)
        }
        Command::UssdStatus { reference } => {
            let client = connect(&config)?;
            print_json(&client.fetch_ussd_transaction(&reference).await?)
        }
        Command::Transactions(query) => {
            let client = connect(&config)?;
            print_json(&client.fetch_transactions(&query).await?)
        }
        Command::Summary => {
            let client = connect(&config)?;
            // Log in first so the two requests share one session
            client.ensure_authenticated().await?;
            let query = TransactionQuery::default();
            let (balance, transactions) =
                futures::try_join!(client.balance(), client.fetch_transactions(&query))?;
            print_json(&serde_json::json!({
                "balance": balance,
                "transactions": transactions,
            }))
        }
    }
}

fn connect(config: &Config) -> Result<Client> {
    let account = resolve_account(config)?;
    build_client(config, account)
}

fn build_client(config: &Config, account: Account) -> Result<Client> {
    let dir = config.sessions_dir()?;
    debug!(path = %dir.display(), "Using session store");
    let store = FileStore::new(&dir)
        .with_context(|| format!("Failed to open session store at {}", dir.display()))?;
    let client = ApiClient::new(config.require_base_url()?, account, store)?;
    Ok(client)
}

fn require_username(config: &Config) -> Result<String> {
    match config.username.clone() {
        Some(username) => Ok(username),
        None => prompt_line("Username: "),
    }
}

/// Collect credentials from the environment, then the keychain, then the terminal.
fn resolve_account(config: &Config) -> Result<Account> {
    let username = require_username(config)?;

    let env_password = std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty());
    let env_pin = std::env::var(ENV_PIN).ok().filter(|v| !v.is_empty());

    let (password, pin) = match (env_password, env_pin) {
        (Some(password), Some(pin)) => (password, pin),
        (password, pin) => {
            let stored = match AccountSecrets::load(&username) {
                Ok(secrets) => Some(secrets),
                Err(e) => {
                    debug!(error = %e, "No stored secrets");
                    None
                }
            };
            let password = match password.or_else(|| stored.as_ref().map(|s| s.password.clone())) {
                Some(password) => password,
                None => rpassword::prompt_password("Password: ")?,
            };
            let pin = match pin.or_else(|| stored.map(|s| s.pin)) {
                Some(pin) => pin,
                None => rpassword::prompt_password("PIN: ")?,
            };
            (password, pin)
        }
    };

    Ok(Account::new(username, password, pin).with_session_length(config.session_length()))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_shows_help() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            Command::parse(&args(&["login"])).unwrap(),
            Command::Login { save: false }
        );
        assert_eq!(
            Command::parse(&args(&["login", "--save"])).unwrap(),
            Command::Login { save: true }
        );
        assert!(Command::parse(&args(&["login", "--keep"])).is_err());
    }

    #[test]
    fn test_parse_ussd() {
        let command = Command::parse(&args(&["ussd", "order-17", "1500.50", "044"])).unwrap();
        assert_eq!(
            command,
            Command::Ussd {
                reference: "order-17".to_string(),
                amount: 1500.5,
                bank_code: "044".to_string(),
            }
        );

        assert!(Command::parse(&args(&["ussd", "order-17", "lots", "044"])).is_err());
        assert!(Command::parse(&args(&["ussd", "order-17"])).is_err());
    }

    #[test]
    fn test_parse_transactions_filters() {
        let command = Command::parse(&args(&[
            "transactions",
            "--type",
            "420.00.010.0000",
            "--after",
            "25",
            "--end",
            "1622307058",
        ]))
        .unwrap();

        assert_eq!(
            command,
            Command::Transactions(TransactionQuery {
                tran_type: Some("420.00.010.0000".to_string()),
                after: Some(25),
                start_date: None,
                end_date: Some(1622307058),
            })
        );
    }

    #[test]
    fn test_parse_transactions_rejects_bad_input() {
        assert!(Command::parse(&args(&["transactions", "--after"])).is_err());
        assert!(Command::parse(&args(&["transactions", "--after", "soon"])).is_err());
        assert!(Command::parse(&args(&["transactions", "--limit", "5"])).is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse(&args(&["withdraw"])).unwrap_err();
        assert!(err.to_string().contains("Unknown command: withdraw"));
    }

    #[test]
    fn test_commands_without_arguments() {
        assert_eq!(Command::parse(&args(&["balance"])).unwrap(), Command::Balance);
        assert_eq!(Command::parse(&args(&["summary"])).unwrap(), Command::Summary);
        assert_eq!(Command::parse(&args(&["forget"])).unwrap(), Command::Forget);
        assert!(Command::parse(&args(&["balance", "now"])).is_err());
    }
}
