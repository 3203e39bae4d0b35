use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, SET_COOKIE};
use serde_json::{json, Value};

use site_gate::auth::token::{self, TokenPolicy};
use site_gate::clock::{Clock, SystemClock};
use site_gate::config::load_config;

#[derive(Parser)]
#[command(name = "site-gate-cli")]
#[command(about = "Operator CLI for site-gate", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "SITE_GATE_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue or check session tokens offline
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Validate a configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show server status
    Status,
    /// Show rate limiter state
    RateLimits,
    /// Clear one client's rate limit window
    ResetRateLimit { client: String },
    /// Try the site password against a running server
    Login {
        /// Site base URL.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        site: String,
        #[arg(long, env = "SITE_PASSWORD")]
        password: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Print a fresh session token
    Issue {
        #[arg(long, env = "AUTH_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Check a session token
    Verify {
        token: String,
        #[arg(long, env = "AUTH_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate a configuration file
    Check { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Token { command } => run_token(command)?,
        Commands::Config {
            command: ConfigCommands::Check { path },
        } => match load_config(&path) {
            Ok(config) => println!(
                "{} is valid (environment: {}, listening on {})",
                path.display(),
                config.environment.as_str(),
                config.listener.bind_address
            ),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        Commands::Status => {
            let res = admin_client(&cli.key)?
                .get(format!("{}/admin/status", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::RateLimits => {
            let res = admin_client(&cli.key)?
                .get(format!("{}/admin/rate-limits", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::ResetRateLimit { client } => {
            let res = admin_client(&cli.key)?
                .delete(format!("{}/admin/rate-limits/{client}", cli.url))
                .send()
                .await?;
            match res.status().as_u16() {
                204 => println!("Window for {client} cleared"),
                404 => println!("No window tracked for {client}"),
                status => eprintln!("Error: Admin API returned status {status}"),
            }
        }
        Commands::Login { site, password } => {
            let res = reqwest::Client::new()
                .post(format!("{site}/api/auth/login"))
                .json(&json!({ "password": password }))
                .send()
                .await?;
            let issued = res.headers().contains_key(SET_COOKIE);
            println!("Status: {}", res.status());
            println!("Session cookie issued: {issued}");
        }
    }

    Ok(())
}

fn run_token(command: TokenCommands) -> Result<(), Box<dyn std::error::Error>> {
    let now = SystemClock.now_millis();
    match command {
        TokenCommands::Issue { secret } => {
            if secret.is_empty() {
                return Err("secret must not be empty".into());
            }
            println!("{}", token::issue_with(&secret, now));
        }
        TokenCommands::Verify { token: value, secret } => {
            let valid = !secret.is_empty()
                && token::verify_with(&secret, &value, now, &TokenPolicy::default());
            println!("{}", if valid { "valid" } else { "invalid" });
            if !valid {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn admin_client(key: &str) -> Result<reqwest::Client, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
