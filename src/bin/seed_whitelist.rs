//! Adds emails to the sign-in whitelist.
//!
//! Emails come from the command line and from `SEED_EMAILS`
//! (comma separated), e.g. `seed-whitelist alice@example.com bob@example.com`.

use std::env;
use std::process;

use log::{error, info};

use beer_night::db::{self, whitelist::AddWhitelistedEmail, Query};
use beer_night::error::Error;
use beer_night::validation::normalize_email;

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let emails = collect_emails(env::args().skip(1).chain(env::var("SEED_EMAILS").ok()));

    if emails.is_empty() {
        eprintln!("Usage: seed-whitelist <email> [email ...]");
        eprintln!("       SEED_EMAILS=a@example.com,b@example.com seed-whitelist");
        process::exit(1);
    }

    if let Err(e) = run(&emails) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Splits every source on commas, normalizes, and drops blanks and repeats.
fn collect_emails<I: IntoIterator<Item = String>>(sources: I) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for source in sources {
        for email in source.split(',').map(normalize_email) {
            if !email.is_empty() && !emails.contains(&email) {
                emails.push(email);
            }
        }
    }
    emails
}

fn run(emails: &[String]) -> Result<(), Error> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| Error::Config("DATABASE_URL must be set".into()))?;

    let pool = db::build_pool(&database_url, 1);
    db::run_migrations(&pool)?;

    let mut conn = pool.get()?;
    let mut failed = 0;

    for email in emails {
        match (AddWhitelistedEmail { email: email.clone() }).execute(&mut conn) {
            Ok(_) => {
                info!("Whitelisted {}", email);
                println!("Added: {}", email);
            }
            Err(e) if e.is_unique_violation() => println!("Already exists: {}", email),
            Err(e) => {
                failed += 1;
                println!("Failed: {} ({})", email, e);
            }
        }
    }

    if failed > 0 {
        process::exit(2);
    }

    Ok(())
}
