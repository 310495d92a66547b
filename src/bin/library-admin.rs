//! Library Administration CLI
//!
//! Operator tasks that have no HTTP endpoint: running migrations and
//! granting or revoking the administrator role.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;

use library_service::{
    database::{run_migrations, DatabaseConfig, PgUserRepository, UserRepository},
    models::{UserChanges, UserRole},
    utils::validation::normalize_email,
};

/// Library administration CLI
#[derive(Parser)]
#[command(name = "library-admin", about = "Library service administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Grant the admin role to an account
    Promote(AccountArgs),
    /// Revoke the admin role from an account
    Demote(AccountArgs),
    /// Show an account's role and verification status
    Show(AccountArgs),
}

#[derive(Args)]
struct AccountArgs {
    /// Account email address
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let Some(db_config) = DatabaseConfig::from_env() else {
        bail!("DATABASE_URL must be set");
    };
    let pool = db_config
        .create_pool()
        .await
        .context("failed to connect to the database")?;

    // Keep the schema current before touching accounts
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let users = PgUserRepository::new(pool);

    match cli.command {
        Commands::Migrate => println!("Migrations applied"),
        Commands::Promote(args) => set_role(&users, &args.email, UserRole::Admin).await?,
        Commands::Demote(args) => set_role(&users, &args.email, UserRole::User).await?,
        Commands::Show(args) => show_account(&users, &args.email).await?,
    }

    Ok(())
}

async fn set_role(users: &PgUserRepository, email: &str, role: UserRole) -> anyhow::Result<()> {
    let email = normalize_email(email);
    let Some(account) = users.find_by_email(&email).await? else {
        bail!("No account registered for {}", email);
    };

    if account.role == role {
        println!("{} already has role {}", email, role);
        return Ok(());
    }

    let updated = users
        .update_by_id(account.id, UserChanges::role_change(role))
        .await?;

    log::info!("Changed role of {} to {}", updated.id, updated.role);
    println!("{} now has role {}", email, updated.role);
    Ok(())
}

async fn show_account(users: &PgUserRepository, email: &str) -> anyhow::Result<()> {
    let email = normalize_email(email);
    let Some(account) = users.find_by_email(&email).await? else {
        bail!("No account registered for {}", email);
    };

    println!("ID:             {}", account.id);
    println!("Email:          {}", account.email);
    println!("Username:       {}", account.username);
    println!("Role:           {}", account.role);
    println!("Email verified: {}", account.email_verified);
    println!("Signed in:      {}", account.refresh_token_hash.is_some());
    println!("Created:        {}", account.created_at.format("%Y-%m-%d %H:%M"));

    Ok(())
}
