use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use safenight_core::catalog::{validate_catalog, STANDARD_DRINKS};
use safenight_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "safenight")]
#[command(about = "Drink logging and blood-alcohol estimates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current BAC estimate (default)
    Status {
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log a standard drink (beer, lightBeer, ipa, wine, champagne, shot, cocktail, margarita, longIsland, martini)
    Quick {
        kind: String,

        /// Outing this drink belongs to
        #[arg(long)]
        plan: Option<String>,
    },

    /// Log a drink with explicit volume and strength
    Log {
        #[arg(long)]
        name: String,

        /// beer, wine, liquor, cocktail, shot or other
        #[arg(long = "type", default_value = "other")]
        alcohol_type: String,

        /// Volume in fluid ounces
        #[arg(long)]
        oz: f64,

        /// Alcohol by volume as a fraction (0.05 for 5%)
        #[arg(long)]
        abv: f64,

        #[arg(long)]
        plan: Option<String>,
    },

    /// Log a drink from a drink-parser JSON reply
    Import {
        /// What the user typed, used if the reply cannot be read
        #[arg(long)]
        description: String,

        /// Raw parser reply
        #[arg(long)]
        response: String,

        #[arg(long)]
        plan: Option<String>,
    },

    /// List logged drinks
    List {
        /// Only drinks for this outing
        #[arg(long)]
        plan: Option<String>,

        /// Only drinks logged today
        #[arg(long)]
        today: bool,
    },

    /// Remove a logged drink by id
    Remove { id: Uuid },

    /// Remove all logged drinks
    Clear,

    /// Show or update the profile used for estimates
    Profile {
        /// Body weight in pounds
        #[arg(long)]
        weight: Option<f64>,

        /// female or other
        #[arg(long)]
        sex: Option<String>,
    },

    /// List the standard drinks available to `quick`
    Kinds,

    /// Compact the drink WAL into the CSV archive
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// Filesystem layout under the data directory
struct Paths {
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
    profile: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal: wal_dir.join("drinks.wal"),
            profile: wal_dir.join("profile.json"),
            csv: data_dir.join("drinks.csv"),
            wal_dir,
        }
    }
}

fn main() -> Result<()> {
    safenight_core::logging::init("warn");

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_or_default(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    let errors = validate_catalog();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid standard drink table".into()));
    }

    match cli.command {
        Some(Commands::Status { at }) => cmd_status(&paths, &config, at),
        Some(Commands::Quick { kind, plan }) => cmd_quick(&paths, &config, &kind, plan),
        Some(Commands::Log {
            name,
            alcohol_type,
            oz,
            abv,
            plan,
        }) => cmd_log(&paths, &config, name, &alcohol_type, oz, abv, plan),
        Some(Commands::Import {
            description,
            response,
            plan,
        }) => cmd_import(&paths, &config, &description, &response, plan),
        Some(Commands::List { plan, today }) => cmd_list(&paths, &config, plan, today),
        Some(Commands::Remove { id }) => cmd_remove(&paths, &config, id),
        Some(Commands::Clear) => cmd_clear(&paths, &config),
        Some(Commands::Profile { weight, sex }) => cmd_profile(&paths, &config, weight, sex),
        Some(Commands::Kinds) => cmd_kinds(),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        None => cmd_status(&paths, &config, None),
    }
}

fn load_profile(paths: &Paths, config: &Config) -> Result<UserProfile> {
    Ok(UserProfile::load(&paths.profile)?.unwrap_or_else(|| config.profile.to_profile()))
}

/// Build a store from everything persisted so far
fn open_store(paths: &Paths, config: &Config, now: DateTime<Utc>) -> Result<DrinkStore> {
    let profile = load_profile(paths, config)?;
    let drinks = load_drinks(&paths.wal, &paths.csv)?;
    Ok(DrinkStore::from_drinks(
        profile,
        config.tracking.window_hours,
        drinks,
        now,
    ))
}

fn cmd_status(paths: &Paths, config: &Config, at: Option<DateTime<Utc>>) -> Result<()> {
    let now = at.unwrap_or_else(Utc::now);
    let store = open_store(paths, config, now)?;

    println!(
        "Drinks in the last {}h: {}",
        config.tracking.window_hours,
        store.recent_drinks(now).len()
    );
    display_estimate(store.current_estimate());
    Ok(())
}

/// Validate, persist and report a new drink
fn record_drink(paths: &Paths, config: &Config, drink: Drink, now: DateTime<Utc>) -> Result<()> {
    let mut store = open_store(paths, config, now)?;
    let logged = store.log_drink(drink, now)?.clone();

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&DrinkLogEntry::Logged {
        drink: logged.clone(),
    })?;

    println!(
        "✓ Logged {} ({} oz @ {:.1}% ABV)",
        logged.name,
        logged.estimated_oz,
        logged.estimated_abv * 100.0
    );
    println!("  id: {}", logged.id);
    display_estimate(store.current_estimate());
    Ok(())
}

fn cmd_quick(paths: &Paths, config: &Config, kind: &str, plan: Option<String>) -> Result<()> {
    let kind: DrinkKind = kind.parse()?;
    let now = Utc::now();
    let user_id = load_profile(paths, config)?.user_id;
    let drink = quick_log_drink(kind, &user_id, plan, now);
    record_drink(paths, config, drink, now)
}

fn cmd_log(
    paths: &Paths,
    config: &Config,
    name: String,
    alcohol_type: &str,
    oz: f64,
    abv: f64,
    plan: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let user_id = load_profile(paths, config)?.user_id;
    let parsed = ParsedDrink {
        name,
        alcohol_type: alcohol_type.parse()?,
        estimated_oz: oz,
        estimated_abv: abv,
    };
    let drink = parsed.into_drink(&user_id, plan, now)?;
    record_drink(paths, config, drink, now)
}

fn cmd_import(
    paths: &Paths,
    config: &Config,
    description: &str,
    response: &str,
    plan: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let user_id = load_profile(paths, config)?.user_id;
    let drink = parse_drink_response(description, response).into_drink(&user_id, plan, now)?;
    record_drink(paths, config, drink, now)
}

fn cmd_list(paths: &Paths, config: &Config, plan: Option<String>, today: bool) -> Result<()> {
    let now = Utc::now();
    let store = open_store(paths, config, now)?;

    let mut drinks: Vec<&Drink> = if today {
        store.todays_drinks(now)
    } else {
        store.drinks().iter().collect()
    };
    if let Some(ref plan) = plan {
        drinks.retain(|d| d.plan_id.as_deref() == Some(plan.as_str()));
    }

    if drinks.is_empty() {
        println!("No drinks logged.");
        return Ok(());
    }

    for drink in drinks {
        println!(
            "{}  {}  {:<12} {:>5} oz  {:>5.1}%  {}",
            drink.id,
            drink.logged_at.format("%Y-%m-%d %H:%M"),
            drink.name,
            drink.estimated_oz,
            drink.estimated_abv * 100.0,
            drink.alcohol_type
        );
    }
    Ok(())
}

fn cmd_remove(paths: &Paths, config: &Config, id: Uuid) -> Result<()> {
    let now = Utc::now();
    let mut store = open_store(paths, config, now)?;

    let Some(removed) = store.remove_drink(id, now) else {
        eprintln!("No drink with id {}", id);
        return Err(Error::Other(format!("drink {} not found", id)));
    };

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&DrinkLogEntry::Removed { id, at: now })?;

    println!("✓ Removed {}", removed.name);
    display_estimate(store.current_estimate());
    Ok(())
}

fn cmd_clear(paths: &Paths, config: &Config) -> Result<()> {
    let now = Utc::now();
    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&DrinkLogEntry::Cleared { at: now })?;
    println!("✓ Cleared all drinks");

    let store = open_store(paths, config, now)?;
    display_estimate(store.current_estimate());
    Ok(())
}

fn cmd_profile(
    paths: &Paths,
    config: &Config,
    weight: Option<f64>,
    sex: Option<String>,
) -> Result<()> {
    if weight.is_none() && sex.is_none() {
        print_profile(&load_profile(paths, config)?);
        return Ok(());
    }

    let sex = sex.as_deref().map(str::parse::<Sex>).transpose()?;
    let profile = UserProfile::update(&paths.profile, config.profile.to_profile(), |p| {
        if let Some(w) = weight {
            p.weight_lbs = w;
        }
        if let Some(s) = sex {
            p.sex = s;
        }
        p.validate()
    })?;
    println!("✓ Profile updated");
    print_profile(&profile);

    let store = open_store(paths, config, Utc::now())?;
    display_estimate(store.current_estimate());
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("  User:   {}", profile.user_id);
    println!("  Weight: {} lbs", profile.weight_lbs);
    println!("  Sex:    {}", profile.sex);
}

fn cmd_kinds() -> Result<()> {
    for d in STANDARD_DRINKS.iter() {
        println!(
            "{:<11} {:<12} {:>4} oz  {:>5.1}%  {}",
            d.key,
            d.name,
            d.oz,
            d.abv * 100.0,
            d.alcohol_type
        );
    }
    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = safenight_core::rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} entries to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = safenight_core::rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn display_estimate(estimate: Option<&BacEstimate>) {
    println!("\n╭─────────────────────────────────────────╮");
    let Some(estimate) = estimate else {
        println!("│  BAC: {}", format_bac(0.0));
        println!("╰─────────────────────────────────────────╯");
        println!();
        println!("  No drinks in the tracking window.");
        println!();
        return;
    };

    println!("│  BAC: {}", format_bac(estimate.bac));
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Safety: {}", estimate.safety_level.label());
    println!("  Sober in: {}", format_time_to_sober(estimate.time_to_sober));
    if estimate.time_to_legal_limit > 0 {
        println!(
            "  Under the legal limit in: {}",
            format_time_to_sober(estimate.time_to_legal_limit)
        );
    }
    println!();
    println!("  {}", estimate.recommendation);
    println!();
}
