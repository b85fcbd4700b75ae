mod commands;
mod config;
mod gemini;
mod server;
mod sessions;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    ProfileUpdate, cmd_equipment_add, cmd_equipment_delete, cmd_equipment_list, cmd_food_add,
    cmd_food_delete, cmd_food_list, cmd_history, cmd_profile_rename, cmd_profile_set,
    cmd_profile_show, cmd_profile_weight, cmd_recommend_both, cmd_recommend_dinner,
    cmd_recommend_recipe, cmd_recommend_workout, cmd_users, parse_height,
};
use crate::config::Config;
use crate::gemini::GeminiClient;
use fitflow_core::generation::RetryPolicy;
use fitflow_core::models::{EquipmentCategory, PreferenceType};
use fitflow_core::service::FitFlowService;

#[derive(Parser)]
#[command(
    name = "fitflow",
    version,
    about = "Personal workout and dinner suggestions from your health profile"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles available for selection
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// View or edit a profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage a profile's exercise equipment
    Equipment {
        #[command(subcommand)]
        command: EquipmentCommands,
    },
    /// Manage a profile's food preferences
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Show saved workout and dinner recommendations
    History {
        /// Profile name
        user: String,
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask Gemini for a workout, a dinner or a recipe
    Recommend {
        #[command(subcommand)]
        command: RecommendCommands,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show a profile
    Show {
        /// Profile name
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create or update a profile
    Set {
        /// Profile name
        user: String,
        /// Age in years (10-120)
        #[arg(long)]
        age: Option<i64>,
        /// Height as feet and inches (5'10") or total inches (70)
        #[arg(long)]
        height: Option<String>,
        /// Weight in lbs (50-600)
        #[arg(long)]
        weight: Option<i64>,
        /// Medical notes or physical limitations
        #[arg(long)]
        notes: Option<String>,
        /// Rename the profile while saving
        #[arg(long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a profile, moving its equipment, preferences and history
    Rename {
        /// Current profile name
        user: String,
        /// New profile name
        new_name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Quickly update a profile's weight
    Weight {
        /// Profile name
        user: String,
        /// Weight in lbs
        weight: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum EquipmentCommands {
    /// List equipment
    List {
        /// Profile name
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a piece of equipment
    Add {
        /// Profile name
        user: String,
        /// Equipment name
        name: String,
        /// Category: strength, cardio, mobility, other
        #[arg(short, long, default_value = "other")]
        category: EquipmentCategory,
        /// Notes (weights, sizes, ...)
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete equipment by ID
    Delete {
        /// Equipment ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List food preferences
    List {
        /// Profile name
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food preference
    Add {
        /// Profile name
        user: String,
        /// Food item
        item: String,
        /// Type: staple, like, dislike, avoid, allergy
        #[arg(short = 't', long = "type", default_value = "like")]
        preference_type: PreferenceType,
        /// Nutritional goal (e.g. "high protein")
        #[arg(long)]
        goal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food preference by ID
    Delete {
        /// Food preference ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecommendCommands {
    /// Suggest a 45-minute workout
    Workout {
        /// Profile name
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest a dinner
    Dinner {
        /// Profile name
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest a workout and a dinner
    Both {
        /// Profile name
        user: String,
        /// Save both suggestions to history
        #[arg(long)]
        save: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Full recipe for a dinner (default: the last saved dinner)
    Recipe {
        /// Profile name
        user: String,
        /// Dinner description
        dinner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fitflow=info,fitflow_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn gemini_client(config: &Config) -> Result<GeminiClient> {
    GeminiClient::new(config.require_gemini_api_key()?, &config.gemini_model)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = FitFlowService::new(&config.db_path, config.store_options())?;
    svc.ensure_default_users()?;
    let policy = RetryPolicy::default();

    match cli.command {
        Commands::Users { json } => cmd_users(&svc, json),
        Commands::Profile { command } => match command {
            ProfileCommands::Show { user, json } => cmd_profile_show(&svc, &user, json),
            ProfileCommands::Set {
                user,
                age,
                height,
                weight,
                notes,
                name,
                json,
            } => {
                let update = ProfileUpdate {
                    name,
                    age,
                    height_in: height.as_deref().map(parse_height).transpose()?,
                    weight_lbs: weight,
                    notes,
                };
                cmd_profile_set(&svc, &user, update, json)
            }
            ProfileCommands::Rename {
                user,
                new_name,
                json,
            } => cmd_profile_rename(&svc, &user, &new_name, json),
            ProfileCommands::Weight { user, weight, json } => {
                cmd_profile_weight(&svc, &user, weight, json)
            }
        },
        Commands::Equipment { command } => match command {
            EquipmentCommands::List { user, json } => cmd_equipment_list(&svc, &user, json),
            EquipmentCommands::Add {
                user,
                name,
                category,
                notes,
                json,
            } => cmd_equipment_add(&svc, &user, &name, category, notes, json),
            EquipmentCommands::Delete { id, json } => cmd_equipment_delete(&svc, id, json),
        },
        Commands::Food { command } => match command {
            FoodCommands::List { user, json } => cmd_food_list(&svc, &user, json),
            FoodCommands::Add {
                user,
                item,
                preference_type,
                goal,
                json,
            } => cmd_food_add(&svc, &user, &item, preference_type, goal, json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, id, json),
        },
        Commands::History { user, limit, json } => cmd_history(&svc, &user, limit, json),
        Commands::Recommend { command } => {
            let client = gemini_client(&config)?;
            match command {
                RecommendCommands::Workout { user, json } => {
                    cmd_recommend_workout(&svc, &client, policy, &user, json).await
                }
                RecommendCommands::Dinner { user, json } => {
                    cmd_recommend_dinner(&svc, &client, policy, &user, json).await
                }
                RecommendCommands::Both { user, save, json } => {
                    cmd_recommend_both(&svc, &client, policy, &user, save, json).await
                }
                RecommendCommands::Recipe { user, dinner, json } => {
                    cmd_recommend_recipe(&svc, &client, policy, &user, dinner, json).await
                }
            }
        }
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            let client = gemini_client(&config)?;
            server::start_server(svc, client, policy, port, &bind, api_key).await
        }
    }
}
