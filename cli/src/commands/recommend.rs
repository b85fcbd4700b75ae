use anyhow::{Context, Result};
use serde::Serialize;

use fitflow_core::generation::{RetryPolicy, TextGenerator, generate_with_retry};
use fitflow_core::service::FitFlowService;
use fitflow_core::session::SessionContext;

#[derive(Serialize)]
struct Recommendation<'a> {
    user: &'a str,
    kind: &'a str,
    text: &'a str,
}

async fn generate<G: TextGenerator>(generator: &G, prompt: &str, policy: RetryPolicy) -> String {
    generate_with_retry(generator, prompt, policy, |notice| eprintln!("{notice}")).await
}

fn print_recommendation(user: &str, kind: &str, text: &str, json: bool) -> Result<()> {
    if json {
        let rec = Recommendation { user, kind, text };
        println!("{}", serde_json::to_string_pretty(&rec)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

pub(crate) async fn cmd_recommend_workout<G: TextGenerator>(
    svc: &FitFlowService,
    generator: &G,
    policy: RetryPolicy,
    user: &str,
    json: bool,
) -> Result<()> {
    let prompt = svc.workout_prompt(user)?;
    let text = generate(generator, &prompt, policy).await;
    print_recommendation(user, "workout", &text, json)
}

pub(crate) async fn cmd_recommend_dinner<G: TextGenerator>(
    svc: &FitFlowService,
    generator: &G,
    policy: RetryPolicy,
    user: &str,
    json: bool,
) -> Result<()> {
    let prompt = svc.dinner_prompt(user)?;
    let text = generate(generator, &prompt, policy).await;
    print_recommendation(user, "dinner", &text, json)
}

/// Generate a workout and a dinner together, optionally saving the pair.
pub(crate) async fn cmd_recommend_both<G: TextGenerator>(
    svc: &FitFlowService,
    generator: &G,
    policy: RetryPolicy,
    user: &str,
    save: bool,
    json: bool,
) -> Result<()> {
    let mut session = SessionContext::new();
    session.select_user(user);

    let workout_prompt = svc.workout_prompt(user)?;
    let dinner_prompt = svc.dinner_prompt(user)?;
    session.set_workout(generate(generator, &workout_prompt, policy).await);
    session.set_dinner(generate(generator, &dinner_prompt, policy).await);

    let saved = if save {
        let entry = svc.save_session_history(&session)?;
        if entry.is_none() {
            eprintln!("Recommendation history is disabled for this database; nothing saved.");
        }
        entry
    } else {
        None
    };

    let (workout, dinner) = session
        .pending_history()
        .context("Recommendations missing from session")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user": user,
                "workout": workout,
                "dinner": dinner,
                "saved": saved,
            }))?
        );
    } else {
        println!("## Workout\n\n{workout}\n\n## Dinner\n\n{dinner}");
        if saved.is_some() {
            eprintln!("\nSaved to {user}'s history.");
        }
    }
    Ok(())
}

/// Full recipe for `dinner`, or for the most recently saved dinner.
pub(crate) async fn cmd_recommend_recipe<G: TextGenerator>(
    svc: &FitFlowService,
    generator: &G,
    policy: RetryPolicy,
    user: &str,
    dinner: Option<String>,
    json: bool,
) -> Result<()> {
    let dinner = match dinner {
        Some(d) => d,
        None => svc
            .get_history(user, 1)?
            .into_iter()
            .next()
            .map(|h| h.dinner)
            .context("No dinner given and none saved in history")?,
    };

    let prompt = svc.recipe_prompt(user, &dinner)?;
    let text = generate(generator, &prompt, policy).await;
    print_recommendation(user, "recipe", &text, json)
}
