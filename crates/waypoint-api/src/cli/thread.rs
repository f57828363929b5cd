//! Thread inspection commands: `show-thread`, `reset-thread`.

use anyhow::Result;
use console::style;

use waypoint_core::checkpoint::CheckpointStore;
use waypoint_types::conversation::{ConversationState, Role};

/// Print a thread's persisted state.
pub async fn show_thread<S: CheckpointStore>(store: &S, id: &str, json: bool) -> Result<()> {
    let Some(state) = store.load(id).await? else {
        anyhow::bail!("thread '{id}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_summary(&state);
    Ok(())
}

fn print_summary(state: &ConversationState) {
    println!();
    println!(
        "  {} {}",
        style("Thread").bold(),
        style(&state.thread_id).cyan()
    );
    println!(
        "  {}",
        style(format!("updated {}", state.updated_at.to_rfc3339())).dim()
    );

    if let Some(task) = &state.task {
        println!();
        println!("  {} {task}", style("Task:").bold());
        println!(
            "  {} {}/{} steps done",
            style("Plan:").bold(),
            state.results.len(),
            state.steps.len()
        );
        for step in &state.steps {
            let done = state.results.iter().any(|r| r.step_id == step.step_id);
            let mark = if done {
                style("✓").green()
            } else {
                style("·").dim()
            };
            println!("    {mark} {} {}", step.step_id, step.description);
        }
    }

    if let Some(path) = &state.optimal_path {
        println!();
        println!("  {} {path}", style("Optimal path:").bold());
    }

    println!();
    for message in &state.messages {
        let who = match message.role {
            Role::User => style("user").yellow(),
            Role::Assistant => style("assistant").cyan(),
        };
        println!("  {who:>9}  {}", message.content);
    }
    println!();
}

/// Delete a thread's persisted state.
pub async fn reset_thread<S: CheckpointStore>(store: &S, id: &str) -> Result<()> {
    if store.delete(id).await? {
        println!("  {} Thread {} reset", style("✓").green().bold(), style(id).cyan());
    } else {
        println!("  {} No thread named {}", style("!").yellow().bold(), style(id).cyan());
    }
    Ok(())
}
