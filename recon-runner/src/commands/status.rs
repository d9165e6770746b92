//! Status and step listing handlers

use anyhow::Result;
use colored::*;
use recon_core::domain::pipeline::{PipelineDefinition, StepKind};
use uuid::Uuid;

use crate::config::Config;
use crate::repository::{FileRunStateStore, RunStateStore};

/// Prints where a target's run currently stands
pub async fn show_status(config: &Config, target_id: Uuid) -> Result<()> {
    let store = FileRunStateStore::new(config.state_dir.clone());

    let Some(state) = store.load(target_id).await? else {
        println!("{}", "No run recorded for this target.".yellow());
        return Ok(());
    };

    let definition = PipelineDefinition::recon();

    println!("{}", "Run State:".bold());
    println!("  Target:  {}", state.target_id.to_string().cyan());
    println!(
        "  Started: {}",
        state.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(updated) = state.updated_at {
        println!("  Updated: {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }

    if state.is_finished() {
        println!("  Step:    {}", "completed".green());
    } else {
        match definition.position(state.current_step) {
            Some(index) => println!(
                "  Step:    {} ({}/{})",
                state.current_step.to_string().yellow(),
                index + 1,
                definition.len()
            ),
            None => println!("  Step:    {}", state.current_step.to_string().dimmed()),
        }
    }

    Ok(())
}

/// Prints the catalog in execution order
pub fn list_steps() {
    let definition = PipelineDefinition::recon();

    println!("{}", format!("{} step(s):", definition.len()).bold());
    for (index, step) in definition.steps().iter().enumerate() {
        let kind = match step.kind {
            StepKind::ToolInvocation(tool) => tool.to_string().normal(),
            StepKind::Consolidation => "merge".cyan(),
        };
        println!("  {:>2}. {:<26} {}", index + 1, step.name.to_string(), kind);
    }
}
