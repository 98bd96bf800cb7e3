//! Order Review Workflow
//!
//! String-labelled states, an ambiguous action whose destination is chosen
//! by an event callback, and checkpoint/resume across a "restart".
//!
//! Run with: cargo run --example order_review

use declarative_fsm::checkpoint::Checkpoint;
use declarative_fsm::prelude::*;
use std::sync::Arc;

fn id(label: &str) -> StateId {
    StateId::from(label)
}

fn description() -> Description<StateId> {
    Description::builder()
        .initial(id("placed"))
        .on_after(|ctx| {
            if let Some(to) = ctx.destination() {
                println!("  [{}] {} -> {}", ctx.action(), ctx.source(), to);
            }
            Ok(())
        })
        .action(ActionBuilder::new("submit").from(id("placed")).to(id("review")))
        .action(
            ActionBuilder::new("review")
                .from(id("review"))
                .destinations([id("approved"), id("rejected"), id("escalated")])
                .on_event(|ctx| {
                    let amount = ctx.kwarg_as::<u64>("amount").unwrap_or(0);
                    let destination = match amount {
                        0 => "rejected",
                        1..=1_000 => "approved",
                        _ => "escalated",
                    };
                    Ok(Some(id(destination)))
                }),
        )
        .action(
            ActionBuilder::new("decide")
                .from(id("escalated"))
                .destinations([id("approved"), id("rejected")])
                .on_before(|ctx| match ctx.kwarg("manager") {
                    Some(_) => Ok(()),
                    None => Err(Abort::new("a manager must sign off")),
                })
                .on_event(|ctx| {
                    let approve = ctx.kwarg_as::<bool>("approve").unwrap_or(false);
                    Ok(Some(id(if approve { "approved" } else { "rejected" })))
                }),
        )
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Order Review Workflow ===\n");

    let registry = Arc::new(Registry::new(description())?);
    let machine = Machine::with_registry(Arc::clone(&registry))?.with_history();

    machine.fire("submit", Args::new())?;
    machine.fire("review", Args::new().kwarg("amount", 25_000))?;

    let checkpoint = machine.checkpoint().to_json()?;
    println!("\nCheckpoint saved ({} bytes)", checkpoint.len());
    drop(machine);

    let machine = Machine::resume(Arc::clone(&registry), Checkpoint::from_json(&checkpoint)?)?;
    println!("Resumed in state '{}'\n", machine.current_state());

    if let Err(err) = machine.fire("decide", Args::new().kwarg("approve", true)) {
        println!("  rejected call: {err}");
    }
    machine.fire(
        "decide",
        Args::new().kwarg("approve", true).kwarg("manager", "dana"),
    )?;

    if let Some(history) = machine.history() {
        println!("\nPath: {:?}", history.get_path());
    }
    println!("\n=== Example Complete ===");
    Ok(())
}
