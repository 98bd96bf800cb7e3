//! Traffic Light State Machine
//!
//! A cyclic machine over an enum state type, with a global `before`
//! callback that vetoes transitions during a power outage.
//!
//! Key concepts:
//! - `state_enum!` for enum-typed states
//! - Single-destination actions
//! - Aborting from a global callback
//!
//! Run with: cargo run --example traffic_light

use declarative_fsm::prelude::*;
use declarative_fsm::state_enum;

state_enum! {
    enum TrafficLight {
        Red,
        Yellow,
        Green,
        Off,
    }
    final: [Off]
}

fn main() -> Result<(), FsmError> {
    println!("=== Traffic Light State Machine ===\n");

    let machine = Machine::create(
        Description::builder()
            .initial(TrafficLight::Red)
            .on_before(|ctx| match ctx.kwarg_as::<bool>("power_outage") {
                Some(true) => Err(Abort::new("no power")),
                _ => Ok(()),
            })
            .action(ActionBuilder::new("go").from(TrafficLight::Red).to(TrafficLight::Green))
            .action(ActionBuilder::new("slow").from(TrafficLight::Green).to(TrafficLight::Yellow))
            .action(ActionBuilder::new("stop").from(TrafficLight::Yellow).to(TrafficLight::Red))
            .action(
                ActionBuilder::new("shutdown")
                    .sources([TrafficLight::Red, TrafficLight::Yellow, TrafficLight::Green])
                    .to(TrafficLight::Off),
            )
            .build(),
    )?;

    println!("Initial state: {:?}", machine.current_state());

    for action in ["go", "slow", "stop", "go"] {
        machine.fire(action, Args::new())?;
        println!("  {action:<8} -> {:?}", machine.current_state());
    }

    if let Err(err) = machine.fire("slow", Args::new().kwarg("power_outage", true)) {
        println!("\nDuring an outage: {err}");
        println!("Still {:?}", machine.current_state());
    }

    machine.fire("shutdown", Args::new())?;
    println!("\nAfter shutdown: {:?} (final: {})", machine.current_state(), machine.is_final());
    println!("Available actions: {:?}", machine.available_actions());

    println!("\n=== Example Complete ===");
    Ok(())
}
