//! `tilekit delegates`: list registered delegate types.

use tilekit::delegate::{DelegateFactory, DelegateKit};

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    let factory = DelegateFactory::with_defaults();

    println!("Delegate types (resolution order):");
    for name in factory.registered_types() {
        println!("  {}", name);
    }

    println!();
    println!("Defaults installed in every layer:");
    for definition in DelegateKit::default_definitions() {
        println!("  {}", definition);
    }
    Ok(())
}
