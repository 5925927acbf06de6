use clap::Subcommand;

use super::canon::CanonArgs;
use super::config::ConfigArgs;
use super::demo::DemoArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Carry students over from the previous period on the live site
    Run(RunArgs),

    /// Run the same flow against a simulated club site
    Demo(DemoArgs),

    /// Manage RosterBot configuration
    Config(ConfigArgs),

    /// Print the canonical "First Last" form of names
    Canon(CanonArgs),
}
