use anyhow::{Context, Result};
use clap::Args;
use club_sim::{ClubSim, ClubSpec};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tool_enroll::{Confirmer, ScriptedConfirmer, SpecialEnrollmentSet};
use tracing::info;

use action_primitives::ActionTimeouts;
use perceiver_roster::canonicalize;
use rosterbot_core_types::SiteLayout;

use super::run::{execute, load_special, CarryOverArg};
use crate::cli::context::CliContext;
use crate::cli::output::OutputFormat;
use crate::prompt::{parse_answer, TerminalConfirmer};
use crate::report::RunReport;

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// YAML description of the simulated club; defaults to a built-in sample
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Answers to the operator prompts, in order (y/n, comma separated)
    #[arg(long, value_delimiter = ',')]
    pub answers: Vec<String>,

    /// Answer for prompts beyond the scripted ones
    #[arg(long, default_value = "y")]
    pub fallback: String,

    /// Ask on the terminal instead of using scripted answers
    #[arg(long, conflicts_with = "answers")]
    pub interactive: bool,

    /// Name on the special enrollment list (repeatable)
    #[arg(long = "special", value_name = "NAME")]
    pub special: Vec<String>,

    /// Special enrollment list file; overrides the config
    #[arg(long, value_name = "FILE")]
    pub special_list: Option<PathBuf>,

    /// Which previous-period students are carried over
    #[arg(long, value_enum)]
    pub carry_over: Option<CarryOverArg>,
}

pub async fn cmd_demo(args: DemoArgs, ctx: &CliContext, output: &OutputFormat) -> Result<()> {
    let config = ctx.config();
    let spec = match &args.scenario {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str::<ClubSpec>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ClubSpec::sample(),
    };
    let sim = ClubSim::new(spec);

    let confirmer: Arc<dyn Confirmer> = if args.interactive {
        Arc::new(TerminalConfirmer::new())
    } else {
        let answers = args
            .answers
            .iter()
            .map(|raw| parse_answer(raw).with_context(|| format!("invalid answer '{raw}'")))
            .collect::<Result<Vec<_>>>()?;
        let fallback = parse_answer(&args.fallback)
            .with_context(|| format!("invalid fallback answer '{}'", args.fallback))?;
        Arc::new(ScriptedConfirmer::new(answers, fallback))
    };

    let mut special = load_special(args.special_list.as_ref().or(config.special_list.as_ref()))
        .await
        .names()
        .map(str::to_string)
        .collect::<Vec<_>>();
    special.extend(args.special.iter().map(|name| canonicalize(name)));

    let mut policy = config.run.clone();
    if let Some(mode) = args.carry_over {
        policy.carry_over = mode.into();
    }
    // The simulated site uses the default markup and renders synchronously.
    policy.attendance.backoff_ms = policy.attendance.backoff_ms.min(10);

    let summary = execute(
        sim.driver(),
        SiteLayout::default(),
        ActionTimeouts::instant(),
        policy,
        SpecialEnrollmentSet::new(special),
        confirmer,
    )
    .await?;

    for (day, student) in sim.enrollments() {
        info!(day = %day, student = %student, "simulated enrollment");
    }
    println!("{}", RunReport::new(&summary).render(output)?);
    Ok(())
}
