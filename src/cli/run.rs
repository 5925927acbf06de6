use std::path::PathBuf;
use std::sync::Arc;

use action_primitives::{ActionTimeouts, Driver, RetryableAction};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rosterbot_core_types::SiteLayout;
use rosterbot_scheduler::{CarryOver, CrossMonthScheduler, RunPolicy, RunSummary};
use tool_enroll::{Confirmer, FileNameList, SpecialEnrollmentSet};
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::output::OutputFormat;
use crate::prompt::TerminalConfirmer;
use crate::report::RunReport;
use crate::session::{login, open_start_page};
use crate::webdriver::WebDriverClient;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Special enrollment list (one name per line); overrides the config
    #[arg(long, value_name = "FILE")]
    pub special_list: Option<PathBuf>,

    /// Which previous-period students are carried over
    #[arg(long, value_enum)]
    pub carry_over: Option<CarryOverArg>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CarryOverArg {
    LowAttendance,
    FullRoster,
}

impl From<CarryOverArg> for CarryOver {
    fn from(arg: CarryOverArg) -> Self {
        match arg {
            CarryOverArg::LowAttendance => CarryOver::LowAttendance,
            CarryOverArg::FullRoster => CarryOver::FullRoster,
        }
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: &OutputFormat) -> Result<()> {
    let config = ctx.config();
    let mut webdriver = config.webdriver.clone();
    webdriver.headless |= args.headless;

    let client = WebDriverClient::connect(&webdriver)
        .await
        .with_context(|| format!("connecting to WebDriver at {}", webdriver.url))?;
    let client = Arc::new(client);

    // The session is deleted whatever the run's outcome.
    let result = drive(client.clone(), &args, ctx).await;
    match Arc::try_unwrap(client) {
        Ok(client) => client.close().await,
        Err(_) => warn!("webdriver session still shared, leaving it open"),
    }

    let summary = result?;
    println!("{}", RunReport::new(&summary).render(output)?);
    Ok(())
}

async fn drive(
    client: Arc<WebDriverClient>,
    args: &RunArgs,
    ctx: &CliContext,
) -> Result<RunSummary> {
    let config = ctx.config();
    open_start_page(&client, config.site.start_url.as_deref()).await?;

    let action = RetryableAction::new(client.clone(), config.timeouts.clone());
    login(&action, &config.login, config.login.credentials().as_ref()).await?;
    drop(action);

    let mut policy = config.run.clone();
    if let Some(mode) = args.carry_over {
        policy.carry_over = mode.into();
    }
    let special = load_special(args.special_list.as_ref().or(config.special_list.as_ref())).await;

    execute(
        client,
        config.site.layout.clone(),
        config.timeouts.clone(),
        policy,
        special,
        Arc::new(TerminalConfirmer::new()),
    )
    .await
}

pub async fn load_special(path: Option<&PathBuf>) -> SpecialEnrollmentSet {
    match path {
        Some(path) => {
            let set = SpecialEnrollmentSet::load(&FileNameList::new(path)).await;
            info!(path = %path.display(), names = set.len(), "special enrollment list loaded");
            set
        }
        None => SpecialEnrollmentSet::default(),
    }
}

/// Build the scheduler over `driver` and run it. Only an unreachable
/// starting document surfaces as an error.
pub async fn execute(
    driver: Arc<dyn Driver>,
    layout: SiteLayout,
    timeouts: ActionTimeouts,
    policy: RunPolicy,
    special: SpecialEnrollmentSet,
    confirmer: Arc<dyn Confirmer>,
) -> Result<RunSummary> {
    let scheduler = CrossMonthScheduler::new(driver, layout, timeouts, policy, special, confirmer);
    scheduler
        .run()
        .await
        .context("the events tree could not be reached")
}
