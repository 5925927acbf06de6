//! Getting the browser from a blank session to the events tree.

use action_primitives::{Locator, RetryableAction};
use anyhow::{bail, Context, Result};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Credentials, LoginConfig};
use crate::webdriver::WebDriverClient;

/// Open the start page, when one is configured.
pub async fn open_start_page(client: &WebDriverClient, start_url: Option<&str>) -> Result<()> {
    match start_url {
        Some(url) => {
            client
                .navigate(url)
                .await
                .with_context(|| format!("navigating to {url}"))?;
            info!(url, "start page opened");
        }
        None => warn!("no start url configured, using the page the session opened on"),
    }
    Ok(())
}

/// Fill the login form and pass the workspace picker.
///
/// Without credentials the step is skipped and the current page is assumed
/// to be authenticated already.
pub async fn login(
    action: &RetryableAction,
    login: &LoginConfig,
    credentials: Option<&Credentials>,
) -> Result<()> {
    let Some(credentials) = credentials else {
        info!(
            username_env = %login.username_env,
            "no credentials configured, skipping login"
        );
        return Ok(());
    };
    let timeouts = action.timeouts();

    action
        .enter_text(
            &Locator::name(login.username_field.clone()),
            &credentials.username,
            timeouts.wait(),
        )
        .await
        .context("filling the username field")?;
    action
        .enter_text(
            &Locator::name(login.password_field.clone()),
            &credentials.password,
            timeouts.wait(),
        )
        .await
        .context("filling the password field")?;

    if !action
        .perform(&Locator::id(login.login_button_id.clone()), timeouts.wait())
        .await
    {
        bail!("login button '{}' could not be pressed", login.login_button_id);
    }
    sleep(timeouts.after_submit()).await;

    if let Some(name) = &login.continue_button_name {
        if !action
            .perform(&Locator::name(name.clone()), timeouts.wait())
            .await
        {
            bail!("post-login button '{name}' could not be pressed");
        }
        sleep(timeouts.after_action()).await;
    }
    info!(username = %credentials.username, "logged in");
    Ok(())
}
