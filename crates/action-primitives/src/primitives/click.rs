//! Click primitive - Click element with fallback strategies

use rosterbot_core_types::{ActionId, Locator, NodeHandle};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    primitives::RetryableAction,
    types::{ActionReport, InvokeStrategy},
};

/// Execute click primitive
///
/// Steps:
/// 1. Wait until the target is actionable
/// 2. Scroll it into view and let the layout settle
/// 3. Native click
/// 4. Script click on the same element
/// 5. Re-resolve the target once and script click the fresh element
pub async fn execute_click(
    action: &RetryableAction,
    target: &Locator,
    timeout: Duration,
) -> Result<ActionReport, ActionError> {
    let started = Instant::now();
    let action_id = ActionId::new();

    debug!(action_id = %action_id, target = %target, "Executing click primitive");

    // 1. Wait for an actionable target
    let node = action.reader().wait_actionable(target, timeout).await?;

    // 2. Scroll and settle
    if let Err(err) = action.driver().scroll_into_view(&node).await {
        debug!(target = %target, error = %err, "scroll into view failed");
    }
    sleep(action.timeouts().settle()).await;

    // 3. Native click
    match action.driver().invoke(&node).await {
        Ok(()) => return Ok(report(action_id, target, InvokeStrategy::Direct, 1, started)),
        Err(err) => debug!(target = %target, error = %err, "native click failed"),
    }

    // 4. Script click
    match action.driver().force_invoke(&node).await {
        Ok(()) => return Ok(report(action_id, target, InvokeStrategy::Forced, 2, started)),
        Err(err) => debug!(target = %target, error = %err, "script click failed"),
    }

    // 5. Re-resolve once, then a final script click
    let fresh = action
        .reader()
        .wait_actionable(target, timeout)
        .await
        .map_err(|err| exhausted(target, &err.to_string()))?;
    final_forced(action, target, &fresh).await?;
    Ok(report(
        action_id,
        target,
        InvokeStrategy::Reresolved,
        3,
        started,
    ))
}

/// Script click on an element that only needs to exist.
///
/// Used for controls the remote application only reacts to through script
/// dispatch (registration link, autocomplete entries, submit button).
pub async fn execute_forced_click(
    action: &RetryableAction,
    target: &Locator,
    timeout: Duration,
) -> Result<ActionReport, ActionError> {
    let started = Instant::now();
    let action_id = ActionId::new();

    let node = action.reader().wait_present(target, timeout).await?;
    match action.driver().force_invoke(&node).await {
        Ok(()) => {
            return Ok(report(
                action_id,
                target,
                InvokeStrategy::Forced,
                1,
                started,
            ))
        }
        Err(err) => debug!(target = %target, error = %err, "script click failed"),
    }

    let fresh = action
        .reader()
        .wait_present(target, timeout)
        .await
        .map_err(|err| exhausted(target, &err.to_string()))?;
    final_forced(action, target, &fresh).await?;
    Ok(report(
        action_id,
        target,
        InvokeStrategy::Reresolved,
        2,
        started,
    ))
}

/// Single script click on an already located element.
pub async fn execute_forced_on_node(
    action: &RetryableAction,
    node: &NodeHandle,
) -> Result<ActionReport, ActionError> {
    let started = Instant::now();
    let action_id = ActionId::new();
    if let Err(err) = action.driver().scroll_into_view(node).await {
        debug!(node = %node, error = %err, "scroll into view failed");
    }
    action
        .driver()
        .force_invoke(node)
        .await
        .map_err(|err| ActionError::Exhausted(format!("{node}: {err}")))?;
    Ok(report(action_id, node, InvokeStrategy::Forced, 1, started))
}

async fn final_forced(
    action: &RetryableAction,
    target: &Locator,
    node: &NodeHandle,
) -> Result<(), ActionError> {
    action
        .driver()
        .force_invoke(node)
        .await
        .map_err(|err| exhausted(target, &err.to_string()))
}

fn exhausted(target: &Locator, last: &str) -> ActionError {
    ActionError::Exhausted(format!("{target}: {last}"))
}

fn report(
    action_id: ActionId,
    target: &dyn fmt::Display,
    strategy: InvokeStrategy,
    attempts: u8,
    started: Instant,
) -> ActionReport {
    let latency_ms = started.elapsed().as_millis() as u64;
    info!(
        action_id = %action_id,
        target = %target,
        strategy = ?strategy,
        latency_ms = latency_ms,
        "Click completed"
    );
    ActionReport {
        action_id: action_id.0,
        target: target.to_string(),
        strategy,
        attempts,
        latency_ms,
    }
}
