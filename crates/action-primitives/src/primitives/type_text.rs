//! Type text primitive - Clear an input and type into it

use rosterbot_core_types::Locator;
use std::time::Duration;
use tracing::debug;

use crate::{errors::ActionError, primitives::RetryableAction};

/// Execute type_text primitive
///
/// Waits for the input to exist, clears any previous value and types
/// `text`. Typing is not retried: the search field reacts to every
/// keystroke, so a second attempt would double the input.
pub async fn execute_type_text(
    action: &RetryableAction,
    target: &Locator,
    text: &str,
    timeout: Duration,
) -> Result<(), ActionError> {
    let node = action.reader().wait_present(target, timeout).await?;
    debug!(target = %target, text_length = text.len(), "Typing into input");

    action.driver().clear(&node).await?;
    action.driver().type_text(&node, text).await?;
    Ok(())
}
