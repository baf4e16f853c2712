//! Link-topic policy checks
//!
//! Pure decisions: callers resolve "is this category link-only?" through the
//! policy cache and hand the answers in.

use thiserror::Error;

use crate::link::{self, InvalidLinkError};
use crate::model::{Actor, Topic};

pub const MOVE_OUT_DISALLOWED_KEY: &str = "links_category.category_move_out_disallowed";
pub const MOVE_IN_DISALLOWED_KEY: &str = "links_category.category_move_in_disallowed";
pub const INVALID_ACCESS_KEY: &str = "invalid_access";

/// Rejected category transitions for non-privileged actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Link topics can't be moved out of a links category")]
    CategoryMoveOutDisallowed,
    #[error("Topics can't be moved into a links category")]
    CategoryMoveInDisallowed,
}

impl MoveError {
    pub fn key(&self) -> &'static str {
        match self {
            MoveError::CategoryMoveOutDisallowed => MOVE_OUT_DISALLOWED_KEY,
            MoveError::CategoryMoveInDisallowed => MOVE_IN_DISALLOWED_KEY,
        }
    }
}

/// Gate for direct category edits on a topic
pub fn check_category_move(
    old_is_link: bool,
    new_is_link: bool,
    privileged: bool,
) -> Result<(), MoveError> {
    if privileged {
        return Ok(());
    }
    if old_is_link {
        return Err(MoveError::CategoryMoveOutDisallowed);
    }
    if new_is_link {
        return Err(MoveError::CategoryMoveInDisallowed);
    }
    Ok(())
}

/// Gate for edits to the featured-link field after creation.
///
/// Returns the value to persist: normalized when the feature is on, the link
/// is non-empty and the category is link-only, otherwise the input as given.
pub fn guard_featured_link(
    new_link: &str,
    is_link_category: bool,
    feature_enabled: bool,
) -> Result<String, InvalidLinkError> {
    if !feature_enabled || !is_link_category || new_link.is_empty() {
        return Ok(new_link.to_string());
    }
    link::normalize(new_link).map(|url| url.into_string())
}

/// Whether `actor` may create (or own) a link topic shaped like `topic`
pub fn can_create_link_topic(actor: &Actor, topic: &Topic, is_link_category: bool) -> bool {
    if !is_link_category {
        return false;
    }
    if actor.is_staff() {
        return true;
    }
    actor.is_authenticated() && !topic.closed && actor.id() == Some(topic.user_id)
}

/// Staff and the topic owner may edit a topic
pub fn can_edit_topic(actor: &Actor, topic: &Topic) -> bool {
    actor.is_staff() || actor.id() == Some(topic.user_id)
}

/// Hidden topics are only shown to staff and their owner
pub fn can_see_topic(actor: &Actor, topic: &Topic) -> bool {
    topic.visible || can_edit_topic(actor, topic)
}
