//! Application use cases / business logic

pub mod categories;
pub mod create_link;
pub mod edit_topic;
pub mod present;

pub use categories::{CategoryAdmin, CategoryAdminError, CategoryChanges};
pub use create_link::{CreateLinkError, CreateLinkRequest, CreateLinkTopic, CreatedLinkTopic};
pub use edit_topic::{EditTopicError, FieldError, TopicChanges, TopicEditOutcome, TopicEditor};
pub use present::{
    FeaturedLinkFields, PostView, Presenter, SiteView, SuggestedTopic, TopicListItem, TopicView,
    UserActionView,
};
