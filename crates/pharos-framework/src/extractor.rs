//! Extractor system for the Pharos framework.
//!
//! Listener functions declare what they need as parameters; each parameter
//! type implements [`FromContext`] and is pulled out of the
//! [`DispatchContext`] before the listener body runs.
//!
//! ```rust,ignore
//! async fn on_echo(event: EventContext<C2CMessage>, Text(rest): Text) {
//!     println!("{} asked to echo {rest}", event.author.display_name());
//! }
//! ```
//!
//! # Error Handling
//!
//! If any extractor fails, the listener is skipped for this event and the
//! bus moves on. [`Option<T>`] never fails.

use pharos_core::{Attachments, Content, Event, EventContext, FromEvent, Target};

use crate::context::{DispatchContext, short_type_name};
use crate::error::{ExtractError, ExtractResult};
use crate::matcher::{CommandResult, MatchResult};

/// A type that can be extracted from a [`DispatchContext`].
pub trait FromContext: Sized {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self>;
}

impl FromContext for Event {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

/// Extracts a typed event, failing when the event is of another kind.
impl<T: FromEvent> FromContext for EventContext<T> {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.event()
            .extract::<T>()
            .ok_or(ExtractError::EventTypeMismatch {
                expected: T::KIND.as_str(),
                got: ctx.event().event_name(),
            })
    }
}

impl FromContext for Target {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.target()
            .ok_or(ExtractError::MissingValue(short_type_name::<Target>()))
    }
}

impl FromContext for Content {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.event()
            .content()
            .cloned()
            .ok_or(ExtractError::MissingValue(short_type_name::<Content>()))
    }
}

impl FromContext for Attachments {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.event()
            .attachments()
            .ok_or(ExtractError::MissingValue(short_type_name::<Attachments>()))
    }
}

/// The result of the last matcher in the listener's pipeline.
impl FromContext for MatchResult {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.get::<MatchResult>()
            .ok_or(ExtractError::MissingValue(short_type_name::<MatchResult>()))
    }
}

impl FromContext for CommandResult {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.get::<CommandResult>()
            .ok_or(ExtractError::MissingValue(short_type_name::<CommandResult>()))
    }
}

// ============================================================================
// Named and provided values
// ============================================================================

/// The residual text left by the matchers, bound under the name `"text"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl Text {
    pub const NAME: &'static str = "text";
}

impl std::ops::Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromContext for Text {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.get_named::<String>(Self::NAME)
            .map(Text)
            .ok_or(ExtractError::MissingName(Self::NAME))
    }
}

/// A value placed in the context by one of the listener's providers.
///
/// ```rust,ignore
/// listen([EventKind::GroupMessage])
///     .provide(Provider::value(Greeting("hi".into())))
///     .handle(|Provided(greeting): Provided<Greeting>| async move { ... })?;
/// ```
#[derive(Debug, Clone)]
pub struct Provided<T>(pub T);

impl<T> std::ops::Deref for Provided<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Clone + Send + Sync + 'static> FromContext for Provided<T> {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.get::<T>()
            .map(Provided)
            .ok_or(ExtractError::MissingValue(short_type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_core::{ApplicationReady, GroupMessage};

    #[test]
    fn test_event_context_mismatch() {
        let ctx = DispatchContext::for_event(Event::from(ApplicationReady));
        let err = EventContext::<GroupMessage>::from_context(&ctx).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::EventTypeMismatch {
                expected: "GroupMessage",
                got: "ApplicationReady"
            }
        ));
        assert!(Option::<EventContext<GroupMessage>>::from_context(&ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_content_only_for_messages() {
        let ctx = DispatchContext::for_event(Event::from(ApplicationReady));
        assert!(Content::from_context(&ctx).is_err());
        assert!(Target::from_context(&ctx).is_err());

        let ctx = DispatchContext::for_event(Event::from(GroupMessage {
            content: Content::from("hi"),
            ..Default::default()
        }));
        assert_eq!(Content::from_context(&ctx).unwrap().as_str(), "hi");
        assert!(Attachments::from_context(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_text_and_provided() {
        let ctx = DispatchContext::for_event(Event::from(ApplicationReady));
        assert!(Text::from_context(&ctx).is_err());

        ctx.insert_named(Text::NAME, String::from("rest"));
        ctx.insert(7u64);
        assert_eq!(Text::from_context(&ctx).unwrap(), Text("rest".into()));
        assert_eq!(*Provided::<u64>::from_context(&ctx).unwrap(), 7);
    }
}
