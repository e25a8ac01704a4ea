//! Render-prop components over a live query

use super::provider::FirestoreProvider;
use crate::live::{LiveQuery, LiveState, QueryDescriptor};
use crate::store::Store;
use futures::Stream;

/// Props that describe one live query
pub trait QueryProps: Clone + PartialEq {
    /// Descriptor these props subscribe to
    fn descriptor(&self) -> QueryDescriptor;
}

/// A mounted component: props, a subscription scope and a render prop
///
/// Mounting subscribes, changing props re-subscribes only when they differ,
/// and dropping (or [`unmount`](Self::unmount)) closes the channel.
pub struct QueryComponent<S: Store, P: QueryProps> {
    props: P,
    scope: LiveQuery<S>,
}

impl<S: Store, P: QueryProps> QueryComponent<S, P> {
    /// Mount under `provider` and subscribe for `props`
    pub fn mount(provider: &FirestoreProvider<S>, props: P) -> Self {
        let mut scope = provider.live_query();
        scope.use_result(&props.descriptor(), true);
        Self { props, scope }
    }

    /// Replace the props, re-subscribing if they changed
    pub fn set_props(&mut self, props: P) -> LiveState {
        if props != self.props {
            self.props = props;
            self.scope.use_result(&self.props.descriptor(), true);
        }
        self.scope.state()
    }

    /// Current props
    pub fn props(&self) -> &P {
        &self.props
    }

    /// Current state
    pub fn state(&self) -> LiveState {
        self.scope.state()
    }

    /// Call the render prop with the current state
    pub fn render<R, F>(&self, render: F) -> R
    where
        F: FnOnce(&LiveState) -> R,
    {
        render(&self.scope.state())
    }

    /// States to re-render with, starting with the current one
    pub fn updates(&self) -> impl Stream<Item = LiveState> + Send + 'static {
        self.scope.updates()
    }

    /// Close the channel and drop the component
    pub fn unmount(self) {
        drop(self);
    }
}
