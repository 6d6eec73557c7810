use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use crate::ContextRef;

pin_project_lite::pin_project! {
    /// Returned by [`ContextFutExt::with_context`].
    pub struct FutureWithContext<'a, F> {
        #[pin]
        fut: F,
        #[pin]
        ctx: ContextRef<'a>,
    }
}

impl<F: Future> Future for FutureWithContext<'_, F> {
    type Output = Option<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if this.ctx.poll(cx).is_ready() {
            return Poll::Ready(None);
        }

        this.fut.poll(cx).map(Some)
    }
}

/// Extends futures with the ability to be cancelled by a [`crate::Context`].
pub trait ContextFutExt: Future + Sized {
    /// Wraps this future so it resolves to `None` as soon as `ctx` is done,
    /// instead of running to completion.
    fn with_context<'a>(self, ctx: impl Into<ContextRef<'a>>) -> FutureWithContext<'a, Self> {
        FutureWithContext {
            fut: self,
            ctx: ctx.into(),
        }
    }
}

impl<F: Future> ContextFutExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    #[tokio::test]
    async fn cancelled_context_short_circuits_the_future() {
        let (ctx, handler) = Context::new();
        handler.cancel();

        let result = std::future::pending::<()>().with_context(ctx).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn live_context_lets_the_future_complete() {
        let (ctx, _handler) = Context::new();
        let result = async { 7 }.with_context(ctx).await;
        assert_eq!(result, Some(7));
    }
}
