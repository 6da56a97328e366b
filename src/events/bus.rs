use std::{collections::BTreeMap, fmt, panic::AssertUnwindSafe, rc::Rc};

use crate::foundation::error::panic_message;

/// Priority used when callers have no ordering preference.
pub const DEFAULT_PRIORITY: i32 = 10;

pub type HandlerResult = anyhow::Result<()>;

/// A registered callback. Identity (for removal) is the `Rc` allocation.
pub type Handler<C, A> = Rc<dyn Fn(&mut C, &A) -> HandlerResult>;

/// Wraps a closure as a [`Handler`]; keep the returned value to remove it later.
pub fn handler<C, A, F>(f: F) -> Handler<C, A>
where
    F: Fn(&mut C, &A) -> HandlerResult + 'static,
{
    Rc::new(f)
}

type Buckets<C, A> = BTreeMap<i32, Vec<Handler<C, A>>>;

/// Named events mapped to priority-ordered handler lists.
///
/// Dispatch is synchronous and best effort: a handler that errors or panics is logged and
/// the remaining handlers still run.
pub struct EventBus<C, A> {
    events: BTreeMap<String, Buckets<C, A>>,
}

impl<C, A> Default for EventBus<C, A> {
    fn default() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }
}

impl<C, A: fmt::Debug> EventBus<C, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`. Never deduplicates. False only for an empty name.
    pub fn add_handler(&mut self, event: &str, handler: Handler<C, A>, priority: i32) -> bool {
        if event.is_empty() {
            return false;
        }
        self.events
            .entry(event.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(handler);
        true
    }

    /// Removes the first registration of `handler` at exactly `(event, priority)`.
    pub fn remove_handler(&mut self, event: &str, handler: &Handler<C, A>, priority: i32) -> bool {
        let Some(bucket) = self
            .events
            .get_mut(event)
            .and_then(|buckets| buckets.get_mut(&priority))
        else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|h| Rc::ptr_eq(h, handler)) else {
            return false;
        };
        bucket.remove(pos);
        true
    }

    pub fn handlers(&self, event: &str) -> Option<&BTreeMap<i32, Vec<Handler<C, A>>>> {
        self.events.get(event)
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.events
            .get(event)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Invokes every handler for `event` in ascending priority, registration order within
    /// a priority. Runs over a snapshot so handlers may not alter this dispatch.
    pub fn dispatch(&self, event: &str, context: &mut C, args: &A) {
        let snapshot: Vec<(i32, Handler<C, A>)> = match self.events.get(event) {
            Some(buckets) => buckets
                .iter()
                .flat_map(|(p, hs)| hs.iter().map(move |h| (*p, Rc::clone(h))))
                .collect(),
            None => return,
        };
        tracing::trace!(event, handlers = snapshot.len(), "dispatching");

        for (priority, h) in snapshot {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| h(context, args)));
            let fault = match result {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            tracing::error!(
                event,
                priority,
                handler = ?Rc::as_ptr(&h),
                ?args,
                %fault,
                "event handler failed"
            );
        }
    }
}

impl<C, A> fmt::Debug for EventBus<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, buckets) in &self.events {
            let counts: BTreeMap<i32, usize> =
                buckets.iter().map(|(p, hs)| (*p, hs.len())).collect();
            map.entry(event, &counts);
        }
        map.finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/events/bus.rs"]
mod tests;
