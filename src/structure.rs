/// The element type every structure stores.
pub type Value = i64;

/// A concurrent container the harness can drive.
///
/// Operations take the calling thread's handle explicitly. A handle carries whatever
/// per-thread state the structure needs, such as a reservation slot, a combining slot
/// or a random number generator, and must only be used with the structure that made it.
pub trait Structure: Sync {
    type Handle<'a>
    where
        Self: 'a;

    /// A short name for reports.
    fn name(&self) -> &'static str;

    /// Create the handle of `thread`. Each index may be held by at most one live handle.
    fn handle(&self, thread: usize) -> Self::Handle<'_>;

    /// Push or enqueue.
    fn insert(&self, handle: &mut Self::Handle<'_>, value: Value);

    /// Pop or dequeue. `None` means the structure was empty.
    fn remove(&self, handle: &mut Self::Handle<'_>) -> Option<Value>;
}
